use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::cache::CacheKey;
use crate::domain::project::Project;
use crate::domain::retry::RetryPolicy;
use crate::domain::DomainError;
use crate::infrastructure::cache::{InMemoryCacheConfig, TtlCache};
use crate::infrastructure::http::{decode, DevOpsHttpClient, ValueList, API_VERSION};

/// Lists the team projects of the organization
#[derive(Debug)]
pub struct ProjectService {
    client: Arc<dyn DevOpsHttpClient>,
    retry: RetryPolicy,
    projects: TtlCache<Vec<Project>>,
}

impl ProjectService {
    pub fn new(
        client: Arc<dyn DevOpsHttpClient>,
        retry: RetryPolicy,
        cache: InMemoryCacheConfig,
    ) -> Self {
        Self {
            client,
            retry,
            projects: TtlCache::with_config("projects", cache),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<Project>, DomainError> {
        let key = CacheKey::new("projects").to_string();

        if let Some(projects) = self.projects.get(&key) {
            debug!("Projects found in cache");
            return Ok(projects);
        }

        let path = projects_path();
        let list: ValueList<Project> = self
            .retry
            .execute("Getting projects", || self.client.get_json(&path))
            .await
            .and_then(decode)
            .map_err(|e| DomainError::remote("list projects", e))?;

        info!(count = list.value.len(), "Fetched projects");
        self.projects.set(key, list.value.clone());
        Ok(list.value)
    }

    pub fn clear_cache(&self) {
        self.projects.clear();
    }
}

fn projects_path() -> String {
    format!("/_apis/projects?api-version={}", API_VERSION)
}
