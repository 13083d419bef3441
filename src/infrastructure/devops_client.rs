//! Facade owning every domain service over one shared HTTP client

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::AppConfig;
use crate::domain::cross_reference::CrossReferenceResult;
use crate::domain::project::Project;
use crate::domain::retry::{RetryConfig, RetryPolicy};
use crate::domain::test_plan::{TestCase, TestPlan, TestPlanDetails};
use crate::domain::wiki::{Wiki, WikiPage, WikiPageHit, WikiSectionLookup};
use crate::domain::work_item::WorkItem;
use crate::domain::DomainError;
use crate::infrastructure::cache::InMemoryCacheConfig;
use crate::infrastructure::http::{DevOpsHttpClient, HttpClientConfig, ReqwestDevOpsClient};
use crate::infrastructure::services::{
    CrossReferenceService, ProjectService, TestPlanService, TestPlanServiceConfig, WikiService,
    WikiServiceConfig, WorkItemService, WorkItemServiceConfig,
};

#[derive(Debug)]
pub struct DevOpsClient {
    projects: ProjectService,
    wiki: Arc<WikiService>,
    test_plans: Arc<TestPlanService>,
    work_items: Arc<WorkItemService>,
    cross_reference: CrossReferenceService,
}

impl DevOpsClient {
    /// Builds the reqwest-backed client from a validated configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let http = ReqwestDevOpsClient::new(&HttpClientConfig {
            organization_url: config.devops.organization_url.clone(),
            personal_access_token: config.devops.personal_access_token.clone(),
            timeout: Duration::from_millis(config.http.timeout_ms),
        })?;

        Ok(Self::with_http_client(Arc::new(http), config))
    }

    /// Builds the services over an arbitrary HTTP client
    pub fn with_http_client(client: Arc<dyn DevOpsHttpClient>, config: &AppConfig) -> Self {
        let mut cache =
            InMemoryCacheConfig::default().with_ttl(Duration::from_millis(config.cache.ttl_ms));
        if let Some(capacity) = config.cache.max_capacity {
            cache = cache.with_max_capacity(capacity);
        }
        let retry = |max_delay_ms: u64| {
            RetryConfig::new(config.retry.max_attempts)
                .with_initial_delay(config.retry.base_delay_ms)
                .with_max_delay(max_delay_ms)
        };

        let wiki = Arc::new(WikiService::new(
            client.clone(),
            WikiServiceConfig {
                cache: cache.clone(),
                retry: retry(config.retry.wiki_max_delay_ms),
                max_content_length: config.content.max_content_length,
                batch_size: config.search.batch_size,
                batch_delay: Duration::from_millis(config.search.batch_delay_ms),
            },
        ));
        let test_plans = Arc::new(TestPlanService::new(
            client.clone(),
            TestPlanServiceConfig {
                cache: cache.clone(),
                retry: retry(config.retry.test_plan_max_delay_ms),
            },
        ));
        let work_items = Arc::new(WorkItemService::new(
            client.clone(),
            WorkItemServiceConfig {
                cache: cache.clone(),
                retry: retry(config.retry.work_item_max_delay_ms),
            },
        ));
        let projects = ProjectService::new(
            client,
            RetryPolicy::new(retry(config.retry.test_plan_max_delay_ms)),
            cache,
        );
        let cross_reference =
            CrossReferenceService::new(wiki.clone(), test_plans.clone(), work_items.clone());

        Self {
            projects,
            wiki,
            test_plans,
            work_items,
            cross_reference,
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, DomainError> {
        self.projects.list_projects().await
    }

    pub async fn list_wikis(&self, project: &str) -> Vec<Wiki> {
        self.wiki.list_wikis(project).await
    }

    pub async fn list_wiki_pages(&self, project: &str, wiki_id: Option<&str>) -> Vec<WikiPage> {
        match wiki_id {
            Some(wiki_id) => self.wiki.list_pages(project, wiki_id).await,
            None => self.wiki.list_all_pages(project).await,
        }
    }

    pub async fn search_wiki_pages(&self, project: &str, text: &str) -> Vec<WikiPage> {
        self.wiki.search_pages(project, text).await
    }

    pub async fn search_wiki_content(&self, project: &str, text: &str) -> Vec<WikiPageHit> {
        self.wiki.search_content(project, text).await
    }

    pub async fn get_wiki_page_content(
        &self,
        project: &str,
        wiki_id: &str,
        path: &str,
    ) -> Result<String, DomainError> {
        self.wiki.get_page_content(project, wiki_id, path).await
    }

    pub async fn get_wiki_section(
        &self,
        project: &str,
        wiki_id: &str,
        path: &str,
        title: &str,
    ) -> Result<WikiSectionLookup, DomainError> {
        self.wiki.get_section(project, wiki_id, path, title).await
    }

    pub async fn list_test_plans(&self, project: &str) -> Vec<TestPlan> {
        self.test_plans.list_plans(project).await
    }

    pub async fn get_test_plan_details(
        &self,
        project: &str,
        plan_id: i64,
    ) -> Result<TestPlanDetails, DomainError> {
        self.test_plans.get_plan_details(project, plan_id).await
    }

    pub async fn search_test_plans(&self, project: &str, text: &str) -> Vec<TestPlan> {
        self.test_plans.search_plans(project, text).await
    }

    pub async fn get_test_cases(
        &self,
        project: &str,
        plan_id: i64,
        suite_id: Option<i64>,
    ) -> Vec<TestCase> {
        self.test_plans.get_test_cases(project, plan_id, suite_id).await
    }

    pub async fn query_work_items(&self, project: &str, wiql: Option<&str>) -> Vec<WorkItem> {
        self.work_items.query_work_items(project, wiql).await
    }

    pub async fn search_work_items(&self, project: &str, text: &str) -> Vec<WorkItem> {
        self.work_items.search_work_items(project, text).await
    }

    pub async fn get_work_item(&self, project: &str, id: i64) -> Result<WorkItem, DomainError> {
        self.work_items.get_work_item(project, id).await
    }

    pub async fn find_related_items(&self, project: &str, text: &str) -> CrossReferenceResult {
        self.cross_reference.find_related_items(project, text).await
    }

    /// Drops every cached response in every service
    pub fn clear_cache(&self) {
        self.projects.clear_cache();
        self.wiki.clear_cache();
        self.test_plans.clear_cache();
        self.work_items.clear_cache();
        info!("All caches cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::mock::MockHttpClient;
    use serde_json::json;

    const PLANS: &str = "/Fabrikam/_apis/testplan/plans?api-version=7.1";
    const PROJECTS: &str = "/_apis/projects?api-version=7.1";

    fn client() -> Arc<MockHttpClient> {
        Arc::new(
            MockHttpClient::new()
                .with_response(PLANS, json!({ "value": [{ "id": 1, "name": "Smoke" }] }))
                .with_response(PROJECTS, json!({ "value": [{ "id": "p", "name": "Fabrikam" }] })),
        )
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let error = DevOpsClient::from_config(&AppConfig::default()).unwrap_err();
        assert!(matches!(error, DomainError::Configuration { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_clears_every_service() {
        let http = client();
        let gateway = DevOpsClient::with_http_client(http.clone(), &AppConfig::default());

        gateway.list_test_plans("Fabrikam").await;
        gateway.list_projects().await.unwrap();
        gateway.list_test_plans("Fabrikam").await;
        gateway.clear_cache();
        gateway.list_test_plans("Fabrikam").await;
        gateway.list_projects().await.unwrap();

        assert_eq!(http.call_count(PLANS), 2);
        assert_eq!(http.call_count(PROJECTS), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_ttl_follows_config() {
        let http = client();
        let mut config = AppConfig::default();
        config.cache.ttl_ms = 1000;
        let gateway = DevOpsClient::with_http_client(http.clone(), &config);

        gateway.list_test_plans("Fabrikam").await;
        tokio::time::advance(Duration::from_millis(1001)).await;
        gateway.list_test_plans("Fabrikam").await;

        assert_eq!(http.call_count(PLANS), 2);
    }
}
