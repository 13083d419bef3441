//! Work item service - WIQL queries and batch retrieval

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::domain::cache::CacheKey;
use crate::domain::retry::{RetryConfig, RetryPolicy};
use crate::domain::work_item::{default_query, search_query, WiqlResult, WorkItem, MAX_BATCH_IDS};
use crate::domain::{ApiError, DomainError};
use crate::infrastructure::cache::{InMemoryCacheConfig, TtlCache};
use crate::infrastructure::http::{decode, encode, DevOpsHttpClient, ValueList, API_VERSION};

#[derive(Debug, Clone)]
pub struct WorkItemServiceConfig {
    pub cache: InMemoryCacheConfig,
    pub retry: RetryConfig,
}

impl Default for WorkItemServiceConfig {
    fn default() -> Self {
        Self {
            cache: InMemoryCacheConfig::default(),
            retry: RetryConfig::default().with_max_delay(10_000),
        }
    }
}

/// Work item service implementation
#[derive(Debug)]
pub struct WorkItemService {
    client: Arc<dyn DevOpsHttpClient>,
    retry: RetryPolicy,
    work_items: TtlCache<Vec<WorkItem>>,
}

impl WorkItemService {
    pub fn new(client: Arc<dyn DevOpsHttpClient>, config: WorkItemServiceConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy::new(config.retry),
            work_items: TtlCache::with_config("work_items", config.cache),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs a WIQL query (open items of the project by default) and fetches
    /// the first hundred matching work items. Failures yield an empty list.
    #[instrument(skip(self, wiql))]
    pub async fn query_work_items(&self, project: &str, wiql: Option<&str>) -> Vec<WorkItem> {
        let key = CacheKey::new("work_items")
            .part(project)
            .part_or(wiql, "default")
            .to_string();

        if let Some(items) = self.work_items.get(&key) {
            debug!(project, "Work items found in cache");
            return items;
        }

        let query = wiql
            .map(str::to_string)
            .unwrap_or_else(|| default_query(project));

        match self.run_query(project, &query).await {
            Ok(items) => {
                info!(project, count = items.len(), "Fetched work items");
                self.work_items.set(key, items.clone());
                items
            }
            Err(e) => {
                error!(project, error = %e, "Failed to query work items");
                Vec::new()
            }
        }
    }

    /// Work items whose title or description contains `text`
    #[instrument(skip(self))]
    pub async fn search_work_items(&self, project: &str, text: &str) -> Vec<WorkItem> {
        if text.is_empty() {
            return Vec::new();
        }

        let query = search_query(project, text);
        self.query_work_items(project, Some(&query)).await
    }

    /// Fetches a single work item with its relations
    #[instrument(skip(self))]
    pub async fn get_work_item(&self, project: &str, id: i64) -> Result<WorkItem, DomainError> {
        let label = format!("Getting work item {}", id);
        let path = work_item_path(project, id);

        let response = self
            .retry
            .execute(&label, || self.client.get_json(&path))
            .await
            .and_then(decode)
            .map_err(|e| DomainError::remote(format!("get work item {}", id), e))?;

        Ok(response)
    }

    pub fn clear_cache(&self) {
        self.work_items.clear();
        info!("Work item cache cleared");
    }

    async fn run_query(&self, project: &str, query: &str) -> Result<Vec<WorkItem>, ApiError> {
        let wiql_path = wiql_path(project);
        let body = json!({ "query": query });

        let response = self
            .retry
            .execute("Running WIQL query", || {
                self.client.post_json(&wiql_path, &body)
            })
            .await?;
        let result: WiqlResult = decode(response)?;
        let ids = result.ids();

        if ids.is_empty() {
            debug!(project, "WIQL query matched no work items");
            return Ok(Vec::new());
        }

        let ids = &ids[..ids.len().min(MAX_BATCH_IDS)];
        let items_path = work_items_path(project, ids);
        let label = format!("Getting {} work items", ids.len());

        let response = self
            .retry
            .execute(&label, || self.client.get_json(&items_path))
            .await?;
        let list: ValueList<WorkItem> = decode(response)?;

        Ok(list.value)
    }
}

fn wiql_path(project: &str) -> String {
    format!(
        "/{}/_apis/wit/wiql?api-version={}",
        encode(project),
        API_VERSION
    )
}

fn work_items_path(project: &str, ids: &[i64]) -> String {
    let ids: Vec<String> = ids.iter().map(i64::to_string).collect();

    format!(
        "/{}/_apis/wit/workitems?ids={}&$expand=relations&api-version={}",
        encode(project),
        ids.join(","),
        API_VERSION
    )
}

fn work_item_path(project: &str, id: i64) -> String {
    format!(
        "/{}/_apis/wit/workitems/{}?$expand=relations&api-version={}",
        encode(project),
        id,
        API_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::mock::MockHttpClient;
    use serde_json::Value;

    const PROJECT: &str = "Fabrikam";

    fn wiql_response(ids: impl IntoIterator<Item = i64>) -> Value {
        let refs: Vec<Value> = ids.into_iter().map(|id| json!({ "id": id })).collect();
        json!({ "queryType": "flat", "workItems": refs })
    }

    fn items_response(ids: &[i64]) -> Value {
        let items: Vec<Value> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "rev": 1,
                    "fields": { "System.Title": format!("Item {}", id), "System.State": "Active" }
                })
            })
            .collect();
        json!({ "count": items.len(), "value": items })
    }

    fn service(client: MockHttpClient) -> (WorkItemService, Arc<MockHttpClient>) {
        let client = Arc::new(client);
        let service = WorkItemService::new(client.clone(), WorkItemServiceConfig::default());
        (service, client)
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_uses_default_wiql_and_caches() {
        let client = MockHttpClient::new()
            .with_response(wiql_path(PROJECT), wiql_response([1, 2]))
            .with_response(work_items_path(PROJECT, &[1, 2]), items_response(&[1, 2]));
        let (service, client) = service(client);

        let items = service.query_work_items(PROJECT, None).await;
        service.query_work_items(PROJECT, None).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title(), Some("Item 1"));
        assert_eq!(client.call_count(&wiql_path(PROJECT)), 1);

        let bodies = client.posted_bodies(&wiql_path(PROJECT));
        let query = bodies[0]["query"].as_str().unwrap();
        assert!(query.contains("[System.TeamProject] = 'Fabrikam'"));
        assert!(query.contains("<> 'Closed'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_fetches_at_most_one_hundred_ids() {
        let first_hundred: Vec<i64> = (1..=100).collect();
        let client = MockHttpClient::new()
            .with_response(wiql_path(PROJECT), wiql_response(1..=150))
            .with_response(
                work_items_path(PROJECT, &first_hundred),
                items_response(&first_hundred),
            );
        let (service, client) = service(client);

        let items = service.query_work_items(PROJECT, None).await;

        assert_eq!(items.len(), 100);
        assert_eq!(client.total_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_with_no_matches_skips_batch_fetch() {
        let client = MockHttpClient::new().with_response(wiql_path(PROJECT), wiql_response([]));
        let (service, client) = service(client);

        assert!(service.query_work_items(PROJECT, None).await.is_empty());
        assert!(service.query_work_items(PROJECT, None).await.is_empty());
        assert_eq!(client.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_failure_yields_empty() {
        let client = MockHttpClient::new()
            .with_error(wiql_path(PROJECT), ApiError::status(500, "boom"))
            .with_error(wiql_path(PROJECT), ApiError::status(502, "bad gateway"))
            .with_error(wiql_path(PROJECT), ApiError::status(503, "busy"));
        let (service, client) = service(client);

        assert!(service.query_work_items(PROJECT, None).await.is_empty());
        assert_eq!(client.call_count(&wiql_path(PROJECT)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_escapes_quotes() {
        let client = MockHttpClient::new()
            .with_response(wiql_path(PROJECT), wiql_response([7]))
            .with_response(work_items_path(PROJECT, &[7]), items_response(&[7]));
        let (service, client) = service(client);

        let items = service.search_work_items(PROJECT, "can't login").await;

        assert_eq!(items.len(), 1);
        let bodies = client.posted_bodies(&wiql_path(PROJECT));
        assert!(
            bodies[0]["query"]
                .as_str()
                .unwrap()
                .contains("[System.Title] CONTAINS 'can''t login'")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_with_empty_text_issues_no_calls() {
        let (service, client) = service(MockHttpClient::new());

        assert!(service.search_work_items(PROJECT, "").await.is_empty());
        assert_eq!(client.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_work_item() {
        let client = MockHttpClient::new()
            .with_response(
                work_item_path(PROJECT, 42),
                json!({ "id": 42, "fields": { "System.Title": "Fix login" } }),
            )
            .with_error(work_item_path(PROJECT, 43), ApiError::status(404, "missing"));
        let (service, _) = service(client);

        let item = service.get_work_item(PROJECT, 42).await.unwrap();
        let error = service.get_work_item(PROJECT, 43).await.unwrap_err();

        assert_eq!(item.title(), Some("Fix login"));
        assert_eq!(error.to_string(), "Failed to get work item 43: HTTP 404: missing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_work_item_reports_malformed_body() {
        let client = MockHttpClient::new()
            .with_response(work_item_path(PROJECT, 5), json!({ "fields": {} }));
        let (service, client) = service(client);

        let error = service.get_work_item(PROJECT, 5).await.unwrap_err();

        assert!(matches!(error.api_error(), Some(ApiError::Decode { .. })));
        assert_eq!(client.call_count(&work_item_path(PROJECT, 5)), 1);
    }
}
