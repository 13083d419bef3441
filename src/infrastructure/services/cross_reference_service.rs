//! Cross-reference service - one search text fanned out over every domain

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{TestPlanService, WikiService, WorkItemService};
use crate::domain::cross_reference::CrossReferenceResult;
use crate::domain::test_plan::TestPlan;
use crate::domain::wiki::WikiPageHit;
use crate::domain::work_item::WorkItem;
use crate::domain::DomainError;

/// Wiki search used by the aggregator (for mocking)
#[async_trait]
pub trait WikiSearch: Send + Sync + Debug {
    async fn search(&self, project: &str, text: &str) -> Result<Vec<WikiPageHit>, DomainError>;
}

#[async_trait]
pub trait TestPlanSearch: Send + Sync + Debug {
    async fn search(&self, project: &str, text: &str) -> Result<Vec<TestPlan>, DomainError>;
}

#[async_trait]
pub trait WorkItemSearch: Send + Sync + Debug {
    async fn search(&self, project: &str, text: &str) -> Result<Vec<WorkItem>, DomainError>;
}

#[async_trait]
impl WikiSearch for WikiService {
    async fn search(&self, project: &str, text: &str) -> Result<Vec<WikiPageHit>, DomainError> {
        Ok(self.search_content(project, text).await)
    }
}

#[async_trait]
impl TestPlanSearch for TestPlanService {
    async fn search(&self, project: &str, text: &str) -> Result<Vec<TestPlan>, DomainError> {
        Ok(self.search_plans(project, text).await)
    }
}

#[async_trait]
impl WorkItemSearch for WorkItemService {
    async fn search(&self, project: &str, text: &str) -> Result<Vec<WorkItem>, DomainError> {
        Ok(self.search_work_items(project, text).await)
    }
}

/// Runs the three domain searches concurrently and joins whatever each produced
#[derive(Debug, Clone)]
pub struct CrossReferenceService {
    wiki: Arc<dyn WikiSearch>,
    test_plans: Arc<dyn TestPlanSearch>,
    work_items: Arc<dyn WorkItemSearch>,
}

impl CrossReferenceService {
    pub fn new(
        wiki: Arc<dyn WikiSearch>,
        test_plans: Arc<dyn TestPlanSearch>,
        work_items: Arc<dyn WorkItemSearch>,
    ) -> Self {
        Self {
            wiki,
            test_plans,
            work_items,
        }
    }

    /// Never fails: a domain whose search fails contributes no items
    #[instrument(skip(self))]
    pub async fn find_related_items(&self, project: &str, text: &str) -> CrossReferenceResult {
        if text.is_empty() {
            return CrossReferenceResult::empty();
        }

        let (wiki_pages, test_plans, work_items) = tokio::join!(
            self.wiki.search(project, text),
            self.test_plans.search(project, text),
            self.work_items.search(project, text),
        );

        let result = CrossReferenceResult::new(
            settle("wiki", wiki_pages),
            settle("test plan", test_plans),
            settle("work item", work_items),
        );

        info!(
            project,
            text,
            wiki_pages = result.summary.total_wiki_pages,
            test_plans = result.summary.total_test_plans,
            work_items = result.summary.total_work_items,
            "Cross-reference search complete"
        );
        result
    }
}

fn settle<T>(domain: &str, result: Result<Vec<T>, DomainError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(domain, error = %e, "Domain search failed, continuing without it");
        Vec::new()
    })
}
