use serde::Serialize;

use crate::domain::test_plan::TestPlan;
use crate::domain::wiki::WikiPageHit;
use crate::domain::work_item::WorkItem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReferenceSummary {
    pub total_wiki_pages: usize,
    pub total_test_plans: usize,
    pub total_work_items: usize,
}

/// Items related to a search text across all three domains.
///
/// Counts are derived from the collections on construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReferenceResult {
    pub wiki_pages: Vec<WikiPageHit>,
    pub test_plans: Vec<TestPlan>,
    pub work_items: Vec<WorkItem>,
    pub summary: CrossReferenceSummary,
}

impl CrossReferenceResult {
    pub fn new(
        wiki_pages: Vec<WikiPageHit>,
        test_plans: Vec<TestPlan>,
        work_items: Vec<WorkItem>,
    ) -> Self {
        let summary = CrossReferenceSummary {
            total_wiki_pages: wiki_pages.len(),
            total_test_plans: test_plans.len(),
            total_work_items: work_items.len(),
        };

        Self {
            wiki_pages,
            test_plans,
            work_items,
            summary,
        }
    }

    /// Result with no items and zero counts
    pub fn empty() -> Self {
        Self::default()
    }
}
