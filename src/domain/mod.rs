//! Domain layer - Core entities, content processing and retry semantics

pub mod cache;
pub mod content;
pub mod cross_reference;
pub mod error;
pub mod project;
pub mod retry;
pub mod test_plan;
pub mod wiki;
pub mod work_item;

pub use cache::CacheKey;
pub use cross_reference::{CrossReferenceResult, CrossReferenceSummary};
pub use error::{ApiError, DomainError, ErrorClass};
pub use project::Project;
pub use retry::{RetryConfig, RetryEvent, RetryPolicy};
pub use test_plan::{TestCase, TestPlan, TestPlanDetails, TestSuite};
pub use wiki::{MatchType, PageNode, Wiki, WikiPage, WikiPageHit, WikiSectionLookup};
pub use work_item::WorkItem;
