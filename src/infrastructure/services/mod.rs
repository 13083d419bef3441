//! Domain services over the Azure DevOps REST API

mod cross_reference_service;
mod project_service;
mod test_plan_service;
mod wiki_service;
mod work_item_service;

pub use cross_reference_service::{
    CrossReferenceService, TestPlanSearch, WikiSearch, WorkItemSearch,
};
pub use project_service::ProjectService;
pub use test_plan_service::{TestPlanService, TestPlanServiceConfig};
pub use wiki_service::{WikiService, WikiServiceConfig};
pub use work_item_service::{WorkItemService, WorkItemServiceConfig};
