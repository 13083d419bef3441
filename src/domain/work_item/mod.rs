//! Work item domain - work items and WIQL query construction

mod entity;
mod wiql;

pub use entity::{WiqlResult, WorkItem, WorkItemReference, WorkItemRelation};
pub use wiql::{default_query, escape_literal, search_query, MAX_BATCH_IDS};
