//! Cross-reference domain - merged results across wikis, test plans and work items

mod entity;

pub use entity::{CrossReferenceResult, CrossReferenceSummary};
