//! Azure DevOps Knowledge Gateway
//!
//! A cached, retrying query surface over Azure DevOps:
//! - Wiki listing, page trees, name and content search
//! - Test plans, suites and test cases
//! - Work items through WIQL
//! - Cross-referencing one search text across all three

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use infrastructure::DevOpsClient;
