//! Infrastructure layer - External service implementations

pub mod cache;
pub mod devops_client;
pub mod http;
pub mod logging;
pub mod services;

pub use devops_client::DevOpsClient;
