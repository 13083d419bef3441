//! Retry domain - classified exponential-backoff execution of remote calls

mod config;
mod policy;

pub use config::RetryConfig;
pub use policy::{ErrorClassifier, RetryEvent, RetryObserver, RetryPolicy};
