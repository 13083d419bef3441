mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, ContentConfig, DevOpsConfig, HttpConfig, LogFormat, LoggingConfig,
    RetrySettings, SearchConfig,
};
