use serde::Deserialize;

use crate::domain::DomainError;

/// Flat environment variables kept for compatibility, mapped to config keys
const LEGACY_ENV: [(&str, &str); 6] = [
    ("AZDO_ORG_URL", "devops.organization_url"),
    ("AZDO_PAT", "devops.personal_access_token"),
    ("AZDO_DEFAULT_PROJECT", "devops.default_project"),
    ("AZDO_MAX_CONTENT_LENGTH", "content.max_content_length"),
    ("AZDO_CACHE_TIMEOUT", "cache.ttl_ms"),
    ("AZDO_HTTP_TIMEOUT", "http.timeout_ms"),
];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub devops: DevOpsConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub content: ContentConfig,
    pub search: SearchConfig,
    pub retry: RetrySettings,
    pub logging: LoggingConfig,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct DevOpsConfig {
    /// e.g. `https://dev.azure.com/fabrikam`
    pub organization_url: String,
    pub personal_access_token: String,
    pub default_project: Option<String>,
}

impl std::fmt::Debug for DevOpsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevOpsConfig")
            .field("organization_url", &self.organization_url)
            .field("personal_access_token", &"<redacted>")
            .field("default_project", &self.default_project)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
    /// Per-cache entry bound; unbounded when absent
    pub max_capacity: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Summary length for wiki content matches
    pub max_content_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub wiki_max_delay_ms: u64,
    pub test_plan_max_delay_ms: u64,
    pub work_item_max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_ms: 120_000 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            max_capacity: None,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_content_length: 2000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay_ms: 100,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            wiki_max_delay_ms: 5000,
            test_plan_max_delay_ms: 10_000,
            work_item_max_delay_ms: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Loads configuration, reading legacy `AZDO_*` variables through `lookup`.
    /// Legacy variables take precedence over files and `APP__` variables.
    pub fn load_with(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for (variable, key) in LEGACY_ENV {
            builder = builder.set_override_option(key, lookup(variable))?;
        }

        builder.build()?.try_deserialize()
    }

    /// Rejects configurations the gateway cannot run with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.devops.organization_url.trim().is_empty()
            || self.devops.personal_access_token.trim().is_empty()
        {
            return Err(DomainError::configuration(
                "devops.organization_url and devops.personal_access_token are required (AZDO_ORG_URL / AZDO_PAT)",
            ));
        }

        if self.content.max_content_length < 100 {
            return Err(DomainError::configuration(
                "content.max_content_length must be at least 100",
            ));
        }

        if self.cache.ttl_ms < 1000 {
            return Err(DomainError::configuration(
                "cache.ttl_ms must be at least 1000 milliseconds",
            ));
        }

        if self.http.timeout_ms < 1000 {
            return Err(DomainError::configuration(
                "http.timeout_ms must be at least 1000 milliseconds",
            ));
        }

        if self.search.batch_size == 0 {
            return Err(DomainError::configuration(
                "search.batch_size must be greater than 0",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(DomainError::configuration(
                "retry.max_attempts must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.devops.organization_url = "https://dev.azure.com/fabrikam".to_string();
        config.devops.personal_access_token = "secret".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.http.timeout_ms, 120_000);
        assert_eq!(config.cache.ttl_ms, 300_000);
        assert_eq!(config.cache.max_capacity, None);
        assert_eq!(config.content.max_content_length, 2000);
        assert_eq!(config.search.batch_size, 5);
        assert_eq!(config.retry.wiki_max_delay_ms, 5000);
        assert_eq!(config.retry.test_plan_max_delay_ms, 10_000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_legacy_variables_override() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AZDO_ORG_URL", "https://dev.azure.com/contoso"),
            ("AZDO_PAT", "pat"),
            ("AZDO_DEFAULT_PROJECT", "Contoso"),
            ("AZDO_CACHE_TIMEOUT", "60000"),
            ("AZDO_HTTP_TIMEOUT", "30000"),
        ]);

        let config =
            AppConfig::load_with(|name| env.get(name).map(|value| value.to_string())).unwrap();

        assert_eq!(config.devops.organization_url, "https://dev.azure.com/contoso");
        assert_eq!(config.devops.default_project.as_deref(), Some("Contoso"));
        assert_eq!(config.cache.ttl_ms, 60_000);
        assert_eq!(config.http.timeout_ms, 30_000);
        assert_eq!(config.content.max_content_length, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_credentials() {
        let error = AppConfig::default().validate().unwrap_err();
        assert!(matches!(error, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = valid();
        config.content.max_content_length = 99;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.cache.ttl_ms = 999;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.http.timeout_ms = 10;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.search.batch_size = 0;
        assert!(config.validate().is_err());

        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_redacts_token() {
        let debug = format!("{:?}", valid().devops);
        assert!(!debug.contains("secret"));
    }
}
