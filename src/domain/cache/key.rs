//! Cache key construction

use std::fmt;

/// Deterministic cache key built from an operation namespace and its parameters.
///
/// Parts are joined with `_` in the order they are added, so two calls with
/// identical parameters always land in the same slot:
/// `CacheKey::new("test_cases").part("Fabrikam").part(7).part_or(None::<u32>, "all")`
/// renders as `test_cases_Fabrikam_7_all`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: &'static str,
    parts: Vec<String>,
}

impl CacheKey {
    /// Creates a key for the given operation namespace
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            parts: Vec::new(),
        }
    }

    /// Appends a parameter to the key
    pub fn part(mut self, value: impl fmt::Display) -> Self {
        self.parts.push(value.to_string());
        self
    }

    /// Appends an optional parameter, using `fallback` when it is absent
    pub fn part_or<T: fmt::Display>(self, value: Option<T>, fallback: &str) -> Self {
        match value {
            Some(value) => self.part(value),
            None => self.part(fallback),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace)?;

        for part in &self.parts {
            write!(f, "_{}", part)?;
        }

        Ok(())
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}
