use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Root URL used when none is configured.
pub const DEFAULT_ROOT_URL: &str = "http://localhost:5000";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Settings a [`Client`](crate::Client) is constructed with.
///
/// Loaded from JSON; every field is optional there:
///
/// ```json
/// { "root_url": "https://api.example.com", "token": "abc", "timeout_ms": 5000 }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address every relative path is joined onto
    pub root_url: String,
    /// Auth token appended to every relative request as `token=...`
    pub token: String,
    /// Default per-request timeout in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_ROOT_URL.to_string(),
            token: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: format!("reqkit/{}", env!("REQKIT_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn validate(&self) -> Result<()> {
        let root = self.root_url.trim();
        if root.is_empty() {
            anyhow::bail!("Root URL must not be empty");
        }
        url::Url::parse(root).with_context(|| format!("Invalid root URL '{}'", root))?;
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() {
            "<none>"
        } else {
            "*********"
        };
        f.debug_struct("ClientConfig")
            .field("root_url", &self.root_url)
            .field("token", &token)
            .field("timeout_ms", &self.timeout_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.root_url, DEFAULT_ROOT_URL);
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert!(config.token.is_empty());
        assert!(config.user_agent.starts_with("reqkit/"));
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("http://api.test")
            .with_token("T")
            .with_timeout(Duration::from_millis(1500));
        assert_eq!(config.root_url, "http://api.test");
        assert_eq!(config.token, "T");
        assert_eq!(config.timeout_ms, 1500);
    }

    #[test]
    fn test_debug_masks_token() {
        let config = ClientConfig::new("http://api.test").with_token("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("http://api.test"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"root_url": "http://api.test", "token": "abc"}}"#).unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.root_url, "http://api.test");
        assert_eq!(config.token, "abc");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = ClientConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("http://api.test").validate().is_ok());
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("not a url").validate().is_err());
    }
}
