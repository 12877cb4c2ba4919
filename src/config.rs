//! Configuration file parser for solvefeed.toml.
//!
//! The config file is optional (a missing file yields `Config::default()`).
//! Unknown keys are silently ignored by serde, though we log a warning when
//! the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `session_cookie` and `csrf_token` to prevent
/// credential leakage in logs and error messages.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream GraphQL endpoint.
    pub upstream_url: String,

    /// Subjects the aggregate feed covers.
    pub subjects: Vec<String>,

    /// Articles fetched per subject, clamped to [1, 50] at fetch time.
    pub limit_per_subject: i64,

    /// Seconds a rendered feed stays fresh.
    pub cache_ttl_seconds: u64,

    /// Per-request upstream timeout in seconds.
    pub fetch_timeout_seconds: u64,

    /// Upper bound in seconds on one whole feed build.
    pub build_timeout_seconds: u64,

    /// SQLite database path for feed descriptors and the persisted cache.
    pub database_path: String,

    /// Absolute URL the rendered feed advertises as its own address.
    pub self_url: Option<String>,

    /// Session cookie for authenticated upstream requests
    /// (SOLVEFEED_SESSION env var takes precedence).
    pub session_cookie: Option<String>,

    /// CSRF token paired with the session cookie
    /// (SOLVEFEED_CSRF env var takes precedence).
    pub csrf_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: "https://leetcode.com/graphql/".to_string(),
            subjects: Vec::new(),
            limit_per_subject: 15,
            cache_ttl_seconds: 300,
            fetch_timeout_seconds: 10,
            build_timeout_seconds: 30,
            database_path: "solvefeed.db".to_string(),
            self_url: None,
            session_cookie: None,
            csrf_token: None,
        }
    }
}

/// Mask credentials in Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("upstream_url", &self.upstream_url)
            .field("subjects", &self.subjects)
            .field("limit_per_subject", &self.limit_per_subject)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("fetch_timeout_seconds", &self.fetch_timeout_seconds)
            .field("build_timeout_seconds", &self.build_timeout_seconds)
            .field("database_path", &self.database_path)
            .field("self_url", &self.self_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "csrf_token",
                &self.csrf_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file: `Ok(Config::default())`
    /// - Empty file: `Ok(Config::default())`
    /// - Invalid TOML: `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys: silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read.
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys.
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "upstream_url",
                "subjects",
                "limit_per_subject",
                "cache_ttl_seconds",
                "fetch_timeout_seconds",
                "build_timeout_seconds",
                "database_path",
                "self_url",
                "session_cookie",
                "csrf_token",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            subjects = config.subjects.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Session credentials with environment variables taking precedence
    /// over the config file.
    pub fn session(&self) -> (Option<String>, Option<String>) {
        let cookie = std::env::var("SOLVEFEED_SESSION")
            .ok()
            .or_else(|| self.session_cookie.clone());
        let csrf = std::env::var("SOLVEFEED_CSRF")
            .ok()
            .or_else(|| self.csrf_token.clone());
        (cookie, csrf)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.upstream_url, "https://leetcode.com/graphql/");
        assert!(config.subjects.is_empty());
        assert_eq!(config.limit_per_subject, 15);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.fetch_timeout_seconds, 10);
        assert_eq!(config.build_timeout_seconds, 30);
        assert_eq!(config.database_path, "solvefeed.db");
        assert!(config.self_url.is_none());
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/solvefeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.cache_ttl_seconds, 300);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("solvefeed_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solvefeed.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.limit_per_subject, 15);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("solvefeed_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solvefeed.toml");
        std::fs::write(&path, "subjects = [\"alice\", \"bob\"]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.subjects, vec!["alice", "bob"]);
        assert_eq!(config.cache_ttl_seconds, 300); // default
        assert_eq!(config.limit_per_subject, 15); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("solvefeed_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solvefeed.toml");

        let content = r#"
upstream_url = "https://example.com/graphql/"
subjects = ["alice"]
limit_per_subject = 25
cache_ttl_seconds = 600
fetch_timeout_seconds = 5
build_timeout_seconds = 15
database_path = "/var/lib/solvefeed/feeds.db"
self_url = "https://feeds.example.com/rss"
session_cookie = "cookie-value"
csrf_token = "csrf-value"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.upstream_url, "https://example.com/graphql/");
        assert_eq!(config.subjects, vec!["alice"]);
        assert_eq!(config.limit_per_subject, 25);
        assert_eq!(config.cache_ttl_seconds, 600);
        assert_eq!(config.fetch_timeout_seconds, 5);
        assert_eq!(config.build_timeout_seconds, 15);
        assert_eq!(config.database_path, "/var/lib/solvefeed/feeds.db");
        assert_eq!(config.self_url.as_deref(), Some("https://feeds.example.com/rss"));
        assert_eq!(config.session_cookie.as_deref(), Some("cookie-value"));
        assert_eq!(config.csrf_token.as_deref(), Some("csrf-value"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("solvefeed_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solvefeed.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("solvefeed_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solvefeed.toml");
        std::fs::write(&path, "totally_fake_key = \"ok\"\nsubjects = [\"alice\"]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.subjects, vec!["alice"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("solvefeed_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solvefeed.toml");
        // subjects should be an array, not a string
        std::fs::write(&path, "subjects = \"alice\"\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("solvefeed_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solvefeed.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::TooLarge(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_credentials() {
        let config = Config {
            session_cookie: Some("super-secret-cookie".to_string()),
            csrf_token: Some("super-secret-csrf".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-cookie"));
        assert!(!debug_output.contains("super-secret-csrf"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
