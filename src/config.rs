//! Configuration loading for triage.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.triage/config.toml`)
//! 3. User config (`~/.triage/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. Without an API key the generative
//! capability is reported as unavailable and every component runs its
//! deterministic fallback.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TriageError};

/// Main configuration struct for triage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Generative text capability configuration.
    pub capability: CapabilityConfig,
    /// Knowledge base matcher configuration.
    pub matcher: MatcherConfig,
    /// Translation service configuration.
    pub translation: TranslationConfig,
    /// Ticket storage configuration.
    pub tickets: TicketsConfig,
}

/// Generative text capability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Whether the capability may be called at all.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Bearer credential. Absent means the capability is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

/// Minimum valid timeout (seconds).
pub const MIN_TIMEOUT_SECS: u64 = 1;

impl CapabilityConfig {
    /// Check if a timeout value is valid (must be >= 1).
    pub fn is_valid_timeout(value: u64) -> bool {
        value >= MIN_TIMEOUT_SECS
    }

    /// Whether a credential is configured and the capability is enabled.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false)
    }
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Knowledge base matcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatcherConfig {
    /// Result limit for interactive searches.
    pub default_limit: usize,
    /// Candidate limit used by the auto-resolution pipeline.
    pub resolver_limit: usize,
    /// Optional TOML knowledge base replacing the built-in entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<PathBuf>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            resolver_limit: 3,
            knowledge_base: None,
        }
    }
}

/// Translation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    /// Whether the public translation endpoint may be called.
    pub enabled: bool,
    /// Base URL of the public translation endpoint.
    pub endpoint: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://translate.googleapis.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Ticket storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TicketsConfig {
    /// Store kind: "file" or "memory".
    pub store: String,
    /// Directory for the file store (defaults to `<triage_home>/tickets`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Valid values for the ticket store kind.
pub const VALID_STORES: &[&str] = &["file", "memory"];

impl TicketsConfig {
    /// Check if a store kind is valid.
    pub fn is_valid_store(value: &str) -> bool {
        VALID_STORES.contains(&value)
    }
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            store: "file".to_string(),
            dir: None,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.triage/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = triage_home()?;
        Self::load_from_file(&home.join("config.toml")).ok()
    }

    /// Load project config from `.triage/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let config_path = cwd.join(".triage").join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| TriageError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| TriageError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // OPENAI_API_KEY is the conventional name; TRIAGE_API_KEY wins when both are set.
        for var in ["OPENAI_API_KEY", "TRIAGE_API_KEY"] {
            if let Ok(val) = env::var(var) {
                if !val.trim().is_empty() {
                    self.capability.api_key = Some(val);
                }
            }
        }

        if let Ok(val) = env::var("TRIAGE_ENDPOINT") {
            if val.trim().is_empty() {
                eprintln!(
                    "Warning: Empty TRIAGE_ENDPOINT. Using '{}'.",
                    self.capability.endpoint
                );
            } else {
                self.capability.endpoint = val.trim_end_matches('/').to_string();
            }
        }

        if let Ok(val) = env::var("TRIAGE_MODEL") {
            if !val.trim().is_empty() {
                self.capability.model = val;
            }
        }

        if let Ok(val) = env::var("TRIAGE_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(n) => {
                    if CapabilityConfig::is_valid_timeout(n) {
                        self.capability.timeout_secs = n;
                    } else {
                        eprintln!(
                            "Warning: Invalid TRIAGE_TIMEOUT_SECS value '{}'. \
                            Must be >= {}. Using default '{}'.",
                            n, MIN_TIMEOUT_SECS, self.capability.timeout_secs
                        );
                    }
                }
                Err(_) => eprintln!(
                    "Warning: Invalid TRIAGE_TIMEOUT_SECS value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.capability.timeout_secs
                ),
            }
        }

        if let Ok(val) = env::var("TRIAGE_CAPABILITY_ENABLED") {
            self.capability.enabled = val == "true" || val == "1";
        }

        if let Ok(val) = env::var("TRIAGE_TICKET_STORE") {
            if TicketsConfig::is_valid_store(&val) {
                self.tickets.store = val;
            } else {
                eprintln!(
                    "Warning: Invalid TRIAGE_TICKET_STORE value '{}'. \
                    Valid values: {:?}. Using default '{}'.",
                    val, VALID_STORES, self.tickets.store
                );
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field. Values equal to
    /// the default cannot override a non-default lower layer.
    fn merge(mut self, other: Config) -> Self {
        let default_cap = CapabilityConfig::default();
        if other.capability.enabled != default_cap.enabled {
            self.capability.enabled = other.capability.enabled;
        }
        if other.capability.endpoint != default_cap.endpoint {
            self.capability.endpoint = other.capability.endpoint;
        }
        if other.capability.model != default_cap.model {
            self.capability.model = other.capability.model;
        }
        if other.capability.api_key.is_some() {
            self.capability.api_key = other.capability.api_key;
        }
        if other.capability.timeout_secs != default_cap.timeout_secs {
            self.capability.timeout_secs = other.capability.timeout_secs;
        }

        let default_matcher = MatcherConfig::default();
        if other.matcher.default_limit != default_matcher.default_limit {
            self.matcher.default_limit = other.matcher.default_limit;
        }
        if other.matcher.resolver_limit != default_matcher.resolver_limit {
            self.matcher.resolver_limit = other.matcher.resolver_limit;
        }
        if other.matcher.knowledge_base.is_some() {
            self.matcher.knowledge_base = other.matcher.knowledge_base;
        }

        let default_translation = TranslationConfig::default();
        if other.translation.enabled != default_translation.enabled {
            self.translation.enabled = other.translation.enabled;
        }
        if other.translation.endpoint != default_translation.endpoint {
            self.translation.endpoint = other.translation.endpoint;
        }
        if other.translation.timeout_secs != default_translation.timeout_secs {
            self.translation.timeout_secs = other.translation.timeout_secs;
        }

        if other.tickets.store != TicketsConfig::default().store {
            self.tickets.store = other.tickets.store;
        }
        if other.tickets.dir.is_some() {
            self.tickets.dir = other.tickets.dir;
        }

        self
    }

    /// Directory used by the file ticket store.
    pub fn tickets_dir(&self) -> Option<PathBuf> {
        self.tickets
            .dir
            .clone()
            .or_else(|| triage_home().map(|h| h.join("tickets")))
    }
}

/// Get the triage home directory.
///
/// Checks `TRIAGE_HOME` first, then falls back to `~/.triage`.
pub fn triage_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("TRIAGE_HOME") {
        if home.is_empty() {
            tracing::warn!("TRIAGE_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("TRIAGE_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".triage"));
    }

    let fallback = env::temp_dir().join("triage");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback.display()
    );
    Some(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        for var in [
            "OPENAI_API_KEY",
            "TRIAGE_API_KEY",
            "TRIAGE_ENDPOINT",
            "TRIAGE_MODEL",
            "TRIAGE_TIMEOUT_SECS",
            "TRIAGE_CAPABILITY_ENABLED",
            "TRIAGE_TICKET_STORE",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.capability.enabled);
        assert_eq!(config.capability.endpoint, "https://api.openai.com");
        assert_eq!(config.capability.model, "gpt-4o-mini");
        assert!(config.capability.api_key.is_none());
        assert_eq!(config.capability.timeout_secs, 30);
        assert!(!config.capability.is_configured());

        assert_eq!(config.matcher.default_limit, 5);
        assert_eq!(config.matcher.resolver_limit, 3);
        assert!(config.matcher.knowledge_base.is_none());

        assert!(config.translation.enabled);
        assert_eq!(config.translation.timeout_secs, 10);

        assert_eq!(config.tickets.store, "file");
    }

    #[test]
    fn test_is_configured_requires_key_and_enabled() {
        let mut cap = CapabilityConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert!(cap.is_configured());

        cap.enabled = false;
        assert!(!cap.is_configured());

        cap.enabled = true;
        cap.api_key = Some("   ".to_string());
        assert!(!cap.is_configured());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[capability]
model = "gpt-4o"
timeout_secs = 12

[matcher]
default_limit = 10
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.capability.model, "gpt-4o");
        assert_eq!(config.capability.timeout_secs, 12);
        assert_eq!(config.matcher.default_limit, 10);
        assert_eq!(config.matcher.resolver_limit, 3);
        assert_eq!(config.tickets.store, "file");
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(TriageError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let triage_dir = dir.path().join(".triage");
        fs::create_dir_all(&triage_dir).unwrap();
        fs::write(
            triage_dir.join("config.toml"),
            "[tickets]\nstore = \"memory\"\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.tickets.store, "memory");
        assert_eq!(config.capability.timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("TRIAGE_API_KEY", "sk-env");
        env::set_var("TRIAGE_MODEL", "local-model");
        env::set_var("TRIAGE_TIMEOUT_SECS", "5");
        env::set_var("TRIAGE_ENDPOINT", "http://localhost:8080/");

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.capability.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.capability.model, "local-model");
        assert_eq!(config.capability.timeout_secs, 5);
        assert_eq!(config.capability.endpoint, "http://localhost:8080");
        assert!(config.capability.is_configured());
    }

    #[test]
    #[serial]
    fn test_triage_api_key_wins_over_openai_key() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "sk-openai");
        env::set_var("TRIAGE_API_KEY", "sk-triage");

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.capability.api_key.as_deref(), Some("sk-triage"));
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_keep_previous() {
        clear_env();
        env::set_var("TRIAGE_TIMEOUT_SECS", "0");
        env::set_var("TRIAGE_TICKET_STORE", "postgres");

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.capability.timeout_secs, 30);
        assert_eq!(config.tickets.store, "file");
    }

    #[test]
    fn test_merge_field_by_field() {
        let mut user = Config::default();
        user.capability.model = "user-model".to_string();
        user.capability.api_key = Some("sk-user".to_string());

        let mut project = Config::default();
        project.matcher.resolver_limit = 1;

        let merged = Config::default().merge(user).merge(project);

        assert_eq!(merged.capability.model, "user-model");
        assert_eq!(merged.capability.api_key.as_deref(), Some("sk-user"));
        assert_eq!(merged.matcher.resolver_limit, 1);
    }

    #[test]
    fn test_tickets_dir_explicit() {
        let mut config = Config::default();
        config.tickets.dir = Some(PathBuf::from("/srv/tickets"));
        assert_eq!(config.tickets_dir(), Some(PathBuf::from("/srv/tickets")));
    }
}
