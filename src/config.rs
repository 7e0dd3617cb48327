use std::env;

/// Application-level constants
pub const APP_NAME: &str = "Concord";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "concord=info"
}

/// Maximum content length accepted for validation (characters).
/// Anything longer is rejected before a prompt is ever built.
pub const MAX_CONTENT_LENGTH: usize = 15_000;

/// Engine configuration, read once at startup.
///
/// Which remote providers are active is decided purely by credential
/// presence; with no credentials the engine still works through the stub,
/// which keeps tests deterministic and network-free.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_model: String,
    pub request_timeout_secs: u64,
}

impl EngineConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            gemini_model: non_empty_var("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            openai_model: non_empty_var("OPENAI_MODEL")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            request_timeout_secs: non_empty_var("CONCORD_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    /// A configuration with no remote credentials. Validation then runs
    /// entirely on the stub provider.
    pub fn offline() -> Self {
        Self {
            gemini_api_key: None,
            openai_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 60,
        }
    }

    /// How many remote providers this configuration activates.
    pub fn remote_provider_count(&self) -> usize {
        self.gemini_api_key.is_some() as usize + self.openai_api_key.is_some() as usize
    }
}

/// Read an env var, treating empty or whitespace-only values as absent.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_config_has_no_remote_providers() {
        let config = EngineConfig::offline();
        assert_eq!(config.remote_provider_count(), 0);
        assert!(config.gemini_api_key.is_none());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn remote_count_follows_credentials() {
        let mut config = EngineConfig::offline();
        config.gemini_api_key = Some("key-a".into());
        assert_eq!(config.remote_provider_count(), 1);
        config.openai_api_key = Some("key-b".into());
        assert_eq!(config.remote_provider_count(), 2);
    }

    #[test]
    fn offline_defaults_are_sensible() {
        let config = EngineConfig::offline();
        assert!(!config.gemini_model.is_empty());
        assert!(!config.openai_model.is_empty());
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.4.0");
    }
}
