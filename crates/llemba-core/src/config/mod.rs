//! Settings and credentials.
//!
//! Settings come from an optional YAML file, then `LLEMBA_*` environment
//! overrides; the CLI applies its flags last. Credentials are only ever read
//! from the environment.

use crate::errors::LlembaError;
use crate::providers::{CompletionBackend, FakeBackend, HttpBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "togethercomputer/LLaMA-2-70B-chat";

/// Checked in order; the first non-empty one wins.
pub const API_KEY_VARS: [&str; 3] = ["LLEMBA_API_KEY", "TOGETHER_AI_TOKEN", "OPENAI_API_KEY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Together,
    Openai,
    Fake,
}

impl Provider {
    pub fn parse(raw: &str) -> Result<Self, LlembaError> {
        match raw.to_lowercase().as_str() {
            "together" => Ok(Provider::Together),
            "openai" => Ok(Provider::Openai),
            "fake" => Ok(Provider::Fake),
            other => Err(LlembaError::configuration(format!(
                "unknown provider '{}' (expected together|openai|fake)",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    /// Fixed pause between transport retries.
    pub delay_ms: u64,
    /// `None` retries forever.
    pub max_transport_attempts: Option<u32>,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            max_transport_attempts: None,
            request_timeout_secs: 120,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EscalationSettings {
    pub temperature_step: f64,
    pub temperature_ceiling: f64,
    /// Hard cap on request rounds, whatever the step size.
    pub max_rounds: u32,
    /// Added to `max_tokens` when completions come back truncated.
    pub token_step: u32,
    pub max_token_escalations: u32,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            temperature_step: 0.1,
            temperature_ceiling: 1.0,
            max_rounds: 16,
            token_step: 200,
            max_token_escalations: 3,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub provider: Provider,
    pub model: String,
    /// Overrides the provider's default endpoint.
    pub api_url: Option<String>,
    /// Completions sampled per call.
    pub samples: u32,
    pub cache_dir: PathBuf,
    pub retry: RetrySettings,
    pub escalation: EscalationSettings,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: DEFAULT_MODEL.to_string(),
            api_url: None,
            samples: 1,
            cache_dir: PathBuf::from("cache"),
            retry: RetrySettings::default(),
            escalation: EscalationSettings::default(),
            verbose: false,
        }
    }
}

impl Settings {
    pub fn from_yaml(text: &str) -> Result<Self, LlembaError> {
        let settings: Settings = serde_yaml::from_str(text)
            .map_err(|e| LlembaError::configuration(format!("failed to parse yaml: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, LlembaError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LlembaError::configuration(format!("failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Applies `LLEMBA_MODEL`, `LLEMBA_API_URL` and `LLEMBA_PROVIDER`.
    pub fn apply_env(mut self) -> Result<Self, LlembaError> {
        if let Some(model) = non_empty_var("LLEMBA_MODEL") {
            self.model = model;
        }
        if let Some(url) = non_empty_var("LLEMBA_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(provider) = non_empty_var("LLEMBA_PROVIDER") {
            self.provider = Provider::parse(&provider)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), LlembaError> {
        if self.model.trim().is_empty() {
            return Err(LlembaError::configuration("model name is empty"));
        }
        if self.samples == 0 {
            return Err(LlembaError::configuration("samples must be at least 1"));
        }
        let esc = &self.escalation;
        if !(esc.temperature_step.is_finite() && esc.temperature_step > 0.0) {
            return Err(LlembaError::configuration(
                "escalation.temperature_step must be positive",
            ));
        }
        if !esc.temperature_ceiling.is_finite() || esc.temperature_ceiling < 0.0 {
            return Err(LlembaError::configuration(
                "escalation.temperature_ceiling must be non-negative",
            ));
        }
        if esc.max_rounds == 0 {
            return Err(LlembaError::configuration(
                "escalation.max_rounds must be at least 1",
            ));
        }
        if self.retry.max_transport_attempts == Some(0) {
            return Err(LlembaError::configuration(
                "retry.max_transport_attempts must be at least 1 (omit for unbounded)",
            ));
        }
        Ok(())
    }
}

/// API credential for the remote endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, LlembaError> {
        API_KEY_VARS
            .iter()
            .find_map(|var| non_empty_var(var))
            .map(|api_key| Credentials { api_key })
            .ok_or_else(|| {
                LlembaError::configuration(format!(
                    "API token is not set (set one of {})",
                    API_KEY_VARS.join(", ")
                ))
            })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Builds the backend for `settings`. Real providers require credentials
/// from the environment and fail here, before any row is processed.
pub fn build_backend(settings: &Settings) -> Result<Arc<dyn CompletionBackend>, LlembaError> {
    settings.validate()?;
    let timeout = settings.retry.request_timeout();

    let backend: Arc<dyn CompletionBackend> = match settings.provider {
        Provider::Fake => Arc::new(FakeBackend::new(settings.model.clone())),
        Provider::Together | Provider::Openai => {
            let creds = Credentials::from_env()?;
            let mut backend = if settings.provider == Provider::Together {
                HttpBackend::together(settings.model.clone(), creds.api_key, timeout)?
            } else {
                HttpBackend::openai(settings.model.clone(), creds.api_key, timeout)?
            };
            if let Some(url) = &settings.api_url {
                backend.api_url = url.clone();
            }
            Arc::new(backend)
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_key_vars() {
        for var in API_KEY_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.provider, Provider::Together);
        assert_eq!(s.retry.delay(), Duration::from_secs(1));
        assert_eq!(s.retry.max_transport_attempts, None);
        assert_eq!(s.escalation.token_step, 200);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn yaml_overrides_are_partial() {
        let s = Settings::from_yaml(
            "provider: openai\nmodel: gpt-4o-mini\nsamples: 3\nretry:\n  max_transport_attempts: 5\n",
        )
        .unwrap();
        assert_eq!(s.provider, Provider::Openai);
        assert_eq!(s.model, "gpt-4o-mini");
        assert_eq!(s.samples, 3);
        assert_eq!(s.retry.max_transport_attempts, Some(5));
        assert_eq!(s.retry.delay_ms, 1000);
        assert_eq!(s.escalation, EscalationSettings::default());
    }

    #[test]
    fn example_settings_file_matches_defaults() {
        let s = Settings::from_yaml(include_str!("../../../../llemba.yaml")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn invalid_yaml_values_are_rejected() {
        assert!(Settings::from_yaml("samples: 0\n").is_err());
        assert!(Settings::from_yaml("escalation:\n  temperature_step: 0\n").is_err());
        assert!(Settings::from_yaml("provider: mystery\n").is_err());
        assert!(Settings::from_yaml("retry:\n  max_transport_attempts: 0\n").is_err());
    }

    #[test]
    #[serial]
    fn missing_credentials_fail_fast() {
        clear_key_vars();
        let err = Credentials::from_env().unwrap_err();
        assert!(matches!(err, LlembaError::Configuration { .. }));

        let settings = Settings::default();
        assert!(build_backend(&settings).is_err());
    }

    #[test]
    #[serial]
    fn credentials_fall_back_in_order() {
        clear_key_vars();
        std::env::set_var("TOGETHER_AI_TOKEN", "tok-1");
        std::env::set_var("OPENAI_API_KEY", "sk-2");
        assert_eq!(Credentials::from_env().unwrap().api_key, "tok-1");

        std::env::set_var("LLEMBA_API_KEY", "  ");
        assert_eq!(Credentials::from_env().unwrap().api_key, "tok-1");
        clear_key_vars();
    }

    #[test]
    #[serial]
    fn fake_provider_needs_no_credentials() {
        clear_key_vars();
        let settings = Settings {
            provider: Provider::Fake,
            ..Settings::default()
        };
        let backend = build_backend(&settings).unwrap();
        assert_eq!(backend.provider_name(), "fake");
    }

    #[test]
    #[serial]
    fn env_overrides() {
        std::env::set_var("LLEMBA_MODEL", "meta/llama-3");
        std::env::set_var("LLEMBA_PROVIDER", "fake");
        let s = Settings::default().apply_env().unwrap();
        assert_eq!(s.model, "meta/llama-3");
        assert_eq!(s.provider, Provider::Fake);
        std::env::remove_var("LLEMBA_MODEL");
        std::env::remove_var("LLEMBA_PROVIDER");
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let c = Credentials {
            api_key: "sk-secret".into(),
        };
        assert!(!format!("{:?}", c).contains("sk-secret"));
    }
}
