use thiserror::Error;

/// Failures that can leave the scoring core.
///
/// Parse failures and truncated completions never show up here: the client
/// resolves them by escalating temperature or token budget and, at worst,
/// degrades to a `None` answer for the row.
#[derive(Debug, Error)]
pub enum LlembaError {
    /// Missing credential or invalid settings. Raised before any row is touched.
    #[error("config error: {message}")]
    Configuration { message: String },

    /// The template needs a field the row does not carry.
    #[error("template '{template}' requires field '{field}', but the row has none")]
    MissingField {
        template: String,
        field: &'static str,
    },

    #[error("method '{method}' not supported")]
    UnsupportedMethod { method: String },

    /// Network/HTTP failure. Only surfaces once a bounded retry budget is spent.
    #[error("transport error ({provider}{}): {detail}", status_suffix(.status))]
    Transport {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    #[error("cache error: {detail}")]
    Cache { detail: String },

    #[error("input error: {detail}")]
    Input { detail: String },
}

impl From<anyhow::Error> for LlembaError {
    fn from(err: anyhow::Error) -> Self {
        Self::cache(format!("{:#}", err))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(", status {}", s)).unwrap_or_default()
}

impl LlembaError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    pub fn transport(provider: impl Into<String>, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn cache(detail: impl std::fmt::Display) -> Self {
        Self::Cache {
            detail: detail.to_string(),
        }
    }

    pub fn input(detail: impl Into<String>) -> Self {
        Self::Input {
            detail: detail.into(),
        }
    }

    /// Whether the condition is worth retrying at the call site.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_is_the_only_retryable_kind() {
        assert!(LlembaError::transport("together", Some(503), "unavailable").is_retryable());
        assert!(LlembaError::configuration("missing key").is_fatal());
        assert!(LlembaError::unsupported_method("LLEMBA-MQM").is_fatal());
        assert!(LlembaError::input("bad row").is_fatal());
    }

    #[test]
    fn transport_message_includes_status_when_known() {
        let with = LlembaError::transport("openai", Some(429), "rate limited").to_string();
        assert_eq!(with, "transport error (openai, status 429): rate limited");

        let without = LlembaError::transport("openai", None, "connection reset").to_string();
        assert_eq!(without, "transport error (openai): connection reset");
    }

    #[test]
    fn missing_field_names_template_and_field() {
        let err = LlembaError::MissingField {
            template: "LLEMBA-DA_ref".into(),
            field: "reference_seg",
        };
        assert_eq!(
            err.to_string(),
            "template 'LLEMBA-DA_ref' requires field 'reference_seg', but the row has none"
        );
    }
}
