use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Cache key for one request: SHA-256 of the canonical (RFC 8785) JSON of
/// `{model, temperature, prompt, max_tokens}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(model: &str, temperature: f64, prompt: &str, max_tokens: u32) -> Self {
        Self::from_value(&json!({
            "model": model,
            "temperature": temperature,
            "prompt": prompt,
            "max_tokens": max_tokens,
        }))
    }

    /// Key for an arbitrary request description. Field order does not matter.
    pub fn from_value(request: &Value) -> Self {
        let canonical = serde_jcs::to_string(request).unwrap_or_else(|_| request.to_string());
        let mut h = Sha256::new();
        h.update(canonical.as_bytes());
        Self(hex::encode(h.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable() {
        let a = RequestKey::new("m", 0.0, "Score: ", 200);
        let b = RequestKey::new("m", 0.0, "Score: ", 200);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn key_ignores_field_order() {
        let a: Value = serde_json::from_str(
            r#"{"model":"m","temperature":0.1,"prompt":"p","max_tokens":200}"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{"max_tokens":200,"prompt":"p","temperature":0.1,"model":"m"}"#,
        )
        .unwrap();
        assert_eq!(RequestKey::from_value(&a), RequestKey::from_value(&b));
        assert_eq!(RequestKey::from_value(&a), RequestKey::new("m", 0.1, "p", 200));
    }

    #[test]
    fn every_field_participates() {
        let base = RequestKey::new("m", 0.0, "p", 200);
        assert_ne!(base, RequestKey::new("m2", 0.0, "p", 200));
        assert_ne!(base, RequestKey::new("m", 0.1, "p", 200));
        assert_ne!(base, RequestKey::new("m", 0.0, "p2", 200));
        assert_ne!(base, RequestKey::new("m", 0.0, "p", 400));
    }
}
