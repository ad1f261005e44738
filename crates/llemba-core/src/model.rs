use serde::{Deserialize, Serialize};

/// One segment pair to score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub source_seg: String,
    pub target_seg: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_seg: Option<String>,
}

impl Row {
    pub fn new(
        source_seg: impl Into<String>,
        target_seg: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            source_seg: source_seg.into(),
            target_seg: target_seg.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            reference_seg: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_seg = Some(reference.into());
        self
    }
}

/// How a sampled completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Stop,
    Length,
    Other,
}

impl FinishReason {
    /// Maps the endpoint's `finish_reason` string. Absent means the endpoint
    /// did not report truncation, which is read as a clean stop.
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            None | Some("stop") | Some("eos") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some(_) => FinishReason::Other,
        }
    }

    pub fn is_truncated(self) -> bool {
        self != FinishReason::Stop
    }
}

/// One sampled completion, before parsing. This is what the cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawAnswer {
    pub text: String,
    pub finish_reason: FinishReason,
}

impl RawAnswer {
    pub fn new(text: impl Into<String>, finish_reason: FinishReason) -> Self {
        Self {
            text: text.into(),
            finish_reason,
        }
    }

    pub fn stop(text: impl Into<String>) -> Self {
        Self::new(text, FinishReason::Stop)
    }
}

/// A validated answer: a score (numeric or stars) or a class index.
///
/// Serialized as a bare integer, which does not record the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ParsedValue {
    Score(i64),
    Class(usize),
}

impl ParsedValue {
    pub fn as_i64(self) -> i64 {
        match self {
            ParsedValue::Score(v) => v,
            ParsedValue::Class(i) => i as i64,
        }
    }
}

impl std::fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// One parsed (or failed) completion for a logical request.
///
/// `answer_id` keeps counting across every retry round of the same request,
/// so it encodes how deep into the retries the answer was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub temperature: f64,
    pub answer_id: i64,
    pub answer: Option<ParsedValue>,
    pub prompt: String,
    pub finish_reason: Option<FinishReason>,
    pub model: String,
}
