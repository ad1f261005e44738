//! Prompt templates and rendering.
//!
//! A [`Template`] pairs a prompt format with the parser that reads the
//! model's reply. The built-in methods live in [`registry`].

pub mod registry;

pub use registry::{lookup, methods, CLASS_LABELS};

use crate::errors::LlembaError;
use crate::model::Row;
use crate::parse::ParserKind;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;

pub const DEFAULT_MAX_TOKENS: u32 = 200;

const REFERENCE_FIELD: &str = "reference_seg";

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{(source_lang|target_lang|source_seg|target_seg|reference_seg)\}").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    pub prompt_format: String,
    pub uses_reference: bool,
    pub parser: ParserKind,
    pub max_tokens: u32,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        prompt_format: impl Into<String>,
        uses_reference: bool,
        parser: ParserKind,
    ) -> Self {
        Self {
            name: name.into(),
            prompt_format: prompt_format.into(),
            uses_reference,
            parser,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Substitutes the row's fields into the prompt format.
    ///
    /// Substitution is a single pass, so segment text that happens to contain
    /// `{target_seg}` or similar is inserted verbatim and not expanded again.
    pub fn render(&self, row: &Row) -> Result<String, LlembaError> {
        let needs_reference =
            self.uses_reference || self.prompt_format.contains("{reference_seg}");
        if needs_reference && row.reference_seg.is_none() {
            return Err(LlembaError::MissingField {
                template: self.name.clone(),
                field: REFERENCE_FIELD,
            });
        }

        let rendered = PLACEHOLDER.replace_all(&self.prompt_format, |caps: &Captures<'_>| {
            match &caps[1] {
                "source_lang" => row.source_lang.as_str(),
                "target_lang" => row.target_lang.as_str(),
                "source_seg" => row.source_seg.as_str(),
                "target_seg" => row.target_seg.as_str(),
                _ => row.reference_seg.as_deref().unwrap_or_default(),
            }
            .to_string()
        });
        Ok(rendered.into_owned())
    }
}

/// Full language name for the ISO codes the prompts were written for.
pub fn language_name(code: &str) -> Option<&'static str> {
    match code {
        "en" => Some("English"),
        "de" => Some("German"),
        "zh" => Some("Chinese"),
        "ru" => Some("Russian"),
        _ => None,
    }
}
