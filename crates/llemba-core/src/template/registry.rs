//! Built-in scoring methods.
//!
//! The table is built once and never mutated. Prompt texts are part of the
//! scoring protocol: changing a single character changes every request key
//! and therefore invalidates existing caches.

use super::Template;
use crate::errors::LlembaError;
use crate::parse::ParserKind;
use lazy_static::lazy_static;

pub const CLASS_LABELS: [&str; 5] = [
    "No meaning preserved",
    "Some meaning preserved, but not understandable",
    "Some meaning preserved and understandable",
    "Most meaning preserved, minor issues",
    "Perfect translation",
];

const CLASS_MAX_TOKENS: u32 = 100;

const DA: &str = "Score the following translation from {source_lang} to {target_lang} on a continuous scale from 0 to 100, where a score of zero means \"no meaning preserved\" and score of one hundred means \"perfect meaning and grammar\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} translation: \"{target_seg}\"\nScore: ";

const DA_REF: &str = "Score the following translation from {source_lang} to {target_lang} with respect to human reference on a continuous scale 0 to 100 where score of zero means \"no meaning preserved\" and score of one hundred means \"perfect meaning and grammar\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} human reference: {reference_seg}\n{target_lang} machine translation: \"{target_seg}\"\nScore: ";

const SQM: &str = "Score the following translation from {source_lang} to {target_lang} on a continuous scale from 0 to 100 that starts on \"No meaning preserved\", goes through \"Some meaning preserved\", then \"Most meaning preserved and few grammar mistakes\", up to \"Perfect meaning and grammar\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} translation: \"{target_seg}\"\nScore (0-100): ";

const SQM_REF: &str = "Score the following machine translation from {source_lang} to {target_lang} with respect to the human reference on a continuous scale from 0 to 100 that starts with \"No meaning preserved\", goes through \"Some meaning preserved\", then \"Most meaning preserved and few grammar mistakes\", up to \"Perfect meaning and grammar\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} human reference: \"{reference_seg}\"\n{target_lang} machine translation: \"{target_seg}\"\nScore (0-100): ";

const STARS: &str = "Score the following translation from {source_lang} to {target_lang} with one to five stars. Where one star means \"Nonsense/No meaning preserved\", two stars mean \"Some meaning preserved, but not understandable\", three stars mean \"Some meaning preserved and understandable\", four stars mean \"Most meaning preserved with possibly few grammar mistakes\", and five stars mean \"Perfect meaning and grammar\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} translation: \"{target_seg}\"\nStars: ";

const STARS_REF: &str = "Score the following translation from {source_lang} to {target_lang} with respect to the human reference with one to five stars. Where one star means \"Nonsense/No meaning preserved\", two stars mean \"Some meaning preserved, but not understandable\", three stars mean \"Some meaning preserved and understandable\", four stars mean \"Most meaning preserved with possibly few grammar mistakes\", and five stars mean \"Perfect meaning and grammar\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} human reference: \"{reference_seg}\"\n{target_lang} translation: \"{target_seg}\"\nStars: ";

const CLASSES: &str = "Classify the quality of machine translation from {source_lang} to {target_lang} into one of following classes: \"No meaning preserved\", \"Some meaning preserved, but not understandable\", \"Some meaning preserved and understandable\", \"Most meaning preserved, minor issues\", \"Perfect translation\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} machine translation: \"{target_seg}\"\nClass: ";

const CLASSES_REF: &str = "Classify the quality of machine translation from {source_lang} to {target_lang} with respect to the human reference into one of following classes: \"No meaning preserved\", \"Some meaning preserved, but not understandable\", \"Some meaning preserved and understandable\", \"Most meaning preserved, minor issues\", \"Perfect translation\".\n\n{source_lang} source: \"{source_seg}\"\n{target_lang} human reference: \"{reference_seg}\"\n{target_lang} machine translation: \"{target_seg}\"\nClass: ";

lazy_static! {
    static ref TEMPLATES: Vec<Template> = vec![
        Template::new("LLEMBA-DA", DA, false, ParserKind::numeric()),
        Template::new("LLEMBA-DA_ref", DA_REF, true, ParserKind::numeric()),
        Template::new("LLEMBA-SQM", SQM, false, ParserKind::numeric()),
        Template::new("LLEMBA-SQM_ref", SQM_REF, true, ParserKind::numeric()),
        Template::new("LLEMBA-stars", STARS, false, ParserKind::Stars),
        Template::new("LLEMBA-stars_ref", STARS_REF, true, ParserKind::Stars),
        Template::new("LLEMBA-classes", CLASSES, false, ParserKind::classes(CLASS_LABELS))
            .with_max_tokens(CLASS_MAX_TOKENS),
        Template::new("LLEMBA-classes_ref", CLASSES_REF, true, ParserKind::classes(CLASS_LABELS))
            .with_max_tokens(CLASS_MAX_TOKENS),
    ];
}

/// Looks up a registered method by name.
pub fn lookup(method: &str) -> Result<&'static Template, LlembaError> {
    TEMPLATES
        .iter()
        .find(|t| t.name == method)
        .ok_or_else(|| LlembaError::unsupported_method(method))
}

pub fn methods() -> &'static [Template] {
    &TEMPLATES
}
