//! Translation quality scoring with a hosted LLM.
//!
//! Prompts are rendered from a static template registry, sent to a
//! completion/chat endpoint, cached on disk by request key, and the free-text
//! replies are parsed into a 0-100 score, a 1-5 star rating or a class index.
//!
//! Flow: [`runner::BulkRunner`] renders each [`model::Row`] through
//! [`template`], hands the prompt to [`client::ApiClient`] (which consults a
//! [`cache::ResponseCache`] before calling a [`providers::CompletionBackend`])
//! and collects the [`model::AnswerRecord`]s in row order.

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod model;
pub mod parse;
pub mod providers;
pub mod report;
pub mod runner;
pub mod template;

pub use errors::LlembaError;
pub use model::{AnswerRecord, FinishReason, ParsedValue, RawAnswer, Row};
pub use parse::ParserKind;
pub use template::Template;
