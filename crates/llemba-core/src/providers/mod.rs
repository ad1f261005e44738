//! Remote completion endpoints.

pub mod fake;
pub mod http;

pub use fake::FakeBackend;
pub use http::{EndpointStyle, HttpBackend};

use crate::errors::LlembaError;
use crate::model::RawAnswer;
use async_trait::async_trait;

/// One call to the endpoint. `n` sampled completions may come back.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub n: u32,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issues a single request. Transport failures come back as
    /// [`LlembaError::Transport`]; retrying is the caller's business.
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<RawAnswer>, LlembaError>;

    fn provider_name(&self) -> &'static str;

    fn model(&self) -> &str;
}
