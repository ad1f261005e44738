use super::{CompletionBackend, CompletionRequest};
use crate::errors::LlembaError;
use crate::model::{FinishReason, RawAnswer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const TOGETHER_COMPLETIONS_URL: &str = "https://api.together.xyz/v1/completions";
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const STOP_SEQUENCES: [&str; 1] = ["</s>"];

/// Request/response shape of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStyle {
    /// `prompt` in, `choices[].text` out.
    Completions,
    /// `messages` in, `choices[].message.content` out.
    Chat,
}

pub struct HttpBackend {
    pub model: String,
    pub api_url: String,
    pub style: EndpointStyle,
    provider: &'static str,
    api_key: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(
        provider: &'static str,
        style: EndpointStyle,
        api_url: String,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, LlembaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlembaError::configuration(format!("http client: {}", e)))?;
        Ok(Self {
            model,
            api_url,
            style,
            provider,
            api_key,
            client,
        })
    }

    /// Together AI completions endpoint.
    pub fn together(model: String, api_key: String, timeout: Duration) -> Result<Self, LlembaError> {
        Self::new(
            "together",
            EndpointStyle::Completions,
            TOGETHER_COMPLETIONS_URL.to_string(),
            model,
            api_key,
            timeout,
        )
    }

    /// OpenAI-compatible chat endpoint.
    pub fn openai(model: String, api_key: String, timeout: Duration) -> Result<Self, LlembaError> {
        Self::new(
            "openai",
            EndpointStyle::Chat,
            OPENAI_CHAT_URL.to_string(),
            model,
            api_key,
            timeout,
        )
    }

    pub fn payload(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_p": 1,
            "n": request.n,
            "stop": STOP_SEQUENCES,
        });
        match self.style {
            EndpointStyle::Completions => {
                body["prompt"] = json!(request.prompt);
            }
            EndpointStyle::Chat => {
                body["messages"] = json!([{ "role": "user", "content": request.prompt }]);
            }
        }
        body
    }
}

/// Extracts the sampled choices. A response without `choices` yields no answers.
pub fn parse_choices(style: EndpointStyle, body: &Value) -> Vec<RawAnswer> {
    let Some(choices) = body.get("choices").and_then(|c| c.as_array()) else {
        return Vec::new();
    };

    let pointer = match style {
        EndpointStyle::Completions => "/text",
        EndpointStyle::Chat => "/message/content",
    };

    choices
        .iter()
        .map(|choice| {
            let text = choice
                .pointer(pointer)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .trim()
                .to_string();
            let finish_reason =
                FinishReason::from_api(choice.get("finish_reason").and_then(|v| v.as_str()));
            RawAnswer {
                text,
                finish_reason,
            }
        })
        .collect()
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<RawAnswer>, LlembaError> {
        let body = self.payload(request);

        let resp = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlembaError::transport(self.provider, None, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(LlembaError::transport(
                self.provider,
                Some(status.as_u16()),
                error_text,
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlembaError::transport(self.provider, Some(status.as_u16()), e.to_string()))?;

        Ok(parse_choices(self.style, &json))
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }
}
