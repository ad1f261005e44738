use super::{CompletionBackend, CompletionRequest};
use crate::errors::LlembaError;
use crate::model::RawAnswer;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Responder = Box<dyn Fn(&CompletionRequest) -> Vec<RawAnswer> + Send + Sync>;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Answers(Vec<RawAnswer>),
    /// Simulated transport failure.
    Fail(String),
}

/// Offline backend: replays a script, then a responder, then a fixed answer.
pub struct FakeBackend {
    model: String,
    script: Mutex<VecDeque<FakeReply>>,
    responder: Option<Responder>,
    fixed_response: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeBackend {
    pub fn new(model: String) -> Self {
        Self {
            model,
            script: Mutex::new(VecDeque::new()),
            responder: None,
            fixed_response: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: String) -> Self {
        self.fixed_response = Some(response);
        self
    }

    pub fn with_script(self, replies: impl IntoIterator<Item = FakeReply>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(replies);
        }
        self
    }

    pub fn with_responder(
        mut self,
        responder: impl Fn(&CompletionRequest) -> Vec<RawAnswer> + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Number of `complete` calls so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<RawAnswer>, LlembaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(FakeReply::Answers(answers)) => return Ok(answers),
            Some(FakeReply::Fail(detail)) => {
                return Err(LlembaError::transport("fake", None, detail))
            }
            None => {}
        }

        if let Some(responder) = &self.responder {
            return Ok(responder(request));
        }

        let text = self.fixed_response.clone().unwrap_or_else(|| "50".to_string());
        Ok((0..request.n.max(1)).map(|_| RawAnswer::stop(text.clone())).collect())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
