//! API client: one logical request, with caching, retries and escalation.
//!
//! A round asks the endpoint (or the cache) for answers at the current
//! temperature and token budget, then parses them. If nothing parses, the
//! next round either raises the token budget (some completion was truncated)
//! or the temperature, until the ceiling or `max_rounds` is reached. The
//! caller then gets a single record with no answer.

mod retry;

pub use retry::dedup_answers;

use crate::cache::{self, RequestKey, ResponseCache};
use crate::config::{EscalationSettings, RetrySettings, Settings};
use crate::errors::LlembaError;
use crate::model::AnswerRecord;
use crate::parse::ParserKind;
use crate::providers::{CompletionBackend, CompletionRequest};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub samples: u32,
    pub retry: RetrySettings,
    pub escalation: EscalationSettings,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl ClientConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            samples: settings.samples,
            retry: settings.retry.clone(),
            escalation: settings.escalation.clone(),
            verbose: settings.verbose,
        }
    }
}

/// Mutable state of one logical request across rounds.
#[derive(Debug, Clone)]
struct RoundState {
    temperature_index: u32,
    max_tokens: u32,
    token_escalations: u32,
    rounds: u32,
    answer_id: i64,
}

impl RoundState {
    fn new(max_tokens: u32) -> Self {
        Self {
            temperature_index: 0,
            max_tokens,
            token_escalations: 0,
            rounds: 0,
            answer_id: -1,
        }
    }

    /// `index * step`, rounded to kill float drift and clamped to the ceiling.
    fn temperature(&self, esc: &EscalationSettings) -> f64 {
        let raw = f64::from(self.temperature_index) * esc.temperature_step;
        ((raw * 1e6).round() / 1e6).min(esc.temperature_ceiling)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    backend: Arc<dyn CompletionBackend>,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: ClientConfig) -> Self {
        Self { backend, config }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs one logical request for `prompt`.
    ///
    /// Returns every parsed answer of the first round that produced one, or a
    /// single record with `answer: None` once escalation is exhausted. Only
    /// fatal conditions (cache failure, transport failure after a bounded
    /// retry budget) come back as errors.
    pub async fn request(
        &self,
        prompt: &str,
        parser: &ParserKind,
        max_tokens: u32,
        cache: &dyn ResponseCache,
    ) -> Result<Vec<AnswerRecord>, LlembaError> {
        let esc = &self.config.escalation;
        let model = self.backend.model().to_string();
        let mut state = RoundState::new(max_tokens);
        let mut temperature: f64;

        loop {
            state.rounds += 1;
            temperature = state.temperature(esc);

            let key = RequestKey::new(&model, temperature, prompt, state.max_tokens);
            let request = CompletionRequest {
                prompt: prompt.to_string(),
                temperature,
                max_tokens: state.max_tokens,
                n: self.config.samples,
            };
            let (raw, source) = cache::get_or_compute(cache, &key, || {
                retry::call_with_retry(self.backend.as_ref(), &request, &self.config.retry)
            })
            .await?;
            let raw = dedup_answers(raw);

            let mut records = Vec::new();
            let mut truncated = false;
            for answer in &raw {
                state.answer_id += 1;
                truncated |= answer.finish_reason.is_truncated();
                let parsed = parser.parse(&answer.text);

                if self.config.verbose || temperature > 0.0 {
                    tracing::info!(
                        temperature,
                        answer_id = state.answer_id,
                        parsed = ?parsed,
                        raw = %answer.text,
                        "answer"
                    );
                } else {
                    tracing::debug!(answer_id = state.answer_id, parsed = ?parsed, source = ?source, "answer");
                }

                if let Some(value) = parsed {
                    records.push(AnswerRecord {
                        temperature,
                        answer_id: state.answer_id,
                        answer: Some(value),
                        prompt: prompt.to_string(),
                        finish_reason: Some(answer.finish_reason),
                        model: model.clone(),
                    });
                }
            }

            if !records.is_empty() {
                return Ok(records);
            }
            if state.rounds >= esc.max_rounds {
                tracing::warn!(rounds = state.rounds, "round limit reached without a parsable answer");
                break;
            }
            if truncated && state.token_escalations < esc.max_token_escalations {
                state.token_escalations += 1;
                state.max_tokens = state.max_tokens.saturating_add(esc.token_step);
                tracing::info!(max_tokens = state.max_tokens, "completion truncated, raising token budget");
                continue;
            }
            if temperature < esc.temperature_ceiling {
                state.temperature_index += 1;
                tracing::info!(
                    temperature = state.temperature(esc),
                    "no parsable answer, raising temperature"
                );
                continue;
            }
            break;
        }

        Ok(vec![AnswerRecord {
            temperature,
            answer_id: state.answer_id,
            answer: None,
            prompt: prompt.to_string(),
            finish_reason: None,
            model,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::model::{FinishReason, ParsedValue, RawAnswer};
    use crate::providers::fake::{FakeBackend, FakeReply};

    fn config() -> ClientConfig {
        let mut c = ClientConfig::default();
        c.retry.delay_ms = 0;
        c
    }

    fn client(fake: FakeBackend) -> (ApiClient, Arc<FakeBackend>) {
        let fake = Arc::new(fake);
        (ApiClient::new(fake.clone(), config()), fake)
    }

    #[tokio::test]
    async fn first_round_success() {
        let (client, fake) = client(FakeBackend::new("m".into()).with_response("Score: 85/100".into()));
        let cache = MemoryCache::new();
        let records = client
            .request("p", &ParserKind::numeric(), 200, &cache)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, Some(ParsedValue::Score(85)));
        assert_eq!(records[0].answer_id, 0);
        assert_eq!(records[0].temperature, 0.0);
        assert_eq!(records[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(records[0].model, "m");
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn escalates_temperature_until_parsable() {
        let (client, fake) = client(FakeBackend::new("m".into()).with_script([
            FakeReply::Answers(vec![RawAnswer::stop("excellent!")]),
            FakeReply::Answers(vec![RawAnswer::stop("very good")]),
            FakeReply::Answers(vec![RawAnswer::stop("70")]),
        ]));
        let cache = MemoryCache::new();
        let records = client
            .request("p", &ParserKind::numeric(), 200, &cache)
            .await
            .unwrap();

        assert_eq!(records[0].answer, Some(ParsedValue::Score(70)));
        assert_eq!(records[0].temperature, 0.2);
        assert_eq!(records[0].answer_id, 2);

        let temps: Vec<f64> = fake.requests().iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![0.0, 0.1, 0.2]);
    }

    #[tokio::test]
    async fn gives_up_at_ceiling() {
        let (client, fake) = client(FakeBackend::new("m".into()).with_response("no idea".into()));
        let cache = MemoryCache::new();
        let records = client
            .request("p", &ParserKind::numeric(), 200, &cache)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, None);
        assert_eq!(records[0].temperature, 1.0);
        assert_eq!(records[0].finish_reason, None);
        // 0.0, 0.1, ..., 1.0
        assert_eq!(fake.calls(), 11);
        assert_eq!(records[0].answer_id, 10);
    }

    #[tokio::test]
    async fn max_rounds_caps_escalation() {
        let mut cfg = config();
        cfg.escalation.temperature_step = 0.05;
        cfg.escalation.max_rounds = 5;
        let fake = Arc::new(FakeBackend::new("m".into()).with_response("nothing".into()));
        let client = ApiClient::new(fake.clone(), cfg);

        let records = client
            .request("p", &ParserKind::Stars, 200, &MemoryCache::new())
            .await
            .unwrap();
        assert_eq!(records[0].answer, None);
        assert_eq!(records[0].temperature, 0.2);
        assert_eq!(fake.calls(), 5);
    }

    #[tokio::test]
    async fn vanishing_step_still_terminates() {
        let mut cfg = config();
        cfg.escalation.temperature_step = 1e-9;
        let fake = Arc::new(FakeBackend::new("m".into()).with_response("nothing".into()));
        let client = ApiClient::new(fake.clone(), cfg);

        let records = client
            .request("p", &ParserKind::Stars, 200, &MemoryCache::new())
            .await
            .unwrap();
        assert_eq!(records[0].answer, None);
        // Every round rounds to temperature 0.0, so later rounds are cache hits.
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn truncation_raises_token_budget_not_temperature() {
        let (client, fake) = client(FakeBackend::new("m".into()).with_script([
            FakeReply::Answers(vec![RawAnswer::new("The translation", FinishReason::Length)]),
            FakeReply::Answers(vec![RawAnswer::stop("Perfect translation")]),
        ]));
        let records = client
            .request(
                "p",
                &ParserKind::classes(crate::template::CLASS_LABELS),
                100,
                &MemoryCache::new(),
            )
            .await
            .unwrap();

        assert_eq!(records[0].answer, Some(ParsedValue::Class(4)));
        let reqs = fake.requests();
        assert_eq!(reqs[0].max_tokens, 100);
        assert_eq!(reqs[1].max_tokens, 300);
        assert_eq!(reqs[1].temperature, 0.0);
    }

    #[tokio::test]
    async fn any_non_stop_finish_raises_token_budget() {
        let (client, fake) = client(FakeBackend::new("m".into()).with_script([
            FakeReply::Answers(vec![RawAnswer::new("Well,", FinishReason::Other)]),
            FakeReply::Answers(vec![RawAnswer::stop("75")]),
        ]));
        let records = client
            .request("p", &ParserKind::numeric(), 200, &MemoryCache::new())
            .await
            .unwrap();

        assert_eq!(records[0].answer, Some(ParsedValue::Score(75)));
        let budget: Vec<(f64, u32)> = fake
            .requests()
            .iter()
            .map(|r| (r.temperature, r.max_tokens))
            .collect();
        assert_eq!(budget, vec![(0.0, 200), (0.0, 400)]);
    }

    #[tokio::test]
    async fn token_escalation_is_bounded() {
        let mut cfg = config();
        cfg.escalation.max_token_escalations = 2;
        let fake = Arc::new(FakeBackend::new("m".into()).with_responder(|_| {
            vec![RawAnswer::new("cut", FinishReason::Length)]
        }));
        let client = ApiClient::new(fake.clone(), cfg);
        client
            .request("p", &ParserKind::numeric(), 200, &MemoryCache::new())
            .await
            .unwrap();

        let reqs = fake.requests();
        assert_eq!(reqs[2].max_tokens, 600);
        assert_eq!(reqs[2].temperature, 0.0);
        assert_eq!(reqs[3].max_tokens, 600);
        assert_eq!(reqs[3].temperature, 0.1);
        // 2 token escalations + 11 temperature rounds, capped at 16.
        assert_eq!(fake.calls(), 13);
    }

    #[tokio::test]
    async fn duplicates_collapse_and_ids_keep_counting() {
        let (client, _fake) = client(FakeBackend::new("m".into()).with_script([
            FakeReply::Answers(vec![RawAnswer::stop("hm"), RawAnswer::stop("hm")]),
            FakeReply::Answers(vec![
                RawAnswer::stop("60"),
                RawAnswer::stop("60"),
                RawAnswer::stop("so so"),
                RawAnswer::stop("65"),
            ]),
        ]));
        let records = client
            .request("p", &ParserKind::numeric(), 200, &MemoryCache::new())
            .await
            .unwrap();

        let ids: Vec<i64> = records.iter().map(|r| r.answer_id).collect();
        let values: Vec<_> = records.iter().map(|r| r.answer).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(
            values,
            vec![Some(ParsedValue::Score(60)), Some(ParsedValue::Score(65))]
        );
    }

    #[tokio::test]
    async fn warm_cache_issues_no_calls() {
        let cache = MemoryCache::new();
        let (client, fake) = client(FakeBackend::new("m".into()).with_script([
            FakeReply::Answers(vec![RawAnswer::stop("bad")]),
            FakeReply::Answers(vec![RawAnswer::stop("**** four stars")]),
        ]));
        let cold = client.request("p", &ParserKind::Stars, 200, &cache).await.unwrap();
        assert_eq!(fake.calls(), 2);

        let warm = client.request("p", &ParserKind::Stars, 200, &cache).await.unwrap();
        assert_eq!(fake.calls(), 2);
        assert_eq!(cold, warm);
    }

    #[tokio::test]
    async fn transport_failures_are_retried_inside_a_round() {
        let (client, fake) = client(FakeBackend::new("m".into()).with_script([
            FakeReply::Fail("connection reset".into()),
            FakeReply::Answers(vec![RawAnswer::stop("90")]),
        ]));
        let records = client
            .request("p", &ParserKind::numeric(), 200, &MemoryCache::new())
            .await
            .unwrap();
        assert_eq!(records[0].answer, Some(ParsedValue::Score(90)));
        assert_eq!(records[0].temperature, 0.0);
        assert_eq!(fake.calls(), 2);
    }
}
