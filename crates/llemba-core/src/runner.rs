//! Bulk scoring: one logical request per row, strictly in row order.

use crate::cache::sqlite::SqliteCache;
use crate::cache::ResponseCache;
use crate::client::{ApiClient, ClientConfig};
use crate::config::Settings;
use crate::errors::LlembaError;
use crate::model::{AnswerRecord, ParsedValue, Row};
use crate::providers::CompletionBackend;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::template::{self, Template};
use std::sync::Arc;

/// Result for one input row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    pub prompt: String,
    /// Never empty: either the parsed answers or a single null record.
    pub records: Vec<AnswerRecord>,
}

impl RowOutcome {
    /// The row's score: the first record's parsed value.
    pub fn answer(&self) -> Option<ParsedValue> {
        self.records.first().and_then(|r| r.answer)
    }

    pub fn first_record(&self) -> Option<&AnswerRecord> {
        self.records.first()
    }
}

pub struct BulkRunner {
    pub client: ApiClient,
}

impl BulkRunner {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Scores every row with `template`, sharing `cache` across rows.
    ///
    /// All prompts are rendered before the first request, so a row missing a
    /// required field aborts the run without touching the endpoint. Outcomes
    /// are returned in input order.
    pub async fn run(
        &self,
        rows: &[Row],
        template: &Template,
        cache: &dyn ResponseCache,
        progress: Option<ProgressSink>,
    ) -> Result<Vec<RowOutcome>, LlembaError> {
        let prompts = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                template
                    .render(row)
                    .inspect_err(|e| tracing::error!(row = i + 1, error = %e, "cannot render prompt"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total = prompts.len();
        tracing::info!(
            method = %template.name,
            model = self.client.model(),
            rows = total,
            "starting bulk run"
        );

        let mut outcomes = Vec::with_capacity(total);
        for prompt in prompts {
            let records = self
                .client
                .request(&prompt, &template.parser, template.max_tokens, cache)
                .await?;
            outcomes.push(RowOutcome { prompt, records });
            if let Some(ref sink) = progress {
                sink(ProgressEvent {
                    done: outcomes.len(),
                    total,
                });
            }
        }

        let scored = outcomes.iter().filter(|o| o.answer().is_some()).count();
        tracing::info!(scored, unscored = total - scored, "bulk run finished");
        Ok(outcomes)
    }

    /// Like [`run`](Self::run), keeping only each row's score.
    pub async fn scores(
        &self,
        rows: &[Row],
        template: &Template,
        cache: &dyn ResponseCache,
        progress: Option<ProgressSink>,
    ) -> Result<Vec<Option<ParsedValue>>, LlembaError> {
        let outcomes = self.run(rows, template, cache, progress).await?;
        Ok(outcomes.iter().map(RowOutcome::answer).collect())
    }
}

/// Builds rows from parallel segment lists.
pub fn build_rows(
    sources: &[String],
    hypotheses: &[String],
    references: Option<&[String]>,
    source_lang: &str,
    target_lang: &str,
) -> Result<Vec<Row>, LlembaError> {
    if sources.len() != hypotheses.len() {
        return Err(LlembaError::input(format!(
            "{} source segments but {} hypotheses",
            sources.len(),
            hypotheses.len()
        )));
    }
    if let Some(refs) = references {
        if refs.len() != sources.len() {
            return Err(LlembaError::input(format!(
                "{} source segments but {} references",
                sources.len(),
                refs.len()
            )));
        }
    }

    Ok(sources
        .iter()
        .zip(hypotheses)
        .enumerate()
        .map(|(i, (src, hyp))| {
            let row = Row::new(src.as_str(), hyp.as_str(), source_lang, target_lang);
            match references {
                Some(refs) => row.with_reference(refs[i].as_str()),
                None => row,
            }
        })
        .collect())
}

/// Scores parallel segment lists with `method`, caching on disk under
/// `settings.cache_dir`. Returns one score per segment, in order.
#[allow(clippy::too_many_arguments)]
pub async fn score_segments(
    backend: Arc<dyn CompletionBackend>,
    settings: &Settings,
    sources: &[String],
    hypotheses: &[String],
    references: Option<&[String]>,
    source_lang: &str,
    target_lang: &str,
    method: &str,
) -> Result<Vec<Option<ParsedValue>>, LlembaError> {
    let template = template::lookup(method)?;
    let rows = build_rows(sources, hypotheses, references, source_lang, target_lang)?;

    let cache = SqliteCache::open_namespace(&settings.cache_dir, backend.model(), method)
        .map_err(LlembaError::from)?;
    let runner = BulkRunner::new(ApiClient::new(backend, ClientConfig::from_settings(settings)));
    runner.scores(&rows, template, &cache, None).await
}
