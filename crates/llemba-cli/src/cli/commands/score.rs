use super::super::args::ScoreArgs;
use crate::exit_codes::SUCCESS;
use crate::io::{output_line, read_rows, with_language_names, write_jsonl};
use anyhow::Context;
use llemba_core::cache::{MemoryCache, ResponseCache, SqliteCache};
use llemba_core::client::{ApiClient, ClientConfig};
use llemba_core::config::{build_backend, Provider, Settings};
use llemba_core::report::default_progress_sink;
use llemba_core::runner::BulkRunner;
use llemba_core::template::lookup;
use llemba_core::LlembaError;
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;

pub async fn run(args: ScoreArgs) -> anyhow::Result<i32> {
    let settings = resolve_settings(&args)?;
    let template = lookup(&args.input.method)?;
    let backend = build_backend(&settings)?;

    let records = read_rows(&args.input.input)?;
    let rows: Vec<_> = records
        .iter()
        .map(|r| {
            if args.input.keep_lang_codes {
                r.row.clone()
            } else {
                with_language_names(&r.row)
            }
        })
        .collect();

    let cache: Box<dyn ResponseCache> = if args.no_cache {
        Box::new(MemoryCache::new())
    } else {
        let cache =
            SqliteCache::open_namespace(&settings.cache_dir, &settings.model, &template.name)
                .map_err(LlembaError::from)?;
        tracing::info!(path = %cache.path().display(), "using response cache");
        Box::new(cache)
    };

    let progress = (rows.len() > 1).then(default_progress_sink);
    let runner = BulkRunner::new(ApiClient::new(
        backend,
        ClientConfig::from_settings(&settings),
    ));
    let outcomes = runner
        .run(&rows, template, cache.as_ref(), progress)
        .await?;

    let lines: Vec<Value> = records
        .iter()
        .zip(&outcomes)
        .map(|(input, outcome)| output_line(input, outcome))
        .collect();

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_jsonl(BufWriter::new(file), &lines)?;
            tracing::info!(rows = lines.len(), path = %path.display(), "wrote scores");
        }
        None => write_jsonl(std::io::stdout().lock(), &lines)?,
    }
    Ok(SUCCESS)
}

/// Settings file, then `LLEMBA_*` environment, then flags.
fn resolve_settings(args: &ScoreArgs) -> Result<Settings, LlembaError> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .apply_env()?;

    if let Some(provider) = &args.provider {
        settings.provider = Provider::parse(provider)?;
    }
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(url) = &args.api_url {
        settings.api_url = Some(url.clone());
    }
    if let Some(samples) = args.samples {
        settings.samples = samples;
    }
    if let Some(dir) = &args.cache_dir {
        settings.cache_dir = dir.clone();
    }
    settings.verbose |= args.verbose;

    settings.validate()?;
    Ok(settings)
}
