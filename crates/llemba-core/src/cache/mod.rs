//! Response cache: request key -> raw answers.
//!
//! Entries are never evicted; a namespace is only ever cleared as a whole.
//! The cache is an explicit dependency of the client, there is no global.

pub mod key;
pub mod sqlite;

pub use key::RequestKey;
pub use sqlite::SqliteCache;

use crate::model::RawAnswer;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &RequestKey) -> anyhow::Result<Option<Vec<RawAnswer>>>;
    fn put(&self, key: &RequestKey, answers: &[RawAnswer]) -> anyhow::Result<()>;
}

/// Where a set of answers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Live,
}

/// Returns the cached answers for `key`, or runs `compute` and stores its result.
///
/// Only a non-empty stored list counts as a hit. An empty result is still
/// written, but the next lookup recomputes it.
pub async fn get_or_compute<F, Fut, E>(
    cache: &dyn ResponseCache,
    key: &RequestKey,
    compute: F,
) -> Result<(Vec<RawAnswer>, Source), E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<RawAnswer>, E>>,
    E: From<anyhow::Error>,
{
    if let Some(answers) = cache.get(key)? {
        if !answers.is_empty() {
            return Ok((answers, Source::Cache));
        }
    }

    let answers = compute().await?;
    cache.put(key, &answers)?;
    Ok((answers, Source::Live))
}

/// In-process cache, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<RequestKey, Vec<RawAnswer>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &RequestKey) -> anyhow::Result<Option<Vec<RawAnswer>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &RequestKey, answers: &[RawAnswer]) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        entries.insert(key.clone(), answers.to_vec());
        Ok(())
    }
}
