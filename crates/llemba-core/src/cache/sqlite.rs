//! On-disk response cache backed by SQLite.
//!
//! One database per `{model}_{method}` namespace under the cache directory,
//! so re-running a scoring job re-serves every answered row from disk.

use super::{RequestKey, ResponseCache};
use crate::model::RawAnswer;
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const DB_FILE: &str = "responses.db";

pub struct SqliteCache {
    conn: Mutex<Connection>,
    path: PathBuf,
    /// Written alongside each entry; `None` for caches opened by path.
    model: Option<String>,
}

impl SqliteCache {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create cache dir {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open cache db {}", path.display()))?;
        init_schema_impl(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            model: None,
        })
    }

    /// Opens (creating if needed) the cache for one model/method pair.
    pub fn open_namespace(cache_dir: &Path, model: &str, method: &str) -> anyhow::Result<Self> {
        let mut cache = Self::open(&namespace_dir(cache_dir, model, method).join(DB_FILE))?;
        cache.model = Some(model.to_string());
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> anyhow::Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drops every entry in this namespace.
    pub fn clear(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM responses", [])
            .context("clear response cache")?;
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("response cache lock poisoned"))
    }
}

/// `{cache_dir}/{model}_{method}`. Model names such as `org/model` nest one
/// directory deeper, mirroring the model's own namespace.
pub fn namespace_dir(cache_dir: &Path, model: &str, method: &str) -> PathBuf {
    cache_dir.join(format!("{}_{}", model, method))
}

fn init_schema_impl(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS responses (
            key TEXT PRIMARY KEY,
            answers_json TEXT NOT NULL,
            model TEXT,
            created_at TEXT NOT NULL
        );",
    )
    .context("init response cache schema")?;
    migrate_add_model_impl(conn)
}

/// Databases created before the `model` column existed gain it in place.
fn migrate_add_model_impl(conn: &Connection) -> anyhow::Result<()> {
    let cols = get_columns_impl(conn, "responses")?;
    if !cols.contains("model") {
        conn.execute("ALTER TABLE responses ADD COLUMN model TEXT", [])
            .context("alter table add column")?;
    }
    Ok(())
}

fn get_columns_impl(conn: &Connection, table: &str) -> anyhow::Result<HashSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .context("prepare pragma table_info")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut out = HashSet::new();
    for r in rows {
        out.insert(r?);
    }
    Ok(out)
}

impl ResponseCache for SqliteCache {
    fn get(&self, key: &RequestKey) -> anyhow::Result<Option<Vec<RawAnswer>>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT answers_json FROM responses WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()
            .context("read response cache")?;

        match raw {
            Some(json) => {
                let answers = serde_json::from_str(&json)
                    .with_context(|| format!("corrupt cache entry {}", key))?;
                Ok(Some(answers))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &RequestKey, answers: &[RawAnswer]) -> anyhow::Result<()> {
        let json = serde_json::to_string(answers)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO responses (key, answers_json, model, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET answers_json = excluded.answers_json,
                                            model = excluded.model,
                                            created_at = excluded.created_at",
            params![
                key.as_str(),
                json,
                self.model.as_deref(),
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .context("write response cache")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FinishReason;
    use tempfile::tempdir;

    #[test]
    fn persists_across_reopen() {
        let tmp = tempdir().unwrap();
        let key = RequestKey::new("m", 0.0, "p", 200);
        let answers = vec![
            RawAnswer::stop("85"),
            RawAnswer::new("Score: 8", FinishReason::Length),
        ];

        {
            let cache = SqliteCache::open_namespace(tmp.path(), "m", "LLEMBA-DA").unwrap();
            assert_eq!(cache.get(&key).unwrap(), None);
            cache.put(&key, &answers).unwrap();
        }

        let cache = SqliteCache::open_namespace(tmp.path(), "m", "LLEMBA-DA").unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(answers));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn put_overwrites() {
        let tmp = tempdir().unwrap();
        let cache = SqliteCache::open(&tmp.path().join("c.db")).unwrap();
        let key = RequestKey::new("m", 0.0, "p", 200);

        cache.put(&key, &[]).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(vec![]));
        cache.put(&key, &[RawAnswer::stop("1")]).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(vec![RawAnswer::stop("1")]));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn namespaces_are_isolated() {
        let tmp = tempdir().unwrap();
        let key = RequestKey::new("m", 0.0, "p", 200);
        let da = SqliteCache::open_namespace(tmp.path(), "org/model", "LLEMBA-DA").unwrap();
        let stars = SqliteCache::open_namespace(tmp.path(), "org/model", "LLEMBA-stars").unwrap();

        da.put(&key, &[RawAnswer::stop("50")]).unwrap();
        assert_eq!(stars.get(&key).unwrap(), None);
        assert!(da.path().starts_with(tmp.path().join("org")));
    }

    #[test]
    fn clear_empties_namespace() {
        let tmp = tempdir().unwrap();
        let cache = SqliteCache::open(&tmp.path().join("c.db")).unwrap();
        cache
            .put(&RequestKey::new("m", 0.0, "a", 1), &[RawAnswer::stop("1")])
            .unwrap();
        cache
            .put(&RequestKey::new("m", 0.0, "b", 1), &[RawAnswer::stop("2")])
            .unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn entries_record_their_model() {
        let tmp = tempdir().unwrap();
        let cache = SqliteCache::open_namespace(tmp.path(), "org/model", "LLEMBA-DA").unwrap();
        cache
            .put(&RequestKey::new("org/model", 0.0, "p", 200), &[RawAnswer::stop("5")])
            .unwrap();

        let conn = cache.lock().unwrap();
        let model: Option<String> = conn
            .query_row("SELECT model FROM responses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(model.as_deref(), Some("org/model"));
    }

    #[test]
    fn old_schema_gains_model_column() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("old.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE responses (
                    key TEXT PRIMARY KEY,
                    answers_json TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                INSERT INTO responses VALUES ('k', '[]', '2024-01-01T00:00:00Z');",
            )
            .unwrap();
        }

        let cache = SqliteCache::open(&path).unwrap();
        assert_eq!(cache.len().unwrap(), 1);
        let cols = get_columns_impl(&cache.lock().unwrap(), "responses").unwrap();
        assert!(cols.contains("model"));
        cache
            .put(&RequestKey::new("m", 0.0, "p", 1), &[RawAnswer::stop("1")])
            .unwrap();
        assert_eq!(cache.len().unwrap(), 2);
    }
}
