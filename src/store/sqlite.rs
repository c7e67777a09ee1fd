// src/store/sqlite.rs
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task;

use super::{url_key, ToolStore};
use crate::ingest::classify::Category;
use crate::ingest::error::StoreError;
use crate::ingest::types::{
    NewRunLog, NewTool, RunStatus, ScrapeRunLog, ToolPatch, ToolRecord,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ai_tools (
        id           INTEGER PRIMARY KEY,
        name         TEXT NOT NULL,
        description  TEXT NOT NULL,
        url          TEXT NOT NULL,
        url_key      TEXT NOT NULL,
        logo_url     TEXT,
        category     TEXT NOT NULL DEFAULT 'uncategorized',
        sub_category TEXT,
        tag          TEXT,
        pricing      TEXT,
        source_url   TEXT,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_ai_tools_name ON ai_tools(name);
    CREATE INDEX IF NOT EXISTS idx_ai_tools_url_key ON ai_tools(url_key);

    CREATE TABLE IF NOT EXISTS scrape_runs (
        id            INTEGER PRIMARY KEY,
        source        TEXT NOT NULL,
        status        TEXT NOT NULL CHECK(status IN ('success','failed')),
        items_found   INTEGER NOT NULL DEFAULT 0,
        items_added   INTEGER NOT NULL DEFAULT 0,
        items_updated INTEGER NOT NULL DEFAULT 0,
        items_failed  INTEGER NOT NULL DEFAULT 0,
        duration_secs INTEGER NOT NULL DEFAULT 0,
        error_message TEXT,
        created_at    TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_scrape_runs_created ON scrape_runs(created_at);
";

const TOOL_COLUMNS: &str = "id, name, description, url, logo_url, category, sub_category, \
                            tag, pricing, source_url, created_at, updated_at";

const RUN_COLUMNS: &str = "id, source, status, items_found, items_added, items_updated, \
                           items_failed, duration_secs, error_message, created_at";

/// SQLite-backed store. One connection behind a mutex; every query runs on
/// the blocking pool. `open` acquires the connection, `close` releases it
/// and reports errors, dropping releases it silently.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn close(self) -> Result<(), StoreError> {
        let conn = Arc::try_unwrap(self.conn)
            .map_err(|_| StoreError::InUse)?
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&guard)
        })
        .await?
    }
}

fn tool_from_row(row: &Row<'_>) -> rusqlite::Result<ToolRecord> {
    let category: String = row.get(5)?;
    Ok(ToolRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        url: row.get(3)?,
        logo_url: row.get(4)?,
        category: Category::from_slug(&category),
        sub_category: row.get(6)?,
        tag: row.get(7)?,
        pricing: row.get(8)?,
        source_url: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<ScrapeRunLog> {
    let status: String = row.get(2)?;
    Ok(ScrapeRunLog {
        id: row.get(0)?,
        source: row.get(1)?,
        // the CHECK constraint only admits the two known values
        status: RunStatus::parse(&status).unwrap_or(RunStatus::Failed),
        items_found: row.get(3)?,
        items_added: row.get(4)?,
        items_updated: row.get(5)?,
        items_failed: row.get(6)?,
        duration_secs: row.get::<_, i64>(7)?.max(0) as u64,
        error_message: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn get_tool(conn: &Connection, id: i64) -> Result<ToolRecord, StoreError> {
    conn.query_row(
        &format!("SELECT {TOOL_COLUMNS} FROM ai_tools WHERE id = ?1"),
        params![id],
        tool_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(id))
}

#[async_trait::async_trait]
impl ToolStore for SqliteStore {
    async fn find_by_identity(
        &self,
        name: &str,
        url: &str,
    ) -> Result<Option<ToolRecord>, StoreError> {
        let name = name.to_string();
        let key = url_key(url);
        self.with_conn(move |conn| {
            let found = conn
                .query_row(
                    &format!(
                        "SELECT {TOOL_COLUMNS} FROM ai_tools
                         WHERE name = ?1 OR url_key = ?2
                         ORDER BY id LIMIT 1"
                    ),
                    params![name, key],
                    tool_from_row,
                )
                .optional()?;
            Ok(found)
        })
        .await
    }

    async fn insert(&self, tool: NewTool) -> Result<ToolRecord, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO ai_tools
                 (name, description, url, url_key, logo_url, category, sub_category,
                  tag, pricing, source_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    tool.name,
                    tool.description,
                    tool.url,
                    url_key(&tool.url),
                    tool.logo_url,
                    tool.category.slug(),
                    tool.sub_category,
                    tool.tag,
                    tool.pricing,
                    tool.source_url,
                    tool.created_at,
                ],
            )?;
            get_tool(conn, conn.last_insert_rowid())
        })
        .await
    }

    async fn update(&self, id: i64, patch: ToolPatch) -> Result<ToolRecord, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE ai_tools
                 SET description = ?2, logo_url = ?3, category = ?4, sub_category = ?5,
                     tag = ?6, pricing = ?7, updated_at = ?8
                 WHERE id = ?1",
                params![
                    id,
                    patch.description,
                    patch.logo_url,
                    patch.category.slug(),
                    patch.sub_category,
                    patch.tag,
                    patch.pricing,
                    patch.updated_at,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            get_tool(conn, id)
        })
        .await
    }

    async fn log_run(&self, entry: NewRunLog) -> Result<ScrapeRunLog, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO scrape_runs
                 (source, status, items_found, items_added, items_updated, items_failed,
                  duration_secs, error_message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.source,
                    entry.status.as_str(),
                    entry.items_found,
                    entry.items_added,
                    entry.items_updated,
                    entry.items_failed,
                    entry.duration_secs as i64,
                    entry.error_message,
                    Utc::now(),
                ],
            )?;
            let log = conn.query_row(
                &format!("SELECT {RUN_COLUMNS} FROM scrape_runs WHERE id = ?1"),
                params![conn.last_insert_rowid()],
                run_from_row,
            )?;
            Ok(log)
        })
        .await
    }

    async fn list_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TOOL_COLUMNS} FROM ai_tools ORDER BY id"))?;
            let rows = stmt
                .query_map([], tool_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<ScrapeRunLog>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RUN_COLUMNS} FROM scrape_runs ORDER BY id DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit as i64], run_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tool(name: &str, url: &str) -> NewTool {
        NewTool {
            name: name.into(),
            description: format!("{name} is an AI tool"),
            url: url.into(),
            logo_url: None,
            category: Category::Other,
            sub_category: Some("Other".into()),
            tag: Some("AI Tools".into()),
            pricing: Some("unknown".into()),
            source_url: Some("https://example.com".into()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn identity_lookup_matches_name_or_url_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.insert(new_tool("Alpha", "https://a.io/x")).await.unwrap();

        let by_name = store.find_by_identity("Alpha", "https://other.io").await.unwrap();
        assert_eq!(by_name.map(|t| t.id), Some(a.id));

        let by_url = store.find_by_identity("Renamed", "https://A.io/x/").await.unwrap();
        assert_eq!(by_url.map(|t| t.id), Some(a.id));

        assert!(store.find_by_identity("Beta", "https://b.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let patch = ToolPatch {
            description: "d".into(),
            logo_url: None,
            category: Category::Code,
            sub_category: None,
            tag: None,
            pricing: None,
            updated_at: Utc::now(),
        };
        let err = store.update(42, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_the_connection() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .insert(new_tool(&format!("Tool {i}"), &format!("https://t{i}.io")))
                        .await
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(store.list_tools().await.unwrap().len(), 8);

        let store = Arc::try_unwrap(store).ok().expect("no other owners");
        store.close().unwrap();
    }
}
