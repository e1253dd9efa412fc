use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use groundwork_common::{Error, Result};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{error, info, warn};

/// Fixed advisory lock key shared by every runner instance. The lock is
/// transaction-scoped, so it disappears on commit and rollback alike.
const MIGRATION_LOCK_KEY: i64 = 0x6772_6f75_6e64_776b;

const CREATE_LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS migrations (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) UNIQUE NOT NULL,
    executed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// A row of the applied-migrations ledger. Rows are written once when a
/// script is applied and never touched again.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub id: i32,
    pub name: String,
    pub executed_at: Option<NaiveDateTime>,
}

/// A migration script read from disk. The body is opaque to the runner and
/// is handed to the database verbatim.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    pub name: String,
    pub body: String,
}

impl MigrationScript {
    async fn load(name: String, path: &Path) -> Result<Self> {
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Migration(format!("failed to read {}: {e}", path.display())))?;
        Ok(Self { name, body })
    }
}

/// Applies pending `.sql` scripts from a directory, exactly once each, in
/// ascending filename order, inside a single transaction.
///
/// Filenames are the only ordering guarantee; operators encode the desired
/// apply order with numeric or date prefixes. A run either commits every
/// pending script or rolls all of them back.
pub struct Migrator {
    pool: PgPool,
    dir: PathBuf,
    statement_timeout_ms: Option<u64>,
}

impl Migrator {
    pub fn new(pool: PgPool, dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            dir: dir.into(),
            statement_timeout_ms: None,
        }
    }

    /// Cap how long any single statement in the run may execute. Without
    /// this a hung query blocks the run indefinitely.
    pub fn with_statement_timeout_ms(mut self, ms: u64) -> Self {
        self.statement_timeout_ms = Some(ms);
        self
    }

    /// Bring the ledger up to date with the scripts on disk. Returns the
    /// number of newly applied scripts.
    pub async fn run(&self) -> Result<usize> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::Database(format!("failed to acquire connection: {e}")))?;
        let mut tx = conn
            .begin()
            .await
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;

        match self.apply_pending(&mut tx).await {
            Ok(applied) => {
                tx.commit()
                    .await
                    .map_err(|e| Error::Database(format!("failed to commit migrations: {e}")))?;
                info!("migrations completed: {applied} applied");
                Ok(applied)
            }
            Err(e) => {
                error!("migration run failed, rolling back: {e}");
                if let Err(rollback_err) = tx.rollback().await {
                    error!("rollback failed: {rollback_err}");
                }
                Err(e)
            }
        }
        // the connection drops here and returns to the pool on every path
    }

    async fn apply_pending(&self, tx: &mut Transaction<'_, Postgres>) -> Result<usize> {
        // Serialize concurrent runners on a fixed key before touching the ledger.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut **tx)
            .await
            .map_err(|e| Error::Database(format!("failed to take migration lock: {e}")))?;

        if let Some(ms) = self.statement_timeout_ms {
            // SET LOCAL cannot take bind parameters; the value is a number
            // straight from config.
            sqlx::query(&format!("SET LOCAL statement_timeout = {ms}"))
                .execute(&mut **tx)
                .await
                .map_err(|e| Error::Database(format!("failed to set statement timeout: {e}")))?;
        }

        sqlx::query(CREATE_LEDGER_SQL)
            .execute(&mut **tx)
            .await
            .map_err(|e| Error::Database(format!("failed to ensure migrations table: {e}")))?;

        let records: Vec<MigrationRecord> =
            sqlx::query_as("SELECT id, name, executed_at FROM migrations")
                .fetch_all(&mut **tx)
                .await
                .map_err(|e| Error::Database(format!("failed to read migrations ledger: {e}")))?;
        let applied: HashSet<String> = records.into_iter().map(|r| r.name).collect();

        let candidates = discover_scripts(&self.dir).await?;

        for name in &applied {
            if !candidates.iter().any(|(candidate, _)| candidate == name) {
                warn!(
                    "applied migration {name} has no file in {}",
                    self.dir.display()
                );
            }
        }

        let mut applied_count = 0;
        for (name, path) in candidates {
            if applied.contains(&name) {
                info!("skipping already executed migration: {name}");
                continue;
            }

            let script = MigrationScript::load(name, &path).await?;
            sqlx::raw_sql(&script.body)
                .execute(&mut **tx)
                .await
                .map_err(|e| Error::Migration(format!("{} failed: {e}", script.name)))?;
            sqlx::query("INSERT INTO migrations (name) VALUES ($1)")
                .bind(&script.name)
                .execute(&mut **tx)
                .await
                .map_err(|e| Error::Migration(format!("failed to record {}: {e}", script.name)))?;
            info!("executed migration: {}", script.name);
            applied_count += 1;
        }

        Ok(applied_count)
    }
}

/// Non-recursive scan of the migrations directory. Only regular files with a
/// `.sql` extension are candidates, sorted ascending by filename.
async fn discover_scripts(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        Error::Migration(format!(
            "failed to read migrations directory {}: {e}",
            dir.display()
        ))
    })?;

    let mut scripts = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::Migration(format!("failed to list {}: {e}", dir.display())))?
    {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| Error::Migration(format!("failed to stat {}: {e}", path.display())))?
            .is_file();
        if !is_file || path.extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }
        scripts.push((entry.file_name().to_string_lossy().into_owned(), path));
    }

    scripts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(scripts)
}
