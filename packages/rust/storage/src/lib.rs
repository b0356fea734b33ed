//! Turso / libSQL storage layer for reconciled updates.
//!
//! The [`Storage`] struct wraps a libSQL database holding one row per
//! `unique_id` in the `updates` table.
//!
//! **Access rules:**
//! - `releasewatch run`: read-write via [`Storage::open`] / [`Storage::connect`]
//! - `releasewatch serve`: read-only via [`Storage::open_readonly`] / [`Storage::connect_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database, params};
use releasewatch_shared::{
    DatabaseConfig, DraftUpdate, PersistedUpdate, ReleaseWatchError, Result, UpdateId,
    expand_home,
};

/// Column list shared by every `SELECT` that feeds [`row_to_update`].
const UPDATE_COLUMNS: &str =
    "id, unique_id, tool, version, date, description, link, created_at, updated_at, revision";

/// Storage format of `updates.date`.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a local database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ReleaseWatchError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        Self::from_database(db, false).await
    }

    /// Open a local database at `path` in read-only mode (for the query API).
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        Self::from_database(db, true).await
    }

    /// Connect using a `[database]` config section, read-write.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.is_remote() {
            Self::open_remote(config, false).await
        } else {
            Self::open(&expand_home(&config.url)?).await
        }
    }

    /// Connect using a `[database]` config section, read-only.
    pub async fn connect_readonly(config: &DatabaseConfig) -> Result<Self> {
        if config.is_remote() {
            Self::open_remote(config, true).await
        } else {
            Self::open_readonly(&expand_home(&config.url)?).await
        }
    }

    async fn open_remote(config: &DatabaseConfig, readonly: bool) -> Result<Self> {
        tracing::debug!(url = %config.url, readonly, "connecting to remote libSQL");
        let db = libsql::Builder::new_remote(config.url.clone(), config.auth_token())
            .build()
            .await
            .map_err(storage_err)?;

        Self::from_database(db, readonly).await
    }

    async fn from_database(db: Database, readonly: bool) -> Result<Self> {
        let conn = db.connect().map_err(storage_err)?;
        let storage = Self { db, conn, readonly };
        if !readonly {
            storage.run_migrations().await?;
        }
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ReleaseWatchError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ReleaseWatchError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Update operations
    // -----------------------------------------------------------------------

    /// Point lookup by `unique_id`.
    pub async fn get_update(&self, unique_id: &UpdateId) -> Result<Option<PersistedUpdate>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {UPDATE_COLUMNS} FROM updates WHERE unique_id = ?1"),
                params![unique_id.as_str()],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_update(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Insert a new update.
    ///
    /// Returns [`ReleaseWatchError::Conflict`] when a row with the same
    /// `unique_id` already exists; the existing row is left untouched.
    pub async fn insert_update(&self, update: &PersistedUpdate) -> Result<()> {
        self.check_writable()?;
        let date = update.date.format(DATE_FORMAT).to_string();
        let inserted = self
            .conn
            .execute(
                "INSERT INTO updates (id, unique_id, tool, version, date, description, link, created_at, updated_at, revision)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(unique_id) DO NOTHING",
                params![
                    update.id.as_str(),
                    update.unique_id.as_str(),
                    update.tool.as_str(),
                    update.version.as_str(),
                    date.as_str(),
                    update.description.as_str(),
                    update.link.as_str(),
                    update.created_at.to_rfc3339(),
                    update.updated_at.to_rfc3339(),
                    update.revision,
                ],
            )
            .await
            .map_err(storage_err)?;

        if inserted == 0 {
            return Err(ReleaseWatchError::Conflict {
                unique_id: update.unique_id.to_string(),
            });
        }
        Ok(())
    }

    /// Overwrite `version`, `description` and `link` of an existing update.
    ///
    /// The write is conditional: it only applies when at least one of the
    /// three fields differs from `draft`, and returns whether a row changed.
    /// `created_at`, `date` and identity are never touched; `revision` is bumped.
    pub async fn update_content(&self, unique_id: &UpdateId, draft: &DraftUpdate) -> Result<bool> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE updates
                 SET version = ?1, description = ?2, link = ?3, updated_at = ?4, revision = revision + 1
                 WHERE unique_id = ?5
                   AND (version <> ?1 OR description <> ?2 OR link <> ?3)",
                params![
                    draft.version.as_str(),
                    draft.description.as_str(),
                    draft.link.as_str(),
                    now.as_str(),
                    unique_id.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;

        Ok(changed > 0)
    }

    /// List updates newest first, optionally filtered by a case-insensitive
    /// substring of `tool`.
    pub async fn list_updates(
        &self,
        tool_filter: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PersistedUpdate>> {
        let filter = tool_filter.map(str::trim).filter(|t| !t.is_empty());
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {UPDATE_COLUMNS} FROM updates
                     WHERE ?1 IS NULL OR instr(lower(tool), lower(?1)) > 0
                     ORDER BY date DESC, created_at DESC
                     LIMIT ?2"
                ),
                params![filter, limit],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_update(&row)?);
        }
        Ok(results)
    }

    /// Total number of stored updates.
    pub async fn count_updates(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM updates", params![])
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).map_err(storage_err)?.max(0) as u64),
            Ok(None) => Ok(0),
            Err(e) => Err(storage_err(e)),
        }
    }
}

/// Map any libSQL error into the storage variant.
fn storage_err(e: libsql::Error) -> ReleaseWatchError {
    ReleaseWatchError::Storage(e.to_string())
}

/// Convert a database row to a [`PersistedUpdate`].
fn row_to_update(row: &libsql::Row) -> Result<PersistedUpdate> {
    let date: String = row.get(4).map_err(storage_err)?;
    let created_at: String = row.get(7).map_err(storage_err)?;
    let updated_at: String = row.get(8).map_err(storage_err)?;

    Ok(PersistedUpdate {
        id: row.get::<String>(0).map_err(storage_err)?,
        unique_id: UpdateId(row.get::<String>(1).map_err(storage_err)?),
        tool: row.get::<String>(2).map_err(storage_err)?,
        version: row.get::<String>(3).map_err(storage_err)?,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| ReleaseWatchError::Storage(format!("invalid date '{date}': {e}")))?,
        description: row.get::<String>(5).map_err(storage_err)?,
        link: row.get::<String>(6).map_err(storage_err)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        revision: row.get::<i64>(9).map_err(storage_err)?.max(0) as u32,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ReleaseWatchError::Storage(format!("invalid timestamp '{s}': {e}")))
}
