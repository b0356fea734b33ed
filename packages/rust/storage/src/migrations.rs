//! SQL migration definitions for the ReleaseWatch database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: updates keyed by unique_id",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per reconciled release note
CREATE TABLE IF NOT EXISTS updates (
    id          TEXT PRIMARY KEY,
    unique_id   TEXT NOT NULL UNIQUE,
    tool        TEXT NOT NULL,
    version     TEXT NOT NULL,
    date        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    link        TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    revision    INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_updates_tool_date ON updates(tool, date DESC);
CREATE INDEX IF NOT EXISTS idx_updates_date ON updates(date DESC);

INSERT OR IGNORE INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
