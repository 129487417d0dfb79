//! SQL migration definitions for the vulnfeed database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

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
        description: "Initial schema: providers, known_exploited, ingest_runs",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per data source, refreshed on every ingestion run
CREATE TABLE IF NOT EXISTS providers (
    id           TEXT PRIMARY KEY,
    version      INTEGER NOT NULL,
    processor    TEXT NOT NULL,
    captured_at  TEXT NOT NULL,
    input_digest TEXT NOT NULL
);

-- Known-exploited-vulnerability entities, keyed by advisory id per provider
CREATE TABLE IF NOT EXISTS known_exploited (
    cve         TEXT NOT NULL,
    provider_id TEXT NOT NULL REFERENCES providers(id) ON DELETE CASCADE,
    blob_json   TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE(provider_id, cve)
);

CREATE INDEX IF NOT EXISTS idx_known_exploited_provider ON known_exploited(provider_id);
CREATE INDEX IF NOT EXISTS idx_known_exploited_cve ON known_exploited(cve);

-- Ingestion run history
CREATE TABLE IF NOT EXISTS ingest_runs (
    id          TEXT PRIMARY KEY,
    provider_id TEXT NOT NULL,
    started_at  TEXT NOT NULL,
    finished_at TEXT,
    stats_json  TEXT
);

CREATE INDEX IF NOT EXISTS idx_ingest_runs_provider ON ingest_runs(provider_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
