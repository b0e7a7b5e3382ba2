//! Database schema
//!
//! Every statement is guarded with `IF NOT EXISTS`, so applying the schema
//! to an existing database is a no-op.

use rusqlite::Connection;

/// Timestamps are unix milliseconds. `tools_fts` is an external-content
/// index over `tools`, kept in sync by the triggers below. Rows are never
/// deleted, so there is no delete trigger.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS providers (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL DEFAULT '',
    endpoint    TEXT NOT NULL,
    pubkey      TEXT NOT NULL,
    stake_claw  TEXT NOT NULL DEFAULT '0',
    reputation  INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL,
    last_seen   INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tools (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    version     TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    schema_json TEXT NOT NULL,
    pricing     TEXT NOT NULL,
    provider_id TEXT NOT NULL REFERENCES providers(id),
    endpoint    TEXT NOT NULL,
    timeout_ms  INTEGER NOT NULL DEFAULT 30000,
    tags        TEXT NOT NULL DEFAULT '',
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS tools_name_version_provider
    ON tools(name, version, provider_id) WHERE is_active = 1;

CREATE INDEX IF NOT EXISTS tools_created_at ON tools(created_at);

CREATE VIRTUAL TABLE IF NOT EXISTS tools_fts USING fts5(
    name, description, tags,
    content='tools',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS tools_fts_insert AFTER INSERT ON tools BEGIN
    INSERT INTO tools_fts(rowid, name, description, tags)
    VALUES (new.rowid, new.name, new.description, new.tags);
END;

CREATE TRIGGER IF NOT EXISTS tools_fts_update AFTER UPDATE ON tools BEGIN
    INSERT INTO tools_fts(tools_fts, rowid, name, description, tags)
    VALUES ('delete', old.rowid, old.name, old.description, old.tags);
    INSERT INTO tools_fts(rowid, name, description, tags)
    VALUES (new.rowid, new.name, new.description, new.tags);
END;

CREATE TABLE IF NOT EXISTS invocations (
    id              TEXT PRIMARY KEY,
    tool_id         TEXT NOT NULL REFERENCES tools(id),
    consumer_id     TEXT NOT NULL,
    input_hash      TEXT NOT NULL,
    output_hash     TEXT,
    receipt_sig     TEXT,
    status          TEXT NOT NULL DEFAULT 'pending',
    cost_claw       TEXT,
    escrow_id       TEXT,
    started_at      INTEGER NOT NULL,
    completed_at    INTEGER,
    error           TEXT
);

CREATE INDEX IF NOT EXISTS invocations_tool_id ON invocations(tool_id);
"#;

/// Per-connection settings applied by the pool on every new connection
pub(crate) fn connection_pragmas(busy_timeout_ms: u64) -> String {
    format!(
        "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout={};",
        busy_timeout_ms
    )
}

pub(crate) fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
