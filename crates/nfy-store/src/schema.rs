/// SQL DDL for the nfy-store database.
/// WAL mode + foreign keys enabled at connection time.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS pending_messages (
    token TEXT PRIMARY KEY,
    author_id INTEGER NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS excluded_handles (
    token TEXT NOT NULL REFERENCES pending_messages(token),
    handle TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (token, handle)
);

CREATE TABLE IF NOT EXISTS reject_overrides (
    author_id INTEGER PRIMARY KEY,
    reject_text TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pending_created ON pending_messages(created_at);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
