//! Centralized schema and file-name constants for mirrorkit's state root.
//!
//! One SQLite database holds the catalog: the full-text/metadata index the
//! site uses for search and navigation. Content that is mirrored appears
//! in the catalog once per location, each row under its own identifier.

pub const CATALOG_DB_NAME: &str = "catalog.db";
pub const JOURNAL_NAME: &str = "catalog.events.jsonl";
pub const CONFIG_NAME: &str = "mirror.toml";

pub const CATALOG_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS catalog (
        id TEXT PRIMARY KEY,
        uid TEXT NOT NULL,
        path TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL,
        language TEXT,
        title TEXT NOT NULL DEFAULT '',
        indexed_at TEXT NOT NULL
    )
";

pub const CATALOG_DB_SCHEMA_UID_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_catalog_uid ON catalog(uid)";

pub const CATALOG_DB_SCHEMA_PATH_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_catalog_path ON catalog(path)";
