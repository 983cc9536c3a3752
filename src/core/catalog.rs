//! The site catalog: the full-text/metadata index behind search and
//! navigation.
//!
//! Mirrored content is indexed once per location. The master location owns
//! the plain row (`id == uid`); every mirror location owns a composite row
//! (`id == uid@mirror_uid`) whose path runs through the mirror. All rows
//! for one object share the same `uid`, which is what the placeless
//! resolver queries.

use crate::core::db;
use crate::core::error::MirrorkitError;
use crate::core::journal::Journal;
use crate::core::schemas;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub id: String,
    pub uid: String,
    pub path: String,
    pub kind: String,
    pub language: Option<String>,
    pub title: String,
    pub indexed_at: String,
}

pub struct Catalog {
    conn: Connection,
    journal: Journal,
}

fn row_from_stmt(row: &rusqlite::Row) -> rusqlite::Result<CatalogRow> {
    Ok(CatalogRow {
        id: row.get(0)?,
        uid: row.get(1)?,
        path: row.get(2)?,
        kind: row.get(3)?,
        language: row.get(4)?,
        title: row.get(5)?,
        indexed_at: row.get(6)?,
    })
}

const ROW_COLUMNS: &str = "id, uid, path, kind, language, title, indexed_at";

impl Catalog {
    pub fn open(root: &Path, db_name: &str) -> Result<Self, MirrorkitError> {
        std::fs::create_dir_all(root).map_err(MirrorkitError::IoError)?;
        let conn = db::db_connect(&root.join(db_name))?;
        conn.execute(schemas::CATALOG_DB_SCHEMA, [])?;
        conn.execute(schemas::CATALOG_DB_SCHEMA_UID_INDEX, [])?;
        conn.execute(schemas::CATALOG_DB_SCHEMA_PATH_INDEX, [])?;
        Ok(Self {
            conn,
            journal: Journal::new(root),
        })
    }

    /// Insert or refresh one catalog row, keyed by identifier.
    pub fn index_row(&self, row: &CatalogRow) -> Result<(), MirrorkitError> {
        let result = self
            .conn
            .execute(
                "INSERT INTO catalog (id, uid, path, kind, language, title, indexed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     uid = ?2, path = ?3, kind = ?4, language = ?5,
                     title = ?6, indexed_at = ?7",
                params![
                    row.id,
                    row.uid,
                    row.path,
                    row.kind,
                    row.language,
                    row.title,
                    row.indexed_at
                ],
            )
            .map(|_| ())
            .map_err(MirrorkitError::RusqliteError);
        let status = if result.is_ok() { "success" } else { "error" };
        self.journal.log("catalog.index", &row.id, status)?;
        result
    }

    /// Remove one row by identifier. Returns whether a row existed.
    pub fn unindex(&self, id: &str) -> Result<bool, MirrorkitError> {
        let result = self
            .conn
            .execute("DELETE FROM catalog WHERE id = ?1", params![id])
            .map_err(MirrorkitError::RusqliteError);
        let status = if result.is_ok() { "success" } else { "error" };
        self.journal.log("catalog.unindex", id, status)?;
        Ok(result? > 0)
    }

    /// Zero-or-more matches for an identifier (zero or one under the
    /// primary-key schema; callers still receive a match list).
    pub fn lookup(&self, id: &str) -> Result<Vec<CatalogRow>, MirrorkitError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ROW_COLUMNS} FROM catalog WHERE id = ?1"),
                params![id],
                row_from_stmt,
            )
            .optional()?;
        Ok(row.into_iter().collect())
    }

    /// Exactly-one lookup: zero or multiple matches is catalog drift and
    /// surfaces as a consistency error.
    pub fn lookup_unique(&self, id: &str) -> Result<CatalogRow, MirrorkitError> {
        let mut rows = self.lookup(id)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(MirrorkitError::ConsistencyError(format!(
                "expected exactly one catalog row for '{}', found none",
                id
            ))),
            n => Err(MirrorkitError::ConsistencyError(format!(
                "expected exactly one catalog row for '{}', found {}",
                id, n
            ))),
        }
    }

    /// All rows sharing a bare identifier, ordered by path. The plain row
    /// sorts alongside composite rows; callers pick the location they need.
    pub fn lookup_by_uid(&self, uid: &str) -> Result<Vec<CatalogRow>, MirrorkitError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM catalog WHERE uid = ?1 ORDER BY path"
        ))?;
        let rows = stmt
            .query_map(params![uid], row_from_stmt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Rows whose path is strictly inside `path` — the row at `path`
    /// itself is excluded, which is exactly the detach unindex scope.
    pub fn lookup_by_path_prefix(&self, path: &str) -> Result<Vec<CatalogRow>, MirrorkitError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM catalog
             WHERE substr(path, 1, length(?1) + 1) = ?1 || '/'
             ORDER BY path"
        ))?;
        let rows = stmt
            .query_map(params![path], row_from_stmt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn clear(&self) -> Result<(), MirrorkitError> {
        let result = self
            .conn
            .execute("DELETE FROM catalog", [])
            .map(|_| ())
            .map_err(MirrorkitError::RusqliteError);
        let status = if result.is_ok() { "success" } else { "error" };
        self.journal.log("catalog.clear", "*", status)?;
        result
    }

    pub fn len(&self) -> Result<usize, MirrorkitError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn is_empty(&self) -> Result<bool, MirrorkitError> {
        Ok(self.len()? == 0)
    }
}
