use crate::core::error;
use crate::core::time;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Append-only JSONL log of catalog mutations.
///
/// Every index/unindex/clear the catalog performs is recorded here with a
/// ULID event id. The journal is observability only: it never gates an
/// operation, and a site can be rebuilt without it.
pub struct Journal {
    log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JournalEvent {
    pub ts: String,
    pub event_id: String,
    pub op: String,
    pub subject: String,
    pub status: String,
}

impl Journal {
    pub fn new(root: &Path) -> Self {
        Self {
            log_path: root.join(crate::core::schemas::JOURNAL_NAME),
        }
    }

    /// Record one catalog mutation. `subject` is the catalog identifier
    /// the operation touched (or `*` for whole-catalog operations).
    pub fn log(&self, op: &str, subject: &str, status: &str) -> Result<(), error::MirrorkitError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let ev = JournalEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            op: op.to_string(),
            subject: subject.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(error::MirrorkitError::IoError)?;

        let line = serde_json::to_string(&ev)
            .map_err(|e| error::MirrorkitError::ValidationError(e.to_string()))?;
        writeln!(f, "{}", line).map_err(error::MirrorkitError::IoError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_appends_parseable_events() {
        let dir = tempfile::TempDir::new().unwrap();
        let journal = Journal::new(dir.path());
        journal.log("catalog.index", "abc", "success").unwrap();
        journal.log("catalog.unindex", "abc", "success").unwrap();

        let content =
            std::fs::read_to_string(dir.path().join(crate::core::schemas::JOURNAL_NAME)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let ev: JournalEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(ev.op, "catalog.index");
        assert_eq!(ev.subject, "abc");
        assert!(ulid::Ulid::from_string(&ev.event_id).is_ok());
    }
}
