/// Undo log persistence and rollback of a previous reorganization.
///
/// The undo log maps each destination path to the path the file came from.
/// It is written after a live run and consumed by [`UndoManager::rollback`],
/// which moves files back in reverse order and then deletes the log.
use crate::file_organizer::{OrganizeError, OrganizeResult, move_file};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the undo log inside the logs directory.
pub const UNDO_LOG_FILE: &str = "file_movement_log.json";

/// One completed move: the file now at `destination` came from `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub destination: PathBuf,
    pub source: PathBuf,
}

/// Ordered record of completed moves, keyed by destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
    // destination -> position in `entries`
    index: HashMap<PathBuf, usize>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed move. A later entry for the same destination replaces the earlier one.
    pub fn record(&mut self, destination: PathBuf, source: PathBuf) {
        if let Some(&position) = self.index.get(&destination) {
            self.entries.remove(position);
            for slot in self.index.values_mut() {
                if *slot > position {
                    *slot -= 1;
                }
            }
        }
        self.index.insert(destination.clone(), self.entries.len());
        self.entries.push(UndoEntry {
            destination,
            source,
        });
    }

    /// Entries in the order the moves happened.
    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the path of the undo log inside `logs_dir`.
    pub fn file_path(logs_dir: &Path) -> PathBuf {
        logs_dir.join(UNDO_LOG_FILE)
    }

    /// Writes the log as a JSON object with 4-space indentation, replacing any previous log.
    pub fn save(&self, logs_dir: &Path) -> OrganizeResult<()> {
        fs::create_dir_all(logs_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: logs_dir.to_path_buf(),
            source: e,
        })?;

        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|e| {
                (
                    e.destination.to_string_lossy().to_string(),
                    Value::String(e.source.to_string_lossy().to_string()),
                )
            })
            .collect();

        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        Value::Object(map)
            .serialize(&mut serializer)
            .map_err(|e| OrganizeError::HistoryWriteFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            })?;

        fs::write(Self::file_path(logs_dir), buffer)
            .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })
    }

    /// Loads the undo log from `logs_dir`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a
    /// JSON object of path strings.
    pub fn load(logs_dir: &Path) -> OrganizeResult<Option<Self>> {
        let path = Self::file_path(logs_dir);
        if !path.exists() {
            return Ok(None);
        }

        let text =
            fs::read_to_string(&path).map_err(|e| OrganizeError::HistoryReadFailed { source: e })?;

        let json: Value =
            serde_json::from_str(&text).map_err(|e| OrganizeError::InvalidHistoryFormat {
                reason: format!("JSON parse error: {}", e),
            })?;

        let map = json
            .as_object()
            .ok_or_else(|| OrganizeError::InvalidHistoryFormat {
                reason: "expected an object mapping destination to source".to_string(),
            })?;

        let mut log = Self::new();
        for (destination, source) in map {
            let source = source
                .as_str()
                .ok_or_else(|| OrganizeError::InvalidHistoryFormat {
                    reason: format!("source for '{}' is not a string", destination),
                })?;
            log.record(PathBuf::from(destination), PathBuf::from(source));
        }
        Ok(Some(log))
    }

    /// Deletes the undo log in `logs_dir` if present.
    pub fn delete(logs_dir: &Path) -> OrganizeResult<()> {
        let path = Self::file_path(logs_dir);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| OrganizeError::HistoryWriteFailed { source: e })?;
        }
        Ok(())
    }
}

/// Outcome of a rollback request.
#[derive(Debug)]
pub enum RollbackOutcome {
    /// No usable undo log; nothing was touched.
    NothingToRestore { reason: String },
    /// The log was replayed.
    Replayed(RollbackReport),
}

/// What a replayed rollback did.
#[derive(Debug, Default)]
pub struct RollbackReport {
    /// Number of files moved back to their source.
    pub restored_files: usize,
    /// Entries whose destination no longer exists.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Entries that could not be restored.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Whether the undo log was deleted afterwards.
    pub log_deleted: bool,
}

enum RestoreError {
    Missing,
    Failed(String),
}

/// Replays undo logs.
pub struct UndoManager;

impl UndoManager {
    /// Restores the files recorded in the undo log in `logs_dir`.
    ///
    /// Entries are replayed newest first. An entry whose destination is gone
    /// is skipped. The log is deleted afterwards unless an entry failed for
    /// another reason, in which case it is kept so the rollback can be rerun.
    ///
    /// A missing or unreadable log is reported as
    /// [`RollbackOutcome::NothingToRestore`] and leaves the filesystem untouched.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use topicsort::undo::{RollbackOutcome, UndoManager};
    /// use std::path::Path;
    ///
    /// match UndoManager::rollback(Path::new("/data/logs_and_temp")) {
    ///     RollbackOutcome::NothingToRestore { reason } => println!("{}", reason),
    ///     RollbackOutcome::Replayed(report) => println!("Restored {}", report.restored_files),
    /// }
    /// ```
    pub fn rollback(logs_dir: &Path) -> RollbackOutcome {
        let log = match UndoLog::load(logs_dir) {
            Ok(Some(log)) => log,
            Ok(None) => {
                return RollbackOutcome::NothingToRestore {
                    reason: "No rollback data found".to_string(),
                };
            }
            Err(e) => {
                warn!("Ignoring undo log: {}", e);
                return RollbackOutcome::NothingToRestore {
                    reason: e.to_string(),
                };
            }
        };

        let mut report = RollbackReport::default();
        for entry in log.entries().iter().rev() {
            match Self::restore_file(entry) {
                Ok(()) => {
                    info!(
                        "Rolled back: {} -> {}",
                        entry.destination.display(),
                        entry.source.display()
                    );
                    report.restored_files += 1;
                }
                Err(RestoreError::Missing) => {
                    info!(
                        "Already resolved, skipping: {}",
                        entry.destination.display()
                    );
                    report.skipped_files.push((
                        entry.destination.clone(),
                        "File not found at expected location".to_string(),
                    ));
                }
                Err(RestoreError::Failed(reason)) => {
                    warn!(
                        "Could not restore {}: {}",
                        entry.destination.display(),
                        reason
                    );
                    report
                        .failed_restores
                        .push((entry.destination.clone(), reason));
                }
            }
        }

        if report.failed_restores.is_empty() {
            match UndoLog::delete(logs_dir) {
                Ok(()) => report.log_deleted = true,
                Err(e) => warn!("Could not delete undo log: {}", e),
            }
        }

        RollbackOutcome::Replayed(report)
    }

    fn restore_file(entry: &UndoEntry) -> Result<(), RestoreError> {
        if !entry.destination.exists() {
            return Err(RestoreError::Missing);
        }

        if let Some(parent) = entry.source.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RestoreError::Failed(format!(
                    "Could not recreate {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        if entry.source.exists() {
            let backup_path = Self::generate_backup_path(&entry.source);
            fs::rename(&entry.source, &backup_path).map_err(|e| {
                RestoreError::Failed(format!("Could not backup conflicting file: {}", e))
            })?;
            warn!(
                "Backed up conflicting file {} to {}",
                entry.source.display(),
                backup_path.display()
            );
        }

        move_file(&entry.destination, &entry.source)
            .map_err(|e| RestoreError::Failed(e.to_string()))
    }

    /// Generates a backup path for a file by appending a timestamp.
    ///
    /// Example: `notes.txt` becomes `notes.txt.bak.20251109-143052`
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");

        let backup_name = format!("{}.bak.{}", filename, timestamp);

        match original_path.parent() {
            Some(parent) => parent.join(backup_name),
            None => PathBuf::from(backup_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn replayed(outcome: RollbackOutcome) -> RollbackReport {
        match outcome {
            RollbackOutcome::Replayed(report) => report,
            RollbackOutcome::NothingToRestore { reason } => {
                panic!("expected a replay, got nothing to restore: {}", reason)
            }
        }
    }

    #[test]
    fn test_save_and_load_preserves_order() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let logs = temp.path().join("logs");

        let mut log = UndoLog::new();
        log.record(PathBuf::from("/t/z/z.txt"), PathBuf::from("/s/z.txt"));
        log.record(PathBuf::from("/t/a/a.txt"), PathBuf::from("/s/a.txt"));
        log.save(&logs).expect("Failed to save undo log");

        let loaded = UndoLog::load(&logs).unwrap().unwrap();
        assert_eq!(loaded, log);
    }

    #[test]
    fn test_saved_log_is_indented_object() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let mut log = UndoLog::new();
        log.record(PathBuf::from("/t/a.txt"), PathBuf::from("/s/a.txt"));
        log.save(temp.path()).unwrap();

        let text = fs::read_to_string(UndoLog::file_path(temp.path())).unwrap();
        assert_eq!(text, "{\n    \"/t/a.txt\": \"/s/a.txt\"\n}");
    }

    #[test]
    fn test_record_same_destination_replaces() {
        let mut log = UndoLog::new();
        log.record(PathBuf::from("/t/a"), PathBuf::from("/s/1"));
        log.record(PathBuf::from("/t/b"), PathBuf::from("/s/b"));
        log.record(PathBuf::from("/t/a"), PathBuf::from("/s/2"));
        log.record(PathBuf::from("/t/b"), PathBuf::from("/s/3"));

        let sources: Vec<_> = log.entries().iter().map(|e| e.source.clone()).collect();
        assert_eq!(sources, vec![PathBuf::from("/s/2"), PathBuf::from("/s/3")]);
    }

    #[test]
    fn test_large_log_keeps_every_entry_in_order() {
        let mut log = UndoLog::new();
        for i in 0..20_000 {
            log.record(
                PathBuf::from(format!("/t/{}", i)),
                PathBuf::from(format!("/s/{}", i)),
            );
        }
        assert_eq!(log.len(), 20_000);
        assert_eq!(log.entries()[19_999].source, PathBuf::from("/s/19999"));
    }

    #[test]
    fn test_rollback_without_log_is_nothing_to_restore() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let outcome = UndoManager::rollback(&temp.path().join("logs"));
        assert!(matches!(outcome, RollbackOutcome::NothingToRestore { .. }));
        assert!(!temp.path().join("logs").exists());
    }

    #[test]
    fn test_rollback_with_malformed_log_is_nothing_to_restore() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        fs::write(UndoLog::file_path(temp.path()), "[1, 2, 3]").unwrap();

        let outcome = UndoManager::rollback(temp.path());

        assert!(matches!(outcome, RollbackOutcome::NothingToRestore { .. }));
        assert!(UndoLog::file_path(temp.path()).exists());
    }

    #[test]
    fn test_rollback_restores_and_deletes_log() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();
        let source = root.join("deep/dir/notes.txt");
        let destination = root.join("organized/foo/foo_00000000.py");
        fs::create_dir_all(destination.parent().unwrap()).unwrap();
        fs::write(&destination, "def foo(): pass").unwrap();

        let mut log = UndoLog::new();
        log.record(destination.clone(), source.clone());
        log.save(root).unwrap();

        let report = replayed(UndoManager::rollback(root));

        assert_eq!(report.restored_files, 1);
        assert!(report.log_deleted);
        assert_eq!(fs::read_to_string(&source).unwrap(), "def foo(): pass");
        assert!(!destination.exists());
        assert!(!UndoLog::file_path(root).exists());
    }

    #[test]
    fn test_rollback_skips_missing_destination() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();

        let mut log = UndoLog::new();
        log.record(root.join("organized/gone.txt"), root.join("gone.txt"));
        log.save(root).unwrap();

        let report = replayed(UndoManager::rollback(root));

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.skipped_files.len(), 1);
        assert!(report.failed_restores.is_empty());
        assert!(report.log_deleted);
        assert!(!root.join("gone.txt").exists());
    }

    #[test]
    fn test_rollback_backs_up_conflicting_file() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();
        let source = root.join("notes.txt");
        let destination = root.join("organized/notes.txt");
        fs::create_dir_all(destination.parent().unwrap()).unwrap();
        fs::write(&destination, "original content").unwrap();
        fs::write(&source, "new content").unwrap();

        let mut log = UndoLog::new();
        log.record(destination, source.clone());
        log.save(root).unwrap();

        let report = replayed(UndoManager::rollback(root));

        assert_eq!(report.restored_files, 1);
        assert_eq!(fs::read_to_string(&source).unwrap(), "original content");
        let backups: Vec<_> = fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".bak."))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_rollback_rerun_is_idempotent() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();
        let source = root.join("a.txt");
        let destination = root.join("organized/a.txt");
        fs::create_dir_all(destination.parent().unwrap()).unwrap();
        fs::write(&destination, "alpha").unwrap();

        let mut log = UndoLog::new();
        log.record(destination.clone(), source.clone());
        // Simulate an interrupted rollback: the file is back but the log survived.
        fs::rename(&destination, &source).unwrap();
        log.save(root).unwrap();

        let report = replayed(UndoManager::rollback(root));

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(fs::read_to_string(&source).unwrap(), "alpha");
        assert!(!UndoLog::file_path(root).exists());
    }
}
