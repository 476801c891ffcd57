/// Execution of a move plan.
///
/// [`FileOrganizer::execute`] walks a [`MovePlan`] bucket by bucket. In a live
/// run every successful move is appended to an [`UndoLog`], which is persisted
/// once all moves are done. In a dry run nothing on disk changes.
use crate::categorizer::{MovePlan, PlannedMove, SkippedFile};
use crate::file_category::NON_TEXT_DIR;
use crate::sniffer::ScriptKind;
use crate::undo::UndoLog;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a category or logs directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Refused to overwrite an existing file.
    #[error("Destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },
    /// The source directory path is invalid or doesn't exist.
    #[error("Invalid source directory {}", .path.display())]
    InvalidBasePath { path: PathBuf },
    /// Failed to write the undo log.
    #[error("Failed to write undo log: {source}")]
    HistoryWriteFailed { source: io::Error },
    /// Failed to read the undo log.
    #[error("Failed to read undo log: {source}")]
    HistoryReadFailed { source: io::Error },
    /// The undo log has an invalid format.
    #[error("Invalid undo log format: {reason}")]
    InvalidHistoryFormat { reason: String },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Whether a run touches the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Perform moves and persist the undo log.
    Live,
    /// Report intended moves only.
    DryRun,
}

/// What [`FileOrganizer::execute`] did, or would do in a dry run.
#[derive(Debug, Default)]
pub struct MoveReport {
    /// Moves performed (live) or intended (dry run), as `(source, destination)`.
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Files not moved, including those the plan already skipped.
    pub skipped: Vec<SkippedFile>,
    /// Placeholder-extension files given a sniffed extension, by source path.
    pub renamed: Vec<(PathBuf, ScriptKind)>,
    /// Directories removed by empty-directory cleanup.
    pub pruned_dirs: Vec<PathBuf>,
    /// The undo log written by a live run.
    pub undo_log: Option<UndoLog>,
}

/// Moves `from` to `to`, falling back to copy and remove when a rename is not possible.
pub fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let rename_error = match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    // Rename fails across filesystems; copy then remove is the best effort there.
    if fs::copy(from, to).is_err() {
        return Err(OrganizeError::FileMoveFailure {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: rename_error,
        });
    }
    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(OrganizeError::FileMoveFailure {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// Applies move plans under a target root and records them for undo.
pub struct FileOrganizer {
    logs_dir: PathBuf,
    mode: RunMode,
}

impl FileOrganizer {
    /// Creates an organizer that writes its undo log into `logs_dir`.
    pub fn new(logs_dir: &Path, mode: RunMode) -> Self {
        Self {
            logs_dir: logs_dir.to_path_buf(),
            mode,
        }
    }

    /// Executes (or simulates) `plan`.
    ///
    /// Non-text files are moved first, then each category bucket in plan
    /// order. A failed directory creation or move skips the affected files
    /// and never aborts the batch; only completed moves enter the undo log.
    /// A live run then writes the undo log, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error only if the undo log cannot be written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use topicsort::categorizer::MovePlan;
    /// use topicsort::file_organizer::{FileOrganizer, RunMode};
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new(Path::new("/data/logs_and_temp"), RunMode::DryRun);
    /// let report = organizer.execute(MovePlan::default()).unwrap();
    /// assert!(report.undo_log.is_none());
    /// ```
    pub fn execute(&self, plan: MovePlan) -> OrganizeResult<MoveReport> {
        let mut report = MoveReport {
            skipped: plan.skipped,
            ..Default::default()
        };
        let mut undo_log = UndoLog::new();

        if !plan.non_text.is_empty() {
            let directory = plan.target_root.join(NON_TEXT_DIR);
            self.execute_bucket(&directory, plan.non_text, &mut report, &mut undo_log);
        }
        for bucket in plan.buckets {
            self.execute_bucket(&bucket.directory, bucket.moves, &mut report, &mut undo_log);
        }

        if self.mode == RunMode::Live {
            undo_log.save(&self.logs_dir)?;
            info!(
                "Undo log with {} entries saved to {}",
                undo_log.len(),
                UndoLog::file_path(&self.logs_dir).display()
            );
            report.undo_log = Some(undo_log);
        }

        Ok(report)
    }

    fn execute_bucket(
        &self,
        directory: &Path,
        moves: Vec<PlannedMove>,
        report: &mut MoveReport,
        undo_log: &mut UndoLog,
    ) {
        if self.mode == RunMode::Live
            && let Err(e) = fs::create_dir_all(directory)
        {
            let error = OrganizeError::DirectoryCreationFailed {
                path: directory.to_path_buf(),
                source: e,
            };
            warn!("{}", error);
            for planned in moves {
                report.skipped.push(SkippedFile {
                    path: planned.source,
                    reason: error.to_string(),
                });
            }
            return;
        }

        for planned in moves {
            match self.apply(&planned) {
                Ok(()) => {
                    if let Some(kind) = planned.renamed_to {
                        report.renamed.push((planned.source.clone(), kind));
                        info!(
                            "{}: {} detected as .{}",
                            if self.mode == RunMode::Live { "Renamed" } else { "Would rename" },
                            planned.source.display(),
                            kind.extension()
                        );
                    }
                    info!(
                        "{} {} -> {}",
                        if self.mode == RunMode::Live { "Moved" } else { "Would move" },
                        planned.source.display(),
                        planned.destination.display()
                    );
                    if self.mode == RunMode::Live {
                        undo_log.record(planned.destination.clone(), planned.source.clone());
                    }
                    report.moved.push((planned.source, planned.destination));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", planned.source.display(), e);
                    report.skipped.push(SkippedFile {
                        path: planned.source,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn apply(&self, planned: &PlannedMove) -> OrganizeResult<()> {
        if planned.destination.exists() {
            return Err(OrganizeError::DestinationExists {
                path: planned.destination.clone(),
            });
        }
        match self.mode {
            RunMode::Live => move_file(&planned.source, &planned.destination),
            RunMode::DryRun => Ok(()),
        }
    }

    /// Removes directories under `root` left empty by a live run.
    ///
    /// `root` itself and the `keep` subtrees are never removed. Does nothing in a dry run.
    pub fn prune_empty_dirs(&self, root: &Path, keep: &[&Path], report: &mut MoveReport) {
        if self.mode == RunMode::DryRun {
            return;
        }

        let mut candidates: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| !keep.iter().any(|dir| entry.path() == *dir))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();
        // Children before parents, so emptied parents are removed in the same pass.
        candidates.reverse();

        for dir in candidates {
            let is_empty = fs::read_dir(&dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !is_empty {
                continue;
            }
            match fs::remove_dir(&dir) {
                Ok(()) => {
                    info!("Removed empty directory: {}", dir.display());
                    report.pruned_dirs.push(dir);
                }
                Err(e) => warn!("Error removing directory {}: {}", dir.display(), e),
            }
        }
    }
}
