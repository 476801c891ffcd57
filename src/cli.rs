//! Command orchestration for topicsort.
//!
//! Ties the pieces together for each command:
//! - discovery and filtering of the source tree
//! - classification into a move plan, with a progress bar
//! - execution or simulation of the plan
//! - rollback of the last live run

use crate::categorizer::Categorizer;
use crate::config::OrganizeConfig;
use crate::discovery::discover_files;
use crate::file_organizer::{FileOrganizer, MoveReport, OrganizeError, RunMode};
use crate::output::OutputFormatter;
use crate::undo::{RollbackOutcome, UndoManager};
use std::collections::HashMap;
use std::path::{self, Path, PathBuf};
use tracing::info;

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Classify and move files.
    Organize {
        /// If true, report the plan without touching the filesystem.
        dry_run: bool,
    },
    /// Restore the files moved by the last live run.
    Rollback,
}

/// Counts reported at the end of a command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Files moved, or that would be moved in a dry run.
    pub processed: usize,
    /// Files left in place, with or without an error.
    pub skipped: usize,
    /// Files that received a sniffed extension.
    pub renamed: usize,
    /// Files moved back by a rollback.
    pub restored: usize,
    /// Rollback entries that could not be restored.
    pub failed: usize,
    /// Files per category directory.
    pub category_counts: HashMap<String, usize>,
}

/// Runs `command` against `source` with an already loaded configuration.
///
/// # Examples
///
/// ```no_run
/// use topicsort::cli::{OrganizeCommand, run_cli};
/// use topicsort::config::OrganizeConfig;
/// use std::path::Path;
///
/// let config = OrganizeConfig::default();
/// let result = run_cli(OrganizeCommand::Organize { dry_run: true }, Path::new("/data"), &config);
/// match result {
///     Ok(summary) => println!("{} files would move", summary.processed),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(
    command: OrganizeCommand,
    source: &Path,
    config: &OrganizeConfig,
) -> Result<RunSummary, String> {
    let source = resolve_source(source)?;
    match command {
        OrganizeCommand::Organize { dry_run } => {
            let mode = if dry_run { RunMode::DryRun } else { RunMode::Live };
            organize(&source, config, mode)
        }
        OrganizeCommand::Rollback => rollback(&source, config),
    }
}

/// Loads the configuration (see [`OrganizeConfig::load`]) and runs `command`.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    source: &Path,
    config_path: Option<&Path>,
) -> Result<RunSummary, String> {
    let config = OrganizeConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    run_cli(command, source, &config)
}

/// Makes `source` absolute so the undo log stays valid from any working directory.
fn resolve_source(source: &Path) -> Result<PathBuf, String> {
    let invalid = || OrganizeError::InvalidBasePath {
        path: source.to_path_buf(),
    };
    if !source.is_dir() {
        return Err(invalid().to_string());
    }
    path::absolute(source).map_err(|_| invalid().to_string())
}

fn organize(source: &Path, config: &OrganizeConfig, mode: RunMode) -> Result<RunSummary, String> {
    let target_root = config.layout.target_root(source);
    let logs_dir = config.layout.logs_root(source);

    match mode {
        RunMode::DryRun => OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            source.display()
        )),
        RunMode::Live => OutputFormatter::info(&format!(
            "Organizing contents of: {}",
            source.display()
        )),
    }

    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let files = discover_files(source, &[&target_root, &logs_dir], &filters);
    info!("Discovered {} candidate files under {}", files.len(), source.display());

    if files.is_empty() {
        OutputFormatter::plain("No files found to organize.");
    }

    let categorizer = Categorizer::from_config(config, &target_root);
    let progress = OutputFormatter::create_progress_bar(files.len() as u64);
    let plan = categorizer.plan_with_progress(&files, |path| {
        if let Some(name) = path.file_name() {
            progress.set_message(name.to_string_lossy().to_string());
        }
        progress.inc(1);
    });
    progress.finish_and_clear();

    let organizer = FileOrganizer::new(&logs_dir, mode);
    let mut report = organizer
        .execute(plan)
        .map_err(|e| format!("Error saving undo log: {}", e))?;

    if config.cleanup_empty_dirs {
        organizer.prune_empty_dirs(source, &[&target_root, &logs_dir], &mut report);
    }

    print_moves(source, &report, mode);
    let summary = summarize(&report);
    OutputFormatter::summary_table(&summary.category_counts, summary.processed, summary.skipped);

    match mode {
        RunMode::DryRun => {
            OutputFormatter::success("Dry run complete. No files were modified.");
            OutputFormatter::plain(&format!(
                "Run 'topicsort {}' (without --dry-run) to execute the reorganization.",
                source.display()
            ));
        }
        RunMode::Live => {
            OutputFormatter::success("Reorganization complete!");
            if summary.renamed > 0 {
                OutputFormatter::plain(&format!(
                    "{} files received a detected script extension.",
                    summary.renamed
                ));
            }
            if !report.pruned_dirs.is_empty() {
                OutputFormatter::plain(&format!(
                    "Removed {} empty directories.",
                    report.pruned_dirs.len()
                ));
            }
            OutputFormatter::plain(&format!(
                "Undo log saved. Use 'topicsort {} --rollback' to revert changes.",
                source.display()
            ));
        }
    }

    Ok(summary)
}

fn print_moves(source: &Path, report: &MoveReport, mode: RunMode) {
    let verb = match mode {
        RunMode::Live => "Moved",
        RunMode::DryRun => "Would move",
    };
    if !report.moved.is_empty() {
        OutputFormatter::header(verb);
    }
    for (from, to) in &report.moved {
        OutputFormatter::plain(&format!(
            " - {} → {}",
            display_relative(source, from),
            display_relative(source, to)
        ));
    }
    let rename_verb = match mode {
        RunMode::Live => "Renamed",
        RunMode::DryRun => "Would rename",
    };
    for (source_path, kind) in &report.renamed {
        OutputFormatter::info(&format!(
            "{} {}: content detected as .{}",
            rename_verb,
            display_relative(source, source_path),
            kind.extension()
        ));
    }
    for skipped in &report.skipped {
        OutputFormatter::warning(&format!(
            "Skipped {}: {}",
            display_relative(source, &skipped.path),
            skipped.reason
        ));
    }
}

fn summarize(report: &MoveReport) -> RunSummary {
    let mut category_counts = HashMap::new();
    for (_, destination) in &report.moved {
        if let Some(category) = destination
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().to_string())
        {
            *category_counts.entry(category).or_insert(0) += 1;
        }
    }
    RunSummary {
        processed: report.moved.len(),
        skipped: report.skipped.len(),
        renamed: report.renamed.len(),
        category_counts,
        ..Default::default()
    }
}

fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn rollback(source: &Path, config: &OrganizeConfig) -> Result<RunSummary, String> {
    OutputFormatter::info("Rolling back previous reorganization...");
    let logs_dir = config.layout.logs_root(source);

    let report = match UndoManager::rollback(&logs_dir) {
        RollbackOutcome::NothingToRestore { reason } => {
            OutputFormatter::warning(&format!("{}. Nothing to restore.", reason));
            return Ok(RunSummary::default());
        }
        RollbackOutcome::Replayed(report) => report,
    };

    OutputFormatter::success(&format!("Restored: {}", report.restored_files));
    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
        }
    }
    if !report.failed_restores.is_empty() {
        OutputFormatter::error(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::error(&format!("    - {}: {}", path.display(), reason));
        }
        OutputFormatter::warning("Undo log was NOT deleted. Fix the issues above and rerun --rollback.");
    }

    Ok(RunSummary {
        restored: report.restored_files,
        skipped: report.skipped_files.len(),
        failed: report.failed_restores.len(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniffer::ScriptKind;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_summarize_counts_by_destination_directory() {
        let report = MoveReport {
            moved: vec![
                (PathBuf::from("/s/a.txt"), PathBuf::from("/s/organized/foo/foo_1.txt")),
                (PathBuf::from("/s/b.txt"), PathBuf::from("/s/organized/foo/foo_2.txt")),
                (PathBuf::from("/s/c.zip"), PathBuf::from("/s/organized/non_text_files/c.zip")),
            ],
            renamed: vec![(PathBuf::from("/s/a.txt"), ScriptKind::Python)],
            ..Default::default()
        };

        let summary = summarize(&report);

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.category_counts.get("foo"), Some(&2));
        assert_eq!(summary.category_counts.get("non_text_files"), Some(&1));
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let result = run_cli(
            OrganizeCommand::Organize { dry_run: true },
            &temp.path().join("missing"),
            &OrganizeConfig::default(),
        );
        assert!(result.unwrap_err().contains("Invalid source directory"));
    }

    #[test]
    fn test_file_as_source_is_rejected() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let file = temp.path().join("plain.txt");
        fs::write(&file, "hello").unwrap();

        let result = run_cli(OrganizeCommand::Rollback, &file, &OrganizeConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_display_relative_strips_root() {
        let root = Path::new("/data");
        assert_eq!(
            display_relative(root, Path::new("/data/organized/x.txt")),
            Path::new("organized/x.txt").display().to_string()
        );
        assert_eq!(display_relative(root, Path::new("/elsewhere/x")), "/elsewhere/x");
    }
}
