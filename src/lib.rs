//! topicsort - reorganize a directory by what its files are about
//!
//! This library sniffs the script type of extension-less text files, derives a
//! category from each file's keywords, names files by category and content
//! fingerprint, and moves them under a target root. Every live run leaves an
//! undo log that restores the original layout exactly; dry runs only report.

pub mod categorizer;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod file_category;
pub mod file_organizer;
pub mod fingerprint;
pub mod keywords;
pub mod logging;
pub mod output;
pub mod sniffer;
pub mod undo;

pub use categorizer::{Categorizer, ClassifyError, FileRecord, MovePlan};
pub use config::{CompiledFilters, ConfigError, OrganizeConfig};
pub use file_organizer::{FileOrganizer, MoveReport, OrganizeError, RunMode};
pub use keywords::KeywordExtractor;
pub use sniffer::{ContentSniffer, ScriptKind};
pub use undo::{RollbackOutcome, RollbackReport, UndoLog, UndoManager};

pub use cli::{OrganizeCommand, RunSummary, run_cli};
