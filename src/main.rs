use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use topicsort::cli::{OrganizeCommand, run_cli};
use topicsort::config::OrganizeConfig;
use topicsort::logging::init_logging;
use topicsort::output::OutputFormatter;
use topicsort::undo::UndoLog;

/// Reorganize a directory into keyword-derived categories.
#[derive(Parser, Debug)]
#[command(name = "topicsort", version, about)]
struct Args {
    /// Directory to reorganize
    directory: PathBuf,

    /// Show what would be moved without touching anything
    #[arg(long, conflicts_with = "rollback")]
    dry_run: bool,

    /// Restore every file moved by the last run
    #[arg(long)]
    rollback: bool,

    /// Only process these extensions, e.g. `.txt,.py`
    #[arg(long, value_delimiter = ',', value_name = "EXTENSIONS")]
    include: Vec<String>,

    /// Configuration file to use instead of the default lookup
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print debug-level events to the console
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match OrganizeConfig::load(args.config.as_deref()) {
        Ok(config) => config.with_include_extensions(args.include),
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let command = if args.rollback {
        OrganizeCommand::Rollback
    } else {
        OrganizeCommand::Organize {
            dry_run: args.dry_run,
        }
    };

    // Dry runs and rollbacks with nothing to restore must leave the tree untouched.
    let logs_dir = config.layout.logs_root(&args.directory);
    let audit_dir = match command {
        OrganizeCommand::Organize { dry_run: true } => None,
        OrganizeCommand::Rollback if !UndoLog::file_path(&logs_dir).exists() => None,
        _ if !args.directory.is_dir() => None,
        _ => Some(logs_dir),
    };

    let _guard = match init_logging(audit_dir.as_deref(), args.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            OutputFormatter::error(&e);
            return ExitCode::FAILURE;
        }
    };

    match run_cli(command, &args.directory, &config) {
        Ok(summary) if summary.failed > 0 => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
