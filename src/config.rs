//! Run configuration and file filtering.
//!
//! Configuration is read from a TOML file and controls where organized files
//! and logs go, how files are classified, and which files enter the walk.
//!
//! # Configuration File Format
//!
//! ```toml
//! cleanup_empty_dirs = false
//!
//! [layout]
//! target_dir = "organized"
//! logs_dir = "logs_and_temp"
//!
//! [classify]
//! max_keywords = 5
//! placeholder_extension = "txt"
//!
//! [filters]
//! enable_hidden_files = false
//! include_extensions = [".txt", ".py"]
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! ```

use crate::keywords::DEFAULT_MAX_KEYWORDS;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".topicsortrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// An inclusion extension did not start with a dot.
    #[error("Invalid extension '{0}': extensions must start with '.' (e.g. .txt)")]
    InvalidExtension(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeConfig {
    /// Remove directories left empty under the source root after a live run.
    #[serde(default)]
    pub cleanup_empty_dirs: bool,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub classify: ClassifyConfig,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Where organized files, the undo log, and the audit log are written.
///
/// Relative paths are resolved against the source root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("organized")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs_and_temp")
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

impl LayoutConfig {
    /// Returns the target root for a given source root.
    pub fn target_root(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.target_dir)
    }

    /// Returns the logs directory for a given source root.
    pub fn logs_root(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.logs_dir)
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Number of keywords joined into a category label.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    /// Generic extension (without the dot) whose files may be renamed after sniffing.
    #[serde(default = "default_placeholder_extension")]
    pub placeholder_extension: String,
}

fn default_max_keywords() -> usize {
    DEFAULT_MAX_KEYWORDS
}

fn default_placeholder_extension() -> String {
    "txt".to_string()
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            placeholder_extension: default_placeholder_extension(),
        }
    }
}

/// Rules deciding which discovered files enter the classification pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    /// Extensions to include, each starting with '.'. Empty means every file.
    #[serde(default)]
    pub include_extensions: Vec<String>,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the path relative to the source root.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl OrganizeConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.topicsortrc.toml` in the current directory
    /// 3. Look for `~/.config/topicsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("topicsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Replaces the inclusion filter, e.g. with extensions given on the command line.
    pub fn with_include_extensions(mut self, extensions: Vec<String>) -> Self {
        if !extensions.is_empty() {
            self.filters.include_extensions = extensions;
        }
        self
    }

    /// Compiles the filter rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob pattern is invalid or an extension lacks its leading dot.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    include_extensions: Option<HashSet<String>>,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let include_extensions = if rules.include_extensions.is_empty() {
            None
        } else {
            let set = rules
                .include_extensions
                .iter()
                .map(|ext| {
                    let ext = ext.trim().to_lowercase();
                    if ext.starts_with('.') && ext.len() > 1 {
                        Ok(ext)
                    } else {
                        Err(ConfigError::InvalidExtension(ext))
                    }
                })
                .collect::<Result<HashSet<_>, _>>()?;
            Some(set)
        };

        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            include_extensions,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_patterns,
        })
    }

    /// Whether hidden files and directories are walked at all.
    pub fn include_hidden(&self) -> bool {
        self.enable_hidden_files
    }

    /// Check if a file should enter the walk.
    ///
    /// `relative_path` is the file's path relative to the source root.
    /// Checks, in order: hidden files, exact filenames, glob patterns, and
    /// finally the inclusion extension set.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        match &self.include_extensions {
            None => true,
            Some(extensions) => relative_path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
                .is_some_and(|ext| extensions.contains(&ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> FilterRules {
        FilterRules {
            enable_hidden_files: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_layout() {
        let config = OrganizeConfig::default();
        let root = Path::new("/data");
        assert_eq!(config.layout.target_root(root), Path::new("/data/organized"));
        assert_eq!(config.layout.logs_root(root), Path::new("/data/logs_and_temp"));
        assert_eq!(config.classify.max_keywords, 5);
        assert_eq!(config.classify.placeholder_extension, "txt");
        assert!(!config.cleanup_empty_dirs);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = OrganizeConfig::from_toml(
            r#"
            cleanup_empty_dirs = true

            [layout]
            target_dir = "library"

            [filters]
            include_extensions = [".txt", ".PY"]
            "#,
        )
        .unwrap();

        assert!(config.cleanup_empty_dirs);
        assert_eq!(config.layout.target_dir, PathBuf::from("library"));
        assert_eq!(config.layout.logs_dir, PathBuf::from("logs_and_temp"));
        assert_eq!(config.classify.max_keywords, 5);
        assert_eq!(config.filters.include_extensions, vec![".txt", ".PY"]);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = OrganizeConfig::from_toml("[layout\ntarget_dir = 3");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_missing_explicit_config_returns_error() {
        let result = OrganizeConfig::load(Some(Path::new("/non/existent/topicsort.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_hidden_file_excluded_by_default() {
        let compiled = OrganizeConfig::default().compile_filters().unwrap();
        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(!compiled.should_include(Path::new("notes/.hidden.txt")));
        assert!(compiled.should_include(Path::new("notes/visible.txt")));
    }

    #[test]
    fn test_no_include_set_accepts_everything() {
        let compiled = CompiledFilters::new(&rules()).unwrap();
        assert!(compiled.should_include(Path::new("a.txt")));
        assert!(compiled.should_include(Path::new("Makefile")));
    }

    #[test]
    fn test_include_extensions() {
        let compiled = CompiledFilters::new(&FilterRules {
            include_extensions: vec![".txt".into(), ".PY".into()],
            ..rules()
        })
        .unwrap();

        assert!(compiled.should_include(Path::new("notes.txt")));
        assert!(compiled.should_include(Path::new("tool.py")));
        assert!(compiled.should_include(Path::new("LOUD.TXT")));
        assert!(!compiled.should_include(Path::new("photo.png")));
        assert!(!compiled.should_include(Path::new("README")));
    }

    #[test]
    fn test_include_extension_without_dot_is_rejected() {
        let result = CompiledFilters::new(&FilterRules {
            include_extensions: vec!["txt".into()],
            ..rules()
        });
        assert!(matches!(result, Err(ConfigError::InvalidExtension(_))));
    }

    #[test]
    fn test_cli_extensions_override_file() {
        let config = OrganizeConfig::default()
            .with_include_extensions(vec![".md".into()])
            .with_include_extensions(Vec::new());
        assert_eq!(config.filters.include_extensions, vec![".md"]);
    }

    #[test]
    fn test_exclude_filenames_and_patterns() {
        let compiled = CompiledFilters::new(&FilterRules {
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".into()],
                patterns: vec!["*.tmp".into(), "**/node_modules/**".into()],
            },
            ..rules()
        })
        .unwrap();

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(!compiled.should_include(Path::new("scratch.tmp")));
        assert!(!compiled.should_include(Path::new("web/node_modules/pkg/index.js")));
        assert!(compiled.should_include(Path::new("web/src/index.js")));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let result = CompiledFilters::new(&FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".into()],
                ..Default::default()
            },
            ..rules()
        });
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }
}
