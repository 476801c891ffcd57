//! Classification of discovered files into an immutable move plan.
//!
//! Each file is either routed to the reserved non-text bucket by extension, or
//! read, sniffed, keyword-ranked and fingerprinted to obtain a category and a
//! new name. The result is a [`MovePlan`] that the mover consumes once.

use crate::config::OrganizeConfig;
use crate::file_category::{ExtensionMapper, NON_TEXT_DIR, NonTextKind, category_label};
use crate::fingerprint::fingerprint;
use crate::keywords::KeywordExtractor;
use crate::sniffer::{ContentSniffer, ScriptKind};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Per-file failures during classification. The file is skipped, the run goes on.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("could not read file: {0}")]
    Read(#[from] io::Error),
    #[error("binary content detected ({mime})")]
    BinaryContent { mime: String },
    #[error("path is not valid UTF-8 and could not be restored exactly")]
    NonUtf8Path,
}

/// What the classification pass learned about a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// Routed by extension alone.
    NonText(NonTextKind),
    /// Text content, possibly sniffed as a script.
    Text { sniffed: Option<ScriptKind> },
}

/// A classified file. Lives only for the duration of a run.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub original_path: PathBuf,
    /// Effective extension without the dot, after any sniff-driven rename.
    pub extension: Option<String>,
    /// Decoded content; `None` for non-text files.
    pub content: Option<String>,
    pub category: String,
    pub new_name: String,
    pub kind: RecordKind,
}

impl FileRecord {
    /// Returns the script kind the file was re-typed as, if any.
    pub fn renamed_to(&self) -> Option<ScriptKind> {
        match self.kind {
            RecordKind::Text { sniffed } => sniffed,
            RecordKind::NonText(_) => None,
        }
    }
}

/// A single move in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Set when the placeholder extension is replaced by a sniffed one.
    pub renamed_to: Option<ScriptKind>,
}

/// All moves destined for one category directory.
#[derive(Debug, Clone)]
pub struct CategoryBucket {
    pub category: String,
    pub directory: PathBuf,
    pub moves: Vec<PlannedMove>,
}

/// A file left out of the plan, with its cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The complete, immutable result of the classification pass.
#[derive(Debug, Clone, Default)]
pub struct MovePlan {
    /// Target root the plan was computed against.
    pub target_root: PathBuf,
    /// Moves into the reserved non-text bucket, executed first.
    pub non_text: Vec<PlannedMove>,
    /// Category buckets in the order their first file was seen.
    pub buckets: Vec<CategoryBucket>,
    pub skipped: Vec<SkippedFile>,
}

impl MovePlan {
    /// Total number of planned moves.
    pub fn move_count(&self) -> usize {
        self.non_text.len() + self.buckets.iter().map(|b| b.moves.len()).sum::<usize>()
    }

}

/// Accumulates records into a [`MovePlan`], rejecting destination collisions.
struct PlanBuilder {
    plan: MovePlan,
    bucket_index: HashMap<String, usize>,
    claimed: HashMap<PathBuf, PathBuf>,
}

impl PlanBuilder {
    fn new(target_root: &Path) -> Self {
        Self {
            plan: MovePlan {
                target_root: target_root.to_path_buf(),
                ..Default::default()
            },
            bucket_index: HashMap::new(),
            claimed: HashMap::new(),
        }
    }

    fn add(&mut self, record: FileRecord) {
        let directory = self.plan.target_root.join(&record.category);
        let destination = directory.join(&record.new_name);

        if let Some(first) = self.claimed.get(&destination) {
            let reason = format!("duplicate of {}", first.display());
            warn!(
                "Skipping {}: {} (both map to {})",
                record.original_path.display(),
                reason,
                destination.display()
            );
            self.plan.skipped.push(SkippedFile {
                path: record.original_path,
                reason,
            });
            return;
        }
        self.claimed
            .insert(destination.clone(), record.original_path.clone());

        let planned = PlannedMove {
            renamed_to: record.renamed_to(),
            source: record.original_path,
            destination,
        };

        if matches!(record.kind, RecordKind::NonText(_)) {
            self.plan.non_text.push(planned);
            return;
        }

        let index = match self.bucket_index.get(&record.category).copied() {
            Some(index) => index,
            None => {
                self.plan.buckets.push(CategoryBucket {
                    category: record.category.clone(),
                    directory,
                    moves: Vec::new(),
                });
                let index = self.plan.buckets.len() - 1;
                self.bucket_index.insert(record.category, index);
                index
            }
        };
        self.plan.buckets[index].moves.push(planned);
    }

    fn skip(&mut self, path: &Path, error: &ClassifyError) {
        warn!("Error processing {}: {}", path.display(), error);
        self.plan.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason: error.to_string(),
        });
    }
}

/// Computes categories and new names for files.
///
/// # Examples
///
/// ```no_run
/// use topicsort::categorizer::Categorizer;
/// use topicsort::config::OrganizeConfig;
/// use std::path::{Path, PathBuf};
///
/// let config = OrganizeConfig::default();
/// let categorizer = Categorizer::from_config(&config, Path::new("/data/organized"));
/// let plan = categorizer.plan(&[PathBuf::from("/data/notes.txt")]);
/// println!("{} moves planned", plan.move_count());
/// ```
#[derive(Debug, Clone)]
pub struct Categorizer {
    target_root: PathBuf,
    placeholder_extension: String,
    mapper: ExtensionMapper,
    sniffer: ContentSniffer,
    extractor: KeywordExtractor,
}

impl Categorizer {
    pub fn new(
        target_root: &Path,
        placeholder_extension: &str,
        sniffer: ContentSniffer,
        extractor: KeywordExtractor,
    ) -> Self {
        Self {
            target_root: target_root.to_path_buf(),
            placeholder_extension: placeholder_extension.trim_start_matches('.').to_lowercase(),
            mapper: ExtensionMapper::default(),
            sniffer,
            extractor,
        }
    }

    /// Builds a categorizer with the built-in sniffer and the configured keyword count.
    pub fn from_config(config: &OrganizeConfig, target_root: &Path) -> Self {
        Self::new(
            target_root,
            &config.classify.placeholder_extension,
            ContentSniffer::default(),
            KeywordExtractor::new(config.classify.max_keywords),
        )
    }

    /// Classifies a single file.
    ///
    /// Non-text files are never opened. Text files are read and decoded
    /// lossily; content that `infer` recognises as a binary format is rejected.
    /// Paths that are not valid UTF-8 cannot be logged for undo and are rejected.
    pub fn classify(&self, path: &Path) -> Result<FileRecord, ClassifyError> {
        if path.to_str().is_none() {
            return Err(ClassifyError::NonUtf8Path);
        }
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string());

        if let Some(kind) = extension
            .as_deref()
            .and_then(|ext| self.mapper.non_text_kind(ext))
        {
            let new_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            return Ok(FileRecord {
                original_path: path.to_path_buf(),
                extension,
                content: None,
                category: NON_TEXT_DIR.to_string(),
                new_name,
                kind: RecordKind::NonText(kind),
            });
        }

        let bytes = fs::read(path)?;
        if let Some(detected) = infer::get(&bytes)
            && detected.matcher_type() != infer::MatcherType::Text
        {
            return Err(ClassifyError::BinaryContent {
                mime: detected.mime_type().to_string(),
            });
        }
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let script = self.sniffer.sniff(&content);
        // Phase one of the rename: only the identity changes here, the move applies it.
        let sniffed = if self.is_placeholder(extension.as_deref()) {
            script
        } else {
            None
        };
        let extension = match sniffed {
            Some(kind) => Some(kind.extension().to_string()),
            None => extension,
        };

        let keywords = if script.is_some() {
            self.extractor.extract_script(&content)
        } else {
            self.extractor.extract(&content)
        };
        let category = category_label(&keywords);
        let suffix = extension
            .as_deref()
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let new_name = format!("{}_{}{}", category, fingerprint(&content), suffix);

        debug!(
            "Classified {} as {} ({:?})",
            path.display(),
            category,
            keywords
        );

        Ok(FileRecord {
            original_path: path.to_path_buf(),
            extension,
            content: Some(content),
            category,
            new_name,
            kind: RecordKind::Text { sniffed },
        })
    }

    /// Classifies every file and assembles the move plan.
    pub fn plan(&self, files: &[PathBuf]) -> MovePlan {
        self.plan_with_progress(files, |_| {})
    }

    /// Like [`Categorizer::plan`], calling `on_file` after each file is handled.
    pub fn plan_with_progress(
        &self,
        files: &[PathBuf],
        mut on_file: impl FnMut(&Path),
    ) -> MovePlan {
        let mut builder = PlanBuilder::new(&self.target_root);
        for path in files {
            match self.classify(path) {
                Ok(record) => builder.add(record),
                Err(e) => builder.skip(path, &e),
            }
            on_file(path);
        }
        builder.plan
    }

    fn is_placeholder(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| ext.eq_ignore_ascii_case(&self.placeholder_extension))
    }
}
