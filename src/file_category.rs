/// Category labels and non-text file kinds.
///
/// Text files are filed under a label built from their keywords; files whose
/// extension names a binary container are filed under a single reserved
/// bucket without ever being read.
///
/// # Examples
///
/// ```
/// use topicsort::file_category::{category_label, ExtensionMapper, NonTextKind};
///
/// let mapper = ExtensionMapper::default();
/// assert_eq!(mapper.non_text_kind("png"), Some(NonTextKind::Image));
/// assert_eq!(mapper.non_text_kind("txt"), None);
///
/// assert_eq!(category_label(&["budget".into(), "q3".into()]), "budget_q3");
/// assert_eq!(category_label(&[]), "miscellaneous");
/// ```
use std::collections::HashMap;

/// Directory name of the reserved bucket for non-text files.
pub const NON_TEXT_DIR: &str = "non_text_files";

/// Label used when no keyword could be extracted.
pub const FALLBACK_CATEGORY: &str = "miscellaneous";

/// Suffix appended to labels that collide with a reserved name.
pub const RESERVED_SUFFIX: &str = "_file";

/// Longest label kept, in bytes. Labels are ASCII after sanitizing.
pub const MAX_LABEL_LEN: usize = 64;

/// Device names Windows refuses as file or directory names.
pub const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Kinds of files that are never content-inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonTextKind {
    /// Compressed archives (ZIP, RAR, 7Z, etc.)
    Archive,
    /// Executables and shared libraries
    Executable,
    /// Binary documents (PDF, DOCX, etc.)
    Document,
    /// Image files
    Image,
    /// Video files
    Video,
}

/// Maps file extensions to [`NonTextKind`]s.
///
/// The mapping is a closed list; anything not in it is treated as text.
#[derive(Debug, Clone)]
pub struct ExtensionMapper {
    extension_map: HashMap<String, NonTextKind>,
}

impl ExtensionMapper {
    /// Creates a mapper with the standard non-text extensions.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        let table: &[(NonTextKind, &[&str])] = &[
            (
                NonTextKind::Archive,
                &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"],
            ),
            (
                NonTextKind::Executable,
                &["exe", "dll", "msi", "so", "dylib", "bin"],
            ),
            (
                NonTextKind::Document,
                &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt"],
            ),
            (
                NonTextKind::Image,
                &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "ico", "heic"],
            ),
            (
                NonTextKind::Video,
                &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm"],
            ),
        ];

        for (kind, extensions) in table {
            for ext in *extensions {
                self.extension_map.insert((*ext).to_string(), *kind);
            }
        }
    }

    /// Returns the non-text kind for an extension (without the dot), case-insensitively.
    pub fn non_text_kind(&self, ext: &str) -> Option<NonTextKind> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }
}

impl Default for ExtensionMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a filesystem-safe category label from ranked keywords.
///
/// Keywords are joined with `_`, sanitized, cut to [`MAX_LABEL_LEN`], and
/// guarded against reserved names. An empty keyword list yields
/// [`FALLBACK_CATEGORY`].
pub fn category_label(keywords: &[String]) -> String {
    let joined = if keywords.is_empty() {
        FALLBACK_CATEGORY.to_string()
    } else {
        keywords.join("_")
    };
    let mut label = sanitize_label(&joined);
    if label.len() > MAX_LABEL_LEN {
        label.truncate(MAX_LABEL_LEN);
        label = label.trim_end_matches('_').to_string();
        if label.is_empty() {
            label = FALLBACK_CATEGORY.to_string();
        }
    }
    guard_reserved(label)
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Returns true if `label` equals a reserved device name or the non-text
/// bucket, ignoring case.
pub fn is_reserved_name(label: &str) -> bool {
    label.eq_ignore_ascii_case(NON_TEXT_DIR)
        || RESERVED_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(label))
}

/// Appends [`RESERVED_SUFFIX`] when `label` is a reserved name.
pub fn guard_reserved(label: String) -> String {
    if is_reserved_name(&label) {
        label + RESERVED_SUFFIX
    } else {
        label
    }
}
