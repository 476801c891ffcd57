//! Directory walk producing the files to classify.

use crate::config::CompiledFilters;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Walks `source_root` and returns every file that passes `filters`.
///
/// Entries are visited in file-name order so repeated runs see the same
/// sequence. The `excluded` subtrees (the target and logs directories) are
/// never descended into, and symlinks are not followed.
pub fn discover_files(
    source_root: &Path,
    excluded: &[&Path],
    filters: &CompiledFilters,
) -> Vec<PathBuf> {
    let walker = WalkDir::new(source_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(entry, excluded, filters));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_root)
            .unwrap_or(entry.path());
        if filters.should_include(relative) {
            files.push(entry.into_path());
        }
    }
    files
}

fn keep_entry(entry: &DirEntry, excluded: &[&Path], filters: &CompiledFilters) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    if excluded.iter().any(|dir| entry.path() == *dir) {
        return false;
    }
    let hidden = entry.file_name().to_string_lossy().starts_with('.');
    !hidden || filters.include_hidden()
}
