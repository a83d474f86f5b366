//! Resolving command-line paths into source files.
//!
//! Files named explicitly are always searched. Directories are walked
//! recursively and contribute only files whose extension belongs to the
//! selected language. Hidden entries are skipped and symbolic links are
//! not followed.

use std::fs;
use std::path::{Path, PathBuf};

use sift::SourceFile;
use sift_syntax::SupportedLanguage;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::errors::AppError;

/// Reads every file under `paths`, in a stable order.
pub(crate) fn collect(
    paths: &[PathBuf],
    language: SupportedLanguage,
) -> Result<Vec<SourceFile>, AppError> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, language, &mut found)?;
        } else {
            found.push(path.clone());
        }
    }
    if found.is_empty() {
        return Err(AppError::NoInputs {
            language: language.to_string(),
        });
    }
    debug!(files = found.len(), "collected inputs");
    found.iter().map(|path| read(path)).collect()
}

/// Walks `dir` in file-name order without following symbolic links, so a
/// link back to an ancestor is listed once and never entered.
fn walk(dir: &Path, language: SupportedLanguage, found: &mut Vec<PathBuf>) -> Result<(), AppError> {
    let entries = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for item in entries {
        let entry = item.map_err(|source| AppError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && SupportedLanguage::from_path(entry.path()) == Some(language)
        {
            found.push(entry.into_path());
        }
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn read(path: &Path) -> Result<SourceFile, AppError> {
    let source = fs::read_to_string(path).map_err(|source| AppError::ReadSource {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceFile::new(path.display().to_string(), source))
}
