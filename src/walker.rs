use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

const DOCUMENT_EXTENSION: &str = "pdf";

/// Resolve the inputs of a run into the list of documents to search.
///
/// Inputs that are PDF files come first, in input order. Every input
/// directory is then walked recursively; each walk contributes its PDF
/// files sorted by path. Inputs that do not exist, and subdirectories
/// that cannot be read, are skipped with a warning.
pub fn discover_documents(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for input in inputs {
        if input.is_dir() {
            dirs.push(input);
        } else if input.is_file() {
            if is_document(input) {
                files.push(input.clone());
            } else {
                debug!(path = %input.display(), "not a pdf, skipping");
            }
        } else {
            warn!(path = %input.display(), "input does not exist, skipping");
        }
    }

    for dir in dirs {
        let mut found = Vec::new();
        walk_dir(dir, &mut found)?;
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn walk_dir(current: &Path, results: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if let Err(e) = walk_dir(&path, results) {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read directory, skipping"
                );
            }
        } else if file_type.is_symlink() {
            // Linked directories are not followed.
            if path.is_file() && is_document(&path) {
                results.push(path);
            }
        } else if file_type.is_file() && is_document(&path) {
            results.push(path);
        }
    }

    Ok(())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}
