//! Corpus loading from a single file or a directory of documents.

use crate::error::{IoError, Result};
use crate::io::reader::read_file;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Documents read from a directory unless configured otherwise.
pub const DEFAULT_MAX_DOCUMENTS: usize = 20;

/// Joins consecutive documents in the loaded corpus.
pub const DOCUMENT_DELIMITER: &str = "\n\n";

/// Extensions read from a directory unless configured otherwise.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["txt", "md", "json"];

/// How a corpus directory is walked.
///
/// A path naming a regular file ignores every option and is read as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Accepted file extensions, case-insensitive, with or without the dot.
    pub extensions: Vec<String>,
    /// Skip files and directories whose name starts with `.`.
    pub exclude_hidden: bool,
    /// Cap on documents read; 0 reads every match.
    pub max_documents: usize,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            exclude_hidden: true,
            max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }
}

impl CorpusOptions {
    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Lists the documents `path` resolves to, in file-name order.
///
/// A regular file yields itself. A directory yields its matching files,
/// sorted within each directory and capped at `max_documents`.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] for a missing path,
/// [`IoError::ReadFailed`] if the directory cannot be walked, and
/// [`IoError::NoDocuments`] if nothing in it matches.
pub fn list_documents<P: AsRef<Path>>(path: P, options: &CorpusOptions) -> Result<Vec<PathBuf>> {
    let root = path.as_ref();
    if !root.exists() {
        return Err(IoError::FileNotFound {
            path: root.to_string_lossy().to_string(),
        }
        .into());
    }
    if !root.is_dir() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut documents = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(options.exclude_hidden && is_hidden(e)))
    {
        let entry = entry.map_err(|e| IoError::ReadFailed {
            path: root.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
        if entry.file_type().is_file() && options.accepts(entry.path()) {
            documents.push(entry.into_path());
        }
    }

    if documents.is_empty() {
        return Err(IoError::NoDocuments {
            path: root.to_string_lossy().to_string(),
        }
        .into());
    }
    if options.max_documents > 0 && documents.len() > options.max_documents {
        debug!(
            found = documents.len(),
            kept = options.max_documents,
            "Capping corpus documents"
        );
        documents.truncate(options.max_documents);
    }
    Ok(documents)
}

/// Reads a file, or every matching document under a directory joined by
/// [`DOCUMENT_DELIMITER`].
///
/// # Errors
///
/// See [`list_documents`] and [`read_file`].
///
/// # Examples
///
/// ```no_run
/// use chunkbench::io::{CorpusOptions, read_corpus};
///
/// let text = read_corpus("docs/", &CorpusOptions::default()).unwrap();
/// ```
pub fn read_corpus<P: AsRef<Path>>(path: P, options: &CorpusOptions) -> Result<String> {
    let documents = list_documents(path.as_ref(), options)?;
    let texts = documents
        .iter()
        .map(read_file)
        .collect::<Result<Vec<_>>>()?;
    if documents.len() > 1 {
        info!(
            documents = documents.len(),
            path = %path.as_ref().display(),
            "Loaded corpus"
        );
    }
    Ok(texts.join(DOCUMENT_DELIMITER))
}
