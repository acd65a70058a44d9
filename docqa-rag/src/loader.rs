//! Loading source documents from a directory.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// Extensions picked up when the caller does not say otherwise.
pub const DEFAULT_EXTENSIONS: &[&str] = &["txt"];

/// Read every file directly inside `dir` whose extension is in `extensions`.
///
/// The listing is not recursive. Each document's id is its file name and its
/// text is the full UTF-8 contents. Documents come back sorted by id. Any
/// listing, read, or decoding failure aborts the whole load.
pub fn load_documents_from_directory(
    dir: impl AsRef<Path>,
    extensions: &[&str],
) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    info!(directory = %dir.display(), "loading documents");

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let source = e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("directory walk failed")
            });
            RagError::DocumentLoadError { path, source }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let accepted = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)));
        if !accepted {
            continue;
        }

        let path = entry.path();
        let text = fs::read_to_string(path)
            .map_err(|source| RagError::DocumentLoadError { path: path.to_path_buf(), source })?;
        let id = entry.file_name().to_string_lossy().into_owned();
        debug!(document.id = %id, bytes = text.len(), "read document");

        documents.push(Document { id, text, source_uri: Some(path.display().to_string()) });
    }

    documents.sort_by(|a, b| a.id.cmp(&b.id));
    info!(directory = %dir.display(), document_count = documents.len(), "loaded documents");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_only_matching_files_sorted() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("b.txt"), "second").unwrap();
        fs::write(root.join("a.txt"), "first").unwrap();
        fs::write(root.join("notes.md"), "ignored").unwrap();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("nested/c.txt"), "not recursive").unwrap();

        let docs = load_documents_from_directory(root, DEFAULT_EXTENSIONS).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a.txt", "b.txt"]);
        assert_eq!(docs[0].text, "first");
        assert!(docs[0].source_uri.as_deref().unwrap().ends_with("a.txt"));
    }

    #[test]
    fn extension_list_is_configurable() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "t").unwrap();
        fs::write(temp.path().join("b.md"), "m").unwrap();

        let docs = load_documents_from_directory(temp.path(), &["md", "txt"]).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn missing_directory_is_a_load_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = load_documents_from_directory(temp.path().join("absent"), DEFAULT_EXTENSIONS)
            .unwrap_err();
        assert!(matches!(err, RagError::DocumentLoadError { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_load_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();
        let err = load_documents_from_directory(temp.path(), DEFAULT_EXTENSIONS).unwrap_err();
        assert!(matches!(err, RagError::DocumentLoadError { .. }));
    }
}
