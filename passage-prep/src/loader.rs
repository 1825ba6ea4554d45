//! Document loader: recursive folder walk producing per-page text.
//!
//! Supported inputs:
//! - `.pdf`: one [`Page`] per physical page (text extracted with `lopdf`).
//! - `.txt` / `.md`: the whole file is page 1.
//!
//! Pages whose extracted text is blank are skipped.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::PrepError;
use crate::model::Page;

const PDF_EXT: &str = "pdf";
const TEXT_EXT: &[&str] = &["txt", "md"];

/// Seam between the pipeline and document text extraction.
pub trait DocumentLoader: Send + Sync {
    /// Loads every page of every supported document under `root`.
    ///
    /// # Errors
    /// [`PrepError::CorpusEmpty`] when `root` holds no supported file.
    fn load(&self, root: &Path) -> Result<Vec<Page>, PrepError>;
}

/// Filesystem-backed loader. Walk order is sorted by file name so that
/// repeated runs see documents in the same order.
#[derive(Clone, Debug, Default)]
pub struct FsDocumentLoader;

impl FsDocumentLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for FsDocumentLoader {
    fn load(&self, root: &Path) -> Result<Vec<Page>, PrepError> {
        if !root.is_dir() {
            warn!(root = %root.display(), "documents folder does not exist");
            return Err(PrepError::CorpusEmpty(root.to_path_buf()));
        }

        let mut files = 0usize;
        let mut pages = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(kind) = classify(entry.path()) else {
                continue;
            };
            files += 1;

            let before = pages.len();
            match kind {
                Kind::Pdf => load_pdf(entry.path(), &mut pages)?,
                Kind::Text => load_text(entry.path(), &mut pages)?,
            }
            debug!(
                path = %entry.path().display(),
                pages = pages.len() - before,
                "document loaded"
            );
        }

        if files == 0 {
            return Err(PrepError::CorpusEmpty(root.to_path_buf()));
        }

        info!(root = %root.display(), files, pages = pages.len(), "corpus loaded");
        Ok(pages)
    }
}

enum Kind {
    Pdf,
    Text,
}

fn classify(path: &Path) -> Option<Kind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext == PDF_EXT {
        Some(Kind::Pdf)
    } else if TEXT_EXT.contains(&ext.as_str()) {
        Some(Kind::Text)
    } else {
        None
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn load_pdf(path: &Path, out: &mut Vec<Page>) -> Result<(), PrepError> {
    let doc = lopdf::Document::load(path).map_err(|e| PrepError::Pdf {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let source = source_name(path);
    let locator = path.display().to_string();

    // get_pages() is keyed by 1-based page number.
    for (&number, _) in doc.get_pages().iter() {
        let text = match doc.extract_text(&[number]) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %locator, page = number, error = %e, "page text extraction failed; skipping");
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }
        out.push(Page {
            text,
            source: source.clone(),
            path: locator.clone(),
            page: number,
        });
    }
    Ok(())
}

fn load_text(path: &Path, out: &mut Vec<Page>) -> Result<(), PrepError> {
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(());
    }
    out.push(Page {
        text,
        source: source_name(path),
        path: path.display().to_string(),
        page: 1,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_corpus_empty() {
        let dir = TempDir::new().unwrap();
        let err = FsDocumentLoader::new()
            .load(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, PrepError::CorpusEmpty(_)));
    }

    #[test]
    fn unsupported_files_only_is_corpus_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("image.png"), b"\x89PNG").unwrap();
        fs::write(dir.path().join("notes.docx"), b"zip").unwrap();
        let err = FsDocumentLoader::new().load(dir.path()).unwrap_err();
        assert!(matches!(err, PrepError::CorpusEmpty(_)));
    }

    #[test]
    fn text_files_are_single_pages_in_name_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("hr")).unwrap();
        fs::write(dir.path().join("hr").join("leave.md"), "Annual leave is 25 days.").unwrap();
        fs::write(dir.path().join("expenses.TXT"), "Receipts are required.").unwrap();
        fs::write(dir.path().join("blank.txt"), "   \n").unwrap();

        let pages = FsDocumentLoader::new().load(dir.path()).unwrap();
        let sources: Vec<_> = pages.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["expenses.TXT", "leave.md"]);
        assert!(pages.iter().all(|p| p.page == 1));
        assert!(pages[1].path.ends_with("leave.md"));
    }

    #[test]
    fn hidden_entries_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache").join("x.txt"), "hidden").unwrap();
        fs::write(dir.path().join("visible.txt"), "shown").unwrap();

        let pages = FsDocumentLoader::new().load(dir.path()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source, "visible.txt");
    }

    #[test]
    fn unreadable_pdf_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.pdf"), b"definitely not a pdf").unwrap();
        let err = FsDocumentLoader::new().load(dir.path()).unwrap_err();
        assert!(matches!(err, PrepError::Pdf { .. }));
    }
}
