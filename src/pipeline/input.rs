//! Input resolution: validate a PDF path or discover the PDFs in a directory.
//!
//! We check the PDF magic bytes (`%PDF`) before uploading so a stray text
//! file costs no service credits and yields a clear local error.

use crate::error::ParseError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn validate_pdf(path: impl AsRef<Path>) -> Result<PathBuf, ParseError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(ParseError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic == b"%PDF" => {}
                Ok(()) => return Err(ParseError::NotAPdf { path, magic }),
                // Shorter than four bytes: cannot be a PDF.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(ParseError::NotAPdf { path, magic })
                }
                Err(source) => return Err(ParseError::ReadFailed { path, source }),
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ParseError::PermissionDenied { path });
        }
        Err(source) => {
            return Err(ParseError::ReadFailed { path, source });
        }
    }

    debug!("Validated local PDF: {}", path.display());
    Ok(path)
}

/// List the `*.pdf` files directly inside `dir`, sorted by path.
///
/// The extension match is case-insensitive; subdirectories are not searched.
pub fn discover_pdfs(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ParseError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| ParseError::ReadFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ParseError::ReadFailed {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && has_pdf_extension(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    debug!("Found {} PDF files in {}", pdfs.len(), dir.display());
    Ok(pdfs)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// File name without extension, used to name batch artifacts.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_pdf("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, ParseError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_is_rejected() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("notes.pdf");
        std::fs::write(&p, b"hello world").unwrap();
        let err = validate_pdf(&p).unwrap_err();
        assert!(matches!(err, ParseError::NotAPdf { magic, .. } if &magic == b"hell"));
    }

    #[test]
    fn tiny_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("tiny.pdf");
        std::fs::write(&p, b"%P").unwrap();
        assert!(matches!(validate_pdf(&p), Err(ParseError::NotAPdf { .. })));
    }

    #[test]
    fn real_header_is_accepted() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("ok.pdf");
        std::fs::write(&p, b"%PDF-1.7\n%...").unwrap();
        assert_eq!(validate_pdf(&p).unwrap(), p);
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.PDF", "c.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let found = discover_pdfs(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn discover_missing_dir_fails() {
        assert!(matches!(
            discover_pdfs("/no/such/dir"),
            Err(ParseError::ReadFailed { .. })
        ));
    }

    #[test]
    fn stem_strips_extension() {
        assert_eq!(file_stem(Path::new("data/CVM_articles.pdf")), "CVM_articles");
    }
}
