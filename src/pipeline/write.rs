//! Result writer: persist a [`ParseResult`] as a JSON file and a markdown file.
//!
//! Both artifacts are rendered in memory first, then written to temp files
//! next to their destinations and renamed into place. A failure before the
//! renames leaves any previous outputs untouched.

use crate::config::ResultType;
use crate::error::ParseError;
use crate::output::{OutputArtifacts, ParseResult};
use crate::pipeline::render::render_markdown;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Write `result` to the two paths in `artifacts`, overwriting existing files.
///
/// `title` is forwarded to [`render_markdown`].
pub fn write_result(
    result: &ParseResult,
    artifacts: &OutputArtifacts,
    result_type: ResultType,
    title: Option<&str>,
) -> Result<(), ParseError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| ParseError::Internal(format!("JSON serialisation failed: {e}")))?;
    let markdown = render_markdown(result, result_type, title);

    let json_tmp = stage(&artifacts.json_path, json.as_bytes())?;
    let md_tmp = stage(&artifacts.markdown_path, markdown.as_bytes())?;

    commit(json_tmp, &artifacts.json_path)?;
    info!("JSON result saved: {}", artifacts.json_path.display());
    commit(md_tmp, &artifacts.markdown_path)?;
    info!("Markdown result saved: {}", artifacts.markdown_path.display());

    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write `bytes` to a temp file in the destination's directory.
fn stage(dest: &Path, bytes: &[u8]) -> Result<NamedTempFile, ParseError> {
    let write_err = |source| ParseError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };

    let dir = parent_dir(dest);
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    debug!("Staged {} bytes for {}", bytes.len(), dest.display());
    Ok(tmp)
}

fn commit(tmp: NamedTempFile, dest: &Path) -> Result<(), ParseError> {
    tmp.persist(dest)
        .map(|_| ())
        .map_err(|e| ParseError::OutputWriteFailed {
            path: dest.to_path_buf(),
            source: e.error,
        })
}
