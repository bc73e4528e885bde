//! Result types returned by the parsing service and produced by a run.
//!
//! [`ParseResult`] mirrors the service's JSON exactly. Page and document
//! fields live in the map the service sent, including explicit `null`s, and
//! typed accessors read from it, so serialising a result reproduces what the
//! service returned.

use crate::config::ResultType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File names used in single-file mode.
pub const SINGLE_JSON_NAME: &str = "parsed_result.json";
pub const SINGLE_MARKDOWN_NAME: &str = "parsed_result.md";

/// First-page preview length printed after a single-file run.
pub const SINGLE_PREVIEW_CHARS: usize = 500;
/// First-page preview length reported per file in batch mode.
pub const BATCH_PREVIEW_CHARS: usize = 200;

/// The structured result of one parse request.
///
/// Serialises as a JSON array with one [`ParsedDocument`] per service job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParseResult {
    pub documents: Vec<ParsedDocument>,
}

/// One job's output: the parsed pages plus whatever else the service sent
/// (`job_metadata`, `job_id`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(default)]
    pub pages: Vec<ParsedPage>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ParsedDocument {
    pub fn job_id(&self) -> Option<&str> {
        self.fields.get("job_id").and_then(Value::as_str)
    }

    pub fn file_path(&self) -> Option<&str> {
        self.fields.get("file_path").and_then(Value::as_str)
    }

    /// Job metadata, unless absent or `null`.
    pub fn job_metadata(&self) -> Option<&Value> {
        self.fields.get("job_metadata").filter(|v| !v.is_null())
    }

    /// Insert `key` only when the service did not send it at all.
    pub fn insert_if_absent(&mut self, key: &str, value: impl Into<Value>) {
        self.fields
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }
}

/// A single parsed page, held as the service's JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedPage {
    pub fields: Map<String, Value>,
}

impl ParsedPage {
    /// 1-indexed page number as reported by the service.
    pub fn page(&self) -> Option<u64> {
        self.fields.get("page").and_then(Value::as_u64)
    }

    pub fn text(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }

    pub fn md(&self) -> Option<&str> {
        self.fields.get("md").and_then(Value::as_str)
    }

    /// Layout items (headings, tables, text blocks).
    pub fn items(&self) -> Option<&[Value]> {
        self.fields
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    /// Content selected by `result_type`, if the page carries it.
    pub fn content(&self, result_type: ResultType) -> Option<&str> {
        match result_type {
            ResultType::Markdown => self.md(),
            ResultType::Text => self.text(),
        }
    }

    /// Page number for headings: `page`, else `page_number`, else `N/A`.
    pub fn number_label(&self) -> String {
        if let Some(n) = self.page() {
            return n.to_string();
        }
        match self.fields.get("page_number") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => "N/A".to_string(),
        }
    }

    /// `(type, text)` for the first `n` layout items.
    pub fn item_summaries(&self, n: usize) -> Vec<(String, String)> {
        let Some(items) = self.items() else {
            return Vec::new();
        };
        items
            .iter()
            .take(n)
            .map(|item| {
                let kind = item
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                let text = item
                    .get("value")
                    .or_else(|| item.get("text"))
                    .or_else(|| item.get("md"))
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                (kind, text)
            })
            .collect()
    }
}

impl ParseResult {
    /// Wrap a single document.
    pub fn single(doc: ParsedDocument) -> Self {
        Self {
            documents: vec![doc],
        }
    }

    /// Pages of the first document; empty when there is none.
    pub fn pages(&self) -> &[ParsedPage] {
        self.documents
            .first()
            .map(|d| d.pages.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.pages().is_empty()
    }

    /// Page count, character count and word count over all page content.
    pub fn stats(&self, result_type: ResultType) -> ParseStats {
        let mut total_text = String::new();
        for content in self.pages().iter().filter_map(|p| p.content(result_type)) {
            total_text.push_str(content);
            total_text.push('\n');
        }
        ParseStats {
            total_pages: self.pages().len(),
            total_chars: total_text.chars().count(),
            word_count: total_text.split_whitespace().count(),
            elapsed_ms: 0,
        }
    }

    /// The first `max_chars` characters of the first page's content.
    pub fn preview(&self, result_type: ResultType, max_chars: usize) -> Option<String> {
        let content = self.pages().first()?.content(result_type)?;
        Some(truncate_chars(content, max_chars))
    }
}

/// Cut `s` to `max_chars` characters, appending `...` when shortened.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Summary figures for one parsed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub total_pages: usize,
    /// Characters of page content, one newline per page included.
    pub total_chars: usize,
    pub word_count: usize,
    /// Wall-clock time of the service round trip.
    pub elapsed_ms: u64,
}

/// Paths of the JSON and markdown files written for one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifacts {
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

impl OutputArtifacts {
    pub fn new(json_path: impl Into<PathBuf>, markdown_path: impl Into<PathBuf>) -> Self {
        Self {
            json_path: json_path.into(),
            markdown_path: markdown_path.into(),
        }
    }

    /// `parsed_result.json` / `parsed_result.md` inside `dir`.
    pub fn single_in(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(SINGLE_JSON_NAME), dir.join(SINGLE_MARKDOWN_NAME))
    }

    /// `<stem>_parsed.json` / `<stem>_parsed.md` inside `dir`.
    pub fn batch_in(dir: impl AsRef<Path>, stem: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(format!("{stem}_parsed.json")),
            dir.join(format!("{stem}_parsed.md")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ParseResult {
        serde_json::from_value(json!([{
            "pages": [
                {"page": 1, "text": "Hello world", "md": "# Hello\n\nworld",
                 "items": [{"type": "heading", "lvl": 1, "value": "Hello"},
                           {"type": "text", "value": "world"}],
                 "images": [], "width": 612.0},
                {"page": 2, "md": "second page"}
            ],
            "job_metadata": {"credits_used": 2.0},
            "job_id": "job-1",
            "file_path": "data/a.pdf"
        }]))
        .unwrap()
    }

    #[test]
    fn unknown_fields_survive_serialisation() {
        let r = sample();
        let page = &r.pages()[0];
        assert_eq!(page.page(), Some(1));
        assert!(page.fields.contains_key("images"));
        assert_eq!(r.documents[0].job_id(), Some("job-1"));
        assert_eq!(r.documents[0].file_path(), Some("data/a.pdf"));

        let back: Value = serde_json::to_value(&r).unwrap();
        assert_eq!(back[0]["pages"][0]["width"], json!(612.0));
        assert_eq!(back[0]["job_metadata"]["credits_used"], json!(2.0));
    }

    #[test]
    fn stats_count_pages_chars_and_words() {
        let s = sample().stats(ResultType::Markdown);
        assert_eq!(s.total_pages, 2);
        // "# Hello\n\nworld\n" + "second page\n"
        assert_eq!(s.total_chars, 15 + 12);
        assert_eq!(s.word_count, 5);
    }

    #[test]
    fn text_stats_skip_pages_without_text() {
        let s = sample().stats(ResultType::Text);
        assert_eq!(s.total_pages, 2);
        assert_eq!(s.word_count, 2);
    }

    #[test]
    fn number_label_falls_back() {
        let mut p = ParsedPage::default();
        assert_eq!(p.number_label(), "N/A");
        p.fields.insert("page_number".into(), json!(7));
        assert_eq!(p.number_label(), "7");
        p.fields.insert("page".into(), json!(3));
        assert_eq!(p.number_label(), "3");
    }

    #[test]
    fn explicit_nulls_are_written_back() {
        let raw = json!([{
            "pages": [{"page": 1, "md": "x", "text": null, "items": null}],
            "job_metadata": null
        }]);
        let r: ParseResult = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(r.pages()[0].items(), None);
        assert_eq!(r.documents[0].job_metadata(), None);
        assert_eq!(serde_json::to_value(&r).unwrap(), raw);
    }

    #[test]
    fn insert_if_absent_keeps_service_values() {
        let mut doc: ParsedDocument =
            serde_json::from_value(json!({"pages": [], "job_id": null})).unwrap();
        doc.insert_if_absent("job_id", "job-9");
        doc.insert_if_absent("file_path", "a.pdf");
        assert_eq!(doc.fields["job_id"], Value::Null);
        assert_eq!(doc.file_path(), Some("a.pdf"));
    }

    #[test]
    fn item_summaries_take_first_n() {
        let r = sample();
        let items = r.pages()[0].item_summaries(1);
        assert_eq!(items, vec![("heading".to_string(), "Hello".to_string())]);
        assert!(r.pages()[1].item_summaries(3).is_empty());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(truncate_chars("페이지 내용", 3), "페이지...");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(
            sample().preview(ResultType::Markdown, 7).as_deref(),
            Some("# Hello...")
        );
    }

    #[test]
    fn empty_result_has_no_pages() {
        assert!(ParseResult::default().is_empty());
        assert!(ParseResult::single(ParsedDocument::default()).is_empty());
    }

    #[test]
    fn artifact_names() {
        let a = OutputArtifacts::single_in(".");
        assert_eq!(a.json_path, PathBuf::from("./parsed_result.json"));
        let b = OutputArtifacts::batch_in("data/parsed", "paper");
        assert_eq!(b.markdown_path, PathBuf::from("data/parsed/paper_parsed.md"));
    }
}
