//! Markdown rendering of a [`ParseResult`].
//!
//! The layout is a heading per page, the page content, and a horizontal
//! rule. In batch mode the document gets a `# <stem>` title and page headings
//! move down one level so every file in `parsed/` reads the same way.

use crate::config::ResultType;
use crate::output::ParseResult;
use crate::pipeline::postprocess::normalise_page;

/// Render the pages of `result` as a markdown document.
///
/// Pages without content for `result_type` are left out. The output is a
/// pure function of its inputs.
pub fn render_markdown(result: &ParseResult, result_type: ResultType, title: Option<&str>) -> String {
    let mut out = String::new();

    let page_heading = match title {
        Some(t) => {
            out.push_str(&format!("# {}\n\n", t));
            "##"
        }
        None => "#",
    };

    for page in result.pages() {
        let Some(content) = page.content(result_type) else {
            continue;
        };
        out.push_str(&format!("{} Page {}\n\n", page_heading, page.number_label()));
        out.push_str(&normalise_page(content));
        out.push_str("\n\n---\n\n");
    }

    out
}
