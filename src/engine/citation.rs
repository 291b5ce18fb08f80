use crate::document::PageText;
use crate::model::Citation;

use super::config::NormalizeConfig;
use super::text::{char_window, collapse_whitespace};

/// Collects one citation per populated field, in the order fields are found.
#[derive(Debug)]
pub struct CitationTracker<'a> {
    source: &'a str,
    pad_chars: usize,
    max_chars: usize,
    citations: Vec<Citation>,
}

impl<'a> CitationTracker<'a> {
    pub fn new(source: &'a str, config: &NormalizeConfig) -> Self {
        Self {
            source,
            pad_chars: config.snippet_pad_chars,
            max_chars: config.snippet_max_chars,
            citations: Vec::new(),
        }
    }

    /// Records the match `start..end` on `page` and returns the snippet.
    pub fn record(&mut self, page: &PageText, start: usize, end: usize) -> String {
        let text_snippet = snippet_around(&page.text, start, end, self.pad_chars, self.max_chars);
        self.citations.push(Citation {
            pdf: self.source.to_string(),
            page: if page.page == 0 { 1 } else { page.page },
            text_snippet: text_snippet.clone(),
        });
        text_snippet
    }

    pub fn into_citations(self) -> Vec<Citation> {
        self.citations
    }
}

const ELISION: &str = " ... ";

/// Over-long snippets keep both ends so the label and the amount of a wide
/// row match stay visible.
pub fn snippet_around(text: &str, start: usize, end: usize, pad: usize, max_chars: usize) -> String {
    let collapsed = collapse_whitespace(char_window(text, start, end, pad));
    let count = collapsed.chars().count();
    if count <= max_chars {
        return collapsed;
    }

    let elision = ELISION.chars().count();
    if max_chars <= elision + 1 {
        return collapsed.chars().take(max_chars).collect();
    }

    let kept = max_chars - elision;
    let head = kept - kept / 2;
    let tail = kept / 2;
    let mut snippet = collapsed.chars().take(head).collect::<String>();
    snippet.push_str(ELISION);
    snippet.extend(collapsed.chars().skip(count - tail));
    snippet
}
