//! Markdown → HTML with GitHub-flavoured extensions.
//!
//! Line-break semantics follow CommonMark: a run of lines separated by
//! single newlines joins into one paragraph (a soft break, no `<br>`); a
//! blank line starts a new paragraph; a line ending in two trailing spaces
//! forces a hard break inside its paragraph.
//!
//! This transform only ever sees placeholder-substituted text — diagram
//! source has already been lifted out by the extractor, so none of its
//! pipes or arrows can be reinterpreted as markdown.

use pulldown_cmark::{html, Options, Parser};

/// Convert markdown text to an HTML fragment.
pub fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
