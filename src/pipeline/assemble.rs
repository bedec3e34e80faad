//! Document assembly: placeholder substitution and the self-contained
//! HTML shell.
//!
//! Ordering is load-bearing: each diagram's fence is replaced by an opaque
//! placeholder *before* the markdown transform runs, so the transform never
//! sees diagram source. The placeholder is an HTML block surrounded by
//! blank lines, which pulldown-cmark passes through verbatim instead of
//! merging it into a paragraph.
//!
//! Each placeholder carries the diagram's kind and its percent-encoded
//! source, so the render loop can locate and decode it inside the live
//! page without any side channel.

use crate::config::ConversionConfig;
use crate::error::MdpressError;
use crate::pipeline::extract::DiagramBlock;
use crate::pipeline::markdown::markdown_to_html;
use crate::theme;
use percent_encoding::{percent_encode, NON_ALPHANUMERIC};

/// Build the placeholder div for one diagram block.
///
/// The id (`diagram-{index}`) is the address the render loop uses; the
/// `data-diagram-source` attribute survives the HTML intermediate because
/// it is percent-encoded with [`NON_ALPHANUMERIC`] — arbitrary Mermaid
/// syntax, including quotes and angle brackets, round-trips intact.
fn placeholder(block: &DiagramBlock) -> String {
    let encoded = percent_encode(block.source.as_bytes(), NON_ALPHANUMERIC);
    format!(
        r#"<div class="diagram" id="diagram-{}" data-diagram-kind="{}" data-diagram-source="{}"></div>"#,
        block.index,
        block.kind.as_str(),
        encoded
    )
}

/// Replace every diagram fence with its placeholder.
///
/// Substitution runs back-to-front so earlier spans stay valid while later
/// ones are rewritten. Blank lines are added around each placeholder so the
/// markdown transform treats it as a standalone HTML block.
fn substitute_placeholders(text: &str, blocks: &[DiagramBlock]) -> String {
    let mut out = text.to_string();
    for block in blocks.iter().rev() {
        let replacement = format!("\n\n{}\n\n", placeholder(block));
        out.replace_range(block.span.clone(), &replacement);
    }
    out
}

/// Minimal escaping for text interpolated into the `<title>` element.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Assemble the complete renderable document.
///
/// Substitutes placeholders, transforms the remaining markdown, and wraps
/// the result in a standalone HTML document with the embedded stylesheet
/// and the Mermaid bootstrap. Apart from the diagram renderer itself
/// (CDN-sourced unless [`crate::MermaidSource::Inline`] is used), the
/// document requires no further fetches.
pub fn assemble(
    title: &str,
    text: &str,
    blocks: &[DiagramBlock],
    config: &ConversionConfig,
) -> Result<String, MdpressError> {
    let substituted = substitute_placeholders(text, blocks);
    let body = markdown_to_html(&substituted);
    let bootstrap = theme::mermaid_bootstrap(&config.mermaid)?;

    Ok(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{}</title>\n\
         <style>{}</style>\n\
         </head>\n\
         <body>\n\
         {}\n\
         {}\n\
         </body>\n\
         </html>\n",
        escape_html(title),
        theme::PAGE_CSS,
        body,
        bootstrap
    ))
}
