//! Static assets embedded into every assembled document: the page
//! stylesheet and the Mermaid bootstrap.
//!
//! Keeping these here rather than scattered through the assembler means the
//! assembler stays focused on *structure* (placeholders, document shell)
//! while the look of the page lives in one reviewable place. Both are
//! injected per document — there is no process-wide styling state, so two
//! conversions in one process cannot affect each other.

use crate::config::{MermaidSource, MERMAID_CDN_VERSION};
use crate::error::MdpressError;

/// Stylesheet embedded in every assembled document.
///
/// Covers typography, code blocks, tables, blockquotes, and the diagram
/// containers. `page-break-inside: avoid` keeps a diagram from being split
/// across two PDF pages.
pub const PAGE_CSS: &str = r#"
html { -webkit-print-color-adjust: exact; }
body {
  font-family: -apple-system, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
  font-size: 11pt;
  line-height: 1.55;
  color: #24292f;
  margin: 0;
}
h1, h2, h3, h4, h5, h6 {
  line-height: 1.25;
  margin-top: 1.4em;
  margin-bottom: 0.5em;
}
h1 { font-size: 1.8em; border-bottom: 1px solid #d8dee4; padding-bottom: 0.25em; }
h2 { font-size: 1.4em; border-bottom: 1px solid #d8dee4; padding-bottom: 0.25em; }
p { margin: 0.6em 0; }
a { color: #0969da; text-decoration: none; }
code {
  font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, monospace;
  font-size: 0.9em;
  background: #f6f8fa;
  border-radius: 4px;
  padding: 0.15em 0.35em;
}
pre {
  background: #f6f8fa;
  border-radius: 6px;
  padding: 12px;
  overflow-x: auto;
  page-break-inside: avoid;
}
pre code { background: none; padding: 0; }
table {
  border-collapse: collapse;
  margin: 0.8em 0;
  width: 100%;
}
th, td {
  border: 1px solid #d0d7de;
  padding: 5px 10px;
  text-align: left;
}
th { background: #f6f8fa; }
tr:nth-child(2n) td { background: #fbfcfd; }
blockquote {
  border-left: 4px solid #d0d7de;
  color: #57606a;
  margin: 0.8em 0;
  padding: 0 1em;
}
hr { border: none; border-top: 1px solid #d8dee4; margin: 1.5em 0; }
img { max-width: 100%; }

.diagram {
  margin: 1.2em 0;
  text-align: center;
  page-break-inside: avoid;
}
.diagram svg { max-width: 100%; height: auto; }
.diagram-error {
  border: 2px solid #cf222e;
  border-radius: 6px;
  padding: 10px 14px;
  text-align: left;
}
.diagram-error-title {
  color: #cf222e;
  font-weight: 600;
  margin-bottom: 0.5em;
}
.diagram-error pre {
  background: #fff1f0;
  white-space: pre-wrap;
}

#mdpress-overlay {
  position: fixed;
  top: 8px;
  right: 8px;
  background: rgba(36, 41, 47, 0.85);
  color: #fff;
  font-size: 12px;
  padding: 4px 10px;
  border-radius: 4px;
  z-index: 9999;
}
"#;

/// Inline script appended after the Mermaid `<script>` tag.
///
/// Disables `startOnLoad` (the render loop drives each diagram
/// individually) and raises the readiness flag the orchestrator polls for.
const BOOTSTRAP_INIT: &str = r#"
if (typeof mermaid !== "undefined") {
  mermaid.initialize({ startOnLoad: false, theme: "default", securityLevel: "loose" });
  window.__diagramReady = true;
}
"#;

/// Build the `<script>` block that provides and initialises Mermaid.
///
/// For [`MermaidSource::Inline`] the script file is read and embedded
/// directly, so the assembled document needs no network access.
pub fn mermaid_bootstrap(source: &MermaidSource) -> Result<String, MdpressError> {
    let provider = match source {
        MermaidSource::Cdn => format!(
            r#"<script src="https://cdn.jsdelivr.net/npm/mermaid@{MERMAID_CDN_VERSION}/dist/mermaid.min.js"></script>"#
        ),
        MermaidSource::Url(url) => format!(r#"<script src="{url}"></script>"#),
        MermaidSource::Inline(path) => {
            let script = std::fs::read_to_string(path).map_err(|e| {
                MdpressError::Internal(format!(
                    "Failed to read Mermaid script '{}': {e}",
                    path.display()
                ))
            })?;
            format!("<script>\n{script}\n</script>")
        }
    };
    Ok(format!("{provider}\n<script>{BOOTSTRAP_INIT}</script>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cdn_bootstrap_pins_version() {
        let html = mermaid_bootstrap(&MermaidSource::Cdn).unwrap();
        assert!(html.contains("mermaid@10"));
        assert!(html.contains("startOnLoad: false"));
        assert!(html.contains("__diagramReady"));
    }

    #[test]
    fn url_bootstrap_uses_given_url() {
        let html =
            mermaid_bootstrap(&MermaidSource::Url("http://localhost:9999/m.js".into())).unwrap();
        assert!(html.contains(r#"src="http://localhost:9999/m.js""#));
    }

    #[test]
    fn inline_bootstrap_embeds_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "var mermaid = {{}};").unwrap();
        let html = mermaid_bootstrap(&MermaidSource::Inline(file.path().to_path_buf())).unwrap();
        assert!(html.contains("var mermaid"));
        assert!(!html.contains("src="));
    }

    #[test]
    fn inline_bootstrap_missing_file_errors() {
        let err = mermaid_bootstrap(&MermaidSource::Inline("/nonexistent.js".into())).unwrap_err();
        assert!(matches!(err, MdpressError::Internal(_)));
    }
}
