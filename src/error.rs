//! Error types for the mdpress library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MdpressError`] — **Fatal**: the conversion cannot proceed at all
//!   (missing input file, browser failed to launch, Mermaid never became
//!   available, PDF serialisation failed). Returned as `Err(MdpressError)`
//!   from the top-level `convert*` functions. A fatal error never produces
//!   a partial PDF.
//!
//! * [`DiagramError`] — **Non-fatal**: a single diagram failed to render
//!   (usually malformed Mermaid syntax) but the rest of the document is
//!   fine. Stored inside [`crate::output::DiagramOutcome`]; the diagram is
//!   replaced by an inline error marker carrying its own source and the
//!   conversion continues.
//!
//! The separation lets callers decide their own tolerance: treat any
//! diagram failure as an error via
//! [`crate::output::ConversionOutput::into_strict`], or log the failed
//! diagrams and ship the PDF anyway.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mdpress library.
///
/// Diagram-level failures use [`DiagramError`] and are stored in
/// [`crate::output::DiagramOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum MdpressError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but is not valid UTF-8 text.
    #[error("File '{path}' is not valid UTF-8 text")]
    InvalidUtf8 { path: PathBuf },

    // ── Rendering-environment errors ──────────────────────────────────────
    /// Headless Chrome could not be launched.
    #[error(
        "Failed to launch headless Chrome: {detail}\n\n\
A Chrome or Chromium binary is required for PDF output.\n\
  • Install Chrome/Chromium, or\n\
  • Set CHROME_PATH=/path/to/chrome to use an existing binary."
    )]
    BrowserLaunchFailed { detail: String },

    /// The assembled HTML document failed to load in the browser.
    #[error("Failed to load the assembled document: {detail}")]
    ContentLoadFailed { detail: String },

    /// Mermaid never initialised inside the loaded page.
    #[error(
        "Mermaid did not become available within {secs}s.\n\
If Mermaid is loaded from a CDN, check your network connection, or pass\n\
a local copy with --mermaid-js /path/to/mermaid.min.js."
    )]
    RendererUnavailable { secs: u64 },

    /// A DevTools script evaluation failed for infrastructure reasons
    /// (crashed tab, detached session). Distinct from a diagram whose
    /// Mermaid source fails to render — that case is a [`DiagramError`].
    #[error("Script evaluation failed in the rendering environment: {detail}")]
    ScriptFailed { detail: String },

    // ── Emission errors ───────────────────────────────────────────────────
    /// Chrome failed to serialise the rendered document to PDF.
    #[error("PDF serialisation failed: {detail}")]
    PdfEmitFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Strict mode: at least one diagram failed to render.
    ///
    /// Returned by [`crate::output::ConversionOutput::into_strict`] when
    /// the caller wants to treat any diagram failure as an error.
    #[error("{failed}/{total} diagrams failed to render")]
    DiagramsFailed { failed: usize, total: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single diagram.
///
/// Stored inside [`crate::output::DiagramOutcome`] when a diagram fails.
/// The overall conversion still succeeds and still emits a complete PDF;
/// the failed diagram appears in the output as an inline error marker
/// that carries its own source text for diagnosis.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DiagramError {
    /// Mermaid rejected the diagram source.
    #[error("Diagram {index} ({kind}): render failed: {detail}")]
    RenderFailed {
        index: usize,
        kind: String,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagrams_failed_display() {
        let e = MdpressError::DiagramsFailed {
            failed: 1,
            total: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/4"), "got: {msg}");
    }

    #[test]
    fn renderer_unavailable_display() {
        let e = MdpressError::RendererUnavailable { secs: 10 };
        assert!(e.to_string().contains("10s"));
        assert!(e.to_string().contains("--mermaid-js"));
    }

    #[test]
    fn browser_launch_display_mentions_chrome_path() {
        let e = MdpressError::BrowserLaunchFailed {
            detail: "no chrome binary".into(),
        };
        assert!(e.to_string().contains("CHROME_PATH"));
        assert!(e.to_string().contains("no chrome binary"));
    }

    #[test]
    fn diagram_error_display() {
        let e = DiagramError::RenderFailed {
            index: 2,
            kind: "sequence".into(),
            detail: "Parse error on line 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Diagram 2"));
        assert!(msg.contains("sequence"));
        assert!(msg.contains("Parse error"));
    }
}
