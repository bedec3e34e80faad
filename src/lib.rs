//! # mdpress
//!
//! Convert Markdown documents with embedded Mermaid diagrams to
//! print-ready PDF.
//!
//! ## Why this crate?
//!
//! Generic markdown-to-PDF tools feed the whole document through a
//! markdown engine, which mangles Mermaid syntax — pipes, arrows, and
//! angle brackets all mean something to markdown. This crate lifts every
//! diagram out *before* the markdown transform, carries it through the
//! HTML intermediate percent-encoded inside an addressable placeholder,
//! and renders each diagram individually inside a headless browser, so one
//! malformed diagram degrades to an inline error marker instead of sinking
//! the document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Extract   find Mermaid fences, classify each diagram
//!  ├─ 2. Assemble  placeholders + GFM transform + stylesheet + bootstrap
//!  ├─ 3. Render    headless Chrome renders diagrams one at a time,
//!  │               failures isolated per diagram
//!  └─ 4. Emit      print to paginated PDF (fixed geometry, no chrome)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdpress::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_to_file("notes.md", "notes.pdf", &config).await?;
//!     eprintln!(
//!         "{}/{} diagrams rendered in {}ms",
//!         output.stats.rendered_diagrams,
//!         output.stats.total_diagrams,
//!         output.timing.total_ms
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Requirements
//!
//! A Chrome or Chromium binary must be installed (or pointed at via
//! `CHROME_PATH`). Mermaid itself is loaded from a pinned CDN build by
//! default; pass [`MermaidSource::Inline`] with a local `mermaid.min.js`
//! for fully offline conversion.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mdpress = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod theme;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, MermaidSource, PaperSize};
pub use convert::{convert, convert_str, convert_sync, convert_to_file, inspect};
pub use error::{DiagramError, MdpressError};
pub use output::{
    ConversionOutput, ConversionTiming, DiagramOutcome, DiagramStatus, RenderStats,
};
pub use pipeline::extract::{extract_diagrams, DiagramBlock, DiagramKind};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
