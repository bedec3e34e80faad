//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::MdpressError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Mermaid version requested when the bootstrap loads from the default CDN.
pub const MERMAID_CDN_VERSION: &str = "10";

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use mdpress::{ConversionConfig, PaperSize};
///
/// let config = ConversionConfig::builder()
///     .paper(PaperSize::Letter)
///     .margin_inches(0.5)
///     .renderer_timeout_secs(15)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Paper size for the emitted PDF. Default: [`PaperSize::A4`].
    pub paper: PaperSize,

    /// Uniform page margin in inches, applied to all four sides.
    /// Range: 0.0–3.0. Default: 0.75.
    ///
    /// Chrome's print pipeline takes margins in inches. A uniform margin keeps
    /// the page geometry fixed and reproducible; per-side margins are a layout
    /// decision this pipeline deliberately does not take.
    pub margin_inches: f64,

    /// Where the Mermaid script comes from. Default: pinned CDN build.
    ///
    /// [`MermaidSource::Inline`] embeds a local `mermaid.min.js` directly into
    /// the assembled document, making the whole conversion work offline.
    pub mermaid: MermaidSource,

    /// How long to wait for Mermaid to initialise inside the loaded page,
    /// in seconds. Default: 10.
    ///
    /// This bounds the `RendererAvailable` wait. Mermaid failing to appear is
    /// fatal for the whole conversion — the renderer is required
    /// infrastructure, unlike an individual diagram that fails to parse.
    pub renderer_timeout_secs: u64,

    /// Pause between consecutive diagram renders, in milliseconds.
    /// Default: 100.
    ///
    /// Diagrams render sequentially and this short gap keeps the in-page
    /// renderer from being hammered back-to-back on diagram-heavy documents.
    pub diagram_pause_ms: u64,

    /// Show a live progress overlay inside the page while diagrams render.
    /// Default: false.
    ///
    /// Observational only — the overlay is removed before the PDF is emitted
    /// and never affects control flow. Useful together with a non-headless
    /// debugging session.
    pub debug_overlay: bool,

    /// Explicit path to a Chrome/Chromium binary.
    /// If `None`, the `CHROME_PATH` env var and standard install locations
    /// are probed.
    pub chrome_path: Option<PathBuf>,

    /// Optional per-diagram progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            margin_inches: 0.75,
            mermaid: MermaidSource::default(),
            renderer_timeout_secs: 10,
            diagram_pause_ms: 100,
            debug_overlay: false,
            chrome_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("paper", &self.paper)
            .field("margin_inches", &self.margin_inches)
            .field("mermaid", &self.mermaid)
            .field("renderer_timeout_secs", &self.renderer_timeout_secs)
            .field("diagram_pause_ms", &self.diagram_pause_ms)
            .field("debug_overlay", &self.debug_overlay)
            .field("chrome_path", &self.chrome_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn Callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn paper(mut self, paper: PaperSize) -> Self {
        self.config.paper = paper;
        self
    }

    pub fn margin_inches(mut self, inches: f64) -> Self {
        self.config.margin_inches = inches.clamp(0.0, 3.0);
        self
    }

    pub fn mermaid(mut self, source: MermaidSource) -> Self {
        self.config.mermaid = source;
        self
    }

    pub fn renderer_timeout_secs(mut self, secs: u64) -> Self {
        self.config.renderer_timeout_secs = secs.max(1);
        self
    }

    pub fn diagram_pause_ms(mut self, ms: u64) -> Self {
        self.config.diagram_pause_ms = ms;
        self
    }

    pub fn debug_overlay(mut self, v: bool) -> Self {
        self.config.debug_overlay = v;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, MdpressError> {
        let c = &self.config;
        if !(0.0..=3.0).contains(&c.margin_inches) {
            return Err(MdpressError::InvalidConfig(format!(
                "Margin must be 0.0–3.0 inches, got {}",
                c.margin_inches
            )));
        }
        if c.renderer_timeout_secs == 0 {
            return Err(MdpressError::InvalidConfig(
                "Renderer timeout must be ≥ 1 second".into(),
            ));
        }
        if let MermaidSource::Inline(ref path) = c.mermaid {
            if !path.exists() {
                return Err(MdpressError::InvalidConfig(format!(
                    "Mermaid script not found: '{}'",
                    path.display()
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Fixed paper geometry for the emitted PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
}

impl PaperSize {
    /// Page dimensions in inches as `(width, height)`, the unit Chrome's
    /// print endpoint expects.
    pub fn dimensions_inches(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (8.27, 11.69),
            PaperSize::Letter => (8.5, 11.0),
        }
    }
}

/// Where the assembled document gets its Mermaid script from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MermaidSource {
    /// `<script src>` pointing at the jsDelivr CDN, pinned to
    /// [`MERMAID_CDN_VERSION`]. (default)
    #[default]
    Cdn,
    /// `<script src>` pointing at a caller-supplied URL.
    Url(String),
    /// Read the script from a local file and embed it inline, so the
    /// assembled document needs no network access at all.
    Inline(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config.paper, PaperSize::A4);
        assert_eq!(config.renderer_timeout_secs, 10);
        assert_eq!(config.mermaid, MermaidSource::Cdn);
    }

    #[test]
    fn margin_is_clamped() {
        let config = ConversionConfig::builder().margin_inches(99.0).build().unwrap();
        assert_eq!(config.margin_inches, 3.0);
    }

    #[test]
    fn renderer_timeout_floor_is_one() {
        let config = ConversionConfig::builder()
            .renderer_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.renderer_timeout_secs, 1);
    }

    #[test]
    fn missing_inline_mermaid_rejected() {
        let mut config = ConversionConfig::default();
        config.mermaid = MermaidSource::Inline(PathBuf::from("/nonexistent/mermaid.min.js"));
        let err = ConversionConfigBuilder { config }.build().unwrap_err();
        assert!(matches!(err, MdpressError::InvalidConfig(_)));
    }

    #[test]
    fn paper_dimensions() {
        assert_eq!(PaperSize::A4.dimensions_inches(), (8.27, 11.69));
        assert_eq!(PaperSize::Letter.dimensions_inches(), (8.5, 11.0));
    }
}
