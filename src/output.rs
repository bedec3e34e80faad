//! Output types: per-diagram outcomes, aggregate stats, and stage timings.

use crate::error::{DiagramError, MdpressError};
use serde::{Deserialize, Serialize};

/// Result of converting one document.
///
/// Conversion succeeds even when some diagrams failed to render — those
/// appear in the PDF as inline error markers and in [`Self::diagrams`] as
/// [`DiagramStatus::Failed`]. Use [`Self::into_strict`] to turn any
/// diagram failure into an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The finished PDF bytes.
    #[serde(skip)]
    pub pdf: Vec<u8>,

    /// Per-diagram outcomes, in extraction order.
    pub diagrams: Vec<DiagramOutcome>,

    /// Aggregate render counts.
    pub stats: RenderStats,

    /// Per-stage wall-clock timings.
    pub timing: ConversionTiming,
}

impl ConversionOutput {
    /// Treat any diagram failure as a fatal error.
    ///
    /// Returns `Err(MdpressError::DiagramsFailed)` if `stats.failed_diagrams
    /// > 0`, otherwise returns `self` unchanged.
    pub fn into_strict(self) -> Result<Self, MdpressError> {
        if self.stats.failed_diagrams > 0 {
            Err(MdpressError::DiagramsFailed {
                failed: self.stats.failed_diagrams,
                total: self.stats.total_diagrams,
            })
        } else {
            Ok(self)
        }
    }
}

/// Outcome of one diagram's render attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramOutcome {
    /// 0-indexed extraction order.
    pub index: usize,
    /// Classified diagram kind tag (e.g. "flowchart", "unknown").
    pub kind: String,
    /// Rendered, or failed with the error kept for diagnosis.
    pub status: DiagramStatus,
}

/// Success/failure state of a single diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiagramStatus {
    /// Mermaid produced SVG markup; the placeholder now holds it.
    Rendered,
    /// Mermaid rejected the source; the placeholder holds an error marker
    /// with the original diagram text.
    Failed(DiagramError),
}

impl DiagramStatus {
    pub fn is_rendered(&self) -> bool {
        matches!(self, DiagramStatus::Rendered)
    }
}

/// Aggregate diagram counts for one conversion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// Diagram blocks extracted from the source document.
    pub total_diagrams: usize,
    /// Diagrams that rendered to SVG.
    pub rendered_diagrams: usize,
    /// Diagrams replaced by an inline error marker.
    pub failed_diagrams: usize,
}

/// Wall-clock duration of each pipeline stage, in milliseconds.
///
/// Totals include stages the run never reached (they stay 0), so
/// `total_ms` is authoritative and the buckets are diagnostic.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConversionTiming {
    /// Reading the source file.
    pub read_ms: u64,
    /// Diagram extraction + placeholder substitution + markdown transform.
    pub extract_ms: u64,
    /// Launching the headless browser.
    pub browser_init_ms: u64,
    /// Loading the assembled document until content idle.
    pub load_ms: u64,
    /// Waiting for Mermaid to initialise.
    pub renderer_wait_ms: u64,
    /// The sequential per-diagram render loop.
    pub diagram_render_ms: u64,
    /// PDF serialisation.
    pub pdf_emit_ms: u64,
    /// End-to-end duration.
    pub total_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_with(failed: usize, total: usize) -> ConversionOutput {
        ConversionOutput {
            pdf: vec![0x25, 0x50, 0x44, 0x46],
            diagrams: Vec::new(),
            stats: RenderStats {
                total_diagrams: total,
                rendered_diagrams: total - failed,
                failed_diagrams: failed,
            },
            timing: ConversionTiming::default(),
        }
    }

    #[test]
    fn strict_passes_when_nothing_failed() {
        assert!(output_with(0, 3).into_strict().is_ok());
    }

    #[test]
    fn strict_rejects_any_failure() {
        let err = output_with(1, 3).into_strict().unwrap_err();
        assert!(matches!(
            err,
            MdpressError::DiagramsFailed { failed: 1, total: 3 }
        ));
    }

    #[test]
    fn json_output_skips_pdf_bytes() {
        let json = serde_json::to_string(&output_with(0, 1)).unwrap();
        // Timing fields like pdf_emit_ms are expected; the raw byte field
        // itself must not appear.
        assert!(!json.contains("\"pdf\":"), "pdf bytes must not be serialised");
        assert!(json.contains("total_diagrams"));
        assert!(json.contains("pdf_emit_ms"));
    }
}
