//! The render orchestrator: drives a [`RenderHost`] from loaded content to
//! a fully-rendered document, then emits the PDF.
//!
//! ## Sequencing
//!
//! ```text
//! load ──▶ await renderer ──▶ render diagram 0..N (sequential) ──▶ count ──▶ print
//! ```
//!
//! Diagrams render one at a time, in extraction order, with a short pause
//! between them. Sequential rendering bounds peak load inside the
//! environment and keeps every failure attributable to exactly one
//! diagram. A failed diagram becomes an inline error marker and the loop
//! continues — only infrastructure failures (dead tab, absent renderer)
//! abort the conversion.

use crate::config::ConversionConfig;
use crate::error::{DiagramError, MdpressError};
use crate::output::{ConversionTiming, DiagramOutcome, DiagramStatus, RenderStats};
use crate::pipeline::extract::DiagramBlock;
use crate::pipeline::host::{PageOptions, RenderAttempt, RenderHost};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Load the assembled document, wait for the renderer, and render every
/// diagram with per-diagram fault isolation.
///
/// Returns one [`DiagramOutcome`] per block, in extraction order, plus the
/// aggregate counts read back from the final placeholder states.
pub fn run_render_stage(
    host: &mut dyn RenderHost,
    html: &str,
    blocks: &[DiagramBlock],
    config: &ConversionConfig,
    timing: &mut ConversionTiming,
) -> Result<(Vec<DiagramOutcome>, RenderStats), MdpressError> {
    // ── Content load ─────────────────────────────────────────────────────
    let load_start = Instant::now();
    host.load(html)?;
    timing.load_ms = load_start.elapsed().as_millis() as u64;
    debug!("Document loaded in {}ms", timing.load_ms);

    // ── Renderer availability ────────────────────────────────────────────
    let wait_start = Instant::now();
    host.await_renderer(Duration::from_secs(config.renderer_timeout_secs))?;
    timing.renderer_wait_ms = wait_start.elapsed().as_millis() as u64;

    // ── Sequential diagram loop ──────────────────────────────────────────
    let total = blocks.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start(total);
    }

    let loop_start = Instant::now();
    let mut outcomes = Vec::with_capacity(total);

    for (i, block) in blocks.iter().enumerate() {
        if config.debug_overlay {
            let label = format!("rendering diagram {}/{}", i + 1, total);
            if let Err(e) = host.set_overlay(Some(&label)) {
                warn!("Progress overlay update failed: {e}");
            }
        }
        if let Some(ref cb) = config.progress_callback {
            cb.on_diagram_start(block.index, total);
        }

        let status = match host.render_diagram(block.index)? {
            RenderAttempt::Rendered => {
                debug!("Diagram {} ({}) rendered", block.index, block.kind.as_str());
                if let Some(ref cb) = config.progress_callback {
                    cb.on_diagram_complete(block.index, total);
                }
                DiagramStatus::Rendered
            }
            RenderAttempt::Failed(detail) => {
                warn!(
                    "Diagram {} ({}) failed: {detail}",
                    block.index,
                    block.kind.as_str()
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_diagram_error(block.index, total, &detail);
                }
                DiagramStatus::Failed(DiagramError::RenderFailed {
                    index: block.index,
                    kind: block.kind.as_str().to_string(),
                    detail,
                })
            }
        };
        outcomes.push(DiagramOutcome {
            index: block.index,
            kind: block.kind.as_str().to_string(),
            status,
        });

        // Short breather between renders; skipped after the last one.
        if i + 1 < total && config.diagram_pause_ms > 0 {
            std::thread::sleep(Duration::from_millis(config.diagram_pause_ms));
        }
    }

    if config.debug_overlay {
        if let Err(e) = host.set_overlay(None) {
            warn!("Progress overlay removal failed: {e}");
        }
    }
    timing.diagram_render_ms = loop_start.elapsed().as_millis() as u64;

    // ── Aggregate from final placeholder states ──────────────────────────
    let (rendered, failed) = host.count_outcomes()?;
    let stats = RenderStats {
        total_diagrams: total,
        rendered_diagrams: rendered,
        failed_diagrams: failed,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(total, rendered);
    }
    info!(
        "Rendered {}/{} diagrams in {}ms ({} failed)",
        rendered, total, timing.diagram_render_ms, failed
    );

    Ok((outcomes, stats))
}

/// Serialise the rendered document to PDF bytes with the configured fixed
/// page geometry. Failure here is fatal for the conversion.
pub fn emit_pdf(
    host: &mut dyn RenderHost,
    config: &ConversionConfig,
    timing: &mut ConversionTiming,
) -> Result<Vec<u8>, MdpressError> {
    let start = Instant::now();
    let pdf = host.print_to_pdf(&PageOptions::from(config))?;
    timing.pdf_emit_ms = start.elapsed().as_millis() as u64;
    info!(
        "Emitted {} bytes of PDF in {}ms",
        pdf.len(),
        timing.pdf_emit_ms
    );
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::extract_diagrams;

    /// A scripted host: renders every diagram, failing the indices listed
    /// in `fail_indices`, and records the calls it receives.
    struct ScriptedHost {
        fail_indices: Vec<usize>,
        loaded: bool,
        renderer_ready: bool,
        render_calls: Vec<usize>,
        rendered: usize,
        failed: usize,
    }

    impl ScriptedHost {
        fn new(fail_indices: Vec<usize>) -> Self {
            Self {
                fail_indices,
                loaded: false,
                renderer_ready: true,
                render_calls: Vec::new(),
                rendered: 0,
                failed: 0,
            }
        }
    }

    impl RenderHost for ScriptedHost {
        fn load(&mut self, _html: &str) -> Result<(), MdpressError> {
            self.loaded = true;
            Ok(())
        }

        fn await_renderer(&mut self, timeout: Duration) -> Result<(), MdpressError> {
            if self.renderer_ready {
                Ok(())
            } else {
                Err(MdpressError::RendererUnavailable {
                    secs: timeout.as_secs(),
                })
            }
        }

        fn render_diagram(&mut self, index: usize) -> Result<RenderAttempt, MdpressError> {
            self.render_calls.push(index);
            if self.fail_indices.contains(&index) {
                self.failed += 1;
                Ok(RenderAttempt::Failed("Parse error on line 1".into()))
            } else {
                self.rendered += 1;
                Ok(RenderAttempt::Rendered)
            }
        }

        fn count_outcomes(&mut self) -> Result<(usize, usize), MdpressError> {
            Ok((self.rendered, self.failed))
        }

        fn set_overlay(&mut self, _text: Option<&str>) -> Result<(), MdpressError> {
            Ok(())
        }

        fn print_to_pdf(&mut self, _options: &PageOptions) -> Result<Vec<u8>, MdpressError> {
            Ok(b"%PDF-1.7 fake".to_vec())
        }
    }

    fn three_diagram_blocks() -> Vec<DiagramBlock> {
        extract_diagrams(
            "```mermaid\ngraph TD\nA-->B\n```\n\n```mermaid\nnot a diagram\n```\n\n```mermaid\npie\n```\n",
        )
    }

    fn quick_config() -> ConversionConfig {
        ConversionConfig::builder().diagram_pause_ms(0).build().unwrap()
    }

    #[test]
    fn all_diagrams_render_in_extraction_order() {
        let blocks = three_diagram_blocks();
        let mut host = ScriptedHost::new(vec![]);
        let mut timing = ConversionTiming::default();
        let (outcomes, stats) =
            run_render_stage(&mut host, "<html>", &blocks, &quick_config(), &mut timing).unwrap();

        assert_eq!(host.render_calls, vec![0, 1, 2]);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.status.is_rendered()));
        assert_eq!(stats.rendered_diagrams, 3);
        assert_eq!(stats.failed_diagrams, 0);
    }

    #[test]
    fn one_failure_does_not_abort_the_rest() {
        let blocks = three_diagram_blocks();
        let mut host = ScriptedHost::new(vec![1]);
        let mut timing = ConversionTiming::default();
        let (outcomes, stats) =
            run_render_stage(&mut host, "<html>", &blocks, &quick_config(), &mut timing).unwrap();

        // Diagram 2 still renders after diagram 1 fails.
        assert_eq!(host.render_calls, vec![0, 1, 2]);
        assert!(outcomes[0].status.is_rendered());
        assert!(!outcomes[1].status.is_rendered());
        assert!(outcomes[2].status.is_rendered());
        assert_eq!(stats.rendered_diagrams, 2);
        assert_eq!(stats.failed_diagrams, 1);
        assert_eq!(stats.total_diagrams, 3);

        match &outcomes[1].status {
            DiagramStatus::Failed(DiagramError::RenderFailed { index, detail, .. }) => {
                assert_eq!(*index, 1);
                assert!(detail.contains("Parse error"));
            }
            other => panic!("expected failure outcome, got {other:?}"),
        }
    }

    #[test]
    fn absent_renderer_is_fatal() {
        let blocks = three_diagram_blocks();
        let mut host = ScriptedHost::new(vec![]);
        host.renderer_ready = false;
        let mut timing = ConversionTiming::default();
        let err = run_render_stage(&mut host, "<html>", &blocks, &quick_config(), &mut timing)
            .unwrap_err();
        assert!(matches!(err, MdpressError::RendererUnavailable { .. }));
        assert!(host.render_calls.is_empty(), "no diagram may be attempted");
    }

    #[test]
    fn zero_diagrams_still_loads_and_counts() {
        let mut host = ScriptedHost::new(vec![]);
        let mut timing = ConversionTiming::default();
        let (outcomes, stats) =
            run_render_stage(&mut host, "<html>", &[], &quick_config(), &mut timing).unwrap();
        assert!(host.loaded);
        assert!(outcomes.is_empty());
        assert_eq!(stats.total_diagrams, 0);
    }

    #[test]
    fn emit_pdf_records_timing_and_returns_bytes() {
        let mut host = ScriptedHost::new(vec![]);
        let mut timing = ConversionTiming::default();
        let pdf = emit_pdf(&mut host, &quick_config(), &mut timing).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
