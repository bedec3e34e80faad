//! Conversion entry points.
//!
//! One conversion is one strictly sequential pipeline: read → extract →
//! assemble → render → emit. There is no internal parallelism by design —
//! sequential diagram rendering bounds peak browser load and keeps every
//! failure attributable — so doing many documents concurrently means
//! calling [`convert`] from several tasks, each of which gets its own
//! exclusively-owned rendering environment.

use crate::config::ConversionConfig;
use crate::error::MdpressError;
use crate::output::{ConversionOutput, ConversionTiming, DiagramOutcome, RenderStats};
use crate::pipeline::extract::{extract_diagrams, DiagramBlock};
use crate::pipeline::host::{ChromeHost, RenderHost};
use crate::pipeline::{assemble, input, render};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a markdown file to PDF bytes.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some diagrams failed to
/// render (check `output.stats.failed_diagrams`; each failure appears in
/// the PDF as an inline error marker carrying the diagram's source).
///
/// # Errors
/// Returns `Err(MdpressError)` only for fatal errors:
/// - Input file missing/unreadable/not UTF-8
/// - The rendering environment cannot start, the document cannot load, or
///   Mermaid never initialises
/// - PDF serialisation fails
///
/// A fatal error never produces a partial PDF.
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MdpressError> {
    let total_start = Instant::now();
    let path = input_path.as_ref();
    info!("Starting conversion: {}", path.display());

    // ── Step 1: Read input ───────────────────────────────────────────────
    let read_start = Instant::now();
    let doc = input::read_source(path).await?;
    let read_ms = read_start.elapsed().as_millis() as u64;

    // ── Steps 2..: the shared in-memory pipeline ─────────────────────────
    let mut output = convert_str(&doc.name, &doc.text, config).await?;
    output.timing.read_ms = read_ms;
    output.timing.total_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Convert in-memory markdown text to PDF bytes.
///
/// This is the core pipeline; [`convert`] is a thin file-reading wrapper
/// around it. `name` only labels the document (PDF title, logs).
pub async fn convert_str(
    name: &str,
    text: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MdpressError> {
    let total_start = Instant::now();

    // ── Extract diagrams and assemble the renderable document ────────────
    let extract_start = Instant::now();
    let blocks = extract_diagrams(text);
    info!("Found {} diagram blocks in '{name}'", blocks.len());
    let html = assemble::assemble(name, text, &blocks, config)?;
    let extract_ms = extract_start.elapsed().as_millis() as u64;
    debug!(
        "Assembled {} bytes of HTML in {extract_ms}ms",
        html.len()
    );

    // ── Browser stages on a blocking thread ──────────────────────────────
    let blocking_config = config.clone();
    let (pdf, diagrams, stats, mut timing) =
        tokio::task::spawn_blocking(move || run_browser_stages(&html, &blocks, &blocking_config))
            .await
            .map_err(|e| MdpressError::Internal(format!("Render task panicked: {e}")))??;

    timing.extract_ms = extract_ms;
    timing.total_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {}/{} diagrams, {}ms total",
        stats.rendered_diagrams, stats.total_diagrams, timing.total_ms
    );

    Ok(ConversionOutput {
        pdf,
        diagrams,
        stats,
        timing,
    })
}

/// Convert a markdown file and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MdpressError> {
    let output = convert(input_path, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MdpressError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(|e| MdpressError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| MdpressError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MdpressError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MdpressError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input_path, config))
}

/// List the diagram blocks in a markdown file without converting it.
///
/// Does not launch the rendering environment.
pub async fn inspect(input_path: impl AsRef<Path>) -> Result<Vec<DiagramBlock>, MdpressError> {
    let doc = input::read_source(input_path.as_ref()).await?;
    Ok(extract_diagrams(&doc.text))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Everything that needs the live browser, in one blocking call.
///
/// The rendering environment is created here and torn down here, exactly
/// once, on every exit path — teardown runs before the stage result is
/// propagated, and its own failures are logged inside
/// [`ChromeHost::teardown`] rather than surfaced.
fn run_browser_stages(
    html: &str,
    blocks: &[DiagramBlock],
    config: &ConversionConfig,
) -> Result<(Vec<u8>, Vec<DiagramOutcome>, RenderStats, ConversionTiming), MdpressError> {
    let mut timing = ConversionTiming::default();

    let init_start = Instant::now();
    let host = ChromeHost::launch(config)?;
    timing.browser_init_ms = init_start.elapsed().as_millis() as u64;

    let (pdf, diagrams, stats) = run_and_teardown(
        host,
        ChromeHost::teardown,
        html,
        blocks,
        config,
        &mut timing,
    )?;
    Ok((pdf, diagrams, stats, timing))
}

/// Run the render and emit stages over a live host, then tear the host
/// down on every exit path before the stage result propagates.
fn run_and_teardown<H: RenderHost>(
    mut host: H,
    teardown: impl FnOnce(H),
    html: &str,
    blocks: &[DiagramBlock],
    config: &ConversionConfig,
    timing: &mut ConversionTiming,
) -> Result<(Vec<u8>, Vec<DiagramOutcome>, RenderStats), MdpressError> {
    let result: Result<_, MdpressError> = (|| {
        let (diagrams, stats) = render::run_render_stage(&mut host, html, blocks, config, timing)?;
        let pdf = render::emit_pdf(&mut host, config, timing)?;
        Ok((pdf, diagrams, stats))
    })();

    teardown(host);
    result
}
