//! End-to-end tests for mdpress.
//!
//! These launch a real headless Chrome and (unless --mermaid-js is wired
//! into the config) fetch Mermaid from the CDN, so they are gated behind
//! the `E2E_ENABLED` environment variable and do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e flowchart -- --nocapture

use mdpress::{
    convert_str, convert_to_file, inspect, ConversionConfig, DiagramStatus, MdpressError,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

fn e2e_config() -> ConversionConfig {
    let mut builder = ConversionConfig::builder()
        .renderer_timeout_secs(30)
        .diagram_pause_ms(50);
    if let Ok(path) = std::env::var("CHROME_PATH") {
        builder = builder.chrome_path(path);
    }
    builder.build().expect("e2e config builds")
}

/// Basic sanity checks on emitted PDF bytes.
fn assert_pdf_quality(pdf: &[u8], context: &str) {
    assert!(!pdf.is_empty(), "[{context}] PDF is empty");
    assert!(
        pdf.starts_with(b"%PDF-"),
        "[{context}] PDF must start with %PDF- magic, got: {:?}",
        &pdf[..pdf.len().min(8)]
    );
    // Chrome always writes the trailer; a truncated body would lack it.
    let tail = &pdf[pdf.len().saturating_sub(64)..];
    assert!(
        tail.windows(5).any(|w| w == b"%%EOF"),
        "[{context}] PDF is missing the %%EOF trailer"
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn flowchart_renders_to_pdf() {
    e2e_skip_unless_enabled!();

    let doc = "# Flow\n\n```mermaid\ngraph TD\n  A[Start] --> B[End]\n```\n";
    let output = convert_str("flowchart.md", doc, &e2e_config())
        .await
        .expect("conversion succeeds");

    assert_pdf_quality(&output.pdf, "flowchart");
    assert_eq!(output.stats.total_diagrams, 1);
    assert_eq!(output.stats.rendered_diagrams, 1);
    assert_eq!(output.stats.failed_diagrams, 0);
    assert!(output.diagrams[0].status.is_rendered());
    assert_eq!(output.diagrams[0].kind, "flowchart");

    println!(
        "flowchart: {} bytes, total {}ms (render {}ms)",
        output.pdf.len(),
        output.timing.total_ms,
        output.timing.diagram_render_ms
    );
}

#[tokio::test]
async fn malformed_diagram_yields_pdf_with_error_marker() {
    e2e_skip_unless_enabled!();

    let doc = "# Broken\n\nBefore.\n\n```mermaid\ngraph TD\n  A --> --> B\n```\n\nAfter.\n";
    let output = convert_str("broken.md", doc, &e2e_config())
        .await
        .expect("conversion must survive a malformed diagram");

    // The document still prints; the bad diagram shows up as failed.
    assert_pdf_quality(&output.pdf, "malformed");
    assert_eq!(output.stats.total_diagrams, 1);
    assert_eq!(output.stats.rendered_diagrams, 0);
    assert_eq!(output.stats.failed_diagrams, 1);
    match &output.diagrams[0].status {
        DiagramStatus::Failed(err) => println!("diagram error (expected): {err}"),
        DiagramStatus::Rendered => panic!("malformed diagram must not report rendered"),
    }

    // Strict mode turns the same result into a fatal error.
    let err = output.into_strict().unwrap_err();
    assert!(matches!(
        err,
        MdpressError::DiagramsFailed { failed: 1, total: 1 }
    ));
}

#[tokio::test]
async fn mixed_document_isolates_the_one_bad_diagram() {
    e2e_skip_unless_enabled!();

    let doc = "# Mixed\n\n\
        ```mermaid\ngraph LR\n  A --> B\n```\n\n\
        Some prose.\n\n\
        ```mermaid\nthis is not mermaid at all {{{\n```\n\n\
        ```mermaid\nsequenceDiagram\n  Alice->>Bob: ping\n```\n";
    let output = convert_str("mixed.md", doc, &e2e_config())
        .await
        .expect("conversion succeeds");

    assert_pdf_quality(&output.pdf, "mixed");
    assert_eq!(output.stats.total_diagrams, 3);
    assert_eq!(output.stats.rendered_diagrams, 2);
    assert_eq!(output.stats.failed_diagrams, 1);
    assert!(output.diagrams[0].status.is_rendered());
    assert!(!output.diagrams[1].status.is_rendered());
    assert!(output.diagrams[2].status.is_rendered());
}

#[tokio::test]
async fn diagram_free_document_prints() {
    e2e_skip_unless_enabled!();

    let doc = "# Plain\n\nJust text, a **bold** word, and a list:\n\n- one\n- two\n";
    let output = convert_str("plain.md", doc, &e2e_config())
        .await
        .expect("conversion succeeds");

    assert_pdf_quality(&output.pdf, "plain");
    assert_eq!(output.stats.total_diagrams, 0);
    assert!(output.diagrams.is_empty());
}

#[tokio::test]
async fn convert_to_file_writes_the_pdf() {
    e2e_skip_unless_enabled!();

    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("doc.md");
    let output_path = dir.path().join("out/doc.pdf");
    std::fs::write(&input, "# File\n\n```mermaid\npie\n  \"a\" : 2\n  \"b\" : 1\n```\n")
        .expect("write input");

    let output = convert_to_file(&input, &output_path, &e2e_config())
        .await
        .expect("conversion succeeds");

    assert_eq!(output.stats.rendered_diagrams, 1);
    let on_disk = std::fs::read(&output_path).expect("output file exists");
    assert_pdf_quality(&on_disk, "to_file");
    assert_eq!(on_disk, output.pdf);
    // No leftover temp file from the atomic write.
    assert!(!output_path.with_extension("pdf.tmp").exists());
}

#[tokio::test]
async fn repeated_runs_agree_on_outcomes() {
    e2e_skip_unless_enabled!();

    let doc = "# Twice\n\n```mermaid\ngraph TD\n  X --> Y\n```\n";
    let config = e2e_config();
    let first = convert_str("twice.md", doc, &config).await.expect("first run");
    let second = convert_str("twice.md", doc, &config).await.expect("second run");

    // PDF bytes embed timestamps, so compare semantics rather than bytes.
    assert_eq!(first.stats.total_diagrams, second.stats.total_diagrams);
    assert_eq!(first.stats.rendered_diagrams, second.stats.rendered_diagrams);
    assert_eq!(first.stats.failed_diagrams, second.stats.failed_diagrams);
    assert_pdf_quality(&first.pdf, "run 1");
    assert_pdf_quality(&second.pdf, "run 2");
}

#[tokio::test]
async fn inspect_needs_no_browser() {
    // No gate: inspect never launches Chrome.
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("doc.md");
    std::fs::write(
        &input,
        "```mermaid\ngraph TD\n  A --> B\n```\n\n```mmd\ngantt\n  title T\n```\n",
    )
    .expect("write input");

    let blocks = inspect(&input).await.expect("inspect succeeds");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].kind.as_str(), "flowchart");
    assert_eq!(blocks[1].kind.as_str(), "gantt");
}
