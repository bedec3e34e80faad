//! CLI binary for mdpress.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mdpress::{
    convert_to_file, inspect, ConversionConfig, ConversionProgressCallback, MermaidSource,
    PaperSize, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-diagram
/// log lines using [indicatif]. The bar length is set by `on_render_start`
/// once the library knows how many diagrams the document contains.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_render_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Launching browser…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_render_start(&self, total_diagrams: usize) {
        if total_diagrams == 0 {
            self.bar.set_prefix("Printing");
            self.bar.set_message("no diagrams");
            return;
        }
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} diagrams  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_diagrams as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
    }

    fn on_diagram_start(&self, index: usize, total: usize) {
        self.bar.set_message(format!("diagram {}/{}", index + 1, total));
    }

    fn on_diagram_complete(&self, index: usize, total: usize) {
        self.bar
            .println(format!("  {} Diagram {:>2}/{:<2}", green("✓"), index + 1, total));
        self.bar.inc(1);
    }

    fn on_diagram_error(&self, index: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let short: String = error.chars().take(79).collect();
            format!("{short}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Diagram {:>2}/{:<2}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_render_complete(&self, total_diagrams: usize, rendered: usize) {
        let failed = total_diagrams.saturating_sub(rendered);
        self.bar.finish_and_clear();

        if total_diagrams == 0 {
            return;
        }
        if failed == 0 {
            eprintln!(
                "{} {} diagrams rendered successfully",
                green("✔"),
                bold(&rendered.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} diagrams rendered  ({} failed)",
                if rendered == 0 { red("✘") } else { cyan("⚠") },
                bold(&rendered.to_string()),
                total_diagrams,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes notes.pdf next to notes.md)
  mdpress notes.md

  # Explicit output path and paper size
  mdpress report.md -o out/report.pdf --paper letter

  # Fully offline: embed a local Mermaid build
  mdpress notes.md --mermaid-js ./vendor/mermaid.min.js

  # Fail the process if any diagram fails to render
  mdpress notes.md --strict

  # List diagrams without converting (no browser needed)
  mdpress notes.md --inspect-only

  # Machine-readable stats
  mdpress notes.md --json > result.json

DIAGRAMS:
  Fenced code blocks labelled `mermaid` or `mmd` are rendered as diagrams:

    ```mermaid
    graph TD
      A --> B
    ```

  A diagram that fails to render appears in the PDF as a framed error
  marker containing its own source, and the rest of the document is
  unaffected.

ENVIRONMENT VARIABLES:
  CHROME_PATH        Path to a Chrome/Chromium binary
  MDPRESS_OUTPUT     Default for -o/--output
  MDPRESS_PAPER      Default for --paper
  MDPRESS_TIMEOUT    Default for --timeout

SETUP:
  1. Install Chrome or Chromium.
  2. Convert:  mdpress document.md

  Mermaid is loaded from a pinned CDN build by default; use --mermaid-js
  for air-gapped machines.
"#;

/// Convert Markdown with embedded Mermaid diagrams to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "mdpress",
    version,
    about = "Convert Markdown with embedded Mermaid diagrams to print-ready PDF",
    long_about = "Convert Markdown documents to paginated PDF via headless Chrome. Mermaid \
code fences are rendered to vector graphics inline; each diagram renders in isolation, so \
one malformed diagram cannot sink the document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    input: PathBuf,

    /// Write the PDF to this file (default: input path with .pdf extension).
    #[arg(short, long, env = "MDPRESS_OUTPUT")]
    output: Option<PathBuf>,

    /// Paper size: a4, letter.
    #[arg(long, env = "MDPRESS_PAPER", value_enum, default_value = "a4")]
    paper: PaperArg,

    /// Uniform page margin in inches (0.0–3.0).
    #[arg(long, env = "MDPRESS_MARGIN", default_value_t = 0.75)]
    margin: f64,

    /// Mermaid script: a local file path (embedded inline) or an http(s) URL.
    #[arg(long, env = "MDPRESS_MERMAID_JS")]
    mermaid_js: Option<String>,

    /// Seconds to wait for Mermaid to initialise before giving up.
    #[arg(long, env = "MDPRESS_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Milliseconds to pause between consecutive diagram renders.
    #[arg(long, env = "MDPRESS_DIAGRAM_PAUSE", default_value_t = 100)]
    diagram_pause: u64,

    /// Path to a Chrome/Chromium binary.
    #[arg(long, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,

    /// Treat any failed diagram as a fatal error.
    #[arg(long, env = "MDPRESS_STRICT")]
    strict: bool,

    /// Show a live progress overlay inside the page while rendering.
    #[arg(long)]
    debug_overlay: bool,

    /// List diagram blocks and exit, without converting.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON stats instead of human-readable summary.
    #[arg(long, env = "MDPRESS_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "MDPRESS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MDPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MDPRESS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PaperArg {
    A4,
    Letter,
}

impl From<PaperArg> for PaperSize {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A4 => PaperSize::A4,
            PaperArg::Letter => PaperSize::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let blocks = inspect(&cli.input).await.context("Failed to inspect document")?;

        if cli.json {
            let entries: Vec<_> = blocks
                .iter()
                .map(|b| {
                    serde_json::json!({
                        "index": b.index,
                        "kind": b.kind.as_str(),
                        "lines": b.source.lines().count(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            println!("File:      {}", cli.input.display());
            println!("Diagrams:  {}", blocks.len());
            for b in &blocks {
                println!(
                    "  #{:<3} {:<10} {} lines",
                    b.index,
                    b.kind.as_str(),
                    b.source.lines().count()
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("pdf"));

    // ── Run conversion ───────────────────────────────────────────────────
    let mut output = convert_to_file(&cli.input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.strict {
        output = output.into_strict().context("Conversion failed")?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !cli.quiet {
        eprintln!(
            "{}  {}/{} diagrams  {}ms  →  {}",
            if output.stats.failed_diagrams == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.rendered_diagrams,
            output.stats.total_diagrams,
            output.timing.total_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {}  {}",
            dim(&format!("render {}ms", output.timing.diagram_render_ms)),
            dim(&format!("print {}ms", output.timing.pdf_emit_ms)),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mermaid = match cli.mermaid_js.as_deref() {
        None => MermaidSource::Cdn,
        Some(s) if s.starts_with("http://") || s.starts_with("https://") => {
            MermaidSource::Url(s.to_string())
        }
        Some(path) => MermaidSource::Inline(PathBuf::from(path)),
    };

    let mut builder = ConversionConfig::builder()
        .paper(cli.paper.clone().into())
        .margin_inches(cli.margin)
        .mermaid(mermaid)
        .renderer_timeout_secs(cli.timeout)
        .diagram_pause_ms(cli.diagram_pause)
        .debug_overlay(cli.debug_overlay);

    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_path(chrome);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
