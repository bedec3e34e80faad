//! The rendering environment: a host capable of loading the assembled
//! document, running Mermaid against individual placeholders, and printing
//! the result to PDF.
//!
//! ## Why a trait?
//!
//! The pipeline logic (sequential loop, fault isolation, state
//! transitions) is independent of the concrete rendering technology. The
//! [`RenderHost`] seam keeps the orchestrator testable against a scripted
//! host and leaves the browser swappable without touching pipeline code.
//!
//! ## Why sync + `spawn_blocking`?
//!
//! `headless_chrome` drives the DevTools protocol synchronously. The whole
//! browser stage runs on a `tokio::task::spawn_blocking` thread, so Tokio
//! workers never stall on a navigation or a render — the same structure
//! the async API would have wrapped around any other blocking engine.

use crate::config::{ConversionConfig, PaperSize};
use crate::error::MdpressError;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Result of one in-page render attempt.
///
/// `Failed` is the *local* failure path: the page already holds the error
/// marker and the loop moves on. Host infrastructure failures surface as
/// `Err(MdpressError)` from [`RenderHost::render_diagram`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderAttempt {
    /// The placeholder now contains the rendered SVG.
    Rendered,
    /// The placeholder now contains an inline error marker; the message is
    /// the renderer's own diagnosis.
    Failed(String),
}

/// Fixed page geometry for PDF emission.
#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    pub paper: PaperSize,
    pub margin_inches: f64,
}

impl From<&ConversionConfig> for PageOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            paper: config.paper,
            margin_inches: config.margin_inches,
        }
    }
}

/// The capability boundary between the pipeline and the concrete
/// rendering technology.
pub trait RenderHost {
    /// Load the assembled document and block until the content is idle.
    fn load(&mut self, html: &str) -> Result<(), MdpressError>;

    /// Block until the diagram renderer reports ready, or fail fatally
    /// after `timeout` — an absent renderer is broken infrastructure, not
    /// a content problem.
    fn await_renderer(&mut self, timeout: Duration) -> Result<(), MdpressError>;

    /// Render the diagram in placeholder `diagram-{index}` synchronously
    /// inside the environment.
    fn render_diagram(&mut self, index: usize) -> Result<RenderAttempt, MdpressError>;

    /// Count final placeholder states as `(rendered, failed)`.
    fn count_outcomes(&mut self) -> Result<(usize, usize), MdpressError>;

    /// Show (`Some`) or remove (`None`) the diagnostic progress overlay.
    /// Observational only; failures here never affect control flow.
    fn set_overlay(&mut self, text: Option<&str>) -> Result<(), MdpressError>;

    /// Serialise the fully-rendered document to paginated PDF bytes.
    fn print_to_pdf(&mut self, options: &PageOptions) -> Result<Vec<u8>, MdpressError>;
}

// ── In-page scripts ──────────────────────────────────────────────────────

/// Expression polled while waiting for the renderer to initialise.
const READY_EXPR: &str = r#"typeof mermaid !== "undefined" && window.__diagramReady === true"#;

/// Per-diagram render script, `__IDX__` substituted per call.
///
/// Decodes the placeholder's own `data-diagram-source`, awaits
/// `mermaid.render`, and installs either the SVG or an error marker that
/// keeps the raw source visible. Always resolves to a JSON string — a
/// Mermaid failure is data, not an exception, so it can never be confused
/// with a DevTools transport failure.
const RENDER_ONE_JS: &str = r#"
(async () => {
  const el = document.getElementById("diagram-__IDX__");
  if (!el) {
    return JSON.stringify({ ok: false, error: "placeholder diagram-__IDX__ not found" });
  }
  const src = decodeURIComponent(el.dataset.diagramSource);
  try {
    const { svg } = await mermaid.render("diagram-svg-__IDX__", src);
    el.innerHTML = svg;
    el.dataset.renderState = "ok";
    return JSON.stringify({ ok: true });
  } catch (err) {
    const leftover = document.getElementById("diagram-svg-__IDX__");
    if (leftover) leftover.remove();
    const msg = err && err.message ? err.message : String(err);
    el.classList.add("diagram-error");
    el.dataset.renderState = "error";
    el.innerHTML = "";
    const title = document.createElement("div");
    title.className = "diagram-error-title";
    title.textContent = "Diagram failed to render: " + msg;
    const pre = document.createElement("pre");
    pre.textContent = src;
    el.appendChild(title);
    el.appendChild(pre);
    return JSON.stringify({ ok: false, error: msg });
  }
})()
"#;

/// Counts final placeholder states straight from the DOM.
const COUNT_JS: &str = r#"
JSON.stringify({
  rendered: document.querySelectorAll('.diagram[data-render-state="ok"]').length,
  failed: document.querySelectorAll('.diagram[data-render-state="error"]').length
})
"#;

#[derive(Deserialize)]
struct RenderReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct CountReply {
    rendered: usize,
    failed: usize,
}

// ── ChromeHost ───────────────────────────────────────────────────────────

/// A headless-Chrome rendering environment.
///
/// Exclusively owned by one conversion: created at the start, torn down
/// exactly once at the end via [`ChromeHost::teardown`] on every exit
/// path. The browser child process is additionally killed on drop, so an
/// aborted owning process cannot leak it.
pub struct ChromeHost {
    browser: Browser,
    tab: Arc<Tab>,
    /// Holds the assembled document on disk for the `file://` navigation;
    /// kept alive for the page's lifetime.
    workdir: Option<TempDir>,
}

impl ChromeHost {
    /// Launch an isolated browser instance: headless, sandboxed page, no
    /// GPU, no shared-memory dependence (portability inside containers).
    pub fn launch(config: &ConversionConfig) -> Result<Self, MdpressError> {
        let start = Instant::now();

        let chrome_path = config
            .chrome_path
            .clone()
            .or_else(|| std::env::var_os("CHROME_PATH").map(Into::into));

        let args: Vec<&OsStr> = vec![
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--hide-scrollbars"),
        ];

        let mut builder = LaunchOptions::default_builder();
        builder
            .headless(true)
            .sandbox(false)
            .args(args)
            .idle_browser_timeout(Duration::from_secs(300));
        if let Some(path) = chrome_path {
            builder.path(Some(path));
        }
        let options = builder
            .build()
            .map_err(|e| MdpressError::BrowserLaunchFailed {
                detail: e.to_string(),
            })?;

        let browser = Browser::new(options).map_err(|e| MdpressError::BrowserLaunchFailed {
            detail: e.to_string(),
        })?;
        let tab = browser
            .new_tab()
            .map_err(|e| MdpressError::BrowserLaunchFailed {
                detail: e.to_string(),
            })?;

        info!(
            "Rendering environment ready in {}ms",
            start.elapsed().as_millis()
        );
        Ok(Self {
            browser,
            tab,
            workdir: None,
        })
    }

    /// Tear the environment down, once, logging (never returning) failures
    /// so they cannot mask the conversion's real outcome.
    pub fn teardown(self) {
        if let Err(e) = self.tab.close(true) {
            warn!("Failed to close rendering tab: {e}");
        }
        // Dropping `browser` kills the child process; dropping `workdir`
        // removes the on-disk document.
        drop(self.browser);
        drop(self.workdir);
        debug!("Rendering environment torn down");
    }

    fn eval(&self, expr: &str, await_promise: bool) -> Result<serde_json::Value, MdpressError> {
        let remote = self
            .tab
            .evaluate(expr, await_promise)
            .map_err(|e| MdpressError::ScriptFailed {
                detail: e.to_string(),
            })?;
        Ok(remote.value.unwrap_or(serde_json::Value::Null))
    }

    /// Evaluate a script that resolves to a JSON string, and parse it.
    fn eval_json<T: serde::de::DeserializeOwned>(
        &self,
        expr: &str,
        await_promise: bool,
    ) -> Result<T, MdpressError> {
        let value = self.eval(expr, await_promise)?;
        let text = value.as_str().ok_or_else(|| MdpressError::ScriptFailed {
            detail: format!("expected a JSON string reply, got: {value}"),
        })?;
        serde_json::from_str(text).map_err(|e| MdpressError::ScriptFailed {
            detail: format!("malformed script reply: {e}"),
        })
    }
}

impl RenderHost for ChromeHost {
    fn load(&mut self, html: &str) -> Result<(), MdpressError> {
        let dir = TempDir::new().map_err(|e| MdpressError::Internal(format!("tempdir: {e}")))?;
        let doc_path = dir.path().join("document.html");
        std::fs::write(&doc_path, html).map_err(|e| MdpressError::ContentLoadFailed {
            detail: format!("writing assembled document: {e}"),
        })?;

        let url = format!("file://{}", doc_path.display());
        debug!("Loading assembled document: {url}");
        self.tab
            .navigate_to(&url)
            .map_err(|e| MdpressError::ContentLoadFailed {
                detail: e.to_string(),
            })?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| MdpressError::ContentLoadFailed {
                detail: e.to_string(),
            })?;

        self.workdir = Some(dir);
        Ok(())
    }

    fn await_renderer(&mut self, timeout: Duration) -> Result<(), MdpressError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.eval(READY_EXPR, false)?.as_bool().unwrap_or(false) {
                debug!("Diagram renderer initialised");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(MdpressError::RendererUnavailable {
                    secs: timeout.as_secs(),
                });
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    fn render_diagram(&mut self, index: usize) -> Result<RenderAttempt, MdpressError> {
        let script = RENDER_ONE_JS.replace("__IDX__", &index.to_string());
        let reply: RenderReply = self.eval_json(&script, true)?;
        if reply.ok {
            Ok(RenderAttempt::Rendered)
        } else {
            Ok(RenderAttempt::Failed(
                reply.error.unwrap_or_else(|| "unknown render error".into()),
            ))
        }
    }

    fn count_outcomes(&mut self) -> Result<(usize, usize), MdpressError> {
        let reply: CountReply = self.eval_json(COUNT_JS, false)?;
        Ok((reply.rendered, reply.failed))
    }

    fn set_overlay(&mut self, text: Option<&str>) -> Result<(), MdpressError> {
        let script = match text {
            Some(t) => format!(
                r#"(() => {{
  let o = document.getElementById("mdpress-overlay");
  if (!o) {{
    o = document.createElement("div");
    o.id = "mdpress-overlay";
    document.body.appendChild(o);
  }}
  o.textContent = {};
}})()"#,
                serde_json::Value::from(t)
            ),
            None => r#"(() => {
  const o = document.getElementById("mdpress-overlay");
  if (o) o.remove();
})()"#
                .to_string(),
        };
        self.eval(&script, false)?;
        Ok(())
    }

    fn print_to_pdf(&mut self, options: &PageOptions) -> Result<Vec<u8>, MdpressError> {
        let (width, height) = options.paper.dimensions_inches();
        let pdf_options = PrintToPdfOptions {
            landscape: Some(false),
            display_header_footer: Some(false),
            print_background: Some(true),
            paper_width: Some(width),
            paper_height: Some(height),
            margin_top: Some(options.margin_inches),
            margin_bottom: Some(options.margin_inches),
            margin_left: Some(options.margin_inches),
            margin_right: Some(options.margin_inches),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(pdf_options))
            .map_err(|e| MdpressError::PdfEmitFailed {
                detail: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_script_addresses_the_right_placeholder() {
        let script = RENDER_ONE_JS.replace("__IDX__", "7");
        assert!(script.contains(r#"getElementById("diagram-7")"#));
        assert!(script.contains(r#"mermaid.render("diagram-svg-7""#));
        assert!(!script.contains("__IDX__"));
    }

    #[test]
    fn render_reply_parses_both_arms() {
        let ok: RenderReply = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(ok.ok);
        let err: RenderReply =
            serde_json::from_str(r#"{"ok":false,"error":"Parse error on line 2"}"#).unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.as_deref(), Some("Parse error on line 2"));
    }

    #[test]
    fn count_reply_parses() {
        let c: CountReply = serde_json::from_str(r#"{"rendered":3,"failed":1}"#).unwrap();
        assert_eq!((c.rendered, c.failed), (3, 1));
    }

    #[test]
    fn page_options_follow_config() {
        let config = ConversionConfig::builder()
            .paper(PaperSize::Letter)
            .margin_inches(0.5)
            .build()
            .unwrap();
        let opts = PageOptions::from(&config);
        assert_eq!(opts.paper, PaperSize::Letter);
        assert_eq!(opts.margin_inches, 0.5);
    }
}
