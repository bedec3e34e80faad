//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different rendering environment behind
//! [`host::RenderHost`]) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ assemble ──▶ render ──▶ PDF
//! (file)    (fences)    (HTML doc)   (browser)  (print)
//! ```
//!
//! 1. [`input`]    — read the markdown file into a `SourceDocument`
//! 2. [`extract`]  — find diagram fences and classify them, *before* any
//!    markdown parsing so diagram syntax never reaches the transform
//! 3. [`markdown`] — GFM markdown → HTML for everything that is not a
//!    diagram
//! 4. [`assemble`] — placeholder substitution plus the self-contained
//!    document shell (stylesheet + Mermaid bootstrap)
//! 5. [`host`]     — the rendering environment boundary; `ChromeHost`
//!    runs headless Chrome, synchronously, inside `spawn_blocking`
//! 6. [`render`]   — the orchestrator: sequential per-diagram loop with
//!    local failure handling, then PDF emission

pub mod assemble;
pub mod extract;
pub mod host;
pub mod input;
pub mod markdown;
pub mod render;
