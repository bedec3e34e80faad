//! Diagram extraction: locate Mermaid code fences and classify them.
//!
//! Extraction happens on the *raw* document text, before any markdown
//! parsing, so diagram source never passes through the markdown transform.
//! Pipes, angle brackets, and arrows that are significant to Mermaid would
//! otherwise be reinterpreted as markdown syntax.
//!
//! Zero diagrams is not an error, and neither is an unrecognised diagram
//! header — unknown diagrams are still extracted and still attempted at
//! render time, where a failure degrades to an inline error marker.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// A fenced code block matching every backtick fence in the document.
/// The info string and body are captured; diagram fences are filtered out
/// of the full set afterwards so a `mermaid`-looking line inside an
/// ordinary code block is never misread as a diagram.
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^```[ \t]*([^`\n]*)\n(.*?)^```[ \t]*$").unwrap());

/// The classified type of a diagram, derived from the first non-empty line
/// of its source.
///
/// The tag is advisory: it labels placeholders, logs, and outcomes, but
/// Mermaid itself re-detects the grammar at render time, so `Unknown`
/// diagrams get the same render attempt as every other kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelationship,
    Journey,
    Gantt,
    Pie,
    GitGraph,
    MindMap,
    Timeline,
    ZenUml,
    Sankey,
    Unknown,
}

/// Ordered keyword predicates for classification. First match wins, so the
/// order is part of the contract.
const KIND_KEYWORDS: &[(&str, DiagramKind)] = &[
    ("flowchart", DiagramKind::Flowchart),
    ("graph", DiagramKind::Flowchart),
    ("sequence", DiagramKind::Sequence),
    ("class", DiagramKind::Class),
    ("state", DiagramKind::State),
    ("er", DiagramKind::EntityRelationship),
    ("journey", DiagramKind::Journey),
    ("gantt", DiagramKind::Gantt),
    ("pie", DiagramKind::Pie),
    ("gitgraph", DiagramKind::GitGraph),
    ("mindmap", DiagramKind::MindMap),
    ("timeline", DiagramKind::Timeline),
    ("zenuml", DiagramKind::ZenUml),
    ("sankey", DiagramKind::Sankey),
];

impl DiagramKind {
    /// Classify a diagram by its first non-empty source line.
    ///
    /// Case-insensitive substring match against the ordered keyword table;
    /// anything unmatched is [`DiagramKind::Unknown`], never an error.
    pub fn classify(source: &str) -> Self {
        let first_line = match source.lines().find(|l| !l.trim().is_empty()) {
            Some(l) => l.to_ascii_lowercase(),
            None => return DiagramKind::Unknown,
        };
        for (keyword, kind) in KIND_KEYWORDS {
            if first_line.contains(keyword) {
                return *kind;
            }
        }
        DiagramKind::Unknown
    }

    /// Stable tag used in placeholder attributes, logs, and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequence",
            DiagramKind::Class => "class",
            DiagramKind::State => "state",
            DiagramKind::EntityRelationship => "er",
            DiagramKind::Journey => "journey",
            DiagramKind::Gantt => "gantt",
            DiagramKind::Pie => "pie",
            DiagramKind::GitGraph => "gitgraph",
            DiagramKind::MindMap => "mindmap",
            DiagramKind::Timeline => "timeline",
            DiagramKind::ZenUml => "zenuml",
            DiagramKind::Sankey => "sankey",
            DiagramKind::Unknown => "unknown",
        }
    }
}

/// One extracted diagram block.
///
/// Immutable once created: the assembler substitutes its span, the render
/// loop reads its index and source, nothing mutates it.
#[derive(Debug, Clone)]
pub struct DiagramBlock {
    /// 0-indexed extraction order; also the placeholder id suffix.
    pub index: usize,
    /// Classified kind tag.
    pub kind: DiagramKind,
    /// Trimmed diagram source text.
    pub source: String,
    /// Byte span of the whole fence (including the fence lines) in the
    /// original document, used by the assembler for substitution.
    pub span: Range<usize>,
}

/// Does this fence info string mark a diagram block?
///
/// Accepted: the reserved labels `mermaid` and `mmd` as the first token, or
/// an attributed info string carrying a `.mmd` file marker
/// (e.g. ```` ```{src="architecture.mmd"} ````).
fn is_diagram_fence(info: &str) -> bool {
    let info = info.trim().to_ascii_lowercase();
    if let Some(label) = info.split_whitespace().next() {
        let label = label.trim_start_matches('{').trim_end_matches('}');
        let label = label.trim_start_matches('.');
        if label == "mermaid" || label == "mmd" {
            return true;
        }
    }
    info.contains(".mmd")
}

/// Scan raw document text for diagram fences, in document order.
pub fn extract_diagrams(text: &str) -> Vec<DiagramBlock> {
    let mut blocks = Vec::new();
    for caps in FENCE_RE.captures_iter(text) {
        let info = caps.get(1).map_or("", |m| m.as_str());
        if !is_diagram_fence(info) {
            continue;
        }
        let whole = caps.get(0).expect("capture 0 always present");
        let source = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
        let kind = DiagramKind::classify(&source);
        tracing::debug!(
            "Extracted diagram {} ({}) at bytes {}..{}",
            blocks.len(),
            kind.as_str(),
            whole.start(),
            whole.end()
        );
        blocks.push(DiagramBlock {
            index: blocks.len(),
            kind,
            source,
            span: whole.range(),
        });
    }
    blocks
}
