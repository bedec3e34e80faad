//! Input resolution: read a local markdown file into a [`SourceDocument`].
//!
//! Errors here are fatal and surface immediately — there is no partial
//! output for a document that could not be read.

use crate::error::MdpressError;
use std::path::Path;
use tracing::debug;

/// The source document of one conversion run.
///
/// Immutable once read; owned exclusively by that run.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Display name (the file name, or a caller-supplied identifier).
    pub name: String,
    /// Raw markdown text.
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Read a markdown file, mapping I/O failures to the input error taxonomy.
pub async fn read_source(path: &Path) -> Result<SourceDocument, MdpressError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MdpressError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MdpressError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(MdpressError::Internal(format!("reading input: {e}"))),
    };

    let text = String::from_utf8(bytes).map_err(|_| MdpressError::InvalidUtf8 {
        path: path.to_path_buf(),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!(
        "Read '{}': {} bytes, {} lines",
        name,
        text.len(),
        text.lines().count()
    );
    Ok(SourceDocument::new(name, text))
}
