use codeblock_core::{DocumentError, SettingsRevision};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors produced by the live view.
pub enum RenderError {
    #[error("invalid viewport {start}..{end} for a document of {line_count} lines")]
    /// The requested viewport is inverted or starts past the end of the document.
    InvalidViewport {
        /// First requested line.
        start: usize,
        /// End of the requested line range (exclusive).
        end: usize,
        /// Lines in the document.
        line_count: usize,
    },

    #[error("settings revision mismatch: view holds {view:?}, request carries {request:?}")]
    /// The request was made against settings the view has not been given.
    RevisionMismatch {
        /// Revision of the settings the view holds.
        view: SettingsRevision,
        /// Revision carried by the request.
        request: SettingsRevision,
    },

    #[error("edit rejected: {0}")]
    /// A text edit did not apply to the document.
    Edit(#[from] DocumentError),
}
