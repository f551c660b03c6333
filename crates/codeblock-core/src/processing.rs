//! Generic decoration processing interface.
//!
//! Front ends implement [`DocumentProcessor`]: given the document and a [`RenderRequest`]
//! describing what the host currently shows, produce the complete [`DecorationSet`]. Hosts call
//! it on every document change, viewport change, cursor move or settings change; two calls on
//! unchanged input must return equal sets.

use crate::decorations::DecorationSet;
use crate::document::DocumentText;
use crate::settings::SettingsRevision;
use std::ops::Range;

/// What the host currently displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderRequest {
    /// Settings revision the host holds.
    pub revision: SettingsRevision,
    /// Visible document lines.
    pub viewport: Range<usize>,
    /// Cursor char offset, if the editor has focus.
    pub cursor: Option<usize>,
}

impl RenderRequest {
    /// A request for `viewport` without a cursor.
    pub fn new(revision: SettingsRevision, viewport: Range<usize>) -> Self {
        Self {
            revision,
            viewport,
            cursor: None,
        }
    }

    /// Attach the cursor offset.
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// A processor that produces decorations for a document.
pub trait DocumentProcessor {
    /// The error type returned by [`DocumentProcessor::process`].
    type Error;

    /// Compute the full decoration set for `request`.
    ///
    /// Implementations must not partially apply results: on error the previously returned set
    /// stays authoritative.
    fn process(
        &mut self,
        doc: &DocumentText,
        request: &RenderRequest,
    ) -> Result<DecorationSet, Self::Error>;
}
