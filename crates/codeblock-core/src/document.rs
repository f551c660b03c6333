//! Document text and code block positions.
//!
//! [`DocumentText`] is a rope-backed copy of the host document, kept in sync through
//! [`TextEdit`]s. [`CodeBlockIndex`] tracks the fenced blocks of the document together with their
//! compiled [`Parameters`]; entries touched by an edit are invalidated and recompiled on the next
//! refresh, never patched in place.

use crate::edit::TextEdit;
use crate::fence::{is_fence_close, parse_fence_open};
use crate::folding::{BlockBounds, LineSource};
use crate::parameters::Parameters;
use crate::settings::{Settings, SettingsRevision};
use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors produced while applying an edit to a [`DocumentText`].
pub enum DocumentError {
    #[error("edit range {start}..{end} is outside the document (length {len})")]
    /// The deleted range does not fit in the document.
    OutOfRange {
        /// Edit start offset.
        start: usize,
        /// Edit end offset.
        end: usize,
        /// Document length in chars.
        len: usize,
    },

    #[error("deleted text does not match the document at offset {start}")]
    /// `deleted_text` differs from the document content it claims to delete.
    DeletedTextMismatch {
        /// Edit start offset.
        start: usize,
    },
}

/// Rope-backed document text, addressed in char offsets and 0-based lines.
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    rope: Rope,
}

impl DocumentText {
    /// Build from text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total char count.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Line count (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text of `line` without its line terminator.
    pub fn line(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let mut text = self.rope.line(line).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    /// Char offset of the start of `line` (document length past the end).
    pub fn line_to_char(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    /// Char offset just before the line terminator of `line`.
    pub fn line_end_char(&self, line: usize) -> usize {
        let start = self.line_to_char(line);
        start + self.line(line).map(|t| t.chars().count()).unwrap_or(0)
    }

    /// Line containing char `offset` (clamped to the document).
    pub fn char_to_line(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    /// Text in `range` (char offsets, clamped).
    pub fn slice(&self, range: Range<usize>) -> String {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.rope.slice(start..end).to_string()
    }

    /// Apply `edit`, checking that its deleted text matches the document.
    pub fn apply_edit(&mut self, edit: &TextEdit) -> Result<(), DocumentError> {
        let len = self.rope.len_chars();
        let (start, end) = (edit.start, edit.end());
        if start > len || end > len {
            return Err(DocumentError::OutOfRange { start, end, len });
        }
        if start < end {
            if self.rope.slice(start..end) != edit.deleted_text.as_str() {
                return Err(DocumentError::DeletedTextMismatch { start });
            }
            self.rope.remove(start..end);
        }
        if !edit.inserted_text.is_empty() {
            self.rope.insert(start, &edit.inserted_text);
        }
        Ok(())
    }
}

impl LineSource for DocumentText {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line(&self, index: usize) -> Option<Cow<'_, str>> {
        DocumentText::line(self, index).map(Cow::Owned)
    }
}

/// Line extents of every fenced block, in document order.
///
/// A block opens on a fence line and closes on the next line with exactly the same backtick run
/// length; an unclosed block extends to the end of the document.
pub fn scan_block_bounds<L: LineSource + ?Sized>(lines: &L) -> Vec<BlockBounds> {
    let count = lines.line_count();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < count {
        let Some(backtick_count) = lines
            .line(i)
            .and_then(|text| parse_fence_open(&text).map(|open| open.backtick_count))
        else {
            i += 1;
            continue;
        };

        let close = (i + 1..count).find(|&j| {
            lines
                .line(j)
                .is_some_and(|text| is_fence_close(&text, backtick_count))
        });
        let end_line = close.unwrap_or(count - 1);
        blocks.push(BlockBounds {
            start_line: i,
            end_line,
            backtick_count,
            closed: close.is_some(),
        });
        i = end_line + 1;
    }

    blocks
}

/// One fenced block of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockPosition {
    /// Char offset of the start of the opening fence line.
    pub start: usize,
    /// Char offset of the end of the closing fence line (end of document when unclosed).
    pub end: usize,
    /// Opening fence line.
    pub start_line: usize,
    /// Closing fence line (last document line when unclosed).
    pub end_line: usize,
    /// Whether a closing fence exists.
    pub closed: bool,
    /// Text of the opening fence line.
    pub fence_line: String,
    /// Compiled parameters.
    pub parameters: Arc<Parameters>,
}

impl CodeBlockPosition {
    /// Number of lines, fences included.
    pub fn total_lines(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// Line extent.
    pub fn bounds(&self) -> BlockBounds {
        BlockBounds {
            start_line: self.start_line,
            end_line: self.end_line,
            backtick_count: self.parameters.backtick_count,
            closed: self.closed,
        }
    }

    /// Whether document `line` belongs to the block.
    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }

    /// Document lines between the fences.
    pub fn content_lines(&self) -> Range<usize> {
        let end = if self.closed {
            self.end_line
        } else {
            self.end_line + 1
        };
        self.start_line + 1..end.max(self.start_line + 1)
    }
}

/// Every code block of `doc`, with freshly compiled parameters.
pub fn scan_code_blocks(doc: &DocumentText, settings: &Settings) -> Vec<CodeBlockPosition> {
    scan_block_bounds(doc)
        .into_iter()
        .map(|bounds| {
            let fence_line = doc.line(bounds.start_line).unwrap_or_default();
            let parameters = Arc::new(Parameters::parse(&fence_line, settings));
            position_from_bounds(doc, bounds, fence_line, parameters)
        })
        .collect()
}

fn position_from_bounds(
    doc: &DocumentText,
    bounds: BlockBounds,
    fence_line: String,
    parameters: Arc<Parameters>,
) -> CodeBlockPosition {
    CodeBlockPosition {
        start: doc.line_to_char(bounds.start_line),
        end: doc.line_end_char(bounds.end_line),
        start_line: bounds.start_line,
        end_line: bounds.end_line,
        closed: bounds.closed,
        fence_line,
        parameters,
    }
}

/// Code block positions of one document, kept across edits.
#[derive(Debug, Clone, Default)]
pub struct CodeBlockIndex {
    blocks: Vec<CodeBlockPosition>,
    revision: Option<SettingsRevision>,
    dirty: bool,
}

impl CodeBlockIndex {
    /// Create an empty index; the first refresh scans the whole document.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            revision: None,
            dirty: true,
        }
    }

    /// Current blocks, in document order.
    pub fn blocks(&self) -> &[CodeBlockPosition] {
        &self.blocks
    }

    /// Settings revision the blocks were compiled with.
    pub fn revision(&self) -> Option<SettingsRevision> {
        self.revision
    }

    /// Whether a refresh is needed for `revision`.
    pub fn is_stale(&self, revision: SettingsRevision) -> bool {
        self.dirty || self.revision != Some(revision)
    }

    /// Drop blocks touched by `edit` and shift the rest.
    pub fn apply_edit(&mut self, edit: &TextEdit) {
        let line_delta = edit.line_delta();
        let before = self.blocks.len();
        self.blocks = self
            .blocks
            .iter()
            .filter(|b| !edit.touches(b.start, b.end))
            .map(|b| {
                if b.start < edit.start {
                    return b.clone();
                }
                let shift = |line: usize| (line as isize + line_delta).max(0) as usize;
                CodeBlockPosition {
                    start: edit.map_offset(b.start),
                    end: edit.map_offset(b.end),
                    start_line: shift(b.start_line),
                    end_line: shift(b.end_line),
                    ..b.clone()
                }
            })
            .collect();
        tracing::trace!(
            invalidated = before - self.blocks.len(),
            kept = self.blocks.len(),
            "code block index mapped through edit"
        );
        self.dirty = true;
    }

    /// Rescan fences, reusing compiled parameters of blocks that survived unchanged.
    ///
    /// A settings revision change recompiles every block.
    pub fn refresh(
        &mut self,
        doc: &DocumentText,
        settings: &Settings,
        revision: SettingsRevision,
    ) -> &[CodeBlockPosition] {
        if !self.is_stale(revision) {
            return &self.blocks;
        }
        if self.revision != Some(revision) {
            tracing::debug!(?revision, "settings revision changed, recompiling all code blocks");
            self.blocks.clear();
        }

        let previous = std::mem::take(&mut self.blocks);
        let mut reused = 0usize;
        let blocks: Vec<CodeBlockPosition> = scan_block_bounds(doc)
            .into_iter()
            .map(|bounds| {
                let start = doc.line_to_char(bounds.start_line);
                let fence_line = doc.line(bounds.start_line).unwrap_or_default();
                let cached = previous
                    .iter()
                    .find(|b| b.start == start && b.fence_line == fence_line)
                    .map(|b| Arc::clone(&b.parameters));
                let parameters = match cached {
                    Some(parameters) => {
                        reused += 1;
                        parameters
                    }
                    None => Arc::new(Parameters::parse(&fence_line, settings)),
                };
                position_from_bounds(doc, bounds, fence_line, parameters)
            })
            .collect();

        tracing::debug!(blocks = blocks.len(), reused, "code block index refreshed");
        self.blocks = blocks;
        self.revision = Some(revision);
        self.dirty = false;
        &self.blocks
    }

    /// The block containing document `line`.
    pub fn block_at_line(&self, line: usize) -> Option<&CodeBlockPosition> {
        let idx = self.blocks.partition_point(|b| b.end_line < line);
        self.blocks.get(idx).filter(|b| b.contains_line(line))
    }

    /// The block containing char `offset`.
    pub fn block_at_offset(&self, offset: usize) -> Option<&CodeBlockPosition> {
        let idx = self.blocks.partition_point(|b| b.end < offset);
        self.blocks
            .get(idx)
            .filter(|b| b.start <= offset && offset <= b.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str =
        "# Title\n\n```js hl:1\nlet a = 1;\n```\n\ntext\n````md\n```py\nx\n```\n````\n";

    #[test]
    fn test_document_lines_and_offsets() {
        let doc = DocumentText::new("ab\r\ncd\nef");
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line(0).as_deref(), Some("ab"));
        assert_eq!(doc.line_to_char(1), 4);
        assert_eq!(doc.line_end_char(1), 6);
        assert_eq!(doc.char_to_line(7), 2);
        assert_eq!(doc.line(3), None);
    }

    #[test]
    fn test_apply_edit_checks_deleted_text() {
        let mut doc = DocumentText::new("hello world");
        doc.apply_edit(&TextEdit::insert(5, ",")).unwrap();
        assert_eq!(doc.text(), "hello, world");

        let err = doc.apply_edit(&TextEdit::delete(0, "nope")).unwrap_err();
        assert_eq!(err, DocumentError::DeletedTextMismatch { start: 0 });

        let err = doc.apply_edit(&TextEdit::delete(10, "world")).unwrap_err();
        assert!(matches!(err, DocumentError::OutOfRange { .. }));
        assert_eq!(doc.text(), "hello, world");
    }

    #[test]
    fn test_scan_code_blocks() {
        let doc = DocumentText::new(DOC);
        let blocks = scan_code_blocks(&doc, &Settings::default());
        assert_eq!(blocks.len(), 2);

        assert_eq!((blocks[0].start_line, blocks[0].end_line), (2, 4));
        assert_eq!(blocks[0].parameters.language, "js");
        assert_eq!(blocks[0].content_lines(), 3..4);
        assert_eq!(doc.slice(blocks[0].start..blocks[0].end), "```js hl:1\nlet a = 1;\n```");

        assert_eq!((blocks[1].start_line, blocks[1].end_line), (7, 11));
        assert_eq!(blocks[1].parameters.backtick_count, 4);
    }

    #[test]
    fn test_unclosed_block_extends_to_end() {
        let doc = DocumentText::new("```rust\nfn main() {}\n");
        let blocks = scan_code_blocks(&doc, &Settings::default());
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].closed);
        assert_eq!(blocks[0].end_line, 2);
        assert_eq!(blocks[0].content_lines(), 1..3);
    }

    #[test]
    fn test_index_reuses_untouched_parameters() {
        let settings = Settings::default();
        let mut doc = DocumentText::new(DOC);
        let mut index = CodeBlockIndex::new();
        index.refresh(&doc, &settings, SettingsRevision::INITIAL);
        let second = Arc::clone(&index.blocks()[1].parameters);

        // Edit inside the first block.
        let edit = TextEdit::insert(doc.line_to_char(3), "// ");
        doc.apply_edit(&edit).unwrap();
        index.apply_edit(&edit);
        assert_eq!(index.blocks().len(), 1);
        assert!(index.is_stale(SettingsRevision::INITIAL));

        let blocks = index.refresh(&doc, &settings, SettingsRevision::INITIAL);
        assert_eq!(blocks.len(), 2);
        assert!(Arc::ptr_eq(&blocks[1].parameters, &second));
        assert_eq!(index.block_at_line(9).map(|b| b.start_line), Some(7));
        assert!(index.block_at_line(6).is_none());
    }

    #[test]
    fn test_revision_change_recompiles() {
        let mut settings = Settings::default();
        let doc = DocumentText::new(DOC);
        let mut index = CodeBlockIndex::new();
        index.refresh(&doc, &settings, SettingsRevision::INITIAL);
        assert!(!index.blocks()[0].parameters.fold);

        settings.inverse_fold = true;
        let revision = SettingsRevision::INITIAL.next();
        assert!(index.is_stale(revision));
        let blocks = index.refresh(&doc, &settings, revision);
        assert!(blocks[0].parameters.fold);
    }
}
