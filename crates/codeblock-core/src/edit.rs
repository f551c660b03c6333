//! Structured document edits.
//!
//! Front ends receive document changes from the host as [`TextEdit`] values expressed in
//! **character offsets** (Unicode scalar values). Derived state keyed by offsets (code block
//! positions, fold ranges) is either mapped through an edit or invalidated by it.

/// A single text edit expressed in character offsets.
///
/// Semantics:
/// - `start` is a character offset in the document **at the time this edit is applied**.
/// - The deleted range is defined by the length (in `char`s) of `deleted_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Start character offset of the edit.
    pub start: usize,
    /// Exact deleted text (may be empty).
    pub deleted_text: String,
    /// Exact inserted text (may be empty).
    pub inserted_text: String,
}

impl TextEdit {
    /// An insertion of `text` at `start`.
    pub fn insert(start: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            deleted_text: String::new(),
            inserted_text: text.into(),
        }
    }

    /// A deletion of `deleted_text`, which must be the document text starting at `start`.
    pub fn delete(start: usize, deleted_text: impl Into<String>) -> Self {
        Self {
            start,
            deleted_text: deleted_text.into(),
            inserted_text: String::new(),
        }
    }

    /// Length of `deleted_text` in characters.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// Exclusive end character offset in the pre-edit document.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.deleted_len())
    }

    /// Net change in document length, in characters.
    pub fn char_delta(&self) -> isize {
        self.inserted_len() as isize - self.deleted_len() as isize
    }

    /// Net change in logical line count.
    pub fn line_delta(&self) -> isize {
        let count = |s: &str| s.matches('\n').count() as isize;
        count(&self.inserted_text) - count(&self.deleted_text)
    }

    /// Whether the pre-edit half-open range `start..end` is touched by this edit.
    ///
    /// Insertions exactly at either boundary count as touching.
    pub fn touches(&self, start: usize, end: usize) -> bool {
        self.start <= end && self.end() >= start
    }

    /// Map a pre-edit offset to the post-edit document.
    ///
    /// Offsets inside the deleted range collapse to the edit start.
    pub fn map_offset(&self, offset: usize) -> usize {
        if offset < self.start {
            offset
        } else if offset >= self.end() {
            (offset as isize + self.char_delta()).max(self.start as isize) as usize
        } else {
            self.start
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_and_deltas() {
        let edit = TextEdit {
            start: 4,
            deleted_text: "ab\n".to_string(),
            inserted_text: "xyz\n\n".to_string(),
        };
        assert_eq!(edit.deleted_len(), 3);
        assert_eq!(edit.inserted_len(), 5);
        assert_eq!(edit.end(), 7);
        assert_eq!(edit.char_delta(), 2);
        assert_eq!(edit.line_delta(), 1);
    }

    #[test]
    fn test_map_offset() {
        let edit = TextEdit::delete(10, "hello");
        assert_eq!(edit.map_offset(3), 3);
        assert_eq!(edit.map_offset(12), 10);
        assert_eq!(edit.map_offset(15), 10);
        assert_eq!(edit.map_offset(20), 15);

        let edit = TextEdit::insert(5, "abc");
        assert_eq!(edit.map_offset(5), 8);
        assert_eq!(edit.map_offset(4), 4);
    }

    #[test]
    fn test_touches() {
        let edit = TextEdit::insert(10, "x");
        assert!(edit.touches(10, 20));
        assert!(edit.touches(0, 10));
        assert!(!edit.touches(11, 20));
    }
}
