//! Case-insensitive search that reports positions in the original text.
//!
//! Lower-casing may change the number of chars (`İ` lower-cases to two chars), so searching a
//! lower-cased copy and reusing its indices would drift. [`FoldedLine`] keeps, for every folded
//! char, the column of the original char it came from.

/// A line folded to lower case, with a map back to original char columns.
pub(crate) struct FoldedLine {
    folded: Vec<char>,
    columns: Vec<usize>,
    char_len: usize,
}

impl FoldedLine {
    pub(crate) fn new(text: &str) -> Self {
        let mut folded = Vec::with_capacity(text.len());
        let mut columns = Vec::with_capacity(text.len());
        let mut char_len = 0;
        for (col, ch) in text.chars().enumerate() {
            for lower in ch.to_lowercase() {
                folded.push(lower);
                columns.push(col);
            }
            char_len = col + 1;
        }
        Self {
            folded,
            columns,
            char_len,
        }
    }

    /// Length of the folded text.
    pub(crate) fn len(&self) -> usize {
        self.folded.len()
    }

    /// Find `needle` (already lower-cased) at or after folded index `from`.
    pub(crate) fn find(&self, needle: &[char], from: usize) -> Option<usize> {
        if needle.is_empty() || needle.len() > self.folded.len() {
            return None;
        }
        let last = self.folded.len() - needle.len();
        (from..=last).find(|&i| self.folded[i..i + needle.len()] == *needle)
    }

    /// Original column of folded index `idx` (the line length past the end).
    pub(crate) fn column(&self, idx: usize) -> usize {
        self.columns.get(idx).copied().unwrap_or(self.char_len)
    }

    /// Original exclusive end column of a match ending at folded index `end` (exclusive).
    pub(crate) fn end_column(&self, end: usize) -> usize {
        if end == 0 {
            return 0;
        }
        match self.columns.get(end - 1) {
            Some(col) => col + 1,
            None => self.char_len,
        }
    }

    /// Original char length.
    pub(crate) fn char_len(&self) -> usize {
        self.char_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_find_case_insensitive() {
        let line = FoldedLine::new("Let X = Foo(); let y = foo();");
        let idx = line.find(&chars("foo"), 0).unwrap();
        assert_eq!(line.column(idx), 8);
        let next = line.find(&chars("foo"), idx + 3).unwrap();
        assert_eq!(line.column(next), 23);
        assert!(line.find(&chars("bar"), 0).is_none());
    }

    #[test]
    fn test_columns_survive_expanding_lowercase() {
        // 'İ' lower-cases to "i\u{307}", two chars.
        let line = FoldedLine::new("İx needle");
        assert_eq!(line.len(), 10);
        assert_eq!(line.char_len(), 9);
        let idx = line.find(&chars("needle"), 0).unwrap();
        assert_eq!(line.column(idx), 3);
        assert_eq!(line.end_column(idx + 6), 9);
    }
}
