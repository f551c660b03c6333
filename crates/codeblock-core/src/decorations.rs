//! Decoration data model.
//!
//! Decorations are what the engine hands back to the host: ranges in document char offsets,
//! each carrying a CSS class assignment, a replaced (hidden) range, line attributes, or a
//! widget. The host maps them onto its own overlay API and never feeds them back.
//!
//! [`DecorationSet`] is always sorted, so two recompute passes over the same input compare equal
//! and [`DecorationSet::diff`] reports nothing.

use std::collections::BTreeSet;

/// A half-open char-offset range (`start..end`) in the document.
///
/// Point-anchored decorations (widgets) use `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecorationRange {
    /// Range start offset (inclusive).
    pub start: usize,
    /// Range end offset (exclusive).
    pub end: usize,
}

impl DecorationRange {
    /// Create a new decoration range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width range at `offset`.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }
}

/// A piece of widget text with an optional CSS class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyledSegment {
    /// Text to render.
    pub text: String,
    /// CSS class, if styled.
    pub class_name: Option<String>,
}

impl StyledSegment {
    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class_name: None,
        }
    }

    /// Text with a class.
    pub fn styled(text: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class_name: Some(class_name.into()),
        }
    }
}

/// Block header contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderWidget {
    /// Header text (file name, title, fold text or collapsed-code text).
    pub text: String,
    /// Lower-cased language id.
    pub language: String,
    /// Display name of the language.
    pub display_language: String,
    /// Whether the block is currently folded.
    pub folded: bool,
    /// Whether the language has a border color.
    pub lang_border: bool,
}

/// Kinds of block widgets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WidgetKind {
    /// Header above the block; clicking it toggles the fold.
    Header(HeaderWidget),
    /// Line number in the gutter of a code line.
    LineNumber(i64),
    /// The semi-fold uncollapse affordance replacing the hidden remainder.
    Uncollapse,
    /// Button under an expanded semi-foldable block that folds it back.
    Collapse,
    /// Copy-to-clipboard button.
    CopyButton,
    /// Rendered prompt prefix of a prompt line.
    Prompt(Vec<StyledSegment>),
    /// Synthesized output line (e.g. for `pwd`), rendered after the command line.
    PromptOutput(String),
}

/// What a decoration does.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecorationKind {
    /// Apply a CSS class to the range.
    Mark(String),
    /// Hide the range.
    Replace,
    /// CSS classes for every line starting in the range.
    LineAttributes(Vec<String>),
    /// A widget anchored at `range.start`.
    Widget(WidgetKind),
}

/// A single decoration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decoration {
    /// Anchor range in char offsets.
    pub range: DecorationRange,
    /// What to render.
    pub kind: DecorationKind,
}

impl Decoration {
    /// A class mark over `start..end`.
    pub fn mark(start: usize, end: usize, class_name: impl Into<String>) -> Self {
        Self {
            range: DecorationRange::new(start, end),
            kind: DecorationKind::Mark(class_name.into()),
        }
    }

    /// A hidden range.
    pub fn replace(start: usize, end: usize) -> Self {
        Self {
            range: DecorationRange::new(start, end),
            kind: DecorationKind::Replace,
        }
    }

    /// Line classes for the line starting at `line_start`.
    pub fn line(line_start: usize, classes: Vec<String>) -> Self {
        Self {
            range: DecorationRange::point(line_start),
            kind: DecorationKind::LineAttributes(classes),
        }
    }

    /// A widget at `offset`.
    pub fn widget(offset: usize, widget: WidgetKind) -> Self {
        Self {
            range: DecorationRange::point(offset),
            kind: DecorationKind::Widget(widget),
        }
    }
}

/// Difference between two decoration sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationDiff {
    /// Decorations only in the new set.
    pub added: Vec<Decoration>,
    /// Decorations only in the old set.
    pub removed: Vec<Decoration>,
}

impl DecorationDiff {
    /// Whether the sets were identical.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A sorted, duplicate-free set of decorations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DecorationSet {
    items: Vec<Decoration>,
}

impl DecorationSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decorations, ordered by range then kind.
    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.items.iter()
    }

    /// Decorations as a slice.
    pub fn as_slice(&self) -> &[Decoration] {
        &self.items
    }

    /// Number of decorations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Decorations whose range intersects `start..end` (points at either edge included).
    pub fn in_range(&self, start: usize, end: usize) -> impl Iterator<Item = &Decoration> {
        self.items
            .iter()
            .filter(move |d| d.range.start <= end && d.range.end >= start)
    }

    /// What changed from `self` to `next`.
    pub fn diff(&self, next: &DecorationSet) -> DecorationDiff {
        let old: BTreeSet<&Decoration> = self.items.iter().collect();
        let new: BTreeSet<&Decoration> = next.items.iter().collect();
        DecorationDiff {
            added: new.difference(&old).map(|d| (*d).clone()).collect(),
            removed: old.difference(&new).map(|d| (*d).clone()).collect(),
        }
    }
}

impl FromIterator<Decoration> for DecorationSet {
    fn from_iter<T: IntoIterator<Item = Decoration>>(iter: T) -> Self {
        let mut items: Vec<Decoration> = iter.into_iter().collect();
        items.sort();
        items.dedup();
        Self { items }
    }
}

impl<'a> IntoIterator for &'a DecorationSet {
    type Item = &'a Decoration;
    type IntoIter = std::slice::Iter<'a, Decoration>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
