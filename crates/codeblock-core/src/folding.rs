//! Fold and semi-fold calculation.
//!
//! A code block is either fully folded (header only) or, when semi-fold is enabled and the block
//! is long enough, semi-folded: the first `visible_lines` content lines are shown, the next
//! `fade_out_line_count` lines fade out, and the rest is replaced by a single uncollapse
//! affordance.
//!
//! Block line indices used here are 0-based and include both fences: index 0 is the opening
//! fence, index `total_lines - 1` the closing fence (when the block is closed).

use crate::edit::TextEdit;
use crate::fence::{is_fence_close, parse_fence_open};
use crate::parameters::Parameters;
use crate::settings::Settings;
use std::borrow::Cow;
use std::ops::Range;

/// Class prefix of faded semi-fold lines; the 1-based fade index is appended.
pub const FADE_OUT_CLASS_PREFIX: &str = "codeblock-customizer-fade-out-line";

/// Fold mode of a block, fixed by its length and the semi-fold settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldMode {
    /// All-or-nothing folding.
    Full,
    /// Head, fade-out, uncollapse affordance.
    SemiFold,
}

/// Fold state of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FoldState {
    /// Everything rendered.
    #[default]
    Expanded,
    /// Semi-folded.
    Faded,
    /// Only the header rendered.
    Collapsed,
}

impl FoldState {
    /// Whether any part of the block is hidden.
    pub fn is_folded(self) -> bool {
        !matches!(self, FoldState::Expanded)
    }
}

/// Something that changes a block's fold state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldAction {
    /// The header (or fold toggle) was clicked.
    Click,
    /// The semi-fold uncollapse affordance was activated.
    Uncollapse,
    /// Fold-all command.
    FoldAll,
    /// Unfold-all command.
    UnfoldAll,
}

/// How one block line is rendered under a fold state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LineTreatment {
    /// Rendered normally.
    Visible,
    /// Rendered with a fade-out class.
    Faded(String),
    /// Not rendered.
    Hidden,
}

/// Rendering layout of a block under a fold state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FoldLayout {
    /// Block line indices that are not rendered.
    pub hidden: Option<Range<usize>>,
    /// Faded block lines with their fade class.
    pub faded: Vec<(usize, String)>,
    /// The uncollapse affordance replaces the hidden range.
    pub uncollapse_affordance: bool,
    /// A collapse button is rendered after the last line of an expanded semi-foldable block.
    pub collapse_button: bool,
}

impl FoldLayout {
    /// Treatment of block line `index`.
    pub fn treatment(&self, index: usize) -> LineTreatment {
        if self.hidden.as_ref().is_some_and(|r| r.contains(&index)) {
            return LineTreatment::Hidden;
        }
        match self.faded.iter().find(|(line, _)| *line == index) {
            Some((_, class)) => LineTreatment::Faded(class.clone()),
            None => LineTreatment::Visible,
        }
    }
}

/// Fold policy derived from [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoldPolicy {
    /// Semi-fold is enabled.
    pub semi_fold: bool,
    /// Content lines shown fully in the semi-fold layout.
    pub visible_lines: usize,
    /// Faded lines in the semi-fold layout.
    pub fade_out_line_count: usize,
    /// Render a collapse button under expanded semi-foldable blocks.
    pub show_uncollapse_button: bool,
}

impl Default for FoldPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl FoldPolicy {
    /// Build the policy from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            semi_fold: settings.semi_fold.enabled,
            visible_lines: settings.semi_fold.visible_lines,
            fade_out_line_count: settings.semi_fold.fade_out_line_count,
            show_uncollapse_button: settings.semi_fold.show_uncollapse_button,
        }
    }

    /// Minimum block line count (fences included) for semi-fold.
    pub fn semi_fold_threshold(&self) -> usize {
        self.visible_lines + self.fade_out_line_count + 2
    }

    /// Fold mode of a block with `total_lines` lines.
    pub fn mode(&self, total_lines: usize) -> FoldMode {
        if self.semi_fold && total_lines >= self.semi_fold_threshold() {
            FoldMode::SemiFold
        } else {
            FoldMode::Full
        }
    }

    /// The folded state for `mode`.
    pub fn folded_state(mode: FoldMode) -> FoldState {
        match mode {
            FoldMode::Full => FoldState::Collapsed,
            FoldMode::SemiFold => FoldState::Faded,
        }
    }

    /// State of a block at load time.
    ///
    /// `params.fold` already reflects the inverse-fold policy.
    pub fn initial_state(&self, params: &Parameters, total_lines: usize) -> FoldState {
        if params.fold {
            Self::folded_state(self.mode(total_lines))
        } else {
            FoldState::Expanded
        }
    }

    /// Apply `action` to a block in `state`.
    pub fn transition(
        &self,
        state: FoldState,
        action: FoldAction,
        total_lines: usize,
    ) -> FoldState {
        let folded = Self::folded_state(self.mode(total_lines));
        match action {
            FoldAction::Click => {
                if state.is_folded() {
                    FoldState::Expanded
                } else {
                    folded
                }
            }
            FoldAction::Uncollapse => match state {
                FoldState::Faded => FoldState::Expanded,
                other => other,
            },
            FoldAction::FoldAll => folded,
            FoldAction::UnfoldAll => FoldState::Expanded,
        }
    }

    /// Rendering layout of a block with `total_lines` lines in `state`.
    pub fn layout(&self, state: FoldState, total_lines: usize) -> FoldLayout {
        match state {
            FoldState::Expanded => FoldLayout {
                collapse_button: self.show_uncollapse_button
                    && self.mode(total_lines) == FoldMode::SemiFold,
                ..FoldLayout::default()
            },
            FoldState::Collapsed => FoldLayout {
                hidden: (total_lines > 1).then_some(1..total_lines),
                ..FoldLayout::default()
            },
            FoldState::Faded => self.semi_fold_layout(total_lines),
        }
    }

    /// The semi-fold layout; blocks too short for semi-fold fall back to a full fold.
    pub fn semi_fold_layout(&self, total_lines: usize) -> FoldLayout {
        if self.mode(total_lines) != FoldMode::SemiFold {
            return self.layout(FoldState::Collapsed, total_lines);
        }
        let fade_start = 1 + self.visible_lines;
        let hidden_start = fade_start + self.fade_out_line_count;
        let faded = (0..self.fade_out_line_count)
            .map(|i| (fade_start + i, format!("{FADE_OUT_CLASS_PREFIX}{}", i + 1)))
            .collect();
        FoldLayout {
            hidden: (hidden_start < total_lines).then_some(hidden_start..total_lines),
            faded,
            uncollapse_affordance: true,
            collapse_button: false,
        }
    }
}

/// Line-oriented read access to a document.
pub trait LineSource {
    /// Number of lines.
    fn line_count(&self) -> usize;
    /// Text of line `index` without its line terminator.
    fn line(&self, index: usize) -> Option<Cow<'_, str>>;
}

impl<S: AsRef<str>> LineSource for [S] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Option<Cow<'_, str>> {
        self.get(index).map(|s| Cow::Borrowed(s.as_ref()))
    }
}

/// Line extent of one code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockBounds {
    /// Opening fence line.
    pub start_line: usize,
    /// Closing fence line, or the last document line when unclosed.
    pub end_line: usize,
    /// Backtick run length of the opening fence.
    pub backtick_count: usize,
    /// Whether a closing fence was found.
    pub closed: bool,
}

impl BlockBounds {
    /// Number of lines, fences included.
    pub fn total_lines(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Find the block around `clicked_line`.
///
/// Scans backward (from `clicked_line` itself) for the nearest opening fence, then forward for
/// the first line whose backtick run has exactly the same length. An unclosed block runs to the
/// end of the document.
pub fn find_block_bounds<L: LineSource + ?Sized>(
    lines: &L,
    clicked_line: usize,
) -> Option<BlockBounds> {
    let count = lines.line_count();
    if clicked_line >= count {
        return None;
    }

    let (start_line, backtick_count) = (0..=clicked_line).rev().find_map(|i| {
        let text = lines.line(i)?;
        parse_fence_open(&text).map(|open| (i, open.backtick_count))
    })?;

    let close = (start_line + 1..count).find(|&i| {
        lines
            .line(i)
            .is_some_and(|text| is_fence_close(&text, backtick_count))
    });

    Some(BlockBounds {
        start_line,
        end_line: close.unwrap_or(count - 1),
        backtick_count,
        closed: close.is_some(),
    })
}

/// A block's explicit fold state, anchored to its character range in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoldRange {
    /// Start offset of the block (inclusive).
    pub start: usize,
    /// End offset of the block (exclusive).
    pub end: usize,
    /// Fold state chosen for the block.
    pub state: FoldState,
}

/// Explicit fold states, kept as an ordered set of disjoint ranges.
///
/// Updates never modify an entry in place: [`FoldStateSet::set`] filters out every overlapping
/// entry and inserts the new one, and edits are applied by mapping every range through the
/// edit. Blocks with no entry are in their load-time default state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldStateSet {
    ranges: Vec<FoldRange>,
}

impl FoldStateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state` for the block spanning `start..end`.
    pub fn set(&mut self, start: usize, end: usize, state: FoldState) {
        self.remove_overlapping(start, end);
        let pos = self
            .ranges
            .binary_search_by_key(&start, |r| r.start)
            .unwrap_or_else(|pos| pos);
        self.ranges.insert(pos, FoldRange { start, end, state });
    }

    /// Drop every entry overlapping `start..end`.
    pub fn remove_overlapping(&mut self, start: usize, end: usize) {
        self.retain(|r| r.end <= start || r.start >= end.max(start + 1));
    }

    /// Keep only the entries matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&FoldRange) -> bool) {
        self.ranges.retain(keep);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Explicit state of the block starting at `start`.
    pub fn state_at(&self, start: usize) -> Option<FoldState> {
        self.ranges
            .binary_search_by_key(&start, |r| r.start)
            .ok()
            .map(|idx| self.ranges[idx].state)
    }

    /// All entries, ordered by start offset.
    pub fn ranges(&self) -> &[FoldRange] {
        &self.ranges
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Map every range through `edit`.
    ///
    /// Ranges entirely after the edit shift, ranges spanning it grow or shrink, ranges whose
    /// start falls inside a deletion are dropped.
    pub fn map_through(&mut self, edit: &TextEdit) {
        let pos = edit.start;
        let del_end = edit.end();
        let deleted = del_end - pos;
        let inserted = edit.inserted_len();

        let mapped: Vec<FoldRange> = self
            .ranges
            .iter()
            .filter_map(|r| {
                let (mut start, mut end) = (r.start, r.end);

                if deleted > 0 && end > pos {
                    if start >= del_end {
                        start -= deleted;
                        end -= deleted;
                    } else if start >= pos {
                        return None;
                    } else if end >= del_end {
                        end -= deleted;
                    } else {
                        end = pos;
                    }
                }

                if inserted > 0 {
                    if start >= pos {
                        start += inserted;
                        end += inserted;
                    } else if end > pos {
                        end += inserted;
                    }
                }

                Some(FoldRange {
                    start,
                    end,
                    state: r.state,
                })
            })
            .collect();

        self.ranges = mapped;
        self.ranges.sort_by_key(|r| (r.start, r.end));
        self.ranges.dedup_by(|a, b| a.start < b.end);
    }
}
