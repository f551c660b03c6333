//! Highlight specification compiler.
//!
//! Turns `hl` / `hlt` (and alternate `<color>` / `<color>t`) directive values into normalized
//! highlight specifications.
//!
//! A value is split on `,` into segments. Each segment is one of:
//!
//! | segment          | `hl` (lines)         | `hlt` (text)                  |
//! |------------------|----------------------|-------------------------------|
//! | `5`, `2-4`       | line numbers         | whole line text               |
//! | `word`           | lines containing it  | every occurrence              |
//! | `3\|word`         | line 3 if it has it  | occurrences on line 3         |
//! | `from:to`        | -                    | spans `from`..`to`            |
//! | `3\|from:to`      | -                    | spans on line 3               |
//!
//! When a segment contains both separators, the leftmost one decides: a leading line separator
//! qualifies the rest with a line (range); a leading text separator makes the whole segment a
//! `from:to` span, even if the line separator appears later inside `to`.
//!
//! Malformed line specifications are dropped silently. Line numbers above
//! [`MAX_HIGHLIGHT_LINE`] are dropped and ranges are clamped to it.

use crate::settings::SeparatorSettings;
use std::collections::BTreeMap;

/// Directive keys that can never name an alternate highlight color.
pub const RESERVED_KEYS: &[&str] = &[
    "hl", "hlt", "ln", "file", "title", "fold", "unfold", "exclude", "lsep", "tsep", "prompt",
];

/// Highest line number a highlight directive can address.
pub const MAX_HIGHLIGHT_LINE: usize = 10_000;

/// Separators in effect for one code block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Separators {
    /// Line separator (default `|`).
    pub line: String,
    /// Text separator (default `:`).
    pub text: String,
}

impl Separators {
    /// Create a separator pair.
    pub fn new(line: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            text: text.into(),
        }
    }
}

impl Default for Separators {
    fn default() -> Self {
        Self::new("|", ":")
    }
}

impl From<&SeparatorSettings> for Separators {
    fn from(settings: &SeparatorSettings) -> Self {
        Self::new(settings.line.clone(), settings.text.clone())
    }
}

/// Words that only apply to one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LineWords {
    /// 1-based line number within the block.
    pub line_number: usize,
    /// Lower-cased words, in first-seen order, without duplicates.
    pub words: Vec<String>,
}

/// A `from:to` text span. Empty `from` means start of line, empty `to` means end of line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextBetween {
    /// Lower-cased start marker.
    pub from: String,
    /// Lower-cased end marker.
    pub to: String,
}

/// A `from:to` text span restricted to one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LineTextBetween {
    /// 1-based line number within the block.
    pub line_number: usize,
    /// Lower-cased start marker.
    pub from: String,
    /// Lower-cased end marker.
    pub to: String,
}

/// Compiled line highlighting (`hl`, `<color>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LinesToHighlight {
    /// Sorted, deduplicated line numbers.
    pub line_numbers: Vec<usize>,
    /// Lower-cased words; any line containing one is highlighted.
    pub words: Vec<String>,
    /// Per-line words, sorted by line number.
    pub line_specific_words: Vec<LineWords>,
}

impl LinesToHighlight {
    /// Whether nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.line_numbers.is_empty() && self.words.is_empty() && self.line_specific_words.is_empty()
    }
}

/// Compiled text highlighting (`hlt`, `<color>t`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextHighlight {
    /// Sorted, deduplicated lines whose whole text is highlighted.
    pub all_words_in_line: Vec<usize>,
    /// Lower-cased words highlighted wherever they occur.
    pub words: Vec<String>,
    /// Per-line words, sorted by line number.
    pub line_specific_words: Vec<LineWords>,
    /// Spans highlighted on every line.
    pub text_between: Vec<TextBetween>,
    /// Spans restricted to one line.
    pub line_specific_text_between: Vec<LineTextBetween>,
}

impl TextHighlight {
    /// Whether nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.all_words_in_line.is_empty()
            && self.words.is_empty()
            && self.line_specific_words.is_empty()
            && self.text_between.is_empty()
            && self.line_specific_text_between.is_empty()
    }
}

/// A highlight specification tagged with the alternate color that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alternate<T> {
    /// The alternate color name as configured by the user.
    pub color_name: String,
    /// The compiled specification.
    pub spec: T,
}

/// One classified segment of a directive value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A line number or a range of line numbers.
    Lines(Vec<usize>),
    /// A bare word.
    Word(String),
    /// A line (range) paired with a word.
    LineWord(Vec<usize>, String),
    /// A `from:to` span.
    Span(String, String),
    /// A line (range) paired with a `from:to` span.
    LineSpan(Vec<usize>, String, String),
    /// Nothing usable (empty segment, inverted range, unparseable line number).
    Invalid,
}

fn looks_like_line_spec(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '-' || c.is_whitespace())
}

/// Parse `5` or `2-4`. Inverted or unparseable ranges yield an empty list.
///
/// Numbers are parsed as `u64` so an oversized value is dropped rather than rejected as
/// malformed; ranges starting past [`MAX_HIGHLIGHT_LINE`] are dropped and longer ones clamped.
fn parse_line_spec(s: &str) -> Vec<usize> {
    let s = s.trim();
    let (a, b) = match s.split_once('-') {
        None => (s.parse::<u64>(), s.parse::<u64>()),
        Some((a, b)) => (a.trim().parse::<u64>(), b.trim().parse::<u64>()),
    };
    let (Ok(start), Ok(end)) = (a, b) else {
        return Vec::new();
    };
    let cap = MAX_HIGHLIGHT_LINE as u64;
    if start > end || start > cap {
        return Vec::new();
    }
    if end > cap {
        tracing::debug!(value = s, cap, "clamping highlight range");
    }
    (start as usize..=end.min(cap) as usize).collect()
}

/// Expand a comma-separated list of line numbers and ranges.
///
/// `"2,4-6,9"` yields `[2, 4, 5, 6, 9]`; `"5-3"` yields `[]`. The result is sorted and
/// deduplicated.
pub fn get_line_ranges(value: &str) -> Vec<usize> {
    let mut lines: Vec<usize> = value
        .split(',')
        .filter(|s| looks_like_line_spec(s.trim()))
        .flat_map(parse_line_spec)
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Classify one segment.
///
/// `allow_spans` is false for line highlighting, where the text separator has no meaning and is
/// kept as part of the word.
pub fn classify_segment(segment: &str, seps: &Separators, allow_spans: bool) -> Segment {
    let segment = segment.trim();
    if segment.is_empty() {
        return Segment::Invalid;
    }

    let line_pos = segment.find(seps.line.as_str());
    let text_pos = if allow_spans {
        segment.find(seps.text.as_str())
    } else {
        None
    };

    let line_first = match (line_pos, text_pos) {
        (Some(l), Some(t)) => l < t,
        (Some(_), None) => true,
        _ => false,
    };

    if line_first {
        let Some(l) = line_pos else {
            return Segment::Invalid;
        };
        let (head, tail) = (&segment[..l], &segment[l + seps.line.len()..]);
        if !looks_like_line_spec(head.trim()) {
            return Segment::Invalid;
        }
        let lines = parse_line_spec(head);
        if lines.is_empty() {
            return Segment::Invalid;
        }
        if allow_spans {
            if let Some((from, to)) = tail.split_once(seps.text.as_str()) {
                return Segment::LineSpan(lines, from.to_lowercase(), to.to_lowercase());
            }
        }
        if tail.is_empty() {
            return Segment::Invalid;
        }
        return Segment::LineWord(lines, tail.to_lowercase());
    }

    if let Some(t) = text_pos {
        let (from, to) = (&segment[..t], &segment[t + seps.text.len()..]);
        return Segment::Span(from.to_lowercase(), to.to_lowercase());
    }

    if looks_like_line_spec(segment) {
        let lines = parse_line_spec(segment);
        if lines.is_empty() {
            return Segment::Invalid;
        }
        return Segment::Lines(lines);
    }

    Segment::Word(segment.to_lowercase())
}

fn push_unique(words: &mut Vec<String>, word: String) {
    if !words.contains(&word) {
        words.push(word);
    }
}

/// Accumulates per-line words, merging repeated line numbers.
#[derive(Default)]
struct LineWordsBuilder(BTreeMap<usize, Vec<String>>);

impl LineWordsBuilder {
    fn add(&mut self, lines: &[usize], word: &str) {
        for line in lines {
            push_unique(self.0.entry(*line).or_default(), word.to_string());
        }
    }

    fn build(self) -> Vec<LineWords> {
        self.0
            .into_iter()
            .map(|(line_number, words)| LineWords { line_number, words })
            .collect()
    }
}

fn sorted_dedup(mut lines: Vec<usize>) -> Vec<usize> {
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Compile an `hl`-style value.
pub fn compile_lines(value: &str, seps: &Separators) -> LinesToHighlight {
    let mut line_numbers = Vec::new();
    let mut words = Vec::new();
    let mut line_words = LineWordsBuilder::default();

    for raw in value.split(',') {
        match classify_segment(raw, seps, false) {
            Segment::Lines(lines) => line_numbers.extend(lines),
            Segment::Word(word) => push_unique(&mut words, word),
            Segment::LineWord(lines, word) => line_words.add(&lines, &word),
            other => tracing::debug!(segment = raw, ?other, "dropping line highlight segment"),
        }
    }

    LinesToHighlight {
        line_numbers: sorted_dedup(line_numbers),
        words,
        line_specific_words: line_words.build(),
    }
}

/// Compile an `hlt`-style value.
pub fn compile_text(value: &str, seps: &Separators) -> TextHighlight {
    let mut all_words_in_line = Vec::new();
    let mut words = Vec::new();
    let mut line_words = LineWordsBuilder::default();
    let mut text_between: Vec<TextBetween> = Vec::new();
    let mut line_text_between: Vec<LineTextBetween> = Vec::new();

    for raw in value.split(',') {
        match classify_segment(raw, seps, true) {
            Segment::Lines(lines) => all_words_in_line.extend(lines),
            Segment::Word(word) => push_unique(&mut words, word),
            Segment::LineWord(lines, word) => line_words.add(&lines, &word),
            Segment::Span(from, to) => {
                let span = TextBetween { from, to };
                if !text_between.contains(&span) {
                    text_between.push(span);
                }
            }
            Segment::LineSpan(lines, from, to) => {
                for line_number in lines {
                    let span = LineTextBetween {
                        line_number,
                        from: from.clone(),
                        to: to.clone(),
                    };
                    if !line_text_between.contains(&span) {
                        line_text_between.push(span);
                    }
                }
            }
            Segment::Invalid => tracing::debug!(segment = raw, "dropping text highlight segment"),
        }
    }

    line_text_between.sort_by_key(|s| s.line_number);

    TextHighlight {
        all_words_in_line: sorted_dedup(all_words_in_line),
        words,
        line_specific_words: line_words.build(),
        text_between,
        line_specific_text_between: line_text_between,
    }
}

/// Line highlighting for directive `param_name` (missing directive compiles to an empty spec).
pub fn get_highlighted_lines(
    directives: &BTreeMap<String, String>,
    param_name: &str,
    seps: &Separators,
) -> LinesToHighlight {
    directives
        .get(&param_name.to_lowercase())
        .map(|value| compile_lines(value, seps))
        .unwrap_or_default()
}

/// Text highlighting for directive `param_name` (missing directive compiles to an empty spec).
pub fn get_text_highlight(
    directives: &BTreeMap<String, String>,
    param_name: &str,
    seps: &Separators,
) -> TextHighlight {
    directives
        .get(&param_name.to_lowercase())
        .map(|value| compile_text(value, seps))
        .unwrap_or_default()
}

/// Directive key for an alternate color name: lower-cased, whitespace removed.
pub fn alternate_key(color_name: &str) -> String {
    color_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compiled alternate highlighting for every configured color, in configuration order.
///
/// Colors whose key collides with a built-in directive are skipped; colors that highlight
/// nothing are omitted.
pub fn get_alternative_highlights(
    directives: &BTreeMap<String, String>,
    color_names: &[String],
    seps: &Separators,
) -> (Vec<Alternate<LinesToHighlight>>, Vec<Alternate<TextHighlight>>) {
    let mut lines = Vec::new();
    let mut text = Vec::new();

    for color_name in color_names {
        let key = alternate_key(color_name);
        if key.is_empty() || RESERVED_KEYS.contains(&key.as_str()) {
            tracing::warn!(color = %color_name, "alternate color collides with a directive key");
            continue;
        }

        let line_spec = get_highlighted_lines(directives, &key, seps);
        if !line_spec.is_empty() {
            lines.push(Alternate {
                color_name: color_name.clone(),
                spec: line_spec,
            });
        }

        let text_spec = get_text_highlight(directives, &format!("{key}t"), seps);
        if !text_spec.is_empty() {
            text.push(Alternate {
                color_name: color_name.clone(),
                spec: text_spec,
            });
        }
    }

    (lines, text)
}
