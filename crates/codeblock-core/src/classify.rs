//! Per-line highlight classification.
//!
//! For the boolean "is this line highlighted" answer the checks run in a fixed priority order
//! and the first hit wins:
//!
//! 1. line number listed in `hl`
//! 2. line contains a global `hl` word
//! 3. line contains one of its line-specific `hl` words
//! 4. line number listed in an alternate color
//! 5. line contains a global alternate word
//! 6. line contains a line-specific alternate word
//!
//! CSS classes are additive: every matching rule contributes its class. Word matching is a
//! case-insensitive substring test, not token-boundary aware.

use crate::highlight::{LineTextBetween, LinesToHighlight, TextBetween, TextHighlight};
use crate::parameters::Parameters;
use crate::settings::Settings;
use crate::text_search::FoldedLine;

/// Class applied to highlighted lines.
pub const LINE_HIGHLIGHT_CLASS: &str = "codeblock-customizer-line-highlighted";
/// Class applied to highlighted text spans.
pub const TEXT_HIGHLIGHT_CLASS: &str = "codeblock-customizer-highlighted-text";

/// A highlighted span of one line, in char columns (`start..end`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextSpan {
    /// Start column (inclusive).
    pub start: usize,
    /// End column (exclusive).
    pub end: usize,
    /// CSS class.
    pub class_name: String,
}

/// Classification of one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LineClassification {
    /// Whether any line rule matched.
    pub is_highlighted: bool,
    /// The alternate color that decided `is_highlighted`, if a default rule did not.
    pub color_name: Option<String>,
    /// Every line class that applies (default first, then alternates in configuration order).
    pub line_classes: Vec<String>,
    /// Highlighted text spans, sorted by position.
    pub text_spans: Vec<TextSpan>,
}

fn slug(name: &str) -> String {
    name.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Resolves alternate color names to CSS classes.
///
/// Names missing from the active theme fall back to the default classes.
#[derive(Debug, Clone, Default)]
pub struct ClassResolver {
    known: Option<Vec<String>>,
}

impl ClassResolver {
    /// Resolve against the theme colors in `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            known: Some(settings.theme.colors.keys().map(|k| k.to_lowercase()).collect()),
        }
    }

    /// Resolve every alternate name to its own class.
    pub fn permissive() -> Self {
        Self { known: None }
    }

    fn is_known(&self, color_name: &str) -> bool {
        match &self.known {
            None => true,
            Some(known) => known.iter().any(|k| *k == color_name.to_lowercase()),
        }
    }

    /// Line class for `color_name` (`None` = default highlight).
    pub fn line_class(&self, color_name: Option<&str>) -> String {
        match color_name {
            Some(name) if self.is_known(name) => format!("{LINE_HIGHLIGHT_CLASS}-{}", slug(name)),
            _ => LINE_HIGHLIGHT_CLASS.to_string(),
        }
    }

    /// Text class for `color_name` (`None` = default highlight).
    pub fn text_class(&self, color_name: Option<&str>) -> String {
        match color_name {
            Some(name) if self.is_known(name) => format!("{TEXT_HIGHLIGHT_CLASS}-{}", slug(name)),
            _ => TEXT_HIGHLIGHT_CLASS.to_string(),
        }
    }
}

fn line_matches(spec: &LinesToHighlight, line_number: usize, lowered: &str) -> (bool, bool, bool) {
    let by_number = spec.line_numbers.binary_search(&line_number).is_ok();
    let by_word = spec.words.iter().any(|w| lowered.contains(w.as_str()));
    let by_line_word = spec
        .line_specific_words
        .iter()
        .filter(|lw| lw.line_number == line_number)
        .any(|lw| lw.words.iter().any(|w| lowered.contains(w.as_str())));
    (by_number, by_word, by_line_word)
}

fn to_chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Every non-overlapping occurrence of `word`, as char column ranges.
fn word_spans(line: &FoldedLine, word: &str) -> Vec<(usize, usize)> {
    let needle = to_chars(word);
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(idx) = line.find(&needle, pos) {
        let end = idx + needle.len();
        spans.push((line.column(idx), line.end_column(end)));
        pos = end;
    }
    spans
}

/// Every `from`..`to` span, scanning left to right without overlap.
///
/// Empty `from` anchors at the start of the line, empty `to` runs to the end of the line.
fn between_spans(line: &FoldedLine, from: &str, to: &str) -> Vec<(usize, usize)> {
    let from = to_chars(from);
    let to = to_chars(to);
    let mut spans = Vec::new();
    let mut pos = 0;

    loop {
        let start = if from.is_empty() {
            0
        } else {
            match line.find(&from, pos) {
                Some(idx) => idx,
                None => break,
            }
        };
        let after_from = start + from.len();
        let end = if to.is_empty() {
            line.len()
        } else {
            match line.find(&to, after_from) {
                Some(idx) => idx + to.len(),
                None => break,
            }
        };
        if end > start {
            spans.push((line.column(start), line.end_column(end)));
        }
        if from.is_empty() || to.is_empty() || end >= line.len() {
            break;
        }
        pos = end;
    }
    spans
}

/// From the first non-whitespace char to the end of the line.
fn whole_line_span(text: &str) -> Option<(usize, usize)> {
    let start = text.chars().position(|c| !c.is_whitespace())?;
    Some((start, text.chars().count()))
}

/// Classifies the lines of one code block.
pub struct LineClassifier<'a> {
    params: &'a Parameters,
    resolver: ClassResolver,
}

impl<'a> LineClassifier<'a> {
    /// Create a classifier resolving alternate classes against the theme in `settings`.
    pub fn new(params: &'a Parameters, settings: &Settings) -> Self {
        Self {
            params,
            resolver: ClassResolver::from_settings(settings),
        }
    }

    /// Create a classifier with an explicit class resolver.
    pub fn with_resolver(params: &'a Parameters, resolver: ClassResolver) -> Self {
        Self { params, resolver }
    }

    /// Classify 1-based block line `line_number` with text `line_text`.
    pub fn classify(&self, line_number: usize, line_text: &str) -> LineClassification {
        let lowered = line_text.to_lowercase();
        let mut result = LineClassification::default();

        let (n, w, lw) =
            line_matches(&self.params.default_lines_to_highlight, line_number, &lowered);
        if n || w || lw {
            result.is_highlighted = true;
            result.line_classes.push(self.resolver.line_class(None));
        }

        for alt in &self.params.alternative_lines_to_highlight {
            let (n, w, lw) = line_matches(&alt.spec, line_number, &lowered);
            if n || w || lw {
                if !result.is_highlighted {
                    result.is_highlighted = true;
                    result.color_name = Some(alt.color_name.clone());
                }
                let class = self.resolver.line_class(Some(&alt.color_name));
                if !result.line_classes.contains(&class) {
                    result.line_classes.push(class);
                }
            }
        }

        let folded = FoldedLine::new(line_text);
        let mut spans = Vec::new();
        self.collect_text_spans(
            &self.params.default_text_to_highlight,
            None,
            line_number,
            line_text,
            &folded,
            &mut spans,
        );
        for alt in &self.params.alternative_text_to_highlight {
            self.collect_text_spans(
                &alt.spec,
                Some(&alt.color_name),
                line_number,
                line_text,
                &folded,
                &mut spans,
            );
        }
        spans.sort();
        spans.dedup();
        result.text_spans = spans;

        result
    }

    fn collect_text_spans(
        &self,
        spec: &TextHighlight,
        color_name: Option<&str>,
        line_number: usize,
        line_text: &str,
        folded: &FoldedLine,
        out: &mut Vec<TextSpan>,
    ) {
        let class_name = self.resolver.text_class(color_name);
        let mut push = |(start, end): (usize, usize)| {
            out.push(TextSpan {
                start,
                end,
                class_name: class_name.clone(),
            });
        };

        if spec.all_words_in_line.binary_search(&line_number).is_ok() {
            if let Some(span) = whole_line_span(line_text) {
                push(span);
            }
        }

        for word in &spec.words {
            word_spans(folded, word).into_iter().for_each(&mut push);
        }

        for lw in spec
            .line_specific_words
            .iter()
            .filter(|lw| lw.line_number == line_number)
        {
            for word in &lw.words {
                word_spans(folded, word).into_iter().for_each(&mut push);
            }
        }

        for TextBetween { from, to } in &spec.text_between {
            between_spans(folded, from, to).into_iter().for_each(&mut push);
        }

        for LineTextBetween { from, to, .. } in spec
            .line_specific_text_between
            .iter()
            .filter(|s| s.line_number == line_number)
        {
            between_spans(folded, from, to).into_iter().for_each(&mut push);
        }
    }
}

/// Classify one line, resolving every alternate color to its own class.
pub fn classify_line(
    line_number: usize,
    line_text: &str,
    params: &Parameters,
) -> LineClassification {
    LineClassifier::with_resolver(params, ClassResolver::permissive())
        .classify(line_number, line_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(info: &str, colors: &[&str]) -> Parameters {
        let settings = Settings {
            alternate_colors: colors.iter().map(|c| c.to_string()).collect(),
            ..Settings::default()
        };
        Parameters::parse(info, &settings)
    }

    fn span(start: usize, end: usize, class: &str) -> TextSpan {
        TextSpan {
            start,
            end,
            class_name: class.to_string(),
        }
    }

    #[test]
    fn test_line_number_and_words() {
        let p = params("```js hl:2,Error,4|warn", &[]);
        assert!(!classify_line(1, "let x = 1;", &p).is_highlighted);
        assert!(classify_line(2, "let x = 1;", &p).is_highlighted);
        assert!(classify_line(3, "throw new ERROR()", &p).is_highlighted);
        assert!(classify_line(4, "console.warn(x)", &p).is_highlighted);
        assert!(!classify_line(5, "console.warn(x)", &p).is_highlighted);
    }

    #[test]
    fn test_default_wins_priority_but_classes_are_additive() {
        let p = params("```js hl:3 imp:3", &["imp"]);
        let c = classify_line(3, "x", &p);
        assert!(c.is_highlighted);
        assert_eq!(c.color_name, None);
        assert_eq!(
            c.line_classes,
            vec![
                LINE_HIGHLIGHT_CLASS.to_string(),
                format!("{LINE_HIGHLIGHT_CLASS}-imp")
            ]
        );

        let c = classify_line(4, "x", &params("```js hl:3 imp:4", &["imp"]));
        assert_eq!(c.color_name.as_deref(), Some("imp"));
    }

    #[test]
    fn test_unknown_theme_color_falls_back_to_default_class() {
        let settings = Settings {
            alternate_colors: vec!["imp".into(), "Info Box".into()],
            theme: crate::settings::ThemeSettings {
                colors: [("Info Box".to_string(), "#00f".to_string())].into_iter().collect(),
            },
            ..Settings::default()
        };
        let p = Parameters::parse("```js imp:1 infobox:1", &settings);
        let c = LineClassifier::new(&p, &settings).classify(1, "x");
        assert_eq!(
            c.line_classes,
            vec![
                LINE_HIGHLIGHT_CLASS.to_string(),
                format!("{LINE_HIGHLIGHT_CLASS}-info-box")
            ]
        );
        assert_eq!(c.color_name.as_deref(), Some("imp"));
    }

    #[test]
    fn test_text_spans() {
        let p = params("```js hlt:foo,2|bar,let:;", &[]);
        let c = classify_line(1, "let a = Foo(foo);", &p);
        assert_eq!(
            c.text_spans,
            vec![
                span(0, 17, TEXT_HIGHLIGHT_CLASS),
                span(8, 11, TEXT_HIGHLIGHT_CLASS),
                span(12, 15, TEXT_HIGHLIGHT_CLASS),
            ]
        );
        assert!(!c.is_highlighted);

        let c = classify_line(2, "bar baz bar", &p);
        assert_eq!(
            c.text_spans,
            vec![span(0, 3, TEXT_HIGHLIGHT_CLASS), span(8, 11, TEXT_HIGHLIGHT_CLASS)]
        );
    }

    #[test]
    fn test_text_between_repeats_and_open_ends() {
        let p = params("```js hlt:(:)", &[]);
        let c = classify_line(1, "f(a) + g(b)", &p);
        assert_eq!(
            c.text_spans,
            vec![span(1, 4, TEXT_HIGHLIGHT_CLASS), span(8, 11, TEXT_HIGHLIGHT_CLASS)]
        );

        let p = params("```js hlt:=:", &[]);
        let c = classify_line(1, "let a = 1; // = x", &p);
        assert_eq!(c.text_spans, vec![span(6, 17, TEXT_HIGHLIGHT_CLASS)]);

        let p = params("```js hlt::=", &[]);
        let c = classify_line(1, "let a = 1;", &p);
        assert_eq!(c.text_spans, vec![span(0, 7, TEXT_HIGHLIGHT_CLASS)]);
    }

    #[test]
    fn test_all_words_in_line_skips_indentation() {
        let p = params("```py hlt:2", &[]);
        let c = classify_line(2, "    return x", &p);
        assert_eq!(c.text_spans, vec![span(4, 12, TEXT_HIGHLIGHT_CLASS)]);
        assert!(classify_line(2, "   ", &p).text_spans.is_empty());
    }

    #[test]
    fn test_alternate_text_class() {
        let p = params("```js impt:todo", &["imp"]);
        let c = classify_line(9, "// TODO: fix", &p);
        assert_eq!(c.text_spans, vec![span(3, 7, &format!("{TEXT_HIGHLIGHT_CLASS}-imp"))]);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let p = params("```hl:1,3-4 imp:2|TODO ln:5", &["imp"]);
        let lines = ["a", "// TODO later", "c", "d", "e"];
        let results: Vec<_> = lines
            .iter()
            .enumerate()
            .map(|(i, text)| classify_line(i + 1, text, &p))
            .collect();

        assert!(results[0].is_highlighted && results[0].color_name.is_none());
        assert_eq!(results[1].color_name.as_deref(), Some("imp"));
        assert!(results[2].is_highlighted && results[3].is_highlighted);
        assert!(!results[4].is_highlighted);
        assert!(!classify_line(2, "nothing here", &p).is_highlighted);
        assert_eq!(p.display_line_number(1), 5);
    }
}
