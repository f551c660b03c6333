//! Info-string directive parsing.
//!
//! The text after an opening fence is a small, best-effort configuration language:
//!
//! ```text
//! ```python hl:2,4-6 hlt:2|needle file:"main.py" fold ln:10
//! ```
//!
//! - The first bare token (if it is neither a directive nor `fold`/`unfold`) is the language.
//! - `key:value` / `key=value` tokens are directives. Keys are case-insensitive; the last
//!   occurrence of a key wins. Values are either quoted (`"..."` / `'...'`, taken verbatim) or a
//!   bare run of non-whitespace, non-quote characters.
//! - Standalone words (`fold`, `unfold`, `exclude`) are flags.
//!
//! Nothing here ever fails: tokens that do not fit the grammar are ignored.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([^\s:="']+)[:=](?:"([^"]*)"|'([^']*)'|([^\s"']+))"#)
        .expect("valid directive regex")
});

/// Remove leading indentation, block-quote markers and the fence run from a fence line.
pub fn strip_fence_marker(info: &str) -> &str {
    let rest = info.trim_start_matches(|c: char| c.is_whitespace() || c == '>');
    let Some(fence_char) = rest.chars().next().filter(|c| *c == '`' || *c == '~') else {
        return rest;
    };
    rest.trim_start_matches(fence_char)
}

/// Split an info string into whitespace-separated tokens.
///
/// A quote directly after a directive separator opens a quoted value that may contain
/// whitespace; everywhere else quotes are ordinary characters.
pub fn tokenize(info: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for (idx, ch) in info.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            prev = Some(ch);
            continue;
        }

        if ch.is_whitespace() {
            if let Some(start) = token_start.take() {
                tokens.push(&info[start..idx]);
            }
        } else {
            if token_start.is_none() {
                token_start = Some(idx);
            }
            if (ch == '"' || ch == '\'') && matches!(prev, Some(':') | Some('=')) {
                quote = Some(ch);
            }
        }
        prev = Some(ch);
    }

    if let Some(start) = token_start {
        tokens.push(&info[start..]);
    }
    tokens
}

/// Parse a single `key:value` token. Returns the lower-cased key and the value.
pub fn parse_directive(token: &str) -> Option<(String, String)> {
    let caps = DIRECTIVE_RE.captures(token)?;
    let key = caps.get(1)?.as_str().to_lowercase();
    let value = caps
        .get(2)
        .or_else(|| caps.get(3))
        .or_else(|| caps.get(4))
        .map(|m| m.as_str().to_string())?;
    Some((key, value))
}

/// Parse every directive of an info string into a key -> value map.
///
/// The fence run is stripped first. Later duplicates overwrite earlier ones.
pub fn parse_parameters(info: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for token in tokenize(strip_fence_marker(info)) {
        match parse_directive(token) {
            Some((key, value)) => {
                map.insert(key, value);
            }
            None => tracing::trace!(token, "not a directive"),
        }
    }
    map
}

/// A parsed info string, keeping both the directive map and the raw tokens the special-case
/// recognizers need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoString {
    tokens: Vec<String>,
    directives: BTreeMap<String, String>,
}

impl InfoString {
    /// Parse an info string (with or without its fence run).
    pub fn parse(info: &str) -> Self {
        let tokens: Vec<String> = tokenize(strip_fence_marker(info))
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut directives = BTreeMap::new();
        for token in &tokens {
            if let Some((key, value)) = parse_directive(token) {
                directives.insert(key, value);
            }
        }
        Self { tokens, directives }
    }

    /// All directives, keyed by lower-cased key.
    pub fn directives(&self) -> &BTreeMap<String, String> {
        &self.directives
    }

    /// Look up a directive value by (case-insensitive) key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.directives
            .get(&key.to_lowercase())
            .map(String::as_str)
    }

    /// Whether a standalone word token equals `word` (case-insensitive).
    pub fn has_word(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(word))
    }

    /// The `file`/`title` value, `file` taking precedence.
    pub fn file_title(&self) -> Option<&str> {
        self.get("file").or_else(|| self.get("title"))
    }

    /// The language: the first token, unless it is a directive or a fold flag.
    pub fn language(&self) -> Option<String> {
        let first = self.tokens.first()?;
        if first.contains(':') || first.contains('=') {
            return None;
        }
        let lower = first.to_lowercase();
        if lower == "fold" || lower == "unfold" {
            return None;
        }
        Some(lower)
    }

    /// Whether a standalone `fold` flag (or a `fold:<text>` directive) is present.
    pub fn is_fold_defined(&self) -> bool {
        self.has_word("fold") || self.directives.contains_key("fold")
    }

    /// Whether a standalone `unfold` flag is present.
    pub fn is_unfold_defined(&self) -> bool {
        self.has_word("unfold")
    }

    /// Whether the block opts out through an `exclude` flag/directive, or its language matches
    /// one of `patterns`.
    pub fn is_excluded(&self, patterns: &[&str]) -> bool {
        if self.has_word("exclude") {
            return true;
        }
        if let Some(value) = self.get("exclude") {
            if !value.eq_ignore_ascii_case("false") {
                return true;
            }
        }
        match self.language() {
            Some(lang) => patterns.iter().any(|p| matches_glob(p, &lang)),
            None => false,
        }
    }
}

/// `file`/`title` of an info string.
pub fn extract_file_title(info: &str) -> Option<String> {
    InfoString::parse(info).file_title().map(str::to_string)
}

/// Language of an info string.
pub fn get_code_block_language(info: &str) -> Option<String> {
    InfoString::parse(info).language()
}

/// Whether the info string carries a `fold` flag.
pub fn is_fold_defined(info: &str) -> bool {
    InfoString::parse(info).is_fold_defined()
}

/// Whether the info string carries an `unfold` flag.
pub fn is_unfold_defined(info: &str) -> bool {
    InfoString::parse(info).is_unfold_defined()
}

/// Whether the block is excluded, either explicitly or through the exclusion list.
pub fn is_excluded(info: &str, patterns: &[&str]) -> bool {
    InfoString::parse(info).is_excluded(patterns)
}

/// Case-insensitive match of `text` against a pattern where `*` matches any run of characters.
///
/// `ad-*` matches `ad-info` but not `ad` or `adinfo`.
pub fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    let text = text.to_lowercase();
    if pattern.is_empty() {
        return false;
    }
    if !pattern.contains('*') {
        return pattern == text;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return remaining.is_empty();
    };

    for part in middle {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last)
}
