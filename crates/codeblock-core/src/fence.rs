//! Fence line recognition.
//!
//! A fence is a run of at least three backticks. The closing fence must repeat the opening run
//! length exactly, so a four-backtick block can contain three-backtick example fences.

/// Remove block-quote / callout markers (`>`, `> >`) from the start of a line.
///
/// Indentation after the last marker is preserved.
pub fn strip_container_prefix(line: &str) -> &str {
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start_matches(' ');
        match trimmed.strip_prefix('>') {
            Some(after) => rest = after,
            None => return rest,
        }
    }
}

/// An opening fence line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceOpen<'a> {
    /// Leading whitespace (after container markers).
    pub indent: &'a str,
    /// Length of the backtick run.
    pub backtick_count: usize,
    /// Text after the backtick run.
    pub info: &'a str,
}

fn backtick_run(text: &str) -> usize {
    text.chars().take_while(|c| *c == '`').count()
}

/// Recognize an opening fence: a run of 3+ backticks not closed again on the same line.
pub fn parse_fence_open(line: &str) -> Option<FenceOpen<'_>> {
    let line = strip_container_prefix(line);
    let rest = line.trim_start_matches([' ', '\t']);
    let indent = &line[..line.len() - rest.len()];
    let backtick_count = backtick_run(rest);
    if backtick_count < 3 {
        return None;
    }
    let info = &rest[backtick_count..];
    if info.contains('`') {
        return None;
    }
    Some(FenceOpen {
        indent,
        backtick_count,
        info,
    })
}

/// Whether `line` closes a fence opened with `backtick_count` backticks.
pub fn is_fence_close(line: &str, backtick_count: usize) -> bool {
    let rest = strip_container_prefix(line).trim_start_matches([' ', '\t']);
    let run = backtick_run(rest);
    run == backtick_count && rest[run..].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_container_prefix() {
        assert_eq!(strip_container_prefix("> ```js"), " ```js");
        assert_eq!(strip_container_prefix("> > ```js"), " ```js");
        assert_eq!(strip_container_prefix("  ```js"), "  ```js");
    }

    #[test]
    fn test_parse_fence_open() {
        let open = parse_fence_open("  ````python hl:1").unwrap();
        assert_eq!(open.indent, "  ");
        assert_eq!(open.backtick_count, 4);
        assert_eq!(open.info, "python hl:1");

        assert!(parse_fence_open("``inline``").is_none());
        assert!(parse_fence_open("```js `x`").is_none());
        assert!(parse_fence_open("text ```").is_none());
        assert_eq!(parse_fence_open("```").unwrap().backtick_count, 3);
    }

    #[test]
    fn test_is_fence_close() {
        assert!(is_fence_close("````", 4));
        assert!(is_fence_close("  ````  ", 4));
        assert!(is_fence_close("> ```", 3));
        assert!(!is_fence_close("```", 4));
        assert!(!is_fence_close("`````", 4));
        assert!(!is_fence_close("```js", 3));
    }
}
