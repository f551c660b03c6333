//! Compiled per-block parameters.
//!
//! [`Parameters`] is built once per code block from its opening fence line and the current
//! [`Settings`], and is never mutated afterwards. Every consumer (line classifier, fold
//! calculator, prompt simulator, both front ends) takes it by shared reference.

use crate::directive::InfoString;
use crate::fence::parse_fence_open;
use crate::highlight::{
    Alternate, LinesToHighlight, Separators, TextHighlight, get_alternative_highlights,
    get_highlighted_lines, get_text_highlight,
};
use crate::language::{display_language, has_lang_border_color};
use crate::settings::Settings;

/// Line-number mode requested by the `ln` directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ShowNumbers {
    /// No `ln` directive: follow the global setting.
    #[default]
    Default,
    /// `ln:true` or `ln:<start>`: always show.
    Specific,
    /// `ln:false`: never show.
    Hide,
}

/// Indentation character of an indented fence (code blocks inside lists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndentCharacter {
    /// Space indentation; four spaces make one level.
    Space,
    /// Tab indentation; one tab is one level.
    Tab,
}

/// Compiled parameters of one code block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameters {
    /// `hl` line highlighting.
    pub default_lines_to_highlight: LinesToHighlight,
    /// `hlt` text highlighting.
    pub default_text_to_highlight: TextHighlight,
    /// Alternate-color line highlighting, in configuration order.
    pub alternative_lines_to_highlight: Vec<Alternate<LinesToHighlight>>,
    /// Alternate-color text highlighting, in configuration order.
    pub alternative_text_to_highlight: Vec<Alternate<TextHighlight>>,
    /// `ln:<start>` was given.
    pub is_specific_number: bool,
    /// Added to the 1-based line index to get the displayed number.
    pub line_number_offset: i64,
    /// Line-number mode.
    pub show_numbers: ShowNumbers,
    /// Header text (`file`/`title`, `fold:<text>`, or the collapsed-code text for folded blocks).
    pub header_display_text: String,
    /// Whether the block starts folded.
    pub fold: bool,
    /// Whether `unfold` was given.
    pub unfold: bool,
    /// Lower-cased language id (empty when absent).
    pub language: String,
    /// Human-readable language name.
    pub display_language: String,
    /// The info string itself asks for a header (`file`, `title` or `fold`).
    pub specific_header: bool,
    /// The theme has a border color for this language.
    pub has_lang_border_color: bool,
    /// The block is excluded from all decoration.
    pub exclude: bool,
    /// Length of the opening fence run.
    pub backtick_count: usize,
    /// Indentation level of the fence line.
    pub indent_level: usize,
    /// Indentation character of the fence line, if indented.
    pub indent_character: Option<IndentCharacter>,
    /// Effective line separator.
    pub line_separator: String,
    /// Effective text separator.
    pub text_separator: String,
    /// Prompt definition name from `prompt:<name>`.
    pub prompt_name: Option<String>,
}

/// Indentation level, indentation character and backtick count of a fence line.
fn fence_shape(fence_line: &str) -> (usize, Option<IndentCharacter>, usize) {
    let Some(open) = parse_fence_open(fence_line) else {
        return (0, None, 0);
    };
    let (level, character) = if open.indent.is_empty() {
        (0, None)
    } else if open.indent.contains('\t') {
        (
            open.indent.chars().filter(|c| *c == '\t').count(),
            Some(IndentCharacter::Tab),
        )
    } else {
        (open.indent.len() / 4, Some(IndentCharacter::Space))
    };
    (level, character, open.backtick_count)
}

impl Parameters {
    /// Compile the parameters of a block from its opening fence line.
    pub fn parse(fence_line: &str, settings: &Settings) -> Self {
        let info = InfoString::parse(fence_line);
        let directives = info.directives();

        let line_separator = info
            .get("lsep")
            .filter(|s| !s.is_empty())
            .unwrap_or(settings.separators.line.as_str())
            .to_string();
        let text_separator = info
            .get("tsep")
            .filter(|s| !s.is_empty())
            .unwrap_or(settings.separators.text.as_str())
            .to_string();
        let seps = Separators::new(line_separator.clone(), text_separator.clone());

        let (alternative_lines_to_highlight, alternative_text_to_highlight) =
            get_alternative_highlights(directives, &settings.alternate_colors, &seps);

        let prompt_name = info
            .get("prompt")
            .map(str::to_lowercase)
            .filter(|name| !name.is_empty());
        let language = match (&prompt_name, info.language()) {
            (_, Some(lang)) => lang,
            (Some(_), None) => "prompt".to_string(),
            (None, None) => String::new(),
        };

        let (show_numbers, is_specific_number, line_number_offset) = match info.get("ln") {
            Some(v) if v.eq_ignore_ascii_case("true") => (ShowNumbers::Specific, false, 0),
            Some(v) if v.eq_ignore_ascii_case("false") => (ShowNumbers::Hide, false, 0),
            Some(v) => match v.parse::<i32>() {
                Ok(start) => (ShowNumbers::Specific, true, i64::from(start) - 1),
                Err(_) => {
                    tracing::debug!(value = v, "ignoring malformed ln directive");
                    (ShowNumbers::Default, false, 0)
                }
            },
            None => (ShowNumbers::Default, false, 0),
        };

        let fold_defined = info.is_fold_defined();
        let unfold = info.is_unfold_defined();
        let fold = if settings.inverse_fold {
            !unfold
        } else {
            fold_defined
        };

        let file_title = info.file_title().map(str::to_string);
        let fold_text = info.get("fold").filter(|t| !t.is_empty()).map(str::to_string);
        let header_display_text = match (file_title.as_ref(), fold_text) {
            (Some(title), _) => title.clone(),
            (None, Some(text)) => text,
            (None, None) if fold => settings.header.collapsed_code_text.clone(),
            (None, None) => String::new(),
        };
        let specific_header = file_title.is_some() || fold_defined;

        let (indent_level, indent_character, backtick_count) = fence_shape(fence_line);

        Self {
            default_lines_to_highlight: get_highlighted_lines(directives, "hl", &seps),
            default_text_to_highlight: get_text_highlight(directives, "hlt", &seps),
            alternative_lines_to_highlight,
            alternative_text_to_highlight,
            is_specific_number,
            line_number_offset,
            show_numbers,
            header_display_text,
            fold,
            unfold,
            display_language: display_language(&language, &settings.language_display_names),
            has_lang_border_color: has_lang_border_color(&language, &settings.lang_border_colors),
            exclude: info.is_excluded(&settings.exclude_patterns()),
            language,
            specific_header,
            backtick_count,
            indent_level,
            indent_character,
            line_separator,
            text_separator,
            prompt_name,
        }
    }

    /// The number displayed for 1-based block line `index`.
    pub fn display_line_number(&self, index: usize) -> i64 {
        i64::try_from(index)
            .unwrap_or(i64::MAX)
            .saturating_add(self.line_number_offset)
    }

    /// Whether line numbers are rendered, combining `ln` with the global toggle.
    pub fn shows_line_numbers(&self, settings: &Settings) -> bool {
        match self.show_numbers {
            ShowNumbers::Specific => true,
            ShowNumbers::Hide => false,
            ShowNumbers::Default => settings.enable_line_numbers,
        }
    }

    /// Whether this is a `prompt:<name>` block.
    pub fn is_prompt(&self) -> bool {
        self.prompt_name.is_some()
    }

    /// Whether any highlighting (default or alternate) is configured.
    pub fn has_highlights(&self) -> bool {
        !self.default_lines_to_highlight.is_empty()
            || !self.default_text_to_highlight.is_empty()
            || !self.alternative_lines_to_highlight.is_empty()
            || !self.alternative_text_to_highlight.is_empty()
    }
}
