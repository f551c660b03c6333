//! Block headers and block-level classes.

use codeblock_core::{FoldState, HeaderWidget, Parameters, Settings};

/// Class of every decorated code block.
pub const BLOCK_CLASS: &str = "codeblock-customizer-pre";
/// Class of a fully collapsed block.
pub const COLLAPSED_CLASS: &str = "codeblock-customizer-codeblock-collapsed";
/// Class of a semi-folded block.
pub const SEMI_FOLDED_CLASS: &str = "codeblock-customizer-codeblock-semi-collapsed";
/// Class of a block whose language has a border color.
pub const LANG_BORDER_CLASS: &str = "codeblock-customizer-has-lang-border";
/// Prefix of the per-language block class.
pub const LANGUAGE_CLASS_PREFIX: &str = "codeblock-customizer-language-";

/// The header shown above a block in `state`, if any.
///
/// A header is shown when the info string asks for one, when the settings always display
/// headers for blocks with a language, or when the block is folded (the header is what
/// unfolds it). A folded block without header text falls back to the configured
/// collapsed-code text.
pub fn header_widget(
    params: &Parameters,
    settings: &Settings,
    state: FoldState,
) -> Option<HeaderWidget> {
    let folded = state.is_folded();
    let wanted = params.specific_header
        || (settings.header.always_display && !params.language.is_empty())
        || folded
        || !params.header_display_text.is_empty();
    if !wanted {
        return None;
    }
    let text = if !params.header_display_text.is_empty() {
        params.header_display_text.clone()
    } else if folded {
        settings.header.collapsed_code_text.clone()
    } else {
        String::new()
    };
    Some(HeaderWidget {
        text,
        language: params.language.clone(),
        display_language: params.display_language.clone(),
        folded,
        lang_border: params.has_lang_border_color,
    })
}

/// Classes of the block element.
pub fn block_classes(params: &Parameters, state: FoldState) -> Vec<String> {
    let mut classes = vec![BLOCK_CLASS.to_string()];
    if !params.language.is_empty() {
        classes.push(format!("{LANGUAGE_CLASS_PREFIX}{}", params.language));
    }
    if params.has_lang_border_color {
        classes.push(LANG_BORDER_CLASS.to_string());
    }
    match state {
        FoldState::Expanded => {}
        FoldState::Collapsed => classes.push(COLLAPSED_CLASS.to_string()),
        FoldState::Faded => classes.push(SEMI_FOLDED_CLASS.to_string()),
    }
    classes
}
