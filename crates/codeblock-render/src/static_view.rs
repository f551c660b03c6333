//! Static (post-processed) view.
//!
//! Renders one block at a time from its fence line and content lines, with no document, cursor
//! or edit history. Folding is expressed through block classes and per-line treatments instead
//! of replaced ranges.

use crate::header::{block_classes, header_widget};
use codeblock_core::{
    DocumentText, FoldPolicy, FoldState, HeaderWidget, LineClassifier, LineTreatment, Parameters,
    Settings, TextSpan, scan_code_blocks,
};
use codeblock_prompt::{PromptContext, PromptData, PromptDefinitionSet, simulate};
use std::sync::Arc;

/// One rendered content line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// 1-based line number within the block.
    pub number: usize,
    /// Source text.
    pub text: String,
    /// Gutter number, when line numbers are shown.
    pub line_number: Option<i64>,
    /// Line classes (highlight and fade-out).
    pub classes: Vec<String>,
    /// Highlighted text spans.
    pub text_spans: Vec<TextSpan>,
    /// Fold treatment.
    pub treatment: LineTreatment,
    /// Prompt rendering, for lines of a prompt block.
    pub prompt: Option<PromptData>,
}

/// One rendered block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    /// Compiled parameters.
    pub parameters: Arc<Parameters>,
    /// Header, if shown.
    pub header: Option<HeaderWidget>,
    /// Fold state the block was rendered in.
    pub fold_state: FoldState,
    /// Classes of the block element.
    pub block_classes: Vec<String>,
    /// Content lines.
    pub lines: Vec<RenderedLine>,
    /// Show the semi-fold uncollapse affordance.
    pub uncollapse_affordance: bool,
    /// Show the collapse button under the block.
    pub collapse_button: bool,
}

impl RenderedBlock {
    /// Lines that are not hidden by the fold state.
    pub fn visible_lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.lines
            .iter()
            .filter(|l| l.treatment != LineTreatment::Hidden)
    }
}

/// Renders blocks for the static view.
#[derive(Debug)]
pub struct StaticViewRenderer<'a> {
    settings: &'a Settings,
    prompts: &'a PromptDefinitionSet,
    policy: FoldPolicy,
}

impl<'a> StaticViewRenderer<'a> {
    /// Create a renderer.
    pub fn new(settings: &'a Settings, prompts: &'a PromptDefinitionSet) -> Self {
        Self {
            settings,
            prompts,
            policy: FoldPolicy::from_settings(settings),
        }
    }

    /// Render a block in its load-time fold state. Excluded blocks render as `None`.
    pub fn render_block<S: AsRef<str>>(
        &self,
        fence_line: &str,
        lines: &[S],
    ) -> Option<RenderedBlock> {
        let params = Arc::new(Parameters::parse(fence_line, self.settings));
        self.render_parsed(params, lines, None)
    }

    /// Render a block in an explicit fold state.
    pub fn render_block_in_state<S: AsRef<str>>(
        &self,
        fence_line: &str,
        lines: &[S],
        state: FoldState,
    ) -> Option<RenderedBlock> {
        let params = Arc::new(Parameters::parse(fence_line, self.settings));
        self.render_parsed(params, lines, Some(state))
    }

    /// Render every block of a document.
    pub fn render_document(&self, text: &str) -> Vec<RenderedBlock> {
        let doc = DocumentText::new(text);
        scan_code_blocks(&doc, self.settings)
            .into_iter()
            .filter_map(|block| {
                let lines: Vec<String> = block
                    .content_lines()
                    .map(|line| doc.line(line).unwrap_or_default())
                    .collect();
                self.render_parsed(Arc::clone(&block.parameters), &lines, None)
            })
            .collect()
    }

    fn render_parsed<S: AsRef<str>>(
        &self,
        params: Arc<Parameters>,
        lines: &[S],
        state: Option<FoldState>,
    ) -> Option<RenderedBlock> {
        if params.exclude {
            tracing::debug!(language = %params.language, "skipping excluded block");
            return None;
        }
        // Fences count towards the block size.
        let total = lines.len() + 2;
        let state = state.unwrap_or_else(|| self.policy.initial_state(&params, total));
        let layout = self.policy.layout(state, total);

        let prompt_data = self.prompt_data(&params, lines);
        let classifier = LineClassifier::new(&params, self.settings);
        let numbers = params.shows_line_numbers(self.settings);

        let rendered = lines
            .iter()
            .enumerate()
            .map(|(offset, text)| {
                let number = offset + 1;
                let text = text.as_ref();
                let treatment = layout.treatment(number);
                let classification = classifier.classify(number, text);
                let mut classes = classification.line_classes;
                if let LineTreatment::Faded(class) = &treatment {
                    classes.push(class.clone());
                }
                RenderedLine {
                    number,
                    text: text.to_string(),
                    line_number: numbers.then(|| params.display_line_number(number)),
                    classes,
                    text_spans: classification.text_spans,
                    treatment,
                    prompt: prompt_data.as_ref().and_then(|d| d.get(offset).cloned()),
                }
            })
            .collect();

        Some(RenderedBlock {
            header: header_widget(&params, self.settings, state),
            block_classes: block_classes(&params, state),
            fold_state: state,
            lines: rendered,
            uncollapse_affordance: layout.uncollapse_affordance,
            collapse_button: layout.collapse_button,
            parameters: params,
        })
    }

    fn prompt_data<S: AsRef<str>>(
        &self,
        params: &Parameters,
        lines: &[S],
    ) -> Option<Vec<PromptData>> {
        let name = params.prompt_name.as_deref()?;
        let Some(prompt) = self.prompts.get(name) else {
            tracing::debug!(prompt = name, "unknown prompt, rendering block plainly");
            return None;
        };
        let ctx = PromptContext::new(&prompt, self.prompts.root_styling());
        Some(simulate(lines, &ctx).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeblock_core::{LINE_HIGHLIGHT_CLASS, SemiFoldSettings};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_highlight_and_numbers() {
        let settings = Settings::default();
        let prompts = PromptDefinitionSet::with_builtins();
        let renderer = StaticViewRenderer::new(&settings, &prompts);
        let block = renderer
            .render_block("```js hl:2 ln:10", &["let a;", "let b;"])
            .unwrap();

        assert_eq!(block.fold_state, FoldState::Expanded);
        assert_eq!(block.header, None);
        assert_eq!(block.lines[0].line_number, Some(10));
        assert_eq!(block.lines[1].line_number, Some(11));
        assert!(block.lines[0].classes.is_empty());
        assert_eq!(block.lines[1].classes, vec![LINE_HIGHLIGHT_CLASS.to_string()]);
    }

    #[test]
    fn test_excluded_block() {
        let settings = Settings {
            exclude_langs: "dataview".into(),
            ..Settings::default()
        };
        let prompts = PromptDefinitionSet::new();
        let renderer = StaticViewRenderer::new(&settings, &prompts);
        assert_eq!(renderer.render_block("```dataview", &["LIST"]), None);
        assert!(renderer.render_block("```js exclude", &["x"]).is_none());
    }

    #[test]
    fn test_semi_fold_treatments() {
        let settings = Settings {
            semi_fold: SemiFoldSettings {
                enabled: true,
                visible_lines: 2,
                fade_out_line_count: 1,
                show_uncollapse_button: false,
            },
            ..Settings::default()
        };
        let prompts = PromptDefinitionSet::new();
        let renderer = StaticViewRenderer::new(&settings, &prompts);
        let lines = ["a", "b", "c", "d", "e"];
        let block = renderer.render_block("```txt fold", &lines).unwrap();

        assert_eq!(block.fold_state, FoldState::Faded);
        assert!(block.uncollapse_affordance);
        let treatments: Vec<_> = block.lines.iter().map(|l| l.treatment.clone()).collect();
        assert_eq!(
            treatments,
            vec![
                LineTreatment::Visible,
                LineTreatment::Visible,
                LineTreatment::Faded("codeblock-customizer-fade-out-line1".into()),
                LineTreatment::Hidden,
                LineTreatment::Hidden,
            ]
        );
        assert_eq!(block.visible_lines().count(), 3);
    }
}
