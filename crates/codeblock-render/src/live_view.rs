//! Incremental (live) view.
//!
//! [`LiveView`] owns the per-document state that survives between render passes: the code block
//! index, the explicit fold states and the last decoration set. Every pass rebuilds the full set
//! for the requested viewport from that state, so two passes over unchanged input are equal and
//! the host can diff them without flicker.

use crate::error::RenderError;
use crate::header::header_widget;
use codeblock_core::{
    CodeBlockIndex, CodeBlockPosition, Decoration, DecorationSet, DocumentProcessor, DocumentText,
    FoldAction, FoldEvent, FoldEventBus, FoldPolicy, FoldState, FoldStateSet, LineClassifier,
    LineTreatment, Parameters, RenderRequest, Settings, SettingsRevision, TextEdit, WidgetKind,
    find_block_bounds,
};
use codeblock_prompt::{PromptContext, PromptData, PromptDefinitionSet, PromptError, simulate};
use std::ops::Range;

/// Live decoration state of one document.
#[derive(Debug)]
pub struct LiveView {
    settings: Settings,
    revision: SettingsRevision,
    policy: FoldPolicy,
    prompts: PromptDefinitionSet,
    index: CodeBlockIndex,
    folds: FoldStateSet,
    events: FoldEventBus,
    decorations: DecorationSet,
}

impl LiveView {
    /// Create a view for settings at [`SettingsRevision::INITIAL`].
    pub fn new(settings: Settings) -> Self {
        Self::with_revision(settings, SettingsRevision::INITIAL)
    }

    /// Create a view for settings at `revision`.
    pub fn with_revision(settings: Settings, revision: SettingsRevision) -> Self {
        let mut prompts = PromptDefinitionSet::with_builtins();
        for err in prompts.apply_settings(&settings.prompts) {
            tracing::warn!(%err, "prompt definition rejected");
        }
        Self {
            policy: FoldPolicy::from_settings(&settings),
            settings,
            revision,
            prompts,
            index: CodeBlockIndex::new(),
            folds: FoldStateSet::new(),
            events: FoldEventBus::new(),
            decorations: DecorationSet::new(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Revision of the current settings.
    pub fn revision(&self) -> SettingsRevision {
        self.revision
    }

    /// Replace the settings.
    ///
    /// Prompt definitions are rebuilt from `settings`, so removed overrides and custom prompts
    /// stop applying. Definitions that fail to compile are returned and their previous versions
    /// stay in effect. Compiled block parameters are dropped on the next pass.
    pub fn update_settings(
        &mut self,
        settings: Settings,
        revision: SettingsRevision,
    ) -> Vec<PromptError> {
        let errors = self.prompts.apply_settings(&settings.prompts);
        self.policy = FoldPolicy::from_settings(&settings);
        self.settings = settings;
        self.revision = revision;
        errors
    }

    /// Prompt definitions in use.
    pub fn prompts(&self) -> &PromptDefinitionSet {
        &self.prompts
    }

    /// Mutably access the prompt definitions (e.g. to load custom prompts).
    pub fn prompts_mut(&mut self) -> &mut PromptDefinitionSet {
        &mut self.prompts
    }

    /// Decorations produced by the last successful pass.
    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    /// Code blocks known to the view.
    pub fn blocks(&self) -> &[CodeBlockPosition] {
        self.index.blocks()
    }

    /// Explicit fold states.
    pub fn fold_states(&self) -> &FoldStateSet {
        &self.folds
    }

    /// Subscribe to fold state changes.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&FoldEvent) + Send + 'static,
    {
        self.events.subscribe(callback);
    }

    /// Fold event bus.
    pub fn events(&self) -> &FoldEventBus {
        &self.events
    }

    /// Apply `edit` to `doc` and map the view state through it.
    ///
    /// A rejected edit leaves both the document and the view untouched.
    pub fn apply_edit(
        &mut self,
        doc: &mut DocumentText,
        edit: &TextEdit,
    ) -> Result<(), RenderError> {
        doc.apply_edit(edit)?;
        self.index.apply_edit(edit);
        self.folds.map_through(edit);
        Ok(())
    }

    /// Run a render pass.
    ///
    /// On error the previous decoration set stays in place.
    pub fn recompute(
        &mut self,
        doc: &DocumentText,
        request: &RenderRequest,
    ) -> Result<&DecorationSet, RenderError> {
        match self.build(doc, request) {
            Ok(next) => {
                let diff = self.decorations.diff(&next);
                tracing::trace!(
                    added = diff.added.len(),
                    removed = diff.removed.len(),
                    total = next.len(),
                    "live view recomputed"
                );
                self.decorations = next;
                Ok(&self.decorations)
            }
            Err(err) => {
                tracing::warn!(%err, "render pass failed, keeping previous decorations");
                Err(err)
            }
        }
    }

    /// Toggle the fold of the block around `line`.
    pub fn toggle_fold_at_line(&mut self, doc: &DocumentText, line: usize) -> Option<FoldState> {
        self.apply_action_at_line(doc, line, FoldAction::Click)
    }

    /// Activate the uncollapse affordance of the block around `line`.
    pub fn uncollapse_at_line(&mut self, doc: &DocumentText, line: usize) -> Option<FoldState> {
        self.apply_action_at_line(doc, line, FoldAction::Uncollapse)
    }

    /// Fold every block. Returns the number of blocks whose state changed.
    pub fn fold_all(&mut self, doc: &DocumentText) -> usize {
        self.apply_action_to_all(doc, FoldAction::FoldAll)
    }

    /// Unfold every block. Returns the number of blocks whose state changed.
    pub fn unfold_all(&mut self, doc: &DocumentText) -> usize {
        self.apply_action_to_all(doc, FoldAction::UnfoldAll)
    }

    /// Effective fold state of `block`.
    pub fn fold_state(&self, block: &CodeBlockPosition) -> FoldState {
        self.folds
            .state_at(block.start)
            .unwrap_or_else(|| self.policy.initial_state(&block.parameters, block.total_lines()))
    }

    fn apply_action_at_line(
        &mut self,
        doc: &DocumentText,
        line: usize,
        action: FoldAction,
    ) -> Option<FoldState> {
        self.index.refresh(doc, &self.settings, self.revision);
        let opener = find_block_bounds(doc, line).map(|b| b.start_line);
        let block = opener
            .and_then(|start| self.index.blocks().iter().find(|b| b.start_line == start))
            .filter(|b| b.contains_line(line))
            .or_else(|| self.index.block_at_line(line))?
            .clone();
        if block.parameters.exclude {
            return None;
        }
        Some(self.transition(&block, action))
    }

    fn apply_action_to_all(&mut self, doc: &DocumentText, action: FoldAction) -> usize {
        self.index.refresh(doc, &self.settings, self.revision);
        let blocks: Vec<CodeBlockPosition> = self
            .index
            .blocks()
            .iter()
            .filter(|b| !b.parameters.exclude)
            .cloned()
            .collect();
        let before = self.events.emitted();
        for block in &blocks {
            self.transition(block, action);
        }
        (self.events.emitted() - before) as usize
    }

    fn transition(&mut self, block: &CodeBlockPosition, action: FoldAction) -> FoldState {
        let old_state = self.fold_state(block);
        let new_state = self
            .policy
            .transition(old_state, action, block.total_lines());
        self.folds.set(block.start, block.end, new_state);
        self.events.emit(&FoldEvent {
            block_start: block.start,
            start_line: block.start_line,
            old_state,
            new_state,
            cause: action,
        });
        new_state
    }

    fn build(
        &mut self,
        doc: &DocumentText,
        request: &RenderRequest,
    ) -> Result<DecorationSet, RenderError> {
        if request.revision != self.revision {
            return Err(RenderError::RevisionMismatch {
                view: self.revision,
                request: request.revision,
            });
        }
        let line_count = doc.line_count();
        let Range { start, end } = request.viewport;
        if start > end || start > line_count {
            return Err(RenderError::InvalidViewport {
                start,
                end,
                line_count,
            });
        }
        let viewport = start..end.min(line_count);

        self.index.refresh(doc, &self.settings, self.revision);
        let index = &self.index;
        self.folds
            .retain(|r| index.blocks().iter().any(|b| b.start == r.start));

        let cursor_block = request
            .cursor
            .and_then(|offset| self.index.block_at_offset(offset))
            .map(|b| b.start);

        let mut out = Vec::new();
        for block in self.index.blocks() {
            if block.end_line < viewport.start || block.start_line >= viewport.end {
                continue;
            }
            if block.parameters.exclude {
                continue;
            }
            self.block_decorations(
                doc,
                block,
                &viewport,
                cursor_block == Some(block.start),
                &mut out,
            );
        }
        Ok(out.into_iter().collect())
    }

    fn block_decorations(
        &self,
        doc: &DocumentText,
        block: &CodeBlockPosition,
        viewport: &Range<usize>,
        has_cursor: bool,
        out: &mut Vec<Decoration>,
    ) {
        let params = &block.parameters;
        let state = self.fold_state(block);
        let layout = self.policy.layout(state, block.total_lines());

        if let Some(header) = header_widget(params, &self.settings, state) {
            out.push(Decoration::widget(block.start, WidgetKind::Header(header)));
        }
        if has_cursor || self.settings.always_show_copy_button {
            out.push(Decoration::widget(block.start, WidgetKind::CopyButton));
        }

        let content = block.content_lines();
        let lines: Vec<String> = content
            .clone()
            .map(|line| doc.line(line).unwrap_or_default())
            .collect();
        let prompt_data = self.prompt_data(params, &lines);
        let classifier = LineClassifier::new(params, &self.settings);
        let numbers = params.shows_line_numbers(&self.settings);

        for (offset, text) in lines.iter().enumerate() {
            let line = content.start + offset;
            if !viewport.contains(&line) {
                continue;
            }
            let index = offset + 1;
            let fade = match layout.treatment(index) {
                LineTreatment::Hidden => continue,
                LineTreatment::Faded(class) => Some(class),
                LineTreatment::Visible => None,
            };
            let line_start = doc.line_to_char(line);

            let classification = classifier.classify(index, text);
            let mut classes = classification.line_classes;
            classes.extend(fade);
            if !classes.is_empty() {
                out.push(Decoration::line(line_start, classes));
            }
            out.extend(classification.text_spans.into_iter().map(|span| {
                Decoration::mark(
                    line_start + span.start,
                    line_start + span.end,
                    span.class_name,
                )
            }));
            if numbers {
                out.push(Decoration::widget(
                    line_start,
                    WidgetKind::LineNumber(params.display_line_number(index)),
                ));
            }

            if let Some(PromptData::Prompt {
                segments,
                prefix_len,
                outputs,
                ..
            }) = prompt_data.as_ref().and_then(|data| data.get(offset))
            {
                let prefix_chars = text.get(..*prefix_len).map_or(0, |p| p.chars().count());
                if prefix_chars > 0 {
                    out.push(Decoration::replace(line_start, line_start + prefix_chars));
                }
                out.push(Decoration::widget(
                    line_start,
                    WidgetKind::Prompt(segments.to_vec()),
                ));
                let line_end = doc.line_end_char(line);
                out.extend(
                    outputs
                        .iter()
                        .map(|o| Decoration::widget(line_end, WidgetKind::PromptOutput(o.clone()))),
                );
            }
        }

        if let Some(hidden) = &layout.hidden {
            let from = doc.line_to_char(block.start_line + hidden.start);
            if from < block.end {
                out.push(Decoration::replace(from, block.end));
            }
            if layout.uncollapse_affordance {
                out.push(Decoration::widget(from, WidgetKind::Uncollapse));
            }
        }
        if layout.collapse_button {
            out.push(Decoration::widget(block.end, WidgetKind::Collapse));
        }
    }

    fn prompt_data(&self, params: &Parameters, lines: &[String]) -> Option<Vec<PromptData>> {
        let prompt = self.prompts.get(params.prompt_name.as_deref()?)?;
        let ctx = PromptContext::new(&prompt, self.prompts.root_styling());
        Some(simulate(lines, &ctx).0)
    }
}

impl DocumentProcessor for LiveView {
    type Error = RenderError;

    fn process(
        &mut self,
        doc: &DocumentText,
        request: &RenderRequest,
    ) -> Result<DecorationSet, Self::Error> {
        self.recompute(doc, request).cloned()
    }
}
