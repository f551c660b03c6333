#![warn(missing_docs)]
//! Codeblock Core - Headless Annotation Engine for Fenced Code Blocks
//!
//! # Overview
//!
//! `codeblock-core` turns the info string of a fenced code block into a compiled set of
//! [`Parameters`] and uses it to decide, per line, which highlight classes apply, how the block
//! folds, and where line numbers and headers go. It does no rendering of its own: front ends
//! (see `codeblock-render`) turn its answers into decorations for the host editor.
//!
//! # Core Features
//!
//! - **Directive Parser**: `key:value` / `key="quoted value"` tokens, case-insensitive keys
//! - **Highlight Compiler**: line numbers, ranges, words, line-scoped words and `from:to` spans
//! - **Alternate Colors**: user-named highlight variants with their own directive keys
//! - **Folding**: full fold and semi-fold (visible head, fade-out, uncollapse affordance)
//! - **Edit Tracking**: rope-backed document text, fold states mapped through edits
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DocumentProcessor / FoldEventBus           │  ← Front-end contract
//! ├─────────────────────────────────────────────┤
//! │  Decorations (DecorationSet, widgets)       │  ← Output model
//! ├─────────────────────────────────────────────┤
//! │  Line Classifier + Fold Calculator          │  ← Per-line decisions
//! ├─────────────────────────────────────────────┤
//! │  Parameters (compiled, immutable)           │  ← Per-block state
//! ├─────────────────────────────────────────────┤
//! │  Directive Parser + Highlight Compiler      │  ← Info-string language
//! ├─────────────────────────────────────────────┤
//! │  DocumentText + CodeBlockIndex              │  ← Document access
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use codeblock_core::{Parameters, Settings, classify_line};
//!
//! let settings = Settings {
//!     alternate_colors: vec!["imp".to_string()],
//!     ..Settings::default()
//! };
//! let params = Parameters::parse("```hl:1,3-4 imp:2|TODO ln:5", &settings);
//!
//! assert!(classify_line(1, "first", &params).is_highlighted);
//! let second = classify_line(2, "// TODO", &params);
//! assert_eq!(second.color_name.as_deref(), Some("imp"));
//! assert_eq!(params.display_line_number(1), 5);
//! ```
//!
//! # Module Description
//!
//! - [`directive`] - info-string tokenizer and special-case recognizers
//! - [`highlight`] - highlight specification compiler
//! - [`parameters`] - compiled per-block parameters
//! - [`classify`] - per-line highlight classification
//! - [`folding`] - fold policy, semi-fold layout, block bounds, fold state set
//! - [`document`] - document text and code block positions
//! - [`decorations`] - decoration data model
//! - [`events`] - typed fold events
//! - [`processing`] - front-end processing trait

pub mod classify;
pub mod decorations;
pub mod directive;
pub mod document;
pub mod edit;
pub mod events;
pub mod fence;
pub mod folding;
pub mod highlight;
pub mod language;
pub mod parameters;
pub mod processing;
pub mod settings;
mod text_search;

pub use classify::{
    ClassResolver, LINE_HIGHLIGHT_CLASS, LineClassification, LineClassifier, TEXT_HIGHLIGHT_CLASS,
    TextSpan, classify_line,
};
pub use decorations::{
    Decoration, DecorationDiff, DecorationKind, DecorationRange, DecorationSet, HeaderWidget,
    StyledSegment, WidgetKind,
};
pub use directive::{
    InfoString, extract_file_title, get_code_block_language, is_excluded, is_fold_defined,
    is_unfold_defined, parse_parameters,
};
pub use document::{
    CodeBlockIndex, CodeBlockPosition, DocumentError, DocumentText, scan_block_bounds,
    scan_code_blocks,
};
pub use edit::TextEdit;
pub use events::{FoldEvent, FoldEventBus, FoldEventCallback};
pub use folding::{
    BlockBounds, FADE_OUT_CLASS_PREFIX, FoldAction, FoldLayout, FoldMode, FoldPolicy, FoldRange,
    FoldState, FoldStateSet, LineSource, LineTreatment, find_block_bounds,
};
pub use highlight::{
    Alternate, LineTextBetween, LineWords, LinesToHighlight, Separators, TextBetween,
    TextHighlight, get_alternative_highlights, get_highlighted_lines, get_line_ranges,
    get_text_highlight,
};
pub use parameters::{IndentCharacter, Parameters, ShowNumbers};
pub use processing::{DocumentProcessor, RenderRequest};
pub use settings::{
    HeaderSettings, PromptDefinitionPatch, PromptSettings, SemiFoldSettings, SeparatorSettings,
    Settings, SettingsError, SettingsRevision, ThemeSettings,
};
