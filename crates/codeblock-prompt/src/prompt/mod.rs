//! Shell prompt simulation.
//!
//! Prompt definitions describe how a shell prompt looks and how to recognize one at the start of
//! a line. The simulator walks a `prompt:<name>` block line by line, re-rendering each prompt from
//! a simulated environment and synthesizing output for `pwd` and `whoami`.

mod builtins;
mod definition;
mod environment;
mod error;
mod set;
mod simulator;
mod template;

pub use builtins::{
    BUILTIN_NAMES, PROMPT_CLASS_PREFIX, ROOT_CLASS_SUFFIX, builtin, builtins,
    default_highlight_groups,
};
pub use definition::{CompiledPrompt, PromptDefinition};
pub use environment::{PromptEnvironment, home_for};
pub use error::PromptError;
pub use set::PromptDefinitionSet;
pub use simulator::{
    PromptCache, PromptContext, PromptData, PromptLineResult, compute_prompt_lines,
    render_prompt_line, simulate,
};
pub use template::{PromptTemplate, TEMPLATE_FIELDS, TemplatePart, field_value, segments_text};
