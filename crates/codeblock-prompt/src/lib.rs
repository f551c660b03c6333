#![warn(missing_docs)]
//! `codeblock-prompt` - shell prompt simulation for `codeblock-core` code blocks.
//!
//! A block opened with `` ```prompt:bash `` is a transcript of a shell session. This crate holds
//! the built-in and user-defined prompt grammars ([`PromptDefinitionSet`]) and the pure
//! line-by-line simulator that threads a [`PromptEnvironment`] through the block.
//!
//! ```
//! use codeblock_prompt::{PromptContext, PromptData, PromptDefinitionSet, simulate};
//!
//! let set = PromptDefinitionSet::with_builtins();
//! let bash = set.get("bash").unwrap();
//! let ctx = PromptContext::new(&bash, set.root_styling());
//!
//! let (lines, env) = simulate(&["$ cd /var/www", "$ pwd"], &ctx);
//! assert_eq!(env.dir, "/var/www");
//! match &lines[1] {
//!     PromptData::Prompt { outputs, .. } => assert_eq!(outputs, &["/var/www".to_string()]),
//!     other => panic!("{other:?}"),
//! }
//! ```

pub mod prompt;

pub use prompt::*;
