#![warn(missing_docs)]
//! `codeblock-render` - front ends that drive `codeblock-core` for a host editor.
//!
//! Two independent front ends share the same core contracts:
//!
//! - [`LiveView`]: the incremental view. It keeps a code block index and fold states across
//!   edits and turns a document plus a [`RenderRequest`](codeblock_core::RenderRequest) into a
//!   complete [`DecorationSet`](codeblock_core::DecorationSet) on every pass.
//! - [`StaticViewRenderer`]: the post-processed view. It renders one block at a time into
//!   per-line classes, spans, numbers and prompt output.
//!
//! ```
//! use codeblock_core::{DocumentText, RenderRequest, Settings, SettingsRevision};
//! use codeblock_render::LiveView;
//!
//! let doc = DocumentText::new("```sh hl:1\nls\n```\n");
//! let mut view = LiveView::new(Settings::default());
//! let request = RenderRequest::new(SettingsRevision::INITIAL, 0..doc.line_count());
//! let decorations = view.recompute(&doc, &request).unwrap();
//! assert!(!decorations.is_empty());
//! ```

mod error;
pub mod header;
mod live_view;
mod static_view;

pub use error::RenderError;
pub use header::{block_classes, header_widget};
pub use live_view::LiveView;
pub use static_view::{RenderedBlock, RenderedLine, StaticViewRenderer};
