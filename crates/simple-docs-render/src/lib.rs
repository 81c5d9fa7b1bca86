//! Rendering capabilities used by simple-docs documents.
//!
//! Markdown is converted to HTML once per document. Template substitution is
//! optional and pluggable through [`TemplateEngine`]; [`TeraEngine`] is the
//! bundled implementation.

mod error;
mod markdown;
mod template;
mod tera_engine;

pub use error::{RenderError, RenderResult};
pub use markdown::render_markdown;
pub use template::{Template, TemplateEngine, Variables};
pub use tera_engine::TeraEngine;
