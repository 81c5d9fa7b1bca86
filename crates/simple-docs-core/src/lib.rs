//! Resolve Markdown documents by logical name.
//!
//! A [`SimpleDocs`] instance is bound to a base directory. Documents are found
//! by probing `<base>/<name>.md` directly and, when the manifest is enabled,
//! by falling back to a persisted index of normalised names built by walking
//! the tree.

pub mod document;
pub mod error;
pub mod manifest;
pub mod resolver;
pub mod store;

pub use document::{Document, DocumentView};
pub use error::{DocsError, DocsResult, ExitCode};
pub use manifest::{build_manifest, Manifest, ManifestEntry};
pub use resolver::SimpleDocs;
pub use simple_docs_extract::{Attributes, Section};
pub use simple_docs_render::{RenderError, Template, TemplateEngine, TeraEngine, Variables};
pub use store::{ManifestState, ManifestStore};
