//! A resolved Markdown document.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use simple_docs_extract::{
    collect_sections, parse_attributes_str, resolve_title, Attributes, Section,
};
use simple_docs_render::{render_markdown, Template, TemplateEngine, Variables};

use crate::error::{DocsError, DocsResult};

/// Snapshot of one Markdown file taken when it was opened.
///
/// The raw HTML is rendered once at construction. When a template engine is
/// available the HTML is compiled into a template on first use and reused for
/// every subsequent render.
pub struct Document<'a> {
    path: PathBuf,
    content: String,
    last_modified: DateTime<Utc>,
    attributes: Attributes,
    sections: Vec<Section>,
    title: Option<String>,
    html: String,
    engine: Option<&'a dyn TemplateEngine>,
    template: OnceLock<Box<dyn Template>>,
}

impl<'a> Document<'a> {
    pub fn open(path: &Path, engine: Option<&'a dyn TemplateEngine>) -> DocsResult<Self> {
        let bytes = fs::read(path).map_err(|err| DocsError::io(path, err))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|err| DocsError::io(path, err))?;

        let attributes = parse_attributes_str(&content);
        let sections = collect_sections(&content);
        let title = resolve_title(&attributes, &sections);
        let html = render_markdown(&content);

        Ok(Document {
            path: path.to_path_buf(),
            content,
            last_modified: DateTime::<Utc>::from(modified),
            attributes,
            sections,
            title,
            html,
            engine,
            template: OnceLock::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Modification time as seconds since the Unix epoch.
    pub fn last_modified_timestamp(&self) -> i64 {
        self.last_modified.timestamp()
    }

    /// Markdown rendered to HTML, without template processing.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Render the document.
    ///
    /// Without a template engine the cached HTML is returned as-is and passing
    /// any variables is an error. With one, the HTML is executed as a template
    /// over the document attributes overlaid with `variables`.
    pub fn render(&self, variables: &Variables) -> DocsResult<String> {
        match self.engine {
            None => {
                ensure_no_variables(variables)?;
                Ok(self.html.clone())
            }
            Some(engine) => {
                let template = self.compiled(engine)?;
                Ok(template.render_to_string(&self.merged_variables(variables))?)
            }
        }
    }

    /// Like [`Document::render`], emitting into `out` instead of returning.
    pub fn render_to(&self, variables: &Variables, out: &mut dyn Write) -> DocsResult<()> {
        match self.engine {
            None => {
                ensure_no_variables(variables)?;
                out.write_all(self.html.as_bytes())
                    .map_err(|err| DocsError::io(&self.path, err))
            }
            Some(engine) => {
                let template = self.compiled(engine)?;
                template.render_to_writer(&self.merged_variables(variables), out)?;
                Ok(())
            }
        }
    }

    /// Bundle of everything a page template usually needs.
    pub fn to_view(&self, variables: &Variables) -> DocsResult<DocumentView<'_>> {
        Ok(DocumentView {
            title: self.title.as_deref(),
            sections: &self.sections,
            attributes: &self.attributes,
            output: self.render(variables)?,
            document: self,
        })
    }

    fn compiled(&self, engine: &dyn TemplateEngine) -> DocsResult<&dyn Template> {
        if let Some(template) = self.template.get() {
            return Ok(&**template);
        }
        let compiled = engine.compile(&self.html)?;
        Ok(&**self.template.get_or_init(|| compiled))
    }

    fn merged_variables(&self, variables: &Variables) -> Variables {
        let mut merged: Variables = self
            .attributes
            .iter()
            .map(|(name, value)| (name.to_owned(), Value::String(value.to_owned())))
            .collect();
        merged.extend(
            variables
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        merged
    }
}

fn ensure_no_variables(variables: &Variables) -> DocsResult<()> {
    if variables.is_empty() {
        Ok(())
    } else {
        Err(DocsError::TemplateCapabilityMissing)
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("title", &self.title)
            .field("attributes", &self.attributes)
            .field("last_modified", &self.last_modified)
            .field("templated", &self.engine.is_some())
            .finish()
    }
}

/// Title, outline, attributes and rendered output of a document.
#[derive(Debug, Serialize)]
pub struct DocumentView<'d> {
    pub title: Option<&'d str>,
    pub sections: &'d [Section],
    pub attributes: &'d Attributes,
    pub output: String,
    #[serde(skip)]
    pub document: &'d Document<'d>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use simple_docs_render::TeraEngine;
    use simple_docs_test_support::docs_tree;

    fn vars(pairs: &[(&str, Value)]) -> Variables {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn reads_snapshot_on_open() {
        let docs = docs_tree(&[(
            "page.md",
            "[//]: # ([title]Page Title)\n\n# Heading\n\n## Sub\n",
        )]);
        let doc = Document::open(&docs.path().join("page.md"), None).unwrap();

        assert_eq!(doc.title(), Some("Page Title"));
        assert_eq!(doc.attribute("title"), Some("Page Title"));
        assert_eq!(doc.sections().len(), 2);
        assert!(doc.content().starts_with("[//]: #"));
        assert_eq!(doc.html(), "<h1>Heading</h1>\n<h2>Sub</h2>\n");
        assert!(doc.last_modified_timestamp() > 0);
    }

    #[test]
    fn opens_file_with_invalid_utf8() {
        let docs = docs_tree(&[]);
        let path = docs.path().join("menu.md");
        fs::write(&path, b"[//]: # ([title]Menu)\n\nCaf\xe9\n").unwrap();

        let doc = Document::open(&path, None).unwrap();
        assert_eq!(doc.title(), Some("Menu"));
        assert!(doc.content().contains("Caf\u{FFFD}"));
    }

    #[test]
    fn raw_render_is_idempotent() {
        let docs = docs_tree(&[("page.md", "Hello {{ who }}\n")]);
        let doc = Document::open(&docs.path().join("page.md"), None).unwrap();

        let first = doc.render(&Variables::new()).unwrap();
        let second = doc.render(&Variables::new()).unwrap();
        assert_eq!(first, "<p>Hello {{ who }}</p>\n");
        assert_eq!(first, second);
    }

    #[test]
    fn variables_without_engine_are_rejected() {
        let docs = docs_tree(&[("page.md", "Hello\n")]);
        let doc = Document::open(&docs.path().join("page.md"), None).unwrap();

        let err = doc.render(&vars(&[("x", json!(1))])).unwrap_err();
        assert!(matches!(err, DocsError::TemplateCapabilityMissing));

        let mut sink = Vec::new();
        let err = doc.render_to(&vars(&[("x", json!(1))]), &mut sink).unwrap_err();
        assert!(matches!(err, DocsError::TemplateCapabilityMissing));
        assert!(sink.is_empty());
    }

    #[test]
    fn caller_variables_override_attributes() {
        let docs = docs_tree(&[(
            "page.md",
            "[//]: # ([product]Docs)\n[//]: # ([edition]basic)\n\n{{ product }} {{ edition }}\n",
        )]);
        let engine = TeraEngine::new();
        let doc = Document::open(&docs.path().join("page.md"), Some(&engine)).unwrap();

        assert_eq!(
            doc.render(&Variables::new()).unwrap(),
            "<p>Docs basic</p>\n"
        );
        assert_eq!(
            doc.render(&vars(&[("edition", json!("pro"))])).unwrap(),
            "<p>Docs pro</p>\n"
        );
    }

    #[test]
    fn render_to_emits_into_sink() {
        let docs = docs_tree(&[("page.md", "Hi {{ name }}\n")]);
        let engine = TeraEngine::new();
        let doc = Document::open(&docs.path().join("page.md"), Some(&engine)).unwrap();

        let mut sink = Vec::new();
        doc.render_to(&vars(&[("name", json!("there"))]), &mut sink)
            .unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "<p>Hi there</p>\n");
    }

    #[test]
    fn view_bundles_outline_and_output() {
        let docs = docs_tree(&[("page.md", "[//]: # ([tag]x)\n\n# Top\n\nBody\n")]);
        let doc = Document::open(&docs.path().join("page.md"), None).unwrap();

        let view = doc.to_view(&Variables::new()).unwrap();
        assert_eq!(view.title, Some("Top"));
        assert_eq!(view.attributes.get("tag"), Some("x"));
        assert_eq!(view.output, "<h1>Top</h1>\n<p>Body</p>\n");
        assert_eq!(view.document.path(), doc.path());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["sections"][0]["anchor"], "top");
        assert!(json.get("document").is_none());
    }
}
