use std::error::Error;
use std::io::Write;

use tera::{Context, Tera};

use crate::error::{RenderError, RenderResult};
use crate::template::{Template, TemplateEngine, Variables};

const TEMPLATE_NAME: &str = "document";

/// Template engine backed by Tera.
///
/// Documents are already HTML by the time they reach the engine, so
/// autoescaping is off unless explicitly requested.
#[derive(Clone, Debug, Default)]
pub struct TeraEngine {
    autoescape: bool,
}

impl TeraEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escape substituted values as HTML.
    pub fn with_autoescape(mut self, enabled: bool) -> Self {
        self.autoescape = enabled;
        self
    }
}

impl TemplateEngine for TeraEngine {
    fn compile(&self, source: &str) -> RenderResult<Box<dyn Template>> {
        let mut tera = Tera::default();
        if self.autoescape {
            tera.autoescape_on(vec![TEMPLATE_NAME]);
        } else {
            tera.autoescape_on(Vec::new());
        }
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|err| RenderError::Compile(format_tera_error(&err)))?;
        Ok(Box::new(TeraTemplate { tera }))
    }
}

struct TeraTemplate {
    tera: Tera,
}

impl TeraTemplate {
    fn context(variables: &Variables) -> RenderResult<Context> {
        Context::from_serialize(variables)
            .map_err(|err| RenderError::Render(format_tera_error(&err)))
    }
}

impl Template for TeraTemplate {
    fn render_to_string(&self, variables: &Variables) -> RenderResult<String> {
        let context = Self::context(variables)?;
        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|err| RenderError::Render(format_tera_error(&err)))
    }

    fn render_to_writer(&self, variables: &Variables, out: &mut dyn Write) -> RenderResult<()> {
        let context = Self::context(variables)?;
        self.tera
            .render_to(TEMPLATE_NAME, &context, out)
            .map_err(|err| RenderError::Render(format_tera_error(&err)))
    }
}

/// Flatten Tera's error chain into one line, dropping the internal template name.
fn format_tera_error(error: &tera::Error) -> String {
    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }

    messages
        .into_iter()
        .map(|msg| {
            msg.replace(&format!("'{TEMPLATE_NAME}'"), "template")
                .trim()
                .to_string()
        })
        .filter(|msg| !msg.is_empty())
        .collect::<Vec<_>>()
        .join(": ")
}
