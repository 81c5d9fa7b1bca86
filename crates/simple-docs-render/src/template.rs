use std::collections::BTreeMap;
use std::io::Write;

use crate::error::RenderResult;

/// Values made available to a template, keyed by variable name.
pub type Variables = BTreeMap<String, serde_json::Value>;

/// Compiles rendered HTML into reusable templates.
pub trait TemplateEngine: Send + Sync {
    fn compile(&self, source: &str) -> RenderResult<Box<dyn Template>>;
}

/// Compiled template ready to be executed with variables.
pub trait Template: Send + Sync {
    fn render_to_string(&self, variables: &Variables) -> RenderResult<String>;

    /// Emit the rendered output into `out`.
    fn render_to_writer(&self, variables: &Variables, out: &mut dyn Write) -> RenderResult<()> {
        let rendered = self.render_to_string(variables)?;
        out.write_all(rendered.as_bytes())?;
        Ok(())
    }
}
