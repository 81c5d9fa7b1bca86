use std::fs;
use std::path::{Path, PathBuf};

use simple_docs_config::Config;
use simple_docs_extract::{parse_attributes, Attributes, MARKDOWN_EXTENSION};
use simple_docs_render::{TemplateEngine, TeraEngine};
use tracing::debug;

use crate::document::Document;
use crate::error::{DocsError, DocsResult};
use crate::manifest::Manifest;
use crate::store::{ManifestState, ManifestStore};

/// Resolution context bound to one documentation directory.
pub struct SimpleDocs {
    base_dir: PathBuf,
    store: ManifestStore,
    engine: Option<Box<dyn TemplateEngine>>,
}

impl SimpleDocs {
    /// Bind to `base_dir`, which must exist. The manifest starts disabled and no
    /// template engine is installed.
    pub fn new(base_dir: impl AsRef<Path>) -> DocsResult<Self> {
        let base_dir = canonical_base(base_dir.as_ref())?;
        Ok(SimpleDocs {
            store: ManifestStore::new(&base_dir),
            base_dir,
            engine: None,
        })
    }

    /// Bind using resolved configuration: manifest file name, exclusions and
    /// policy, plus the Tera engine when templates are enabled.
    pub fn from_config(config: &Config) -> DocsResult<Self> {
        let base_dir = canonical_base(&config.base_dir)?;
        let mut docs = SimpleDocs {
            store: ManifestStore::from_settings(&base_dir, &config.manifest),
            base_dir,
            engine: None,
        };
        if config.render.templates {
            docs.set_template_engine(Some(Box::new(TeraEngine::new())));
        }
        if config.manifest.enabled {
            docs.enable_manifest(true, config.manifest.rebuild_always)?;
        }
        Ok(docs)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn with_template_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    pub fn set_template_engine(&mut self, engine: Option<Box<dyn TemplateEngine>>) -> &mut Self {
        self.engine = engine;
        self
    }

    pub fn template_engine(&self) -> Option<&dyn TemplateEngine> {
        self.engine.as_deref()
    }

    /// Enable or disable manifest fallback and apply the rebuild policy right
    /// away. With `rebuild_always` every call rebuilds the index.
    pub fn enable_manifest(&mut self, enabled: bool, rebuild_always: bool) -> DocsResult<()> {
        let rebuilt = self.store.configure(enabled, rebuild_always)?;
        debug!(enabled, rebuild_always, rebuilt, "Manifest policy updated");
        Ok(())
    }

    pub fn manifest_enabled(&self) -> bool {
        self.store.is_enabled()
    }

    /// Force a rebuild regardless of policy.
    pub fn rebuild_manifest(&self) -> DocsResult<Manifest> {
        self.store.rebuild()
    }

    /// The persisted manifest, if one exists.
    pub fn manifest(&self) -> DocsResult<Option<Manifest>> {
        self.store.load()
    }

    pub fn manifest_state(&self) -> DocsResult<ManifestState> {
        self.store.state()
    }

    pub fn manifest_path(&self) -> &Path {
        self.store.index_path()
    }

    /// Attribute block of an arbitrary file.
    pub fn parse_attributes(&self, path: &Path) -> DocsResult<Attributes> {
        parse_attributes(path).map_err(|err| DocsError::io(path, err))
    }

    /// Resolve `name` to a physical path.
    ///
    /// The direct file `<base>/<name>.md` always wins. Otherwise, when the
    /// manifest is enabled, `name` is looked up as given among the normalised
    /// names of the index.
    pub fn resolve(&self, name: &str) -> DocsResult<PathBuf> {
        let candidate = self.candidate_path(name)?;
        if candidate.is_file() {
            debug!(document = %name, path = %candidate.display(), "Resolved directly");
            return Ok(candidate);
        }

        if let ManifestState::Present(manifest) = self.store.state()? {
            if let Some(entry) = manifest.get(name) {
                debug!(document = %name, path = %entry.path.display(), "Resolved through manifest");
                return Ok(entry.path.clone());
            }
        }

        Err(DocsError::FileNotFound { path: candidate })
    }

    /// Resolve `name` and load the document.
    pub fn find(&self, name: &str) -> DocsResult<Document<'_>> {
        let path = self.resolve(name)?;
        Document::open(&path, self.template_engine())
    }

    fn candidate_path(&self, name: &str) -> DocsResult<PathBuf> {
        let segments: Vec<&str> = name
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();
        if segments.is_empty() || segments.contains(&"..") {
            return Err(DocsError::InvalidName {
                name: name.to_owned(),
            });
        }

        let mut relative = segments.join("/");
        if !relative.ends_with(MARKDOWN_EXTENSION) {
            relative.push_str(MARKDOWN_EXTENSION);
        }
        Ok(self.base_dir.join(relative))
    }
}

fn canonical_base(path: &Path) -> DocsResult<PathBuf> {
    if !path.is_dir() {
        return Err(DocsError::DirectoryNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::canonicalize(path).map_err(|err| DocsError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_docs_test_support::sample_docs;

    #[test]
    fn candidate_appends_extension_once() {
        let docs = sample_docs();
        let resolver = SimpleDocs::new(docs.path()).unwrap();

        assert_eq!(
            resolver.candidate_path("guide/intro").unwrap(),
            resolver.base_dir().join("guide/intro.md")
        );
        assert_eq!(
            resolver.candidate_path("readme.md").unwrap(),
            resolver.base_dir().join("readme.md")
        );
        assert_eq!(
            resolver.candidate_path("/readme").unwrap(),
            resolver.base_dir().join("readme.md")
        );
    }

    #[test]
    fn rejects_names_escaping_the_base() {
        let docs = sample_docs();
        let resolver = SimpleDocs::new(docs.path()).unwrap();

        for name in ["../secret", "guide/../../x", "", "/"] {
            let err = resolver.candidate_path(name).unwrap_err();
            assert!(matches!(err, DocsError::InvalidName { .. }), "{name}");
        }
    }
}
