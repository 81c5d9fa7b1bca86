//! Configuration primitives and loader for simple-docs.
//!
//! Settings resolve through a small precedence stack:
//! override file → `.simple-docs.toml` in the base directory → built-in defaults.
//! Raw TOML is normalised into typed structures so the resolver never touches it.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use simple_docs_extract::MARKDOWN_EXTENSION;
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".simple-docs.toml";

/// Default name of the persisted manifest index.
pub const DEFAULT_MANIFEST_FILE: &str = "manifest.json";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_dir: PathBuf,
    pub manifest: ManifestSettings,
    pub render: RenderSettings,
    pub sources: Vec<ConfigSource>,
}

/// Settings controlling the manifest index.
#[derive(Clone, Debug)]
pub struct ManifestSettings {
    pub enabled: bool,
    pub rebuild_always: bool,
    pub file_name: String,
    pub exclude: PatternList,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        ManifestSettings {
            enabled: false,
            rebuild_always: true,
            file_name: DEFAULT_MANIFEST_FILE.to_owned(),
            exclude: PatternList::default(),
        }
    }
}

/// Settings controlling document rendering.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Install the template engine so documents can substitute variables.
    pub templates: bool,
}

/// Glob pattern list with a pre-compiled matcher.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    originals: Vec<String>,
    set: GlobSet,
}

impl PatternList {
    /// Compile `patterns` into a matcher. Fails on the first invalid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self, globset::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut originals = Vec::new();
        for pattern in patterns {
            let pattern = pattern.into();
            builder.add(Glob::new(&pattern)?);
            originals.push(pattern);
        }
        Ok(PatternList {
            originals,
            set: builder.build()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    pub fn is_match(&self, path: &Path) -> bool {
        !self.is_empty() && self.set.is_match(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.originals.iter().map(String::as_str)
    }
}

/// Layer of configuration that contributed to the resolved settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn defaults() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} at {}", self.kind, path.display()),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "built-in defaults",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub base_dir: Option<PathBuf>,
    pub override_path: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(path.into());
        self
    }

    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base directory {attempted} is not accessible: {source}")]
    BaseDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{}", format_validation(.0))]
    Validation(Vec<ConfigValidationError>),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Validation failure with provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: ConfigSource,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.source)
    }
}

fn format_validation(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> ConfigResult<Self> {
        let attempted = options.base_dir.unwrap_or_else(|| PathBuf::from("."));
        let base_dir = fs::canonicalize(&attempted)
            .map_err(|source| ConfigError::BaseDirectory { attempted, source })?;

        let override_path = options.override_path.map(|path| {
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        });
        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = PartialConfig::default();
        let mut sources = vec![ConfigSource::defaults()];

        let local_path = base_dir.join(CONFIG_FILE_NAME);
        if local_path.is_file() && Some(&local_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_path.clone());
            merged.merge(load_layer(&local_path, source.clone())?);
            sources.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            sources.push(source);
        }

        let (manifest, render) = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            base_dir,
            manifest,
            render,
            sources,
        })
    }

    /// Absolute location of the manifest index.
    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join(&self.manifest.file_name)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> ConfigResult<PartialConfig> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.into(),
        source: err,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.into(),
        source: err,
    })?;
    Ok(raw.into_partial(source))
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    enabled: Option<Located<bool>>,
    rebuild_always: Option<Located<bool>>,
    file_name: Option<Located<String>>,
    exclude: Option<Located<Vec<String>>>,
    templates: Option<Located<bool>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.rebuild_always.is_some() {
            self.rebuild_always = other.rebuild_always;
        }
        if other.file_name.is_some() {
            self.file_name = other.file_name;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
        if other.templates.is_some() {
            self.templates = other.templates;
        }
    }

    fn finalize(self) -> Result<(ManifestSettings, RenderSettings), Vec<ConfigValidationError>> {
        let defaults = ManifestSettings::default();
        let mut errors = Vec::new();

        let file_name = match self.file_name {
            Some(located) => {
                let name = located.value.trim();
                if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                    errors.push(ConfigValidationError {
                        source: located.source,
                        message: format!(
                            "manifest.file_name must be a plain file name (received '{}')",
                            located.value
                        ),
                    });
                    defaults.file_name.clone()
                } else if name.ends_with(MARKDOWN_EXTENSION) {
                    errors.push(ConfigValidationError {
                        source: located.source,
                        message: format!(
                            "manifest.file_name must not end in '{MARKDOWN_EXTENSION}' \
                             (received '{}')",
                            located.value
                        ),
                    });
                    defaults.file_name.clone()
                } else {
                    name.to_owned()
                }
            }
            None => defaults.file_name.clone(),
        };

        let exclude = match self.exclude {
            Some(located) => match PatternList::new(located.value.iter().cloned()) {
                Ok(list) => list,
                Err(err) => {
                    errors.push(ConfigValidationError {
                        source: located.source,
                        message: format!("manifest.exclude contains an invalid glob: {err}"),
                    });
                    PatternList::default()
                }
            },
            None => PatternList::default(),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let manifest = ManifestSettings {
            enabled: self.enabled.map_or(defaults.enabled, |v| v.value),
            rebuild_always: self
                .rebuild_always
                .map_or(defaults.rebuild_always, |v| v.value),
            file_name,
            exclude,
        };
        let render = RenderSettings {
            templates: self.templates.map_or(false, |v| v.value),
        };
        Ok((manifest, render))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    manifest: Option<RawManifest>,
    #[serde(default)]
    render: Option<RawRender>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let mut partial = PartialConfig::default();
        if let Some(manifest) = self.manifest {
            partial.enabled = manifest.enabled.map(|v| Located::new(v, source.clone()));
            partial.rebuild_always = manifest
                .rebuild_always
                .map(|v| Located::new(v, source.clone()));
            partial.file_name = manifest.file_name.map(|v| Located::new(v, source.clone()));
            partial.exclude = manifest.exclude.map(|v| Located::new(v, source.clone()));
        }
        if let Some(render) = self.render {
            partial.templates = render.templates.map(|v| Located::new(v, source));
        }
        partial
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    rebuild_always: Option<bool>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRender {
    #[serde(default)]
    templates: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_list_matches_relative_paths() {
        let list = PatternList::new(["drafts/**", "*.tmp.md"]).unwrap();
        assert!(list.is_match(Path::new("drafts/wip.md")));
        assert!(list.is_match(Path::new("notes.tmp.md")));
        assert!(!list.is_match(Path::new("guide/intro.md")));
    }

    #[test]
    fn empty_pattern_list_matches_nothing() {
        let list = PatternList::default();
        assert!(!list.is_match(Path::new("anything.md")));
    }

    #[test]
    fn later_layers_win_during_merge() {
        let local = ConfigSource::for_file(ConfigSourceKind::Local, PathBuf::from("a"));
        let over = ConfigSource::for_file(ConfigSourceKind::Override, PathBuf::from("b"));
        let mut merged = PartialConfig::default();
        merged.merge(PartialConfig {
            enabled: Some(Located::new(true, local.clone())),
            rebuild_always: Some(Located::new(false, local)),
            ..PartialConfig::default()
        });
        merged.merge(PartialConfig {
            enabled: Some(Located::new(false, over)),
            ..PartialConfig::default()
        });

        let (manifest, _) = merged.finalize().unwrap();
        assert!(!manifest.enabled);
        assert!(!manifest.rebuild_always);
    }
}
