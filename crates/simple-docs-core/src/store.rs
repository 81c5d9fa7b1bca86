//! Persistence and rebuild policy for the manifest index.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use simple_docs_config::{ManifestSettings, PatternList, DEFAULT_MANIFEST_FILE};
use simple_docs_utils::{atomic_write, FileLock};
use tracing::debug;

use crate::error::{DocsError, DocsResult};
use crate::manifest::{build_manifest, Manifest};

const LOCK_FILE_NAME: &str = ".simple-docs.lock";

/// What the store can currently offer the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManifestState {
    Disabled,
    Absent,
    Present(Manifest),
}

/// Owns the on-disk manifest for one base directory.
#[derive(Clone, Debug)]
pub struct ManifestStore {
    base_dir: PathBuf,
    index_path: PathBuf,
    exclude: PatternList,
    enabled: bool,
    rebuild_always: bool,
}

impl ManifestStore {
    /// A disabled store persisting to `<base_dir>/manifest.json`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        ManifestStore {
            index_path: base_dir.join(DEFAULT_MANIFEST_FILE),
            base_dir,
            exclude: PatternList::default(),
            enabled: false,
            rebuild_always: true,
        }
    }

    /// A store using the file name and exclusions from `settings`. The store
    /// starts disabled; enabling is an explicit step.
    pub fn from_settings(base_dir: impl Into<PathBuf>, settings: &ManifestSettings) -> Self {
        let base_dir = base_dir.into();
        ManifestStore {
            index_path: base_dir.join(&settings.file_name),
            base_dir,
            exclude: settings.exclude.clone(),
            enabled: false,
            rebuild_always: settings.rebuild_always,
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn rebuild_always(&self) -> bool {
        self.rebuild_always
    }

    /// Update the policy and immediately apply it. Returns whether a rebuild ran.
    pub fn configure(&mut self, enabled: bool, rebuild_always: bool) -> DocsResult<bool> {
        self.enabled = enabled;
        self.rebuild_always = rebuild_always;
        self.ensure()
    }

    /// Build and persist the manifest when enabled and either missing or
    /// configured to rebuild every time. Returns whether a rebuild ran.
    pub fn ensure(&self) -> DocsResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        if !self.rebuild_always && self.index_path.is_file() {
            return Ok(false);
        }

        let _lock = self.lock()?;
        // Another writer may have produced the index while we waited.
        if !self.rebuild_always && self.index_path.is_file() {
            return Ok(false);
        }
        self.write_fresh()?;
        Ok(true)
    }

    /// Unconditionally rebuild and persist the manifest.
    pub fn rebuild(&self) -> DocsResult<Manifest> {
        let _lock = self.lock()?;
        self.write_fresh()
    }

    /// Read the persisted index, whether or not the store is enabled.
    pub fn load(&self) -> DocsResult<Option<Manifest>> {
        if !self.index_path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.index_path)
            .map_err(|err| DocsError::io(&self.index_path, err))?;
        let manifest =
            serde_json::from_str(&contents).map_err(|source| DocsError::ManifestCorrupt {
                path: self.index_path.clone(),
                source,
            })?;
        Ok(Some(manifest))
    }

    pub fn state(&self) -> DocsResult<ManifestState> {
        if !self.enabled {
            return Ok(ManifestState::Disabled);
        }
        Ok(match self.load()? {
            Some(manifest) => ManifestState::Present(manifest),
            None => ManifestState::Absent,
        })
    }

    fn lock(&self) -> DocsResult<FileLock> {
        let lock_path = self.base_dir.join(LOCK_FILE_NAME);
        FileLock::acquire(&lock_path).map_err(|err| DocsError::io(lock_path, err))
    }

    fn write_fresh(&self) -> DocsResult<Manifest> {
        debug!(index = %self.index_path.display(), "Rebuilding manifest");
        let manifest = build_manifest(&self.base_dir, &self.exclude)?;
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|err| DocsError::io(&self.index_path, io::Error::other(err)))?;
        atomic_write(&self.index_path, &json)
            .map_err(|err| DocsError::io(&self.index_path, err))?;
        Ok(manifest)
    }
}
