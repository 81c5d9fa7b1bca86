//! Directory walk producing the logical-name index.

use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simple_docs_config::PatternList;
use simple_docs_extract::{normalize_name, parse_attributes, Attributes, MARKDOWN_EXTENSION};
use simple_docs_utils::parallel_map;
use strsim::normalized_levenshtein;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{DocsError, DocsResult};

/// Minimum similarity for [`Manifest::suggest`].
const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Physical location and metadata recorded for one logical name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub attributes: Attributes,
    pub path: PathBuf,
}

/// Mapping from logical document name to its entry, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ManifestEntry> {
        self.entries.iter()
    }

    /// Record `entry` under `name`, returning the entry it replaced.
    pub fn insert(&mut self, name: String, entry: ManifestEntry) -> Option<ManifestEntry> {
        self.entries.insert(name, entry)
    }

    /// Closest known name to `name`, if any is similar enough.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        self.names()
            .map(|candidate| (candidate, normalized_levenshtein(name, candidate)))
            .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(candidate, _)| candidate)
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (&'a String, &'a ManifestEntry);
    type IntoIter = btree_map::Iter<'a, String, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Walk `base_dir` depth-first and index every `.md` file by logical name.
///
/// Siblings are visited in file-name order. When two files normalise to the
/// same name the one visited last wins.
pub fn build_manifest(base_dir: &Path, exclude: &PatternList) -> DocsResult<Manifest> {
    let mut discovered = Vec::new();

    let walker = WalkDir::new(base_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(base_dir)
                .map_or(true, |relative| !exclude.is_match(relative))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.loop_ancestor().is_some() => {
                warn!(error = %err, "Skipping symlink loop");
                continue;
            }
            Err(err) if is_dangling_link(&err) => {
                warn!(error = %err, "Skipping dangling symlink");
                continue;
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| base_dir.to_path_buf());
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                return Err(DocsError::io(path, source));
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let is_markdown = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(MARKDOWN_EXTENSION));
        if !is_markdown {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(base_dir) else {
            continue;
        };
        let segments: Option<Vec<&str>> = relative.iter().map(|segment| segment.to_str()).collect();
        let Some(segments) = segments else {
            warn!(path = %entry.path().display(), "Skipping path that is not valid UTF-8");
            continue;
        };

        let name = normalize_name(segments);
        discovered.push((name, entry.into_path()));
    }

    let parsed = parallel_map(discovered, |(name, path)| {
        let attributes = parse_attributes(&path);
        (name, path, attributes)
    });

    let mut manifest = Manifest::default();
    for (name, path, attributes) in parsed {
        let attributes = attributes.map_err(|err| DocsError::io(&path, err))?;
        let entry = ManifestEntry {
            attributes,
            path: path.clone(),
        };
        if let Some(previous) = manifest.insert(name.clone(), entry) {
            warn!(
                document = %name,
                replaced = %previous.path.display(),
                by = %path.display(),
                "Duplicate document name in manifest; last entry wins"
            );
        }
    }

    debug!(base = %base_dir.display(), documents = manifest.len(), "Manifest built");
    Ok(manifest)
}

fn is_dangling_link(err: &walkdir::Error) -> bool {
    let missing = err
        .io_error()
        .is_some_and(|source| source.kind() == std::io::ErrorKind::NotFound);
    missing
        && err
            .path()
            .and_then(|path| path.symlink_metadata().ok())
            .is_some_and(|metadata| metadata.file_type().is_symlink())
}
