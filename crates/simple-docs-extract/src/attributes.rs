//! Metadata embedded at the head of a Markdown file.
//!
//! Each attribute is a reference-style comment that renders to nothing:
//!
//! ```text
//! [//]: # ([title]Getting started)
//! [//]: # ([order]3)
//! ```
//!
//! Attributes form one contiguous block. The first line that is not such a
//! comment ends the block.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::line::NonEmptyLines;
use crate::normalize::MARKDOWN_EXTENSION;

/// Ordered attribute mapping. Insertion order is preserved and the first value
/// recorded for a name is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name = value` unless `name` is already present. Returns whether
    /// the value was stored.
    pub fn insert_first(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert_first(name, value);
        }
        attributes
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttributesVisitor;

        impl<'de> Visitor<'de> for AttributesVisitor {
            type Value = Attributes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Attributes, A::Error> {
                let mut attributes = Attributes::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    attributes.insert_first(name, value);
                }
                Ok(attributes)
            }

            // Older indexes serialised an empty attribute set as `[]`.
            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Attributes, A::Error> {
                if access.next_element::<serde::de::IgnoredAny>()?.is_some() {
                    return Err(serde::de::Error::custom(
                        "attribute lists must be empty; use a map for attributes",
                    ));
                }
                Ok(Attributes::new())
            }
        }

        deserializer.deserialize_any(AttributesVisitor)
    }
}

fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\[//\]:\s#\s\((.*)\)$").expect("valid comment regex"))
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\[(.*)\](.*)$").expect("valid attribute regex"))
}

/// Extract the attribute block at the head of the file at `path`.
///
/// Paths that do not end in `.md` or do not exist yield an empty mapping.
pub fn parse_attributes(path: &Path) -> io::Result<Attributes> {
    let is_markdown = path
        .to_str()
        .is_some_and(|p| p.ends_with(MARKDOWN_EXTENSION));
    if !is_markdown || !path.is_file() {
        return Ok(Attributes::new());
    }

    let file = File::open(path)?;
    scan(BufReader::new(file))
}

/// Extract the attribute block from in-memory Markdown.
pub fn parse_attributes_str(contents: &str) -> Attributes {
    scan(Cursor::new(contents.as_bytes())).unwrap_or_default()
}

fn scan<R: BufRead>(reader: R) -> io::Result<Attributes> {
    let mut attributes = Attributes::new();

    for line in NonEmptyLines::new(reader) {
        let line = line?;
        let Some(comment) = comment_pattern().captures(&line) else {
            break;
        };

        let inner = comment.get(1).map_or("", |m| m.as_str());
        if let Some(attribute) = attribute_pattern().captures(inner) {
            let name = attribute.get(1).map_or("", |m| m.as_str()).trim();
            let value = attribute.get(2).map_or("", |m| m.as_str()).trim();
            attributes.insert_first(name, value);
        }
    }

    Ok(attributes)
}
