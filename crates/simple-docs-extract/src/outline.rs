use pulldown_cmark::{Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;

/// Heading-delimited section of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub level: usize,
    pub title: String,
    pub anchor: String,
}

/// Collect every heading in document order.
pub fn collect_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for event in Parser::new_ext(markdown, Options::empty()) {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                current = Some((level as usize, String::new()));
            }
            Event::End(Tag::Heading(..)) => {
                if let Some((level, text)) = current.take() {
                    let title = collapse_whitespace(&text);
                    let anchor = generate_anchor(&title);
                    sections.push(Section {
                        level,
                        title,
                        anchor,
                    });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push(' ');
                }
            }
            _ => {}
        }
    }

    sections
}

/// The `title` attribute when declared, otherwise the first top-level heading.
pub fn resolve_title(attributes: &Attributes, sections: &[Section]) -> Option<String> {
    attributes
        .get("title")
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            sections
                .iter()
                .find(|section| section.level == 1)
                .map(|section| section.title.clone())
        })
}

/// Convert heading text into a stable anchor identifier.
pub fn generate_anchor(text: &str) -> String {
    let mut anchor = String::new();
    let mut last_was_dash = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            anchor.push(ch);
            last_was_dash = false;
        } else if (ch.is_whitespace() || ch == '-') && !anchor.is_empty() && !last_was_dash {
            anchor.push('-');
            last_was_dash = true;
        }
    }

    if anchor.ends_with('-') {
        anchor.pop();
    }

    anchor
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
