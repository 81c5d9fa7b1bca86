mod attributes;
mod line;
mod normalize;
mod outline;

pub use attributes::{parse_attributes, parse_attributes_str, Attributes};
pub use normalize::{has_ordinal_prefix, normalize_name, normalize_segment, MARKDOWN_EXTENSION};
pub use outline::{collect_sections, generate_anchor, resolve_title, Section};
