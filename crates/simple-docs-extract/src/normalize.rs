//! Logical document names.
//!
//! Files on disk may carry a three-digit ordinal prefix (`010_intro.md`) purely
//! to control listing order. The logical name drops those prefixes from every
//! segment along with the `.md` extension of the final segment.

pub const MARKDOWN_EXTENSION: &str = ".md";

/// True when `segment` starts with exactly three ASCII digits and an underscore.
pub fn has_ordinal_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b'_'
}

/// Strip the ordinal prefix from a single segment, if present.
pub fn normalize_segment(segment: &str) -> &str {
    if has_ordinal_prefix(segment) {
        &segment[4..]
    } else {
        segment
    }
}

/// Map raw path segments (directories followed by the file name) to a logical
/// document name.
pub fn normalize_name<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let segments: Vec<&str> = segments
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect();

    let last = segments.len().saturating_sub(1);
    let normalized: Vec<&str> = segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| {
            let segment = normalize_segment(segment);
            if idx == last {
                segment.strip_suffix(MARKDOWN_EXTENSION).unwrap_or(segment)
            } else {
                segment
            }
        })
        .collect();

    normalized.join("/").trim_matches('/').to_owned()
}
