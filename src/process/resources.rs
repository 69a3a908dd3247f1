//! Allocated-node lists → resource identifier sets.

use crate::error::ResourceParseError;
use crate::schema::NodeListFormat;
use crate::table::ResourceSet;

/// Upper bound on the width of a single `a-b` entry.
const MAX_RANGE_SPAN: u32 = 1 << 20;

/// Parse a node-list cell such as `fg[007-010|012]` into `{7, 8, 9, 10, 12}`.
pub fn parse_node_list(raw: &str, format: &NodeListFormat) -> Result<ResourceSet, ResourceParseError> {
    let normalized = normalize_node_list(raw, format);
    parse_ranges(&normalized).map_err(|entry| ResourceParseError {
        entry,
        input: raw.to_string(),
    })
}

/// Strip framing, rewrite separators to spaces and drop leading zeroes from
/// every range endpoint: `fg[007-010|012]` → `7-10 12`.
pub fn normalize_node_list(raw: &str, format: &NodeListFormat) -> String {
    let unframed = raw.trim().trim_matches(|c: char| format.framing.contains(c));
    let separated: String = unframed
        .chars()
        .map(|c| if format.separators.contains(&c) { ' ' } else { c })
        .collect();
    strip_leading_zeroes(&separated)
}

fn strip_leading_zeroes(s: &str) -> String {
    s.split_whitespace()
        .map(|entry| {
            entry
                .split('-')
                .map(|part| match part.trim_start_matches('0') {
                    "" if !part.is_empty() => "0",
                    stripped => stripped,
                })
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand whitespace-separated `n` / `a-b` entries. On failure returns the
/// offending entry.
fn parse_ranges(s: &str) -> Result<ResourceSet, String> {
    let mut set = ResourceSet::new();
    for entry in s.split_whitespace() {
        let (first, last) = match entry.split_once('-') {
            Some((a, b)) => (parse_id(a), parse_id(b)),
            None => (parse_id(entry), parse_id(entry)),
        };
        match (first, last) {
            (Some(a), Some(b)) if a <= b && b - a < MAX_RANGE_SPAN => {
                for id in a..=b {
                    set.insert(id);
                }
            }
            _ => return Err(entry.to_string()),
        }
    }
    Ok(set)
}

fn parse_id(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaMapping;

    fn sacct() -> NodeListFormat {
        SchemaMapping::sacct_2022().node_list
    }

    fn ids(set: &ResourceSet) -> Vec<u32> {
        set.iter().collect()
    }

    #[test]
    fn test_bracketed_range() {
        let set = parse_node_list("fg[00-03]", &sacct()).unwrap();
        assert_eq!(ids(&set), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_pipe_separated_entries() {
        let set = parse_node_list("fg[007|010]", &sacct()).unwrap();
        assert_eq!(ids(&set), vec![7, 10]);
    }

    #[test]
    fn test_mixed_entries_collapse_duplicates() {
        let set = parse_node_list("fg[001-003|002|0100]", &sacct()).unwrap();
        assert_eq!(ids(&set), vec![1, 2, 3, 100]);
    }

    #[test]
    fn test_single_unbracketed_node() {
        let set = parse_node_list("fg042", &sacct()).unwrap();
        assert_eq!(ids(&set), vec![42]);
    }

    #[test]
    fn test_normalization_steps() {
        assert_eq!(normalize_node_list("fg[007-010|012]", &sacct()), "7-10 12");
        assert_eq!(normalize_node_list("sn[000]", &sacct()), "0");
    }

    #[test]
    fn test_empty_is_empty_set() {
        assert!(parse_node_list("", &sacct()).unwrap().is_empty());
        assert!(parse_node_list("fg[]", &sacct()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_entry_is_reported() {
        let err = parse_node_list("fg[001|0a2-005]", &sacct()).unwrap_err();
        assert_eq!(err.entry, "a2-5");
        assert_eq!(err.input, "fg[001|0a2-005]");

        let err = parse_node_list("fg[009-002]", &sacct()).unwrap_err();
        assert_eq!(err.entry, "9-2");

        assert!(parse_node_list("None assigned", &sacct()).is_err());
        assert!(parse_node_list("fg[1-2-3]", &sacct()).is_err());
    }

    #[test]
    fn test_oversized_range_is_rejected() {
        assert!(parse_node_list("0-4294967295", &NodeListFormat::default()).is_err());
    }
}
