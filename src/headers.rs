//! Header block codec
//!
//! Converts between the raw header text a tab persists (`Key: Value` per
//! line) and the ordered entries shown in the table view. The text is the
//! source of truth; entries are re-derived whenever the view switches.

use crate::models::HeaderEntry;

/// Parse a header block into ordered entries.
///
/// Splits each line on its first colon and trims both halves. A line with
/// no colon becomes a key with an empty value; blank lines are dropped.
/// Duplicate keys are kept in order.
pub fn parse(text: &str) -> Vec<HeaderEntry> {
    text.split('\n')
        .filter_map(|line| {
            let (key, value) = match line.split_once(':') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (line.trim(), ""),
            };
            if key.is_empty() && value.is_empty() {
                None
            } else {
                Some(HeaderEntry::new(key, value))
            }
        })
        .collect()
}

/// Render entries as a header block, one `key: value` per line, no trailing newline
pub fn serialize(entries: &[HeaderEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}: {}", entry.key, entry.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Insert an entry into a header block at `index` (clamped to the end)
pub fn insert(text: &str, index: usize, entry: HeaderEntry) -> String {
    let mut entries = parse(text);
    let index = index.min(entries.len());
    entries.insert(index, entry);
    serialize(&entries)
}

/// Remove the entry at `index`; out of range leaves the block unchanged
pub fn remove(text: &str, index: usize) -> String {
    let mut entries = parse(text);
    if index < entries.len() {
        entries.remove(index);
    }
    serialize(&entries)
}
