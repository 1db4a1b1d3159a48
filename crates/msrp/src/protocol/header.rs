//! Ordered, case-insensitive header field storage.
//!
//! Every message owns exactly one [`FieldMap`]; it is never shared between
//! messages. Lookups are case-insensitive while the display spelling of a
//! field name is the one first seen on the wire. Distinct names iterate in
//! insertion order, which keeps re-serialization and logging deterministic.
//! The order contract is implemented with an explicit entry list plus a
//! normalized-name index, since a plain associative container would not
//! preserve it.

use std::collections::HashMap;

const EMPTY_VALUES: &[String] = &[];

/// An insertion-ordered multimap from field name to field values.
///
/// ```
/// use micro_msrp::protocol::FieldMap;
///
/// let mut fields = FieldMap::new();
/// fields.append("To-Path", "msrp://a/1,tcp");
/// fields.append("to-path", "msrp://b/2,tcp");
///
/// assert_eq!(fields.get("TO-PATH"), Some("msrp://a/1,tcp"));
/// assert_eq!(fields.get_all("To-Path").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<FieldEntry>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldEntry {
    name: String,
    values: Vec<String>,
}

impl FieldMap {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the value list of `name`, creating the entry if the
    /// name was never seen before.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let normalized = name.to_ascii_lowercase();
        match self.index.get(&normalized) {
            Some(&at) => self.entries[at].values.push(value.into()),
            None => {
                self.index.insert(normalized, self.entries.len());
                self.entries.push(FieldEntry { name, values: vec![value.into()] });
            }
        }
    }

    /// Returns the first value recorded for `name`, or `None` if the name was
    /// never set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|entry| entry.values.first()).map(String::as_str)
    }

    /// Returns every value recorded for `name` in encounter order. Absent
    /// names yield an empty slice.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entry(name).map_or(EMPTY_VALUES, |entry| entry.values.as_slice())
    }

    /// Returns true if at least one value was recorded for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Iterates over `(name, values)` pairs in original insertion order.
    ///
    /// The iterator is restartable; calling it again walks the same entries
    /// from the beginning.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Number of distinct field names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&FieldEntry> {
        let normalized = name.to_ascii_lowercase();
        self.index.get(&normalized).map(|&at| &self.entries[at])
    }
}
