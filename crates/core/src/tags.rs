//! Free-form `name = value` tags attached to every entity.
//!
//! The editable [`TagList`] always ends in one blank entry, the "add
//! new" row. Error messages are derived: every edit recomputes them from
//! the entry and its siblings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::ERROR_BLANK_VALUE;

/// Shown when a tag has a value but no name.
pub const ERROR_TAG_NAME_BLANK: &str = "Tags name are case-insensitive.";
pub const ERROR_TAG_NAME_USED: &str = "The tag name is already used.";

/// A stored tag, as it appears inside the backend's `tag_list` JSON string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a server-side `tag_list` string. Blank or malformed input
    /// yields an empty list.
    pub fn parse_list(raw: &str) -> Vec<Tag> {
        if raw.is_empty() {
            return Vec::new();
        }
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unparseable tag_list, using empty list");
            Vec::new()
        })
    }
}

/// One row of the tag editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    pub name: String,
    pub value: String,
    /// Empty when the entry is valid.
    pub error_message: String,
}

impl TagEntry {
    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.value.is_empty()
    }
}

/// Which half of a tag entry an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagField {
    Name,
    Value,
}

/// Error message for one tag given the names of its siblings.
///
/// Returns an empty string when the tag is valid.
pub fn tag_error<'a>(name: &str, value: &str, mut siblings: impl Iterator<Item = &'a str>) -> &'static str {
    if name.is_empty() {
        return ERROR_TAG_NAME_BLANK;
    }
    if siblings.any(|s| s == name) {
        return ERROR_TAG_NAME_USED;
    }
    if value.is_empty() {
        return ERROR_BLANK_VALUE;
    }
    ""
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagList {
    entries: Vec<TagEntry>,
}

impl Default for TagList {
    fn default() -> Self {
        Self::new()
    }
}

impl TagList {
    pub fn new() -> Self {
        Self {
            entries: vec![TagEntry::default()],
        }
    }

    /// Build an editor list from stored tags (edit flows).
    pub fn hydrate(tags: &[Tag]) -> Self {
        let mut list = Self {
            entries: tags
                .iter()
                .map(|t| TagEntry {
                    name: t.name.clone(),
                    value: t.value.clone(),
                    error_message: String::new(),
                })
                .collect(),
        };
        list.normalize();
        list
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the trailing blank row is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_name(&mut self, index: usize, name: impl Into<String>) -> Result<(), CoreError> {
        self.edit(index, TagField::Name, name.into())
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> Result<(), CoreError> {
        self.edit(index, TagField::Value, value.into())
    }

    /// Update one half of the entry at `index`.
    ///
    /// Editing the trailing row turns it into a real entry and a fresh
    /// blank row is appended. A non-trailing entry cleared to blank is
    /// dropped.
    pub fn edit(&mut self, index: usize, field: TagField, text: String) -> Result<(), CoreError> {
        let entry = self.entries.get_mut(index).ok_or_else(|| {
            CoreError::Validation(format!("tag index {index} out of range"))
        })?;
        match field {
            TagField::Name => entry.name = text,
            TagField::Value => entry.value = text,
        }
        self.normalize();
        Ok(())
    }

    /// Delete the entry at `index`. The trailing blank row cannot be
    /// deleted; returns whether anything was removed.
    pub fn remove(&mut self, index: usize) -> bool {
        if index + 1 >= self.entries.len() {
            return false;
        }
        self.entries.remove(index);
        self.normalize();
        true
    }

    /// True when any real entry carries an error. A list holding only
    /// the blank row is never in error.
    pub fn has_error(&self) -> bool {
        self.entries.len() > 1 && self.entries.iter().any(|e| !e.error_message.is_empty())
    }

    pub fn first_error(&self) -> Option<&str> {
        self.entries
            .iter()
            .map(|e| e.error_message.as_str())
            .find(|m| !m.is_empty())
    }

    /// Entries with either half filled in, in editor order.
    pub fn filtered(&self) -> Vec<Tag> {
        self.entries
            .iter()
            .filter(|e| !e.is_blank())
            .map(|e| Tag::new(e.name.clone(), e.value.clone()))
            .collect()
    }

    /// The `tag_list` field of create/update payloads: a JSON string, or
    /// an empty string when there are no tags.
    pub fn to_payload(&self) -> String {
        let tags = self.filtered();
        if tags.is_empty() {
            return String::new();
        }
        serde_json::to_string(&tags).unwrap_or_default()
    }

    fn normalize(&mut self) {
        self.entries.retain(|e| !e.is_blank());
        self.entries.push(TagEntry::default());

        let names: Vec<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        let last = self.entries.len() - 1;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.error_message = if i == last {
                String::new()
            } else {
                let siblings = names
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i && *j != last)
                    .map(|(_, n)| n.as_str());
                tag_error(&entry.name, &entry.value, siblings).to_string()
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    // -- error messages --

    #[test]
    fn error_order_is_name_then_duplicate_then_value() {
        assert_eq!(tag_error("", "", std::iter::empty()), ERROR_TAG_NAME_BLANK);
        assert_eq!(tag_error("env", "", ["env"].into_iter()), ERROR_TAG_NAME_USED);
        assert_eq!(tag_error("env", "", std::iter::empty()), ERROR_BLANK_VALUE);
        assert_eq!(tag_error("env", "prod", ["Env"].into_iter()), "");
    }

    // -- editing --

    #[test]
    fn editing_trailing_row_appends_blank() {
        let mut list = TagList::new();
        list.set_name(0, "env").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.entries()[0].error_message, ERROR_BLANK_VALUE);
        assert!(list.entries()[1].is_blank());

        list.set_value(0, "prod").unwrap();
        assert_eq!(list.len(), 2);
        assert!(!list.has_error());
    }

    #[test]
    fn duplicate_names_flag_both_entries() {
        let mut list = TagList::hydrate(&[Tag::new("a", "1")]);
        list.set_name(1, "a").unwrap();
        list.set_value(1, "2").unwrap();

        assert_eq!(list.entries()[0].error_message, ERROR_TAG_NAME_USED);
        assert_eq!(list.entries()[1].error_message, ERROR_TAG_NAME_USED);

        list.set_name(1, "b").unwrap();
        assert!(!list.has_error());
    }

    #[test]
    fn trailing_row_cannot_be_removed() {
        let mut list = TagList::hydrate(&[Tag::new("a", "1")]);
        assert!(!list.remove(1));
        assert!(list.remove(0));
        assert_eq!(list.len(), 1);
        assert!(!list.remove(0));
    }

    #[test]
    fn out_of_range_edit_is_rejected() {
        let mut list = TagList::new();
        assert!(list.set_name(3, "x").is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn blank_only_list_is_not_in_error() {
        let list = TagList::new();
        assert!(!list.has_error());
        assert_eq!(list.to_payload(), "");
    }

    // -- payload --

    #[test]
    fn payload_drops_blank_rows() {
        let list = TagList::hydrate(&[Tag::new("a", "1"), Tag::new("b", "2")]);
        assert_eq!(
            list.to_payload(),
            r#"[{"name":"a","value":"1"},{"name":"b","value":"2"}]"#
        );
    }

    #[test]
    fn parse_list_is_defensive() {
        assert!(Tag::parse_list("").is_empty());
        assert!(Tag::parse_list("{not json").is_empty());
        assert_eq!(
            Tag::parse_list(r#"[{"name":"a","value":"1"}]"#),
            vec![Tag::new("a", "1")]
        );
    }

    // -- invariant under random edits --

    #[test]
    fn random_edits_keep_single_trailing_blank_and_flag_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        let words = ["", "a", "b", "c"];
        let mut list = TagList::new();

        for _ in 0..500 {
            let index = rng.random_range(0..list.len());
            let text = words[rng.random_range(0..words.len())];
            match rng.random_range(0..3) {
                0 => list.set_name(index, text).unwrap(),
                1 => list.set_value(index, text).unwrap(),
                _ => {
                    list.remove(index);
                }
            }

            let entries = list.entries();
            let blanks: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_blank())
                .map(|(i, _)| i)
                .collect();
            assert_eq!(blanks, vec![entries.len() - 1]);

            let mut valid_names: Vec<&str> = entries
                .iter()
                .filter(|e| !e.is_blank() && e.error_message.is_empty())
                .map(|e| e.name.as_str())
                .collect();
            let total = valid_names.len();
            valid_names.sort_unstable();
            valid_names.dedup();
            assert_eq!(valid_names.len(), total);
        }
    }
}
