//! User dictionary: words to keep verbatim and corrections to apply.
//!
//! Stored as a JSON array in `dictionary.json` next to `settings.toml`:
//!
//! ```json
//! [
//!   { "kind": "word", "input": "Tokio" },
//!   { "kind": "correction", "input": "get hub", "output": "GitHub" }
//! ]
//! ```
//!
//! The file is edited by hand (or by a settings UI); this crate only reads it.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// What a dictionary entry asks the router to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Keep `input` spelled exactly as written.
    Word,
    /// Replace `input` with `output`.
    Correction,
}

/// A single dictionary rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub kind: EntryKind,
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl DictionaryEntry {
    pub fn word(input: &str) -> Self {
        Self {
            kind: EntryKind::Word,
            input: input.to_string(),
            output: None,
        }
    }

    pub fn correction(input: &str, output: &str) -> Self {
        Self {
            kind: EntryKind::Correction,
            input: input.to_string(),
            output: Some(output.to_string()),
        }
    }
}

/// Read the dictionary file.
///
/// A missing file is an empty dictionary.  An unreadable or malformed file is
/// logged and treated as empty so a typo never blocks dictation.
pub fn load_dictionary(path: &Path) -> Vec<DictionaryEntry> {
    if !path.exists() {
        return Vec::new();
    }
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("context: cannot read {}: {e}", path.display());
            return Vec::new();
        }
    };
    serde_json::from_str(&data).unwrap_or_else(|e| {
        log::warn!("context: ignoring malformed {}: {e}", path.display());
        Vec::new()
    })
}

/// Read the free-text style examples; missing or unreadable means none.
pub fn load_style_examples(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load_dictionary(&dir.path().join("dictionary.json")).is_empty());
        assert_eq!(load_style_examples(&dir.path().join("style.txt")), "");
    }

    #[test]
    fn entries_load_from_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dictionary.json");
        std::fs::write(
            &path,
            r#"[
                {"kind":"word","input":"Tokio"},
                {"kind":"correction","input":"get hub","output":"GitHub"},
                {"kind":"correction","input":"orphan"}
            ]"#,
        )
        .unwrap();

        let entries = load_dictionary(&path);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], DictionaryEntry::word("Tokio"));
        assert_eq!(entries[1], DictionaryEntry::correction("get hub", "GitHub"));
        assert_eq!(entries[2].output, None);
    }

    #[test]
    fn malformed_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dictionary.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_dictionary(&path).is_empty());
    }

    #[test]
    fn style_examples_are_read_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("style.txt");
        std::fs::write(&path, "  lowercase, no full stops\n").unwrap();
        assert_eq!(load_style_examples(&path), "  lowercase, no full stops\n");
    }
}
