use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,          // Display name, never empty
    #[serde(default)]
    pub description: String,
    pub command: String,       // Shown and copied verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,  // Icon name/path
}

impl Entry {
    pub fn new(name: impl Into<String>, description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            command: command.into(),
            icon: None,
        }
    }
}

/// Immutable, ordered list of servers shown by the registry.
///
/// Clones share storage, so handing a catalog to another session or thread
/// never copies the entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Arc<[Entry]>,
}

impl Catalog {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries: entries.into() }
    }

    /// All entries in insertion order.
    pub fn get_all(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_all_keeps_insertion_order() {
        let catalog = Catalog::new(vec![
            Entry::new("B", "second letter", "b"),
            Entry::new("A", "first letter", "a"),
        ]);
        let names: Vec<&str> = catalog.get_all().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_clones_share_entries() {
        let catalog = Catalog::new(vec![Entry::new("A", "", "a")]);
        let other = catalog.clone();
        assert!(std::ptr::eq(catalog.get_all().as_ptr(), other.get_all().as_ptr()));
    }

    #[test]
    fn test_default_is_empty() {
        let catalog = Catalog::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert!(catalog.get(0).is_none());
    }
}
