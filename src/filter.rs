use crate::model::Entry;

/// Case-insensitive substring matcher over an entry's name and description.
///
/// The query is lowered once up front. Whitespace is kept as typed, so a
/// trailing space only matches text that has a space in the same place.
pub struct QueryMatcher {
    needle: String,
}

impl QueryMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.to_lowercase(),
        }
    }

    // The command is never searched.
    pub fn matches(&self, entry: &Entry) -> bool {
        entry.name.to_lowercase().contains(&self.needle)
            || entry.description.to_lowercase().contains(&self.needle)
    }
}

/// Positions of the entries matching `query`, in catalog order.
pub fn filter_indices(entries: &[Entry], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..entries.len()).collect();
    }

    let matcher = QueryMatcher::new(query);
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| matcher.matches(e))
        .map(|(i, _)| i)
        .collect()
}

/// The matching entries themselves, as a fresh list.
pub fn filter(entries: &[Entry], query: &str) -> Vec<Entry> {
    if query.is_empty() {
        return entries.to_vec();
    }

    let matcher = QueryMatcher::new(query);
    entries.iter().filter(|e| matcher.matches(e)).cloned().collect()
}
