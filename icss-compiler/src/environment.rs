/// Chronological `name -> value` table.
///
/// Entries are recorded in traversal order and never removed during a pass; lookups return
/// the most recent entry for a name regardless of which scope recorded it.
#[derive(Debug, Clone)]
pub struct Environment<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Environment<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Environment<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn record<S: Into<String>>(&mut self, name: S, value: T) {
        self.entries.push((name.into(), value));
    }

    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .rev()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .rev()
            .map(|(name, value)| (name.as_str(), value))
    }
}
