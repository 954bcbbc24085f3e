use std::collections::HashSet;

/// Titles of a Plex collection whose members must never be deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtectedSet {
    collection: Option<String>,
    titles: HashSet<String>,
}

impl ProtectedSet {
    /// No collection configured, nothing is protected.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I, S>(collection: impl Into<String>, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collection: Some(collection.into()),
            titles: titles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_exact() {
        let set = ProtectedSet::new("Keepers", ["Beta", "Beta", "The Gamma"]);
        assert_eq!(set.collection(), Some("Keepers"));
        assert_eq!(set.len(), 2);
        assert!(set.contains("Beta"));
        assert!(!set.contains("beta"));
        assert!(!set.contains("Gamma"));
    }

    #[test]
    fn test_empty_set() {
        let set = ProtectedSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.collection(), None);
        assert!(!set.contains(""));
    }
}
