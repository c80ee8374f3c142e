//! Identifier-keyed, insertion-ordered record sets.
//!
//! Every fetched record carries an externally assigned id that never
//! changes, so membership by id gives the same answer as comparing whole
//! records, in constant time.

use std::collections::HashSet;

use harvest_types::Keyed;

/// Records in first-seen order, at most one per id.
#[derive(Debug, Clone)]
pub struct RecordSet<T: Keyed> {
    items: Vec<T>,
    keys: HashSet<T::Key>,
}

impl<T: Keyed> Default for RecordSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            keys: HashSet::new(),
        }
    }
}

impl<T: Keyed> RecordSet<T> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` unless a record with the same id is present.
    ///
    /// Returns `true` when the record was added.
    pub fn insert(&mut self, item: T) -> bool {
        if !self.keys.insert(item.key()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Whether a record with `key` is present.
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.keys.contains(key)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records in insertion order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Ids in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = T::Key> + '_ {
        self.items.iter().map(Keyed::key)
    }
}

impl<T: Keyed> Extend<T> for RecordSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use harvest_types::{Comment, CommentId, Owner, PostId};

    use super::*;

    fn comment(id: i64, body: &str) -> Comment {
        Comment {
            comment_id: CommentId(id),
            edited: false,
            post_id: PostId(1),
            body: body.to_owned(),
            creation_date: chrono::DateTime::UNIX_EPOCH,
            score: 0,
            content_license: None,
            owner: Owner::default(),
        }
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let mut set = RecordSet::new();
        assert!(set.insert(comment(1, "a")));
        assert!(set.insert(comment(2, "b")));
        assert!(!set.insert(comment(1, "a")));
        assert_eq!(set.len(), 2);
        assert!(set.contains_key(&CommentId(2)));
    }

    #[test]
    fn first_seen_order_is_kept() {
        let mut set = RecordSet::new();
        set.extend([comment(3, "c"), comment(1, "a"), comment(3, "c"), comment(2, "b")]);
        let ids: Vec<_> = set.keys().collect();
        assert_eq!(ids, vec![CommentId(3), CommentId(1), CommentId(2)]);
        assert_eq!(set.as_slice().len(), 3);
    }
}
