//! Visual column order, independent of how records store their fields.

use std::rc::Rc;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct ColumnOrder {
    keys: Vec<Rc<str>>,
    index: FxHashMap<Rc<str>, usize>,
}

impl ColumnOrder {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order = Self::default();
        order.set(keys);
        order
    }

    /// Replace the order and rebuild the lookup. Duplicate keys keep their
    /// first position. Returns true when the order changed.
    pub fn set<I, S>(&mut self, keys: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next: Vec<Rc<str>> = Vec::new();
        let mut index = FxHashMap::default();
        for key in keys {
            let key: Rc<str> = Rc::from(key.as_ref());
            if index.contains_key(&key) {
                continue;
            }
            index.insert(Rc::clone(&key), next.len());
            next.push(key);
        }
        if next == self.keys {
            return false;
        }
        self.keys = next;
        self.index = index;
        true
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn key_at(&self, index: usize) -> Option<&Rc<str>> {
        self.keys.get(index)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> &[Rc<str>] {
        &self.keys
    }

    pub fn first(&self) -> Option<&Rc<str>> {
        self.keys.first()
    }

    pub fn last(&self) -> Option<&Rc<str>> {
        self.keys.last()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Columns between `a` and `b` inclusive, in visual order regardless of
    /// which one comes first. `None` if either key is unknown.
    pub fn span(&self, a: &str, b: &str) -> Option<&[Rc<str>]> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        self.keys.get(a.min(b)..=a.max(b))
    }

    /// The key `delta` positions away from `key`, clamped to the ends.
    pub fn step(&self, key: &str, delta: isize) -> Option<&Rc<str>> {
        let current = self.index_of(key)?;
        let last = self.keys.len().checked_sub(1)?;
        let target = current.saturating_add_signed(delta).min(last);
        self.keys.get(target)
    }
}
