//! An observable list whose entries are unique by key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::watch;

type KeyFn<K, V> = dyn Fn(&V) -> K + Send + Sync;

/// An ordered list of values, unique by a key derived from each value.
///
/// Every change is published to subscribers. Cloning yields another handle
/// to the same list.
pub struct KeyedList<K, V> {
    inner: Arc<Inner<K, V>>,
}

struct Inner<K, V> {
    key_of: Box<KeyFn<K, V>>,
    tx: watch::Sender<Vec<V>>,
}

impl<K, V> Clone for KeyedList<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> KeyedList<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(key_of: impl Fn(&V) -> K + Send + Sync + 'static) -> Self {
        Self::with_values(key_of, Vec::new())
    }

    pub fn with_values(key_of: impl Fn(&V) -> K + Send + Sync + 'static, values: Vec<V>) -> Self {
        let key_of: Box<KeyFn<K, V>> = Box::new(key_of);
        let values = dedup(&*key_of, values);
        let (tx, _) = watch::channel(values);
        Self {
            inner: Arc::new(Inner { key_of, tx }),
        }
    }

    pub fn key_of(&self, value: &V) -> K {
        (self.inner.key_of)(value)
    }

    /// Snapshot of the current values.
    pub fn value(&self) -> Vec<V> {
        self.inner.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tx.borrow().is_empty()
    }

    /// Replace all values. Later duplicates overwrite earlier ones in place.
    pub fn set(&self, values: Vec<V>) {
        let values = dedup(&*self.inner.key_of, values);
        self.inner.tx.send_replace(values);
    }

    pub fn clear(&self) {
        self.inner.tx.send_replace(Vec::new());
    }

    /// Transform the whole list at once; the result is deduplicated by key.
    pub fn mutate(&self, f: impl FnOnce(Vec<V>) -> Vec<V>) {
        let key_of = &*self.inner.key_of;
        self.inner.tx.send_modify(|list| {
            let current = std::mem::take(list);
            *list = dedup(key_of, f(current));
        });
    }

    /// Append values, replacing existing entries that share a key.
    pub fn append(&self, items: impl IntoIterator<Item = V>) {
        self.mutate(|mut list| {
            list.extend(items);
            list
        });
    }

    /// Insert or replace a single value. Returns true if the key was new.
    pub fn upsert(&self, item: V) -> bool {
        let key = self.key_of(&item);
        let mut inserted = false;
        let key_of = &*self.inner.key_of;
        self.inner.tx.send_modify(|list| {
            match list.iter().position(|v| key_of(v) == key) {
                Some(i) => list[i] = item,
                None => {
                    list.push(item);
                    inserted = true;
                }
            }
        });
        inserted
    }

    /// Modify the value for `key` in place. `f` returns whether it changed
    /// anything; subscribers are only notified if it did.
    ///
    /// Returns `None` when no value has the key, else what `f` returned.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V) -> bool) -> Option<bool> {
        let mut outcome = None;
        let key_of = &*self.inner.key_of;
        self.inner.tx.send_if_modified(|list| {
            let changed = list
                .iter_mut()
                .find(|v| key_of(v) == *key)
                .map(f);
            outcome = changed;
            changed.unwrap_or(false)
        });
        outcome
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut removed = None;
        let key_of = &*self.inner.key_of;
        self.inner.tx.send_if_modified(|list| {
            match list.iter().position(|v| key_of(v) == *key) {
                Some(i) => {
                    removed = Some(list.remove(i));
                    true
                }
                None => false,
            }
        });
        removed
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.find(|v| self.key_of(v) == *key)
    }

    pub fn find(&self, predicate: impl Fn(&V) -> bool) -> Option<V> {
        self.inner.tx.borrow().iter().find(|v| predicate(v)).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<V>> {
        self.inner.tx.subscribe()
    }
}

fn dedup<K: Eq + Hash, V>(key_of: &KeyFn<K, V>, values: Vec<V>) -> Vec<V> {
    let mut index: HashMap<K, usize> = HashMap::with_capacity(values.len());
    let mut out: Vec<V> = Vec::with_capacity(values.len());
    for value in values {
        let key = key_of(&value);
        match index.get(&key) {
            Some(&i) => out[i] = value,
            None => {
                index.insert(key, out.len());
                out.push(value);
            }
        }
    }
    out
}
