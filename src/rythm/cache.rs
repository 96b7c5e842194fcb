//! Memoization of derived rythms for one verification run.

use super::{derive, Direction, Ratio, Rythm};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type Key = (u32, u32, Direction);

/// A compute-once-insert-once-read-many store of derived rythms, owned by a
/// single verification run and shared across concurrently checked modules.
///
/// Concurrent first computation of the same key is allowed: derivation is a
/// pure function of the key, so a lost insert race only wastes the duplicate
/// work. Readers only ever observe fully built values.
#[derive(Debug, Default)]
pub struct RythmCache {
    inner: RwLock<HashMap<Key, Arc<Rythm>>>,
}

impl RythmCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached rythm for `(ratio, direction)`, deriving it on
    /// first access. The ratio is reduced before keying, so `4:2` and `2:1`
    /// share an entry.
    pub fn get_or_derive(&self, ratio: Ratio, direction: Direction) -> Arc<Rythm> {
        let ratio = Ratio::new(ratio.p, ratio.q);
        let key = (ratio.p, ratio.q, direction);

        if let Some(hit) = self.inner.read().expect("rythm cache poisoned").get(&key) {
            return Arc::clone(hit);
        }

        // Derive outside the write lock; first insert wins.
        let fresh = Arc::new(derive(ratio, direction));
        let mut map = self.inner.write().expect("rythm cache poisoned");
        Arc::clone(map.entry(key).or_insert(fresh))
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("rythm cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
