//! Dense indexing of billable entities (actors, locations).
//!
//! External string ids are mapped once to `u32` indices; the day rate of each
//! entity is stored alongside so hot loops read two vectors and never hash.

use rustc_hash::FxHashMap;

/// Index of an actor or location inside its registry.
pub type EntityIdx = u32;

/// Ids and day rates of one kind of entity, addressed by [`EntityIdx`].
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    index: FxHashMap<String, EntityIdx>,
    ids: Vec<String>,
    rates: Vec<f64>,
}

impl EntityRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ids: Vec::with_capacity(capacity),
            rates: Vec::with_capacity(capacity),
        }
    }

    /// Register a declared entity. Returns `None` if the id is already known,
    /// leaving the first registration untouched.
    pub fn register(&mut self, id: &str, rate: f64) -> Option<EntityIdx> {
        if self.index.contains_key(id) {
            return None;
        }
        Some(self.push(id, rate))
    }

    /// Index of `id`, registering it at rate 0 when it was never declared.
    ///
    /// The flag is true when the entity had to be added.
    pub fn resolve_or_add(&mut self, id: &str) -> (EntityIdx, bool) {
        match self.index.get(id) {
            Some(&idx) => (idx, false),
            None => (self.push(id, 0.0), true),
        }
    }

    fn push(&mut self, id: &str, rate: f64) -> EntityIdx {
        let idx = self.ids.len() as EntityIdx;
        self.ids.push(id.to_string());
        self.rates.push(rate);
        self.index.insert(id.to_string(), idx);
        idx
    }

    #[inline]
    pub fn lookup(&self, id: &str) -> Option<EntityIdx> {
        self.index.get(id).copied()
    }

    #[inline]
    pub fn id(&self, idx: EntityIdx) -> Option<&str> {
        self.ids.get(idx as usize).map(|s| s.as_str())
    }

    /// Day rate, 0 for an index outside the registry.
    #[inline]
    pub fn rate(&self, idx: EntityIdx) -> f64 {
        self.rates.get(idx as usize).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(|s| s.as_str())
    }
}
