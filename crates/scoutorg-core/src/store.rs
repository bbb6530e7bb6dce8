//! Multi-index entity store.
//!
//! `MultiIndex<T>` holds one set of entities addressable both by numeric id
//! and by name. It is the container behind every collection on a
//! `ScoutGroup` (members, troops, branches, role groups), as well as custom
//! lists and waiting lists.
//!
//! Invariant: every entity reachable by name is reachable by id. When two
//! entities share a name, the one inserted last owns the name key and the
//! earlier one stays reachable by its id only.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

/// An entity with an id key and a name key.
pub trait Indexed {
    fn id(&self) -> i64;

    /// The key this entity is filed under in the name index
    fn index_name(&self) -> &str;
}

/// Which index a snapshot is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexBy {
    Id,
    Name,
}

impl IndexBy {
    /// Map the legacy `id_indexed` flag onto an index
    pub fn from_id_flag(id_indexed: bool) -> Self {
        if id_indexed {
            IndexBy::Id
        } else {
            IndexBy::Name
        }
    }
}

/// An owned copy of one index. Changing it never affects the store.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSnapshot<T> {
    ById(BTreeMap<i64, Arc<T>>),
    ByName(BTreeMap<String, Arc<T>>),
}

impl<T> IndexSnapshot<T> {
    pub fn len(&self) -> usize {
        match self {
            IndexSnapshot::ById(map) => map.len(),
            IndexSnapshot::ByName(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The entities in key order
    pub fn values(&self) -> Vec<Arc<T>> {
        match self {
            IndexSnapshot::ById(map) => map.values().cloned().collect(),
            IndexSnapshot::ByName(map) => map.values().cloned().collect(),
        }
    }
}

impl<T> Default for IndexSnapshot<T> {
    fn default() -> Self {
        IndexSnapshot::ById(BTreeMap::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiIndex<T> {
    by_id: BTreeMap<i64, Arc<T>>,
    by_name: BTreeMap<String, Arc<T>>,
    /// Ids in first-insert order
    order: Vec<i64>,
}

impl<T> Default for MultiIndex<T> {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_name: BTreeMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Indexed> MultiIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity under its id and its name, returning the shared handle.
    pub fn insert(&mut self, entity: T) -> Arc<T> {
        let entity = Arc::new(entity);
        self.insert_arc(Arc::clone(&entity));
        entity
    }

    pub fn insert_arc(&mut self, entity: Arc<T>) {
        let id = entity.id();

        match self.by_id.insert(id, Arc::clone(&entity)) {
            Some(previous) => {
                // The replaced entity must not stay reachable by name alone
                let previous_name = previous.index_name();
                if self
                    .by_name
                    .get(previous_name)
                    .is_some_and(|current| Arc::ptr_eq(current, &previous))
                {
                    self.by_name.remove(previous_name);
                }
            }
            None => self.order.push(id),
        }

        let name = entity.index_name().to_string();
        if let Some(displaced) = self.by_name.insert(name, entity) {
            if displaced.id() != id {
                trace!(
                    name = displaced.index_name(),
                    displaced_id = displaced.id(),
                    id,
                    "Name collision, last insert wins the name key"
                );
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<Arc<T>> {
        self.by_id.get(&id).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<T>> {
        self.by_name.get(name).cloned()
    }
}

impl<T> MultiIndex<T> {
    /// Number of distinct entities (by id)
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Snapshot of the requested index
    pub fn all(&self, by: IndexBy) -> IndexSnapshot<T> {
        match by {
            IndexBy::Id => IndexSnapshot::ById(self.all_by_id()),
            IndexBy::Name => IndexSnapshot::ByName(self.all_by_name()),
        }
    }

    pub fn all_by_id(&self) -> BTreeMap<i64, Arc<T>> {
        self.by_id.clone()
    }

    pub fn all_by_name(&self) -> BTreeMap<String, Arc<T>> {
        self.by_name.clone()
    }

    /// Entities in the order they were first inserted
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

impl<T: Indexed> FromIterator<T> for MultiIndex<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut store = Self::new();
        for entity in iter {
            store.insert(entity);
        }
        store
    }
}
