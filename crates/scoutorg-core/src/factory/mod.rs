//! Factories turning raw provider responses into domain aggregates.
//!
//! Each factory either returns a complete value or an
//! `OrgError::MalformedProviderData` naming the first bad record.

pub mod custom_list;
pub mod group;
pub(crate) mod parse;
pub mod waiting_list;

use std::collections::HashMap;

pub use custom_list::CustomListFactory;
pub use group::GroupFactory;
pub use waiting_list::WaitingListFactory;

/// Entities under construction, keyed by id, kept in first-seen order.
pub(crate) struct Drafts<T> {
    entries: Vec<T>,
    positions: HashMap<i64, usize>,
}

impl<T> Default for Drafts<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> Drafts<T> {
    pub(crate) fn get_or_insert_with(&mut self, id: i64, create: impl FnOnce() -> T) -> &mut T {
        let position = match self.positions.get(&id) {
            Some(&position) => position,
            None => {
                self.entries.push(create());
                self.positions.insert(id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position]
    }

    pub(crate) fn contains(&self, id: i64) -> bool {
        self.positions.contains_key(&id)
    }

    pub(crate) fn into_values(self) -> std::vec::IntoIter<T> {
        self.entries.into_iter()
    }
}
