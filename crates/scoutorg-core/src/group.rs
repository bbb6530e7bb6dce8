//! The scout group aggregate.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::models::{Branch, CustomList, Member, RoleGroup, Troop};
use crate::store::{IndexBy, IndexSnapshot, MultiIndex};

/// Capability for reaching custom lists, which the organization owns.
///
/// The group is handed this at construction instead of a reference to its
/// owner, so the group never depends on the organization type.
pub trait CustomListSource: Send + Sync {
    fn custom_lists(&self, group_id: i64, by: IndexBy) -> IndexSnapshot<CustomList>;
}

/// Source with no custom lists at all
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCustomLists;

impl CustomListSource for NoCustomLists {
    fn custom_lists(&self, _group_id: i64, by: IndexBy) -> IndexSnapshot<CustomList> {
        MultiIndex::default().all(by)
    }
}

/// One scout group with its members, troops, branches and role groups.
///
/// Built once by `GroupFactory` and immutable afterwards; every accessor
/// hands out copies.
pub struct ScoutGroup {
    id: i64,
    name: Option<String>,
    members: MultiIndex<Member>,
    troops: MultiIndex<Troop>,
    branches: MultiIndex<Branch>,
    role_groups: MultiIndex<RoleGroup>,
    custom_lists: Arc<dyn CustomListSource>,
}

impl ScoutGroup {
    pub(crate) fn new(
        id: i64,
        name: Option<String>,
        members: MultiIndex<Member>,
        troops: MultiIndex<Troop>,
        branches: MultiIndex<Branch>,
        role_groups: MultiIndex<RoleGroup>,
        custom_lists: Arc<dyn CustomListSource>,
    ) -> Self {
        Self {
            id,
            name,
            members,
            troops,
            branches,
            role_groups,
            custom_lists,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Group name as reported by the provider
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // ===== Members =====

    /// Members indexed by id
    pub fn members(&self) -> BTreeMap<i64, Arc<Member>> {
        self.members.all_by_id()
    }

    pub fn member(&self, id: i64) -> Option<Arc<Member>> {
        self.members.get(id)
    }

    pub fn member_by_name(&self, full_name: &str) -> Option<Arc<Member>> {
        self.members.get_by_name(full_name)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    // ===== Troops =====

    pub fn troops(&self, by: IndexBy) -> IndexSnapshot<Troop> {
        self.troops.all(by)
    }

    pub fn troop(&self, id: i64) -> Option<Arc<Troop>> {
        self.troops.get(id)
    }

    pub fn troop_by_name(&self, name: &str) -> Option<Arc<Troop>> {
        self.troops.get_by_name(name)
    }

    /// Troops that no branch claims, in provider order
    pub fn unassigned_troops(&self) -> Vec<Arc<Troop>> {
        self.troops
            .iter()
            .filter(|t| t.branch_id.is_none())
            .cloned()
            .collect()
    }

    pub fn troop_members(&self, troop_id: i64) -> Vec<Arc<Member>> {
        self.troops
            .get(troop_id)
            .map(|troop| self.resolve_members(&troop.member_ids))
            .unwrap_or_default()
    }

    // ===== Branches =====

    pub fn branches(&self, by: IndexBy) -> IndexSnapshot<Branch> {
        self.branches.all(by)
    }

    pub fn branch(&self, id: i64) -> Option<Arc<Branch>> {
        self.branches.get(id)
    }

    pub fn branch_by_name(&self, name: &str) -> Option<Arc<Branch>> {
        self.branches.get_by_name(name)
    }

    /// Troops of a branch in the order the branch table lists them
    pub fn branch_troops(&self, branch_id: i64) -> Vec<Arc<Troop>> {
        self.branches
            .get(branch_id)
            .map(|branch| {
                branch
                    .troop_ids
                    .iter()
                    .filter_map(|&id| self.troops.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ===== Role groups =====

    pub fn role_groups(&self, by: IndexBy) -> IndexSnapshot<RoleGroup> {
        self.role_groups.all(by)
    }

    pub fn role_group(&self, id: i64) -> Option<Arc<RoleGroup>> {
        self.role_groups.get(id)
    }

    pub fn role_group_by_name(&self, role_name: &str) -> Option<Arc<RoleGroup>> {
        self.role_groups.get_by_name(role_name)
    }

    pub fn role_group_members(&self, role_group_id: i64) -> Vec<Arc<Member>> {
        self.role_groups
            .get(role_group_id)
            .map(|role| self.resolve_members(&role.member_ids))
            .unwrap_or_default()
    }

    // ===== Custom lists =====

    /// Custom lists indexed by id (`true`) or title (`false`).
    #[deprecated(note = "custom lists are owned by the organization; use ScoutOrg::custom_lists")]
    pub fn custom_lists(&self, id_indexed: bool) -> IndexSnapshot<CustomList> {
        self.custom_lists
            .custom_lists(self.id, IndexBy::from_id_flag(id_indexed))
    }

    fn resolve_members(&self, ids: &[i64]) -> Vec<Arc<Member>> {
        ids.iter().filter_map(|&id| self.members.get(id)).collect()
    }
}

impl fmt::Debug for ScoutGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoutGroup")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("members", &self.members.len())
            .field("troops", &self.troops.len())
            .field("branches", &self.branches.len())
            .field("role_groups", &self.role_groups.len())
            .finish()
    }
}
