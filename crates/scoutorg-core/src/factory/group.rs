use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::branch::BranchTable;
use crate::error::OrgResult;
use crate::group::{CustomListSource, ScoutGroup};
use crate::models::{Branch, RoleGroup, Troop};
use crate::provider::MemberListResponse;
use crate::store::MultiIndex;

use super::parse::{parse_member_record, ParsedMember};
use super::Drafts;

struct TroopDraft {
    id: i64,
    name: String,
    member_ids: Vec<i64>,
}

struct RoleDraft {
    id: i64,
    role_name: String,
    member_ids: Vec<i64>,
}

struct BranchDraft {
    id: i64,
    name: String,
    troop_ids: Vec<i64>,
}

fn add_unique(ids: &mut Vec<i64>, id: i64) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

/// Builds a `ScoutGroup` from a provider member list and the branch table.
///
/// Construction is all-or-nothing: the group only exists once every record
/// has parsed.
#[derive(Debug, Clone)]
pub struct GroupFactory {
    branches: Arc<BranchTable>,
}

impl GroupFactory {
    pub fn new(branches: Arc<BranchTable>) -> Self {
        Self { branches }
    }

    pub fn build(
        &self,
        group_id: i64,
        raw: &MemberListResponse,
        custom_lists: Arc<dyn CustomListSource>,
    ) -> OrgResult<ScoutGroup> {
        let mut members = MultiIndex::new();
        let mut troops: Drafts<TroopDraft> = Drafts::default();
        let mut roles: Drafts<RoleDraft> = Drafts::default();

        // Members, collecting troop and role membership on the way
        for (key, raw_member) in &raw.data {
            let ParsedMember { member, troop, roles: member_roles } = parse_member_record(key, raw_member)?;

            if let Some((troop_id, troop_name)) = troop {
                let draft = troops.get_or_insert_with(troop_id, || TroopDraft {
                    id: troop_id,
                    name: troop_name,
                    member_ids: Vec::new(),
                });
                add_unique(&mut draft.member_ids, member.id);
            }

            for (role_id, role_name) in member_roles {
                let draft = roles.get_or_insert_with(role_id, || RoleDraft {
                    id: role_id,
                    role_name,
                    member_ids: Vec::new(),
                });
                add_unique(&mut draft.member_ids, member.id);
            }

            members.insert(member);
        }

        // Branches claim troops; the first branch listing a troop keeps it
        let mut claimed: HashMap<i64, i64> = HashMap::new();
        let mut branch_drafts: Drafts<BranchDraft> = Drafts::default();
        for config in self.branches.branches() {
            let draft = branch_drafts.get_or_insert_with(config.id, || BranchDraft {
                id: config.id,
                name: config.name.clone(),
                troop_ids: Vec::new(),
            });
            for &troop_id in &config.troops {
                if !troops.contains(troop_id) {
                    warn!(group_id, branch_id = config.id, troop_id, "Branch lists a troop the provider does not know");
                    continue;
                }
                match claimed.entry(troop_id) {
                    Entry::Occupied(owner) if *owner.get() != config.id => {
                        warn!(
                            group_id,
                            troop_id,
                            branch_id = config.id,
                            owner_branch_id = *owner.get(),
                            "Troop already assigned to another branch"
                        );
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(config.id);
                        add_unique(&mut draft.troop_ids, troop_id);
                    }
                }
            }
        }

        let troops: MultiIndex<Troop> = troops
            .into_values()
            .map(|draft| Troop {
                branch_id: claimed.get(&draft.id).copied(),
                id: draft.id,
                name: draft.name,
                member_ids: draft.member_ids,
            })
            .collect();

        let branches: MultiIndex<Branch> = branch_drafts
            .into_values()
            .map(|draft| Branch {
                id: draft.id,
                name: draft.name,
                troop_ids: draft.troop_ids,
            })
            .collect();

        let role_groups: MultiIndex<RoleGroup> = roles
            .into_values()
            .map(|draft| RoleGroup {
                id: draft.id,
                role_name: draft.role_name,
                member_ids: draft.member_ids,
            })
            .collect();

        debug!(
            group_id,
            members = members.len(),
            troops = troops.len(),
            branches = branches.len(),
            role_groups = role_groups.len(),
            "Built scout group"
        );

        let name = raw.group.as_ref().and_then(|g| g.name.clone());
        Ok(ScoutGroup::new(
            group_id,
            name,
            members,
            troops,
            branches,
            role_groups,
            custom_lists,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchConfig;
    use crate::error::OrgError;
    use crate::group::NoCustomLists;
    use crate::store::IndexBy;
    use crate::test_support::{member_list, raw_member, sample_member_list};

    fn factory(configs: Vec<BranchConfig>) -> GroupFactory {
        GroupFactory::new(Arc::new(BranchTable::new(configs)))
    }

    fn build(factory: &GroupFactory, raw: &MemberListResponse) -> OrgResult<ScoutGroup> {
        factory.build(5, raw, Arc::new(NoCustomLists))
    }

    fn troop_ids(troops: Vec<Arc<Troop>>) -> Vec<i64> {
        troops.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_branch_assignment() {
        let factory = factory(vec![
            BranchConfig::new(10, "A", vec![1, 2]),
            BranchConfig::new(20, "B", vec![3]),
        ]);
        let group = build(&factory, &sample_member_list()).unwrap();

        assert_eq!(troop_ids(group.branch_troops(10)), vec![1, 2]);
        assert_eq!(troop_ids(group.branch_troops(20)), vec![3]);
        assert_eq!(group.branch_by_name("A").unwrap().troop_ids, vec![1, 2]);

        let troop4 = group.troop(4).expect("troop 4 exists");
        assert_eq!(troop4.branch_id, None);
        assert_eq!(troop_ids(group.unassigned_troops()), vec![4]);
        assert_eq!(group.troop(1).unwrap().branch_id, Some(10));
        assert_eq!(group.troop(3).unwrap().branch_id, Some(20));
    }

    #[test]
    fn test_troop_claimed_once() {
        let factory = factory(vec![
            BranchConfig::new(10, "A", vec![1, 2]),
            BranchConfig::new(20, "B", vec![2, 3]),
        ]);
        let group = build(&factory, &sample_member_list()).unwrap();

        assert_eq!(group.branch(10).unwrap().troop_ids, vec![1, 2]);
        assert_eq!(group.branch(20).unwrap().troop_ids, vec![3]);
        assert_eq!(group.troop(2).unwrap().branch_id, Some(10));
    }

    #[test]
    fn test_unknown_troop_ids_are_skipped() {
        let factory = factory(vec![BranchConfig::new(10, "A", vec![1, 99])]);
        let group = build(&factory, &sample_member_list()).unwrap();
        assert_eq!(group.branch(10).unwrap().troop_ids, vec![1]);
        assert!(group.troop(99).is_none());
    }

    #[test]
    fn test_repeated_branch_id_is_merged() {
        let factory = factory(vec![
            BranchConfig::new(10, "A", vec![1]),
            BranchConfig::new(10, "A", vec![2]),
        ]);
        let group = build(&factory, &sample_member_list()).unwrap();
        assert_eq!(group.branches(IndexBy::Id).len(), 1);
        assert_eq!(group.branch(10).unwrap().troop_ids, vec![1, 2]);
    }

    #[test]
    fn test_members_troops_and_roles() {
        let group = build(&factory(Vec::new()), &sample_member_list()).unwrap();

        assert_eq!(group.id(), 5);
        assert_eq!(group.name(), Some("Testkåren"));
        assert_eq!(group.member_count(), 5);
        assert_eq!(group.member_by_name("Cia Lund").unwrap().id, 103);

        let beavers = group.troop_by_name("Bävrarna").unwrap();
        assert_eq!(beavers.member_ids, vec![101, 105]);
        let names: Vec<String> = group
            .troop_members(1)
            .iter()
            .map(|m| m.full_name().to_string())
            .collect();
        assert_eq!(names, vec!["Alva Berg", "Eva Berg"]);

        let leaders = group.role_group_by_name("Ledare").unwrap();
        assert_eq!(leaders.id, 50);
        assert_eq!(leaders.member_ids, vec![102, 104]);
        assert_eq!(group.role_group(51).unwrap().member_ids, vec![104]);
        assert_eq!(group.role_group_members(51)[0].id, 104);

        // No branch table: every troop is branch-less
        assert_eq!(group.unassigned_troops().len(), 4);
        assert!(group.branches(IndexBy::Name).is_empty());
    }

    #[test]
    fn test_same_troop_name_last_write_wins() {
        let raw = member_list(
            "Testkåren",
            vec![
                raw_member(1, "A", "A", Some((7, "Spårarna")), &[]),
                raw_member(2, "B", "B", Some((8, "Spårarna")), &[]),
            ],
        );
        let group = build(&factory(Vec::new()), &raw).unwrap();

        assert_eq!(group.troops(IndexBy::Id).len(), 2);
        assert_eq!(group.troops(IndexBy::Name).len(), 1);
        assert_eq!(group.troop_by_name("Spårarna").unwrap().id, 8);
        assert_eq!(group.troop(7).unwrap().name, "Spårarna");
    }

    #[test]
    fn test_malformed_member_fails_whole_build() {
        let mut raw = sample_member_list();
        let (key, mut broken) = raw_member(106, "Fia", "Gran", None, &[]);
        broken.first_name = None;
        raw.data.push((key, broken));

        match build(&factory(Vec::new()), &raw) {
            Err(OrgError::MalformedProviderData { record, .. }) => assert_eq!(record, "member 106"),
            other => panic!("expected malformed data error, got {other:?}"),
        }
    }

    #[test]
    fn test_same_payload_builds_equal_groups() {
        let factory = factory(vec![BranchConfig::new(10, "A", vec![1, 2])]);
        let raw = sample_member_list();
        let first = build(&factory, &raw).unwrap();
        let second = build(&factory, &raw).unwrap();

        assert_eq!(first.members(), second.members());
        assert_eq!(first.troops(IndexBy::Name), second.troops(IndexBy::Name));
        assert_eq!(first.branches(IndexBy::Id), second.branches(IndexBy::Id));
        assert_eq!(first.role_groups(IndexBy::Id), second.role_groups(IndexBy::Id));

        // Equal by value, distinct by identity
        let a = first.member(101).unwrap();
        let b = second.member(101).unwrap();
        assert_eq!(a, b);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    #[allow(deprecated)]
    fn test_custom_lists_go_through_source() {
        let group = build(&factory(Vec::new()), &sample_member_list()).unwrap();
        assert!(group.custom_lists(true).is_empty());
        assert!(group.custom_lists(false).is_empty());
    }
}
