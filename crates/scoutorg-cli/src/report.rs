//! Plain-text reports for the terminal.

use std::fmt::Write;

use scoutorg_core::models::{CustomList, WaitingList};
use scoutorg_core::{IndexBy, IndexSnapshot, ScoutGroup};

pub fn group_summary(group: &ScoutGroup) -> String {
    let mut out = String::new();
    let name = group.name().unwrap_or("(unnamed group)");
    let _ = writeln!(out, "{} [{}] - {} members", name, group.id(), group.member_count());

    for branch in group.branches(IndexBy::Name).values() {
        let _ = writeln!(out, "\n{}", branch.name);
        for troop in group.branch_troops(branch.id) {
            let _ = writeln!(out, "  {:<30} {:>4} members", troop.name, troop.member_count());
        }
    }

    let unassigned = group.unassigned_troops();
    if !unassigned.is_empty() {
        let _ = writeln!(out, "\nWithout branch");
        for troop in unassigned {
            let _ = writeln!(out, "  {:<30} {:>4} members", troop.name, troop.member_count());
        }
    }

    let roles = group.role_groups(IndexBy::Name);
    if !roles.is_empty() {
        let _ = writeln!(out, "\nRoles");
        for role in roles.values() {
            let holders: Vec<String> = group
                .role_group_members(role.id)
                .iter()
                .map(|m| m.full_name().to_string())
                .collect();
            let _ = writeln!(out, "  {:<30} {}", role.role_name, holders.join(", "));
        }
    }
    out
}

pub fn waiting_list(waiting: &WaitingList) -> String {
    let mut out = format!("\nWaiting list ({})\n", waiting.len());
    for entry in waiting.iter() {
        let since = entry
            .waiting_since
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "  {:<30} since {}", entry.member.display_name(), since);
    }
    out
}

pub fn custom_lists(lists: &IndexSnapshot<CustomList>) -> String {
    let mut out = format!("\nCustom lists ({})\n", lists.len());
    for list in lists.values() {
        let _ = writeln!(out, "  [{}] {:<30} {:>4} members", list.id, list.title, list.member_ids.len());
    }
    out
}
