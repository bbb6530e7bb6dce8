use std::collections::HashMap;

use tracing::debug;

use crate::error::{OrgError, OrgResult};
use crate::models::CustomList;
use crate::provider::raw::parse_id_value;
use crate::provider::{CustomListsResponse, MemberListResponse, RawCustomList};
use crate::store::MultiIndex;

use super::parse::parse_member_id;

fn list_record(key: &str) -> String {
    format!("custom list {}", key)
}

fn list_id(key: &str, raw: &RawCustomList) -> OrgResult<i64> {
    match raw.id.as_ref() {
        Some(value) => parse_id_value(value)
            .ok_or_else(|| OrgError::malformed(list_record(key), format!("id is not a number: {}", value))),
        None => key
            .trim()
            .parse()
            .map_err(|_| OrgError::malformed(list_record(key), "id is missing")),
    }
}

/// Builds the custom lists of a group from the list catalogue and the
/// member response of each list.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomListFactory;

impl CustomListFactory {
    pub fn new() -> Self {
        Self
    }

    /// Ids of every list in the catalogue, in provider order
    pub fn list_ids(&self, catalogue: &CustomListsResponse) -> OrgResult<Vec<i64>> {
        catalogue
            .lists
            .iter()
            .map(|(key, raw)| list_id(key, raw))
            .collect()
    }

    pub fn build(
        &self,
        catalogue: &CustomListsResponse,
        list_members: &HashMap<i64, MemberListResponse>,
    ) -> OrgResult<MultiIndex<CustomList>> {
        let mut lists = MultiIndex::new();
        for (key, raw) in &catalogue.lists {
            let id = list_id(key, raw)?;
            let title = raw
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| OrgError::malformed(list_record(key), "title is missing"))?
                .to_string();

            let member_ids = match list_members.get(&id) {
                Some(members) => members
                    .data
                    .iter()
                    .map(|(member_key, raw_member)| parse_member_id(member_key, raw_member))
                    .collect::<OrgResult<Vec<i64>>>()?,
                None => {
                    debug!(list_id = id, "No member response for custom list");
                    Vec::new()
                }
            };

            lists.insert(CustomList {
                id,
                title,
                description: raw.description.clone().filter(|d| !d.trim().is_empty()),
                member_ids,
            });
        }
        Ok(lists)
    }
}
