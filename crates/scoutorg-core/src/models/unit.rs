use serde::{Deserialize, Serialize};

use crate::store::Indexed;

/// A troop (Scoutnet "unit"). Membership is derived from the member records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Troop {
    pub id: i64,
    pub name: String,
    pub member_ids: Vec<i64>,
    /// Set when the branch table assigns this troop to a branch
    pub branch_id: Option<i64>,
}

impl Troop {
    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    pub fn has_member(&self, member_id: i64) -> bool {
        self.member_ids.contains(&member_id)
    }
}

impl Indexed for Troop {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_name(&self) -> &str {
        &self.name
    }
}

/// A named partition of troops, defined by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub troop_ids: Vec<i64>,
}

impl Branch {
    pub fn has_troop(&self, troop_id: i64) -> bool {
        self.troop_ids.contains(&troop_id)
    }
}

impl Indexed for Branch {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_name(&self) -> &str {
        &self.name
    }
}

/// Members holding the same group-level role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGroup {
    pub id: i64,
    pub role_name: String,
    pub member_ids: Vec<i64>,
}

impl Indexed for RoleGroup {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_name(&self) -> &str {
        &self.role_name
    }
}
