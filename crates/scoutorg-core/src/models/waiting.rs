use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::{Indexed, MultiIndex};

use super::Member;

/// A person waiting for a place in the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingMember {
    pub member: Member,
    pub waiting_since: Option<NaiveDate>,
}

impl Indexed for WaitingMember {
    fn id(&self) -> i64 {
        self.member.id
    }

    fn index_name(&self) -> &str {
        self.member.full_name()
    }
}

pub type WaitingList = MultiIndex<WaitingMember>;
