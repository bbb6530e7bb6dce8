use tracing::debug;

use crate::error::OrgResult;
use crate::models::{WaitingList, WaitingMember};
use crate::provider::MemberListResponse;

use super::parse::{member_record, parse_date, parse_member};

/// Builds the waiting list of a group, independently of the group itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitingListFactory;

impl WaitingListFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, raw: &MemberListResponse) -> OrgResult<WaitingList> {
        let mut waiting = WaitingList::new();
        for (key, raw_member) in &raw.data {
            let member = parse_member(key, raw_member)?;
            let waiting_since =
                parse_date(&raw_member.waiting_since, &member_record(key), "waiting_since")?;
            waiting.insert(WaitingMember {
                member,
                waiting_since,
            });
        }
        debug!(waiting = waiting.len(), "Built waiting list");
        Ok(waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrgError;
    use crate::test_support::{field, member_list, raw_member};
    use chrono::NaiveDate;

    #[test]
    fn test_build_waiting_list() {
        let (key, mut first) = raw_member(201, "Gun", "Holm", None, &[]);
        first.waiting_since = Some(field("2023-08-20"));
        let raw = member_list(
            "Testkåren",
            vec![(key, first), raw_member(202, "Hans", "Ek", None, &[])],
        );

        let waiting = WaitingListFactory::new().build(&raw).unwrap();
        assert_eq!(waiting.len(), 2);

        let gun = waiting.get_by_name("Gun Holm").unwrap();
        assert_eq!(gun.waiting_since, NaiveDate::from_ymd_opt(2023, 8, 20));
        assert_eq!(waiting.get(202).unwrap().waiting_since, None);

        let order: Vec<i64> = waiting.iter().map(|w| w.member.id).collect();
        assert_eq!(order, vec![201, 202]);
    }

    #[test]
    fn test_bad_waiting_date_fails_whole_list() {
        let (key, mut broken) = raw_member(203, "Ida", "Sjö", None, &[]);
        broken.waiting_since = Some(field("yesterday"));
        let raw = member_list(
            "Testkåren",
            vec![raw_member(201, "Gun", "Holm", None, &[]), (key, broken)],
        );

        match WaitingListFactory::new().build(&raw) {
            Err(OrgError::MalformedProviderData { record, reason }) => {
                assert_eq!(record, "member 203");
                assert!(reason.contains("waiting_since"));
            }
            other => panic!("expected malformed data error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_waiting_list() {
        let waiting = WaitingListFactory::new()
            .build(&member_list("Testkåren", Vec::new()))
            .unwrap();
        assert!(waiting.is_empty());
    }
}
