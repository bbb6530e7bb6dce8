//! Builders and a fake provider shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{
    CustomListsResponse, Field, MemberListResponse, Provider, ProviderError, RawCustomList, RawMember,
};
use crate::provider::raw::GroupInfo;

pub(crate) fn field(value: &str) -> Field {
    Field {
        value: Some(value.to_string()),
        raw_value: None,
    }
}

pub(crate) fn raw_field(raw_value: &str, value: &str) -> Field {
    Field {
        value: Some(value.to_string()),
        raw_value: Some(raw_value.to_string()),
    }
}

pub(crate) fn raw_member(
    id: i64,
    first_name: &str,
    last_name: &str,
    troop: Option<(i64, &str)>,
    roles: &[(i64, &str)],
) -> (String, RawMember) {
    let group_role = if roles.is_empty() {
        None
    } else {
        let ids: Vec<String> = roles.iter().map(|(id, _)| id.to_string()).collect();
        let names: Vec<&str> = roles.iter().map(|(_, name)| *name).collect();
        Some(raw_field(&ids.join(", "), &names.join(", ")))
    };

    let raw = RawMember {
        member_no: Some(field(&id.to_string())),
        first_name: Some(field(first_name)),
        last_name: Some(field(last_name)),
        unit: troop.map(|(troop_id, name)| raw_field(&troop_id.to_string(), name)),
        group_role,
        ..RawMember::default()
    };
    (id.to_string(), raw)
}

pub(crate) fn member_list(group_name: &str, data: Vec<(String, RawMember)>) -> MemberListResponse {
    MemberListResponse {
        group: Some(GroupInfo {
            name: Some(group_name.to_string()),
            membercount: None,
        }),
        data,
    }
}

/// Four troops, three of them in branches, one group role
pub(crate) fn sample_member_list() -> MemberListResponse {
    member_list(
        "Testkåren",
        vec![
            raw_member(101, "Alva", "Berg", Some((1, "Bävrarna")), &[]),
            raw_member(102, "Bo", "Ek", Some((2, "Spårarna")), &[(50, "Ledare")]),
            raw_member(103, "Cia", "Lund", Some((3, "Upptäckarna")), &[]),
            raw_member(104, "Dan", "Ås", Some((4, "Roverlaget")), &[(50, "Ledare"), (51, "Kassör")]),
            raw_member(105, "Eva", "Berg", Some((1, "Bävrarna")), &[]),
        ],
    )
}

pub(crate) fn sample_custom_lists() -> (CustomListsResponse, HashMap<i64, MemberListResponse>) {
    let lists = CustomListsResponse {
        lists: vec![(
            "9".to_string(),
            RawCustomList {
                id: Some(serde_json::json!(9)),
                title: Some("Styrelsen".to_string()),
                description: Some("Board members".to_string()),
            },
        )],
    };
    let members = member_list("Testkåren", vec![raw_member(104, "Dan", "Ås", None, &[])]);
    (lists, HashMap::from([(9, members)]))
}

/// In-memory provider with call counters and injectable failures.
pub(crate) struct FakeProvider {
    group_id: i64,
    lifetime: Duration,
    delay: Duration,
    members: Mutex<MemberListResponse>,
    waiting: MemberListResponse,
    custom_lists: CustomListsResponse,
    list_members: HashMap<i64, MemberListResponse>,
    member_fetches: AtomicUsize,
    failures_left: AtomicUsize,
    waiting_fails: AtomicBool,
    custom_lists_fail: AtomicBool,
}

impl FakeProvider {
    pub(crate) fn new(group_id: i64) -> Self {
        let (custom_lists, list_members) = sample_custom_lists();
        Self {
            group_id,
            lifetime: Duration::from_secs(600),
            delay: Duration::from_millis(50),
            members: Mutex::new(sample_member_list()),
            waiting: member_list(
                "Testkåren",
                vec![raw_member(201, "Gun", "Holm", None, &[])],
            ),
            custom_lists,
            list_members,
            member_fetches: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            waiting_fails: AtomicBool::new(false),
            custom_lists_fail: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub(crate) fn with_members(self, members: MemberListResponse) -> Self {
        *self.members.lock().unwrap() = members;
        self
    }

    pub(crate) fn set_members(&self, members: MemberListResponse) {
        *self.members.lock().unwrap() = members;
    }

    /// Fail the next `count` member list fetches
    pub(crate) fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub(crate) fn set_waiting_list_failing(&self, failing: bool) {
        self.waiting_fails.store(failing, Ordering::SeqCst);
    }

    /// Make the custom list catalogue answer 401
    pub(crate) fn set_custom_lists_failing(&self, failing: bool) {
        self.custom_lists_fail.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn member_fetches(&self) -> usize {
        self.member_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn group_id(&self) -> i64 {
        self.group_id
    }

    fn cache_lifetime(&self) -> Duration {
        self.lifetime
    }

    async fn member_list(&self) -> Result<MemberListResponse, ProviderError> {
        self.member_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ProviderError::ServerError {
                endpoint: "memberlist".to_string(),
                status: 503,
                body: "provider down".to_string(),
            });
        }
        Ok(self.members.lock().unwrap().clone())
    }

    async fn waiting_list(&self) -> Result<MemberListResponse, ProviderError> {
        if self.waiting_fails.load(Ordering::SeqCst) {
            return Err(ProviderError::ServerError {
                endpoint: "waitinglist".to_string(),
                status: 500,
                body: String::new(),
            });
        }
        Ok(self.waiting.clone())
    }

    async fn custom_lists(&self) -> Result<CustomListsResponse, ProviderError> {
        if self.custom_lists_fail.load(Ordering::SeqCst) {
            return Err(ProviderError::BadCredentials {
                endpoint: "customlists".to_string(),
            });
        }
        Ok(self.custom_lists.clone())
    }

    async fn custom_list_members(&self, list_id: i64) -> Result<MemberListResponse, ProviderError> {
        self.list_members
            .get(&list_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                endpoint: format!("customlist_{}", list_id),
                body: String::new(),
            })
    }
}
