use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Indexed;

/// Where a member lives. A plain value with no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    address: String,
    post_code: String,
    post_town: String,
}

impl Location {
    pub fn new(
        address: impl Into<String>,
        post_code: impl Into<String>,
        post_town: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            post_code: post_code.into(),
            post_town: post_town.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn post_code(&self) -> &str {
        &self.post_code
    }

    pub fn post_town(&self) -> &str {
        &self.post_town
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub home_phone: Option<String>,
    pub accommodation: Option<Location>,
    pub troop_id: Option<i64>,
    pub role_group_ids: Vec<i64>,
    /// Cached "first last", the name index key
    full_name: String,
}

impl Member {
    pub fn new(id: i64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let full_name = format!("{} {}", first_name, last_name).trim().to_string();
        Self {
            id,
            first_name,
            last_name,
            date_of_birth: None,
            email: None,
            mobile_phone: None,
            home_phone: None,
            accommodation: None,
            troop_id: None,
            role_group_ids: Vec::new(),
            full_name,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Preferred phone number, mobile first
    pub fn phone(&self) -> Option<&str> {
        self.mobile_phone.as_deref().or(self.home_phone.as_deref())
    }

    pub fn age(&self) -> Option<i32> {
        self.age_on(Utc::now().date_naive())
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| {
            let mut age = today.year() - dob.year();
            if (today.month(), today.day()) < (dob.month(), dob.day()) {
                age -= 1;
            }
            age
        })
    }
}

impl Indexed for Member {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_name(&self) -> &str {
        &self.full_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_names() {
        let member = Member::new(3001, "Astrid", "Lindgren");
        assert_eq!(member.full_name(), "Astrid Lindgren");
        assert_eq!(member.index_name(), "Astrid Lindgren");
        assert_eq!(member.display_name(), "Lindgren, Astrid");
    }

    #[test]
    fn test_age_on() {
        let mut member = Member::new(1, "Nils", "Holgersson");
        assert_eq!(member.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), None);

        member.date_of_birth = NaiveDate::from_ymd_opt(2012, 6, 15);
        assert_eq!(member.age_on(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), Some(11));
        assert_eq!(member.age_on(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), Some(12));
    }

    #[test]
    fn test_phone_prefers_mobile() {
        let mut member = Member::new(1, "Nils", "Holgersson");
        member.home_phone = Some("08-123 45".to_string());
        assert_eq!(member.phone(), Some("08-123 45"));
        member.mobile_phone = Some("070-123 45 67".to_string());
        assert_eq!(member.phone(), Some("070-123 45 67"));
    }

    #[test]
    fn test_location_accessors() {
        let location = Location::new("Storgatan 1", "123 45", "Småstad");
        assert_eq!(location.address(), "Storgatan 1");
        assert_eq!(location.post_code(), "123 45");
        assert_eq!(location.post_town(), "Småstad");
    }
}
