//! Field-level parsing shared by the factories.

use chrono::NaiveDate;

use crate::error::{OrgError, OrgResult};
use crate::models::{Location, Member};
use crate::provider::{Field, RawMember};

/// Date format used by the provider for all date fields
const PROVIDER_DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn member_record(key: &str) -> String {
    format!("member {}", key)
}

fn text(field: &Option<Field>) -> Option<String> {
    field.as_ref().and_then(Field::text).map(str::to_string)
}

fn required_text(field: &Option<Field>, record: &str, name: &str) -> OrgResult<String> {
    text(field).ok_or_else(|| OrgError::malformed(record, format!("{} is missing", name)))
}

pub(crate) fn parse_id(value: &str, record: &str, name: &str) -> OrgResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| OrgError::malformed(record, format!("{} is not a number: {:?}", name, value)))
}

pub(crate) fn parse_date(field: &Option<Field>, record: &str, name: &str) -> OrgResult<Option<NaiveDate>> {
    match field.as_ref().and_then(Field::text) {
        Some(value) => NaiveDate::parse_from_str(value, PROVIDER_DATE_FORMAT)
            .map(Some)
            .map_err(|_| OrgError::malformed(record, format!("{} is not a date: {:?}", name, value))),
        None => Ok(None),
    }
}

/// Troop reference of a member: `(troop id, troop name)`
pub(crate) fn parse_troop(raw: &RawMember, record: &str) -> OrgResult<Option<(i64, String)>> {
    let unit = match raw.unit.as_ref() {
        Some(unit) => unit,
        None => return Ok(None),
    };
    let id = match unit.raw_value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw_id) => parse_id(raw_id, record, "troop id")?,
        None if unit.text().is_none() => return Ok(None),
        None => return Err(OrgError::malformed(record, "troop has a name but no id")),
    };
    let name = unit
        .text()
        .ok_or_else(|| OrgError::malformed(record, format!("troop {} has no name", id)))?;
    Ok(Some((id, name.to_string())))
}

/// Group roles of a member: comma separated ids zipped with comma separated names
pub(crate) fn parse_roles(raw: &RawMember, record: &str) -> OrgResult<Vec<(i64, String)>> {
    let field = match raw.group_role.as_ref() {
        Some(field) => field,
        None => return Ok(Vec::new()),
    };

    let ids: Vec<&str> = split_list(field.raw_value.as_deref());
    let names: Vec<&str> = split_list(field.value.as_deref());
    if ids.len() != names.len() {
        return Err(OrgError::malformed(
            record,
            format!("{} role ids but {} role names", ids.len(), names.len()),
        ));
    }

    ids.into_iter()
        .zip(names)
        .map(|(id, name)| Ok((parse_id(id, record, "role id")?, name.to_string())))
        .collect()
}

fn split_list(value: Option<&str>) -> Vec<&str> {
    value
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Member id from `member_no`, falling back to the record key
pub(crate) fn parse_member_id(key: &str, raw: &RawMember) -> OrgResult<i64> {
    let id_text = raw
        .member_no
        .as_ref()
        .and_then(Field::raw)
        .unwrap_or(key);
    parse_id(id_text, &member_record(key), "member_no")
}

/// A member record with the troop and role references it carries
pub(crate) struct ParsedMember {
    pub member: Member,
    pub troop: Option<(i64, String)>,
    pub roles: Vec<(i64, String)>,
}

/// Parse one member record. `key` is the record's key in the provider map.
pub(crate) fn parse_member(key: &str, raw: &RawMember) -> OrgResult<Member> {
    parse_member_record(key, raw).map(|parsed| parsed.member)
}

pub(crate) fn parse_member_record(key: &str, raw: &RawMember) -> OrgResult<ParsedMember> {
    let record = member_record(key);
    let id = parse_member_id(key, raw)?;

    let first_name = required_text(&raw.first_name, &record, "first_name")?;
    let last_name = required_text(&raw.last_name, &record, "last_name")?;

    let mut member = Member::new(id, first_name, last_name);
    member.date_of_birth = parse_date(&raw.date_of_birth, &record, "date_of_birth")?;
    member.email = text(&raw.email);
    member.mobile_phone = text(&raw.contact_mobile_phone);
    member.home_phone = text(&raw.contact_home_phone);

    let address = text(&raw.address_1);
    let post_code = text(&raw.postcode);
    let post_town = text(&raw.town);
    if address.is_some() || post_code.is_some() || post_town.is_some() {
        member.accommodation = Some(Location::new(
            address.unwrap_or_default(),
            post_code.unwrap_or_default(),
            post_town.unwrap_or_default(),
        ));
    }

    let troop = parse_troop(raw, &record)?;
    let roles = parse_roles(raw, &record)?;
    member.troop_id = troop.as_ref().map(|(id, _)| *id);
    member.role_group_ids = roles.iter().map(|(id, _)| *id).collect();

    Ok(ParsedMember { member, troop, roles })
}
