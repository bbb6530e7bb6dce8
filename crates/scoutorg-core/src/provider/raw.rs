//! Raw response shapes returned by the Scoutnet group API.
//!
//! Member records are maps of field name to `{ "value", "raw_value" }`
//! pairs. The order of entries in `data` is the provider's insertion order
//! and is preserved, since it decides which entity wins a name collision.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// A single provider field. `value` is the display text, `raw_value` the
/// underlying identifier(s) when the field references other records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub raw_value: Option<String>,
}

impl Field {
    /// Display text, trimmed, `None` when blank
    pub fn text(&self) -> Option<&str> {
        non_blank(self.value.as_deref())
    }

    /// Raw identifier text, falling back to the display value
    pub fn raw(&self) -> Option<&str> {
        non_blank(self.raw_value.as_deref()).or_else(|| self.text())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMember {
    pub member_no: Option<Field>,
    pub first_name: Option<Field>,
    pub last_name: Option<Field>,
    pub date_of_birth: Option<Field>,
    pub email: Option<Field>,
    pub contact_mobile_phone: Option<Field>,
    pub contact_home_phone: Option<Field>,
    pub address_1: Option<Field>,
    pub postcode: Option<Field>,
    pub town: Option<Field>,
    /// Troop: `raw_value` is the troop id, `value` the troop name
    pub unit: Option<Field>,
    /// Comma separated role ids in `raw_value`, role names in `value`
    pub group_role: Option<Field>,
    pub waiting_since: Option<Field>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: Option<String>,
    pub membercount: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberListResponse {
    #[serde(rename = "Group", default)]
    pub group: Option<GroupInfo>,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub data: Vec<(String, RawMember)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCustomList {
    /// Scoutnet sends this as either a number or a numeric string
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Catalogue of custom lists, keyed by list id in provider order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CustomListsResponse {
    pub lists: Vec<(String, RawCustomList)>,
}

impl<'de> Deserialize<'de> for CustomListsResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            lists: ordered_entries(deserializer)?,
        })
    }
}

/// Parse a provider id that may arrive as a JSON number or string
pub fn parse_id_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize a JSON object into its entries, keeping document order.
///
/// An empty JSON array is also accepted since the provider emits `[]` for
/// an empty map; array elements are keyed by their position.
fn ordered_entries<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: DeserializeOwned> Visitor<'de> for EntriesVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of records or an empty array")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, T>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some(value) = seq.next_element::<T>()? {
                entries.push((entries.len().to_string(), value));
            }
            Ok(entries)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(EntriesVisitor(PhantomData))
}
