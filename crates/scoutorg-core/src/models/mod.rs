//! Domain models for a scout group.
//!
//! - `Member`, `Location`: people and their accommodation
//! - `Troop`, `Branch`, `RoleGroup`: how members are organized
//! - `CustomList`: legacy provider-maintained mailing lists
//! - `WaitingMember`: people queued for a place in the group
//!
//! All entities are built once by the factories and never mutated.

pub mod custom_list;
pub mod member;
pub mod unit;
pub mod waiting;

pub use custom_list::CustomList;
pub use member::{Location, Member};
pub use unit::{Branch, RoleGroup, Troop};
pub use waiting::{WaitingList, WaitingMember};
