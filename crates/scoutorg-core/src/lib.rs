//! Core library for scoutorg.
//!
//! Keeps an in-memory, multiply indexed model of a scout organization
//! (groups, branches, troops, role groups, members, waiting lists) built
//! from the Scoutnet membership API and cached for a configured lifetime.
//!
//! - `provider`: raw API client and response-body cache
//! - `store`: the id/name `MultiIndex` container
//! - `factory`: raw responses to domain aggregates
//! - `org`: the `ScoutOrg` cache that builds each group at most once per expiry

pub mod branch;
pub mod config;
pub mod error;
pub mod factory;
pub mod group;
pub mod loader;
pub mod models;
pub mod org;
pub mod provider;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use branch::{BranchConfig, BranchTable};
pub use config::{Config, ProviderConfig};
pub use error::{OrgError, OrgResult};
pub use group::{CustomListSource, NoCustomLists, ScoutGroup};
pub use loader::load_organization;
pub use org::ScoutOrg;
pub use store::{IndexBy, IndexSnapshot, Indexed, MultiIndex};
