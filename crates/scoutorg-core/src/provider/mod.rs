//! Raw data provider for the Scoutnet group API.
//!
//! `Provider` is the seam the organization cache builds against; the
//! production implementation is `ScoutnetClient`, which talks HTTPS and
//! keeps fetched bodies in a `RawCache` for the configured lifetime.

pub mod cache;
pub mod client;
pub mod error;
pub mod raw;

use std::time::Duration;

use async_trait::async_trait;

pub use cache::{CachedData, RawCache};
pub use client::ScoutnetClient;
pub use error::ProviderError;
pub use raw::{CustomListsResponse, Field, MemberListResponse, RawCustomList, RawMember};

/// Source of raw organizational data for one scout group.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The group this provider is configured for
    fn group_id(&self) -> i64;

    /// How long data fetched by this provider stays valid
    fn cache_lifetime(&self) -> Duration;

    async fn member_list(&self) -> Result<MemberListResponse, ProviderError>;

    async fn waiting_list(&self) -> Result<MemberListResponse, ProviderError>;

    async fn custom_lists(&self) -> Result<CustomListsResponse, ProviderError>;

    async fn custom_list_members(&self, list_id: i64) -> Result<MemberListResponse, ProviderError>;
}
