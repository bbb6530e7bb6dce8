//! HTTP client for the Scoutnet group API.
//!
//! Every endpoint is authenticated with HTTP basic auth where the user is
//! the group id and the password is the API key for that data category.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ProviderConfig;

use super::{CustomListsResponse, MemberListResponse, Provider, ProviderError, RawCache};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// The member list endpoint is slow for large groups.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Which API key an endpoint is authorized with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    MemberList,
    CustomLists,
}

/// Scoutnet API client for a single group.
pub struct ScoutnetClient {
    client: Client,
    config: ProviderConfig,
    cache: RawCache,
    initial_backoff: Duration,
}

impl ScoutnetClient {
    pub fn new(config: ProviderConfig, cache: RawCache) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            config,
            cache,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    fn base_url(&self) -> String {
        let domain = self.config.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{}/api", domain)
        } else {
            format!("https://{}/api", domain)
        }
    }

    fn api_key(&self, kind: KeyKind) -> &str {
        match kind {
            KeyKind::MemberList => &self.config.member_list_api_key,
            KeyKind::CustomLists => &self.config.custom_lists_api_key,
        }
    }

    /// Fetch and decode an endpoint, serving it from the raw cache when
    /// fresh. Only bodies that decode are stored.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        query: &[(&str, String)],
        kind: KeyKind,
    ) -> Result<T, ProviderError> {
        if let Some(body) = self.cache.get(endpoint) {
            match Self::decode(endpoint, &body) {
                Ok(data) => return Ok(data),
                Err(e) => {
                    warn!(endpoint, error = %e, "Cached response does not decode, refetching");
                    if let Err(e) = self.cache.remove(endpoint) {
                        warn!(endpoint, error = %e, "Failed to drop cached response");
                    }
                }
            }
        }

        let body = self.get_body(endpoint, path, query, kind).await?;
        let data = Self::decode(endpoint, &body)?;
        self.cache.put(endpoint, &body);
        Ok(data)
    }

    /// GET a response body, backing off and retrying on 429
    async fn get_body(
        &self,
        endpoint: &str,
        path: &str,
        query: &[(&str, String)],
        kind: KeyKind,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/{}", self.base_url(), path);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            debug!(url = %url, group_id = self.config.group_id, "Fetching from provider");
            let response = self
                .client
                .get(&url)
                .basic_auth(self.config.group_id, Some(self.api_key(kind)))
                .query(query)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.text().await?);
            }

            if status.as_u16() == 429 {
                if retries == MAX_RATE_LIMIT_RETRIES {
                    return Err(ProviderError::RateLimited {
                        endpoint: endpoint.to_string(),
                        retries,
                    });
                }
                retries += 1;
                warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(endpoint, status, &body));
        }
    }

    fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ProviderError> {
        serde_json::from_str(body).map_err(|source| ProviderError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Provider for ScoutnetClient {
    fn group_id(&self) -> i64 {
        self.config.group_id
    }

    fn cache_lifetime(&self) -> Duration {
        self.config.cache_lifetime
    }

    async fn member_list(&self) -> Result<MemberListResponse, ProviderError> {
        self.fetch("memberlist", "group/memberlist", &[], KeyKind::MemberList)
            .await
    }

    async fn waiting_list(&self) -> Result<MemberListResponse, ProviderError> {
        self.fetch(
            "waitinglist",
            "group/memberlist",
            &[("waiting", "1".to_string())],
            KeyKind::MemberList,
        )
        .await
    }

    async fn custom_lists(&self) -> Result<CustomListsResponse, ProviderError> {
        self.fetch("customlists", "group/customlists", &[], KeyKind::CustomLists)
            .await
    }

    async fn custom_list_members(&self, list_id: i64) -> Result<MemberListResponse, ProviderError> {
        self.fetch(
            &format!("customlist_{}", list_id),
            "group/customlists",
            &[("list_id", list_id.to_string())],
            KeyKind::CustomLists,
        )
        .await
    }
}
