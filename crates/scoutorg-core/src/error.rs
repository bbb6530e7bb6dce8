use std::sync::Arc;

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors surfaced by group construction and the organization cache.
///
/// `Clone` so that every caller waiting on the same in-flight build can
/// receive the same failure.
#[derive(Error, Debug, Clone)]
pub enum OrgError {
    #[error("Organization loading disabled: {0}")]
    ConfigurationInvalid(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(#[source] Arc<ProviderError>),

    #[error("Malformed provider data in {record}: {reason}")]
    MalformedProviderData { record: String, reason: String },

    #[error("No provider configured for group {0}")]
    UnknownGroup(i64),

    #[error("Group build aborted: {0}")]
    BuildAborted(String),
}

impl OrgError {
    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        OrgError::MalformedProviderData {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

impl From<ProviderError> for OrgError {
    fn from(err: ProviderError) -> Self {
        match err {
            // A body that arrived but could not be decoded is bad data, not a transport failure
            ProviderError::Decode { endpoint, source } => {
                OrgError::malformed(format!("{} response", endpoint), source.to_string())
            }
            other => OrgError::ProviderUnavailable(Arc::new(other)),
        }
    }
}

pub type OrgResult<T> = std::result::Result<T, OrgError>;
