use thiserror::Error;

/// Failures talking to Scoutnet. `endpoint` is the cache name of the
/// request (`memberlist`, `waitinglist`, `customlists`, `customlist_{id}`).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Scoutnet answers 401 when the group id and key do not match
    #[error("Scoutnet rejected the credentials for {endpoint} - check the group id and API key")]
    BadCredentials { endpoint: String },

    /// 403: the key exists but its API category is not enabled for the group
    #[error("API key is not enabled for {endpoint}: {body}")]
    KeyNotEnabled { endpoint: String, body: String },

    #[error("Scoutnet has no {endpoint}: {body}")]
    NotFound { endpoint: String, body: String },

    #[error("Rate limited on {endpoint} after {retries} retries")]
    RateLimited { endpoint: String, retries: u32 },

    #[error("Scoutnet error {status} on {endpoint}: {body}")]
    ServerError { endpoint: String, status: u16, body: String },

    #[error("Unexpected status {status} on {endpoint}: {body}")]
    UnexpectedStatus { endpoint: String, status: u16, body: String },

    #[error("Could not reach Scoutnet: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ProviderError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success, non-429 response
    pub fn from_status(endpoint: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let endpoint = endpoint.to_string();
        let body = Self::truncate_body(body);
        match status.as_u16() {
            401 => ProviderError::BadCredentials { endpoint },
            403 => ProviderError::KeyNotEnabled { endpoint, body },
            404 => ProviderError::NotFound { endpoint, body },
            code @ 500..=599 => ProviderError::ServerError {
                endpoint,
                status: code,
                body,
            },
            code => ProviderError::UnexpectedStatus {
                endpoint,
                status: code,
                body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ProviderError::from_status("memberlist", StatusCode::UNAUTHORIZED, ""),
            ProviderError::BadCredentials { ref endpoint } if endpoint == "memberlist"
        ));
        assert!(matches!(
            ProviderError::from_status("customlists", StatusCode::FORBIDDEN, "no"),
            ProviderError::KeyNotEnabled { ref body, .. } if body == "no"
        ));
        assert!(matches!(
            ProviderError::from_status("memberlist", StatusCode::BAD_GATEWAY, "upstream"),
            ProviderError::ServerError { status: 502, ref body, .. } if body == "upstream"
        ));
        assert!(matches!(
            ProviderError::from_status("memberlist", StatusCode::IM_A_TEAPOT, "tea"),
            ProviderError::UnexpectedStatus { status: 418, .. }
        ));
    }

    #[test]
    fn test_message_names_endpoint() {
        let err = ProviderError::from_status("customlist_9", StatusCode::FORBIDDEN, "denied");
        assert_eq!(err.to_string(), "API key is not enabled for customlist_9: denied");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "å".repeat(400);
        let truncated = ProviderError::truncate_body(&body);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert!(truncated.len() < body.len());
    }
}
