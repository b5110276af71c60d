use thiserror::Error;

/// A record that cannot be turned into `RegionStats`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("record has no country name")]
    MissingName,

    #[error("record for {name} has no region code")]
    MissingCode { name: String },

    #[error("aggregate record has no case count")]
    MissingCounters,
}

/// Endpoint-level failure of a remote fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network failure for {url}: {reason}")]
    NetworkFailure { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("country list endpoint returned {found} instead of a list")]
    MalformedCatalog { found: String },
}

impl FetchError {
    /// Only transport failures are worth retrying; the server already
    /// answered everything else.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::NetworkFailure { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FetchError::NetworkFailure { .. } => {
                "Network unavailable, showing last known data.".to_string()
            }
            FetchError::BadStatus { status: 404, .. } => {
                "No data for that region, showing last known data.".to_string()
            }
            FetchError::BadStatus { status, .. } => format!("Server error ({status})."),
            FetchError::MalformedRecord(_) | FetchError::MalformedCatalog { .. } => {
                "The statistics service sent unexpected data.".to_string()
            }
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            };
        }
        if err.is_decode() {
            return FetchError::MalformedRecord(err.to_string());
        }
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        FetchError::NetworkFailure {
            url: url.to_string(),
            reason,
        }
    }
}

impl From<NormalizeError> for FetchError {
    fn from(err: NormalizeError) -> Self {
        FetchError::MalformedRecord(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid URL: {reason}")]
    InvalidUrl { key: &'static str, reason: String },

    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_failures_retry() {
        let network = FetchError::NetworkFailure {
            url: "u".into(),
            reason: "refused".into(),
        };
        let status = FetchError::BadStatus {
            url: "u".into(),
            status: 503,
        };
        assert!(network.is_retryable());
        assert!(!status.is_retryable());
        assert!(!FetchError::MalformedRecord("x".into()).is_retryable());
    }

    #[test]
    fn test_normalize_errors_become_malformed_records() {
        let err: FetchError = NormalizeError::MissingName.into();
        assert!(matches!(err, FetchError::MalformedRecord(_)));
    }

    #[test]
    fn test_not_found_has_its_own_message() {
        let err = FetchError::BadStatus {
            url: "u".into(),
            status: 404,
        };
        assert!(err.user_friendly_message().contains("No data"));
    }
}
