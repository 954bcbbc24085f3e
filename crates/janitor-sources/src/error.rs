use thiserror::Error;

/// Coarse failure classes; the retry policy decides on these, not on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    ConnectTimeout,
    Connection,
    PlexApi,
    Status,
    Decode,
    Request,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{service}: connection timed out: {message}")]
    ConnectTimeout { service: &'static str, message: String },

    #[error("{service}: connection failed: {message}")]
    Connection { service: &'static str, message: String },

    #[error("plex api error: {0}")]
    PlexApi(String),

    #[error("{service} returned HTTP {status} for {method} {endpoint}")]
    Status {
        service: &'static str,
        method: &'static str,
        endpoint: String,
        status: u16,
    },

    #[error("{service}: invalid response: {message}")]
    Decode { service: &'static str, message: String },

    #[error("{service}: request failed: {message}")]
    Request { service: &'static str, message: String },
}

impl SourceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SourceError::ConnectTimeout { .. } => ErrorCategory::ConnectTimeout,
            SourceError::Connection { .. } => ErrorCategory::Connection,
            SourceError::PlexApi(_) => ErrorCategory::PlexApi,
            SourceError::Status { .. } => ErrorCategory::Status,
            SourceError::Decode { .. } => ErrorCategory::Decode,
            SourceError::Request { .. } => ErrorCategory::Request,
        }
    }

    /// Classify a transport error from a non-Plex service.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_connect() && err.is_timeout() {
            SourceError::ConnectTimeout { service, message }
        } else if err.is_connect() {
            SourceError::Connection { service, message }
        } else if err.is_decode() {
            SourceError::Decode { service, message }
        } else {
            SourceError::Request { service, message }
        }
    }

    /// Classify a transport error from Plex. Anything that is not a
    /// connection failure counts as a Plex API failure.
    pub fn from_plex(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::from_reqwest("plex", err)
        } else {
            SourceError::PlexApi(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let timeout = SourceError::ConnectTimeout {
            service: "radarr",
            message: "deadline".to_string(),
        };
        assert_eq!(timeout.category(), ErrorCategory::ConnectTimeout);

        let status = SourceError::Status {
            service: "radarr",
            method: "DELETE",
            endpoint: "movie/7".to_string(),
            status: 500,
        };
        assert_eq!(status.category(), ErrorCategory::Status);
        assert_eq!(status.to_string(), "radarr returned HTTP 500 for DELETE movie/7");

        assert_eq!(SourceError::PlexApi("nope".into()).category(), ErrorCategory::PlexApi);
    }
}
