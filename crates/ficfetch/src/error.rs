//! Error types for ficfetch

use thiserror::Error;

/// Errors that can occur while fetching, cleaning or merging works
#[derive(Debug, Error)]
pub enum FicError {
    /// Work identifier is missing
    #[error("Missing required parameter: work id")]
    MissingId,

    /// Listing URL failed to parse
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// CSS selector failed to parse
    #[error("Invalid content selector: {0}")]
    Selector(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    Connect(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status
    #[error("Request for '{url}' failed with status {status}")]
    Status { url: String, status: u16 },

    /// Filesystem error (unreadable input, unwritable output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FicError {
    /// Classify a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FicError::Timeout
        } else if err.is_connect() {
            FicError::Connect(err)
        } else {
            FicError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FicError::MissingId.to_string(),
            "Missing required parameter: work id"
        );
        assert_eq!(FicError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            FicError::Status {
                url: "https://example.com/works/1".to_string(),
                status: 404
            }
            .to_string(),
            "Request for 'https://example.com/works/1' failed with status 404"
        );
    }
}
