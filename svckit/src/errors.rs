use thiserror::Error;

/// Failure of a backend request.
///
/// The `Display` text is the normalized, user-presentable message. The
/// transport error that caused it stays reachable through `source()` for
/// diagnostics only.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server error: {status}")]
    Server { status: u16 },

    #[error("No response received from server")]
    NoResponse(#[source] reqwest::Error),

    #[error("{message}")]
    Setup {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Invalid response body")]
    InvalidBody(#[source] reqwest::Error),
}

impl ApiError {
    /// Classify a transport-level error the way the dashboard reports it.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ApiError::Server { status: status.as_u16() }
        } else if err.is_builder() {
            ApiError::Setup {
                message: err.to_string(),
                source: Some(err),
            }
        } else if err.is_decode() {
            ApiError::InvalidBody(err)
        } else {
            ApiError::NoResponse(err)
        }
    }

    /// Body read failures: a timeout mid-body is still a missing response.
    pub fn from_body(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::NoResponse(err)
        } else {
            ApiError::InvalidBody(err)
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        ApiError::Setup {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message() {
        let err = ApiError::Server { status: 503 };
        assert_eq!(err.message(), "Server error: 503");
    }

    #[test]
    fn test_setup_message_is_verbatim() {
        let err = ApiError::setup("relative URL without a base");
        assert_eq!(err.message(), "relative URL without a base");
        assert!(std::error::Error::source(&err).is_none());
    }
}
