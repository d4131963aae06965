use thiserror::Error;

/// Failure of a single data source operation.
///
/// Every variant is an ordinary, recoverable outcome: the controller turns
/// it into a `Failed` resource instead of propagating it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Backend unreachable")]
    Unreachable,

    #[error("Server error: status {0}")]
    ServerError(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No member selected")]
    NoFocus,
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    pub fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode) -> Self {
        FetchError::ServerError(status.as_u16())
    }

    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Unreachable
        }
    }

    /// Short message suitable for rendering in place of the data.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Unreachable => {
                "Backend server not available. Check that it is running and reachable.".to_string()
            }
            FetchError::ServerError(429) => {
                "The server is busy. Please wait a moment and retry.".to_string()
            }
            FetchError::ServerError(404) => "No data found for this member.".to_string(),
            FetchError::ServerError(code) if *code >= 500 => {
                format!("The server failed to answer (status {}). Please check server logs.", code)
            }
            FetchError::ServerError(code) => format!("Request rejected (status {}).", code),
            FetchError::Malformed(_) => {
                "Invalid data format received from server. Please check server logs.".to_string()
            }
            FetchError::NoFocus => "Select a member to load data.".to_string(),
        }
    }
}
