/// Errors from the remote store client layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A uniqueness constraint rejected the write (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A response body did not have the expected shape.
    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    /// Credentials were rejected by the auth service.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The backend could not serve the request.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}
