use dinodex_core::error::CoreError;
use dinodex_remote::RemoteError;

/// Error type for state manager operations.
///
/// Wraps [`CoreError`] for validation and lookup failures and
/// [`RemoteError`] for backend failures that are surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A domain-level error from `dinodex_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A backend call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,
}

/// Convenience type alias for manager return values.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Short message fit for inline display next to the triggering control.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Core(core) => core.user_message(),
            ClientError::Remote(RemoteError::InvalidCredentials) => {
                "Invalid login credentials".to_string()
            }
            ClientError::Remote(_) => "Something went wrong, please try again".to_string(),
            ClientError::NotSignedIn => "Please sign in first".to_string(),
        }
    }
}
