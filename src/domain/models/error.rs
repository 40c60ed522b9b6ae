use super::TransportError;

/// Failures surfaced by the session controller. Every remote failure is
/// converted into one of these at the call site.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// An action was attempted before the session allowed it. No request was
    /// made.
    #[error("{0}")]
    Precondition(String),
    #[error("the backend rejected the API key")]
    Credential,
    #[error("failed to fetch chat history: {0}")]
    Fetch(#[source] TransportError),
    #[error("failed to send message: {0}")]
    Send(#[source] TransportError),
    #[error("failed to reset chat history: {0}")]
    Reset(#[source] TransportError),
    #[error("failed to initialise the page: {0}")]
    Init(#[source] TransportError),
    #[error("credential store failed: {0:#}")]
    Store(#[source] anyhow::Error),
}

impl ChatError {
    pub fn precondition(reason: &str) -> ChatError {
        return ChatError::Precondition(reason.to_string());
    }

    /// Wraps a transport failure, except rejected credentials which are the
    /// same failure whichever call hit them.
    pub fn classify(err: TransportError, wrap: fn(TransportError) -> ChatError) -> ChatError {
        if err.is_unauthorized() {
            return ChatError::Credential;
        }

        return wrap(err);
    }

    pub fn is_credential(&self) -> bool {
        return matches!(self, ChatError::Credential);
    }
}
