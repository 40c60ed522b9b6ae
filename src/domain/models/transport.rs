#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

use std::fmt;

use async_trait::async_trait;

use super::Credential;
use super::Message;

const IMAGE_PREFIX: &str = "/image ";

/// Headers every call to the backend carries.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestAuth {
    pub credential: Credential,
    pub model_id: String,
}

impl RequestAuth {
    pub fn new(credential: Credential, model_id: &str) -> RequestAuth {
        return RequestAuth {
            credential,
            model_id: model_id.to_string(),
        };
    }

    pub fn api_key(&self) -> &str {
        return self.credential.as_str();
    }
}

impl fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("RequestAuth")
            .field("credential", &self.credential)
            .field("model_id", &self.model_id)
            .finish();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PromptEndpoint {
    Chat,
    Image,
}

impl PromptEndpoint {
    /// Prompts starting with `/image ` (any case) go to the image endpoint.
    pub fn route(text: &str) -> PromptEndpoint {
        let is_image = text
            .get(..IMAGE_PREFIX.len())
            .map(|prefix| return prefix.eq_ignore_ascii_case(IMAGE_PREFIX))
            .unwrap_or(false);

        if is_image {
            return PromptEndpoint::Image;
        }

        return PromptEndpoint::Chat;
    }

    pub fn path(&self) -> &'static str {
        match self {
            PromptEndpoint::Chat => return "/",
            PromptEndpoint::Image => return "/i",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("the backend rejected the API key (status {0})")]
    Unauthorized(u16),
    #[error("the backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("the request timed out")]
    Timeout,
    #[error("the request failed: {0}")]
    Request(String),
    #[error("the response could not be decoded: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn from_status(status: u16, body: String) -> TransportError {
        if status == 401 || status == 403 {
            return TransportError::Unauthorized(status);
        }

        return TransportError::Status { status, body };
    }

    pub fn is_unauthorized(&self) -> bool {
        return matches!(self, TransportError::Unauthorized(_));
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// The remote chat contract. Implementations only move data; applying the
/// results to the message log is the dispatcher's job.
#[async_trait]
pub trait ChatTransport {
    /// `GET /`: the full ordered history.
    async fn fetch_history(&self, auth: &RequestAuth) -> TransportResult<Vec<Message>>;

    /// `POST /` or `POST /i` with `{"prompt": ...}`. Any response body is
    /// ignored, callers re-fetch history instead.
    async fn send_prompt(
        &self,
        auth: &RequestAuth,
        endpoint: PromptEndpoint,
        prompt: &str,
    ) -> TransportResult<()>;

    /// `DELETE /`: clears server side history and returns what is left.
    async fn reset_history(&self, auth: &RequestAuth) -> TransportResult<Vec<Message>>;

    /// `POST /init` with `{"page_url": ...}`.
    async fn init_page(&self, auth: &RequestAuth, page_url: &str) -> TransportResult<()>;
}

pub type TransportBox = Box<dyn ChatTransport + Send + Sync>;
