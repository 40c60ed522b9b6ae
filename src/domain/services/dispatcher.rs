#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;

use crate::domain::models::ChatError;
use crate::domain::models::MessageLog;
use crate::domain::models::PromptEndpoint;
use crate::domain::models::RequestAuth;
use crate::domain::models::TransportBox;

/// Issues the backend calls and applies their results to the message log.
/// Failures are logged and converted to a `ChatError`; nothing is retried.
pub struct RequestDispatcher {
    transport: TransportBox,
}

impl RequestDispatcher {
    pub fn new(transport: TransportBox) -> RequestDispatcher {
        return RequestDispatcher { transport };
    }

    /// Replaces the log with the server history. The log is untouched on
    /// failure.
    pub async fn fetch_history(
        &self,
        auth: &RequestAuth,
        log: &mut MessageLog,
    ) -> Result<(), ChatError> {
        match self.transport.fetch_history(auth).await {
            Ok(messages) => {
                tracing::debug!(count = messages.len(), model = %auth.model_id, "Fetched history");
                log.replace(messages);
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to fetch history");
                return Err(ChatError::classify(err, ChatError::Fetch));
            }
        }
    }

    /// Sends a prompt the caller has already echoed into the log, then
    /// re-fetches history so the server's view replaces the echo. The echo
    /// stays in place when sending fails.
    pub async fn send_message(
        &self,
        auth: &RequestAuth,
        text: &str,
        log: &mut MessageLog,
    ) -> Result<(), ChatError> {
        let endpoint = PromptEndpoint::route(text);
        tracing::debug!(endpoint = %endpoint, model = %auth.model_id, "Sending prompt");

        if let Err(err) = self.transport.send_prompt(auth, endpoint, text).await {
            tracing::warn!(error = %err, endpoint = %endpoint, "Failed to send prompt");
            return Err(ChatError::classify(err, ChatError::Send));
        }

        return self.fetch_history(auth, log).await;
    }

    pub async fn reset_history(
        &self,
        auth: &RequestAuth,
        log: &mut MessageLog,
    ) -> Result<(), ChatError> {
        match self.transport.reset_history(auth).await {
            Ok(messages) => {
                tracing::debug!(count = messages.len(), "Reset history");
                log.replace(messages);
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to reset history");
                return Err(ChatError::classify(err, ChatError::Reset));
            }
        }
    }

    pub async fn init_page(&self, auth: &RequestAuth, page_url: &str) -> Result<(), ChatError> {
        if let Err(err) = self.transport.init_page(auth, page_url).await {
            tracing::warn!(error = %err, page_url = page_url, "Failed to initialise page");
            return Err(ChatError::classify(err, ChatError::Init));
        }

        tracing::debug!(page_url = page_url, "Initialised page");
        return Ok(());
    }
}
