#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatTransport;
use crate::domain::models::Message;
use crate::domain::models::PromptEndpoint;
use crate::domain::models::RequestAuth;
use crate::domain::models::TransportError;
use crate::domain::models::TransportResult;

fn convert_err(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if err.is_decode() {
        return TransportError::Decode(err.to_string());
    }

    return TransportError::Request(err.to_string());
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PromptRequest {
    prompt: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct InitRequest {
    page_url: String,
}

/// Talks to a chat backend over HTTP. The API key and model travel as the
/// `x-api-key` and `x-model-id` headers on every request.
pub struct HttpTransport {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: &str, timeout: Duration) -> HttpTransport {
        return HttpTransport {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config() -> Result<HttpTransport> {
        let url = Config::get(ConfigKey::ApiURL);
        if url.is_empty() {
            bail!("No API URL is configured");
        }
        let timeout = Config::get(ConfigKey::RequestTimeout).parse::<u64>()?;

        return Ok(HttpTransport::new(&url, Duration::from_millis(timeout)));
    }

    fn request(&self, method: Method, path: &str, auth: &RequestAuth) -> reqwest::RequestBuilder {
        return self
            .client
            .request(method, format!("{url}{path}", url = self.url))
            .header("x-api-key", auth.api_key())
            .header("x-model-id", &auth.model_id)
            .timeout(self.timeout);
    }

    async fn execute(&self, req: reqwest::RequestBuilder) -> TransportResult<reqwest::Response> {
        let res = req.send().await.map_err(|err| {
            tracing::error!(error = ?err, "Chat backend is not reachable");
            return convert_err(err);
        })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "Chat backend request failed"
            );
            return Err(TransportError::from_status(status.as_u16(), body));
        }

        return Ok(res);
    }

    async fn decode_history(res: reqwest::Response) -> TransportResult<Vec<Message>> {
        let body = res.text().await.map_err(convert_err)?;
        let messages: Vec<Message> = serde_json::from_str(&body).map_err(|err| {
            tracing::error!(error = ?err, body = %body, "Failed to decode chat history");
            return TransportError::Decode(err.to_string());
        })?;

        return Ok(messages);
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    #[allow(clippy::implicit_return)]
    async fn fetch_history(&self, auth: &RequestAuth) -> TransportResult<Vec<Message>> {
        let res = self.execute(self.request(Method::GET, "/", auth)).await?;
        return HttpTransport::decode_history(res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn send_prompt(
        &self,
        auth: &RequestAuth,
        endpoint: PromptEndpoint,
        prompt: &str,
    ) -> TransportResult<()> {
        let body = PromptRequest {
            prompt: prompt.to_string(),
        };
        self.execute(self.request(Method::POST, endpoint.path(), auth).json(&body))
            .await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn reset_history(&self, auth: &RequestAuth) -> TransportResult<Vec<Message>> {
        let res = self.execute(self.request(Method::DELETE, "/", auth)).await?;
        return HttpTransport::decode_history(res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn init_page(&self, auth: &RequestAuth, page_url: &str) -> TransportResult<()> {
        let body = InitRequest {
            page_url: page_url.to_string(),
        };
        self.execute(self.request(Method::POST, "/init", auth).json(&body))
            .await?;

        return Ok(());
    }
}
