use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::models::ChatTransport;
use crate::domain::models::Message;
use crate::domain::models::PromptEndpoint;
use crate::domain::models::RequestAuth;
use crate::domain::models::Role;
use crate::domain::models::TransportError;
use crate::domain::models::TransportResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FakeCall {
    FetchHistory { api_key: String, model_id: String },
    SendPrompt { endpoint: PromptEndpoint, prompt: String },
    ResetHistory,
    InitPage(String),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<FakeCall>,
    history: Vec<Message>,
    seed: Vec<Message>,
    reply: String,
    fetch_status: Option<u16>,
    send_status: Option<u16>,
    reset_status: Option<u16>,
    init_status: Option<u16>,
    fetch_timeout: bool,
}

/// In-process stand-in for a chat backend. Clones share state, so a test can
/// keep a handle after boxing one into a controller.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeTransport {
    fn default() -> FakeTransport {
        return FakeTransport {
            state: Arc::new(Mutex::new(FakeState {
                reply: "hi!".to_string(),
                ..FakeState::default()
            })),
        };
    }
}

fn failure(status: Option<u16>) -> TransportResult<()> {
    if let Some(code) = status {
        return Err(TransportError::from_status(code, "fake failure".to_string()));
    }

    return Ok(());
}

impl FakeTransport {
    /// History the server starts with and returns to after a reset.
    pub fn with_seed(seed: Vec<Message>) -> FakeTransport {
        let transport = FakeTransport::default();
        {
            let mut state = transport.state.lock().unwrap();
            state.history = seed.clone();
            state.seed = seed;
        }

        return transport;
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        return self.state.lock().unwrap().calls.clone();
    }

    pub fn server_history(&self) -> Vec<Message> {
        return self.state.lock().unwrap().history.clone();
    }

    pub fn fail_fetch(&self, status: u16) {
        self.state.lock().unwrap().fetch_status = Some(status);
    }

    pub fn timeout_fetch(&self) {
        self.state.lock().unwrap().fetch_timeout = true;
    }

    pub fn fail_send(&self, status: u16) {
        self.state.lock().unwrap().send_status = Some(status);
    }

    pub fn fail_reset(&self, status: u16) {
        self.state.lock().unwrap().reset_status = Some(status);
    }

    pub fn fail_init(&self, status: u16) {
        self.state.lock().unwrap().init_status = Some(status);
    }

    pub fn recover(&self) {
        let mut state = self.state.lock().unwrap();
        state.fetch_status = None;
        state.send_status = None;
        state.reset_status = None;
        state.init_status = None;
        state.fetch_timeout = false;
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    #[allow(clippy::implicit_return)]
    async fn fetch_history(&self, auth: &RequestAuth) -> TransportResult<Vec<Message>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::FetchHistory {
            api_key: auth.api_key().to_string(),
            model_id: auth.model_id.to_string(),
        });
        if state.fetch_timeout {
            return Err(TransportError::Timeout);
        }
        failure(state.fetch_status)?;

        return Ok(state.history.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn send_prompt(
        &self,
        _auth: &RequestAuth,
        endpoint: PromptEndpoint,
        prompt: &str,
    ) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::SendPrompt {
            endpoint,
            prompt: prompt.to_string(),
        });
        failure(state.send_status)?;

        let reply = state.reply.to_string();
        state.history.push(Message::user(prompt));
        state.history.push(Message::new(Role::Assistant, &reply));

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn reset_history(&self, _auth: &RequestAuth) -> TransportResult<Vec<Message>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::ResetHistory);
        failure(state.reset_status)?;

        state.history = state.seed.clone();
        return Ok(state.history.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn init_page(&self, _auth: &RequestAuth, page_url: &str) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::InitPage(page_url.to_string()));
        return failure(state.init_status);
    }
}
