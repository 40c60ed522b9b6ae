#[cfg(test)]
#[path = "session_controller_test.rs"]
mod tests;

use super::RequestDispatcher;
use crate::domain::models::ChatError;
use crate::domain::models::Credential;
use crate::domain::models::CredentialStoreBox;
use crate::domain::models::IndicatorState;
use crate::domain::models::Message;
use crate::domain::models::MessageLog;
use crate::domain::models::RequestAuth;
use crate::domain::models::Session;
use crate::domain::models::SessionState;
use crate::domain::models::TransportBox;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// `start` refuses to run without a target URL.
    pub require_target_url: bool,
    /// `start` asks the backend to initialise the target URL first.
    pub init_page: bool,
}

/// Owns everything a chat session needs: the credential, the selected model
/// and URL, the message log and the indicator flags.
///
/// Every operation that talks to the backend takes `&mut self`, so at most
/// one request is in flight per controller. The state is `Busy` for the
/// duration of a request and returns to `Idle` however it settles, unless the
/// backend rejected the credential, in which case the controller goes back to
/// `AwaitingCredential`.
pub struct SessionController {
    dispatcher: RequestDispatcher,
    store: CredentialStoreBox,
    options: SessionOptions,
    credential: Option<Credential>,
    credential_rejected: bool,
    session: Session,
    state: SessionState,
    log: MessageLog,
    indicators: IndicatorState,
    pending: Option<String>,
}

impl SessionController {
    pub fn new(
        transport: TransportBox,
        store: CredentialStoreBox,
        options: SessionOptions,
    ) -> SessionController {
        return SessionController {
            dispatcher: RequestDispatcher::new(transport),
            store,
            options,
            credential: None,
            credential_rejected: false,
            session: Session::default(),
            state: SessionState::Uninitialized,
            log: MessageLog::default(),
            indicators: IndicatorState::default(),
            pending: None,
        };
    }

    pub fn state(&self) -> SessionState {
        return self.state;
    }

    pub fn session(&self) -> &Session {
        return &self.session;
    }

    pub fn messages(&self) -> &MessageLog {
        return &self.log;
    }

    pub fn indicators(&self) -> IndicatorState {
        return self.indicators;
    }

    pub fn options(&self) -> SessionOptions {
        return self.options;
    }

    pub fn has_credential(&self) -> bool {
        return self.credential.is_some();
    }

    /// True after the backend turned the last credential down and no new one
    /// has been supplied yet.
    pub fn credential_rejected(&self) -> bool {
        return self.credential_rejected;
    }

    pub fn input_disabled(&self) -> bool {
        return self.state != SessionState::Idle;
    }

    /// Loads a stored credential. Without one the controller waits in
    /// `AwaitingCredential` until `supply_credential` is called.
    pub fn startup(&mut self) -> SessionState {
        if self.state != SessionState::Uninitialized
            && self.state != SessionState::AwaitingCredential
        {
            return self.state;
        }

        match self.store.get() {
            Ok(Some(credential)) => {
                tracing::debug!(store = %self.store.name(), "Loaded stored credential");
                self.credential = Some(credential);
                self.state = SessionState::Idle;
            }
            Ok(None) => {
                self.state = SessionState::AwaitingCredential;
            }
            Err(err) => {
                tracing::warn!(error = ?err, store = %self.store.name(), "Failed to read stored credential");
                self.state = SessionState::AwaitingCredential;
            }
        }

        return self.state;
    }

    pub fn supply_credential(&mut self, value: &str) -> Result<(), ChatError> {
        if self.state != SessionState::AwaitingCredential {
            return Err(ChatError::Precondition(format!(
                "a credential can only be supplied while awaiting one, the session is {}",
                self.state
            )));
        }

        let credential = Credential::new(value.trim());
        if credential.is_blank() {
            return Err(ChatError::precondition("the API key must not be empty"));
        }

        if let Err(err) = self.store.set(&credential) {
            tracing::error!(error = ?err, store = %self.store.name(), "Failed to persist credential");
            return Err(ChatError::Store(err));
        }

        self.credential = Some(credential);
        self.credential_rejected = false;
        self.state = SessionState::Idle;

        return Ok(());
    }

    /// Returns false, changing nothing, once the session is enabled.
    pub fn select_model(&mut self, model_id: &str) -> bool {
        if self.session.enabled {
            return false;
        }

        self.session.model_id = model_id.trim().to_string();
        return true;
    }

    /// Returns false, changing nothing, once the session is enabled.
    pub fn set_target_url(&mut self, url: &str) -> bool {
        if self.session.enabled {
            return false;
        }

        self.session.target_url = url.trim().to_string();
        return true;
    }

    pub fn on_user_input_changed(&mut self, text: &str) {
        self.indicators.on_user_input_changed(text);
    }

    /// Enables the session and loads its history. A failed history load is
    /// returned, but the session stays enabled so the user can refresh.
    pub async fn start(&mut self) -> Result<(), ChatError> {
        if self.session.enabled {
            return Err(ChatError::precondition("the session has already started"));
        }

        let mut missing = self.session.missing_fields(self.options.require_target_url);
        if self.credential.is_none() {
            missing.push("credential");
        }
        if !missing.is_empty() {
            return Err(ChatError::Precondition(format!(
                "cannot start the session, missing {}",
                missing.join(", ")
            )));
        }
        self.ensure_idle()?;

        let auth = self.auth()?;
        self.state = SessionState::Busy;

        if self.options.init_page && !self.session.target_url.is_empty() {
            let res = self
                .dispatcher
                .init_page(&auth, &self.session.target_url)
                .await;
            if res.is_err() {
                return self.settle(res);
            }
        }

        self.session.enabled = true;
        tracing::debug!(model = %self.session.model_id, target_url = %self.session.target_url, "Session started");

        let res = self.dispatcher.fetch_history(&auth, &mut self.log).await;
        return self.settle(res);
    }

    /// Echoes the message into the log and sends it, see `begin_submit` and
    /// `complete_submit` for the two halves.
    pub async fn submit(&mut self, text: &str) -> Result<(), ChatError> {
        if !self.begin_submit(text)? {
            return Ok(());
        }

        return self.complete_submit().await;
    }

    /// Appends the optimistic user message and raises the loading flag. The
    /// session is `Busy` until `complete_submit` settles. Returns false for
    /// blank input, which is ignored.
    pub fn begin_submit(&mut self, text: &str) -> Result<bool, ChatError> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.ensure_enabled()?;
        self.ensure_idle()?;
        self.auth()?;

        self.log.append(Message::user(text));
        self.indicators.on_submit();
        self.pending = Some(text.to_string());
        self.state = SessionState::Busy;

        return Ok(true);
    }

    /// Sends the message queued by `begin_submit`. The echo is never rolled
    /// back; on success the log is replaced with the server history.
    pub async fn complete_submit(&mut self) -> Result<(), ChatError> {
        let text = match self.pending.take() {
            Some(text) => text,
            None => return Err(ChatError::precondition("there is no message waiting to be sent")),
        };

        let res = match self.auth() {
            Ok(auth) => self.dispatcher.send_message(&auth, &text, &mut self.log).await,
            Err(err) => Err(err),
        };

        return self.settle(res);
    }

    /// Clears server side history. Does not change whether the session is
    /// enabled.
    pub async fn reset(&mut self) -> Result<(), ChatError> {
        self.ensure_idle()?;
        let auth = self.auth()?;
        self.state = SessionState::Busy;

        let res = self.dispatcher.reset_history(&auth, &mut self.log).await;
        return self.settle(res);
    }

    /// Re-fetches history on request.
    pub async fn refresh(&mut self) -> Result<(), ChatError> {
        self.ensure_idle()?;
        let auth = self.auth()?;
        self.state = SessionState::Busy;

        let res = self.dispatcher.fetch_history(&auth, &mut self.log).await;
        return self.settle(res);
    }

    /// Forgets the credential and the session. The controller waits for a new
    /// credential afterwards.
    pub fn logout(&mut self) -> Result<(), ChatError> {
        if self.state == SessionState::Busy {
            return Err(ChatError::precondition("cannot log out while a request is running"));
        }

        let res = self.store.clear().map_err(|err| {
            tracing::error!(error = ?err, store = %self.store.name(), "Failed to clear credential");
            return ChatError::Store(err);
        });

        self.credential = None;
        self.credential_rejected = false;
        self.session = Session::default();
        self.log.clear();
        self.indicators = IndicatorState::default();
        self.pending = None;
        self.state = SessionState::AwaitingCredential;

        return res;
    }

    fn ensure_idle(&self) -> Result<(), ChatError> {
        if self.state != SessionState::Idle {
            return Err(ChatError::Precondition(format!(
                "the session is {}, try again once it is idle",
                self.state
            )));
        }

        return Ok(());
    }

    fn ensure_enabled(&self) -> Result<(), ChatError> {
        if !self.session.enabled {
            return Err(ChatError::precondition("the session has not been started"));
        }

        return Ok(());
    }

    fn auth(&self) -> Result<RequestAuth, ChatError> {
        let credential = match &self.credential {
            Some(credential) => credential.clone(),
            None => return Err(ChatError::precondition("no API key has been supplied")),
        };
        if self.session.model_id.is_empty() {
            return Err(ChatError::precondition("no model has been selected"));
        }

        return Ok(RequestAuth::new(credential, &self.session.model_id));
    }

    fn settle(&mut self, res: Result<(), ChatError>) -> Result<(), ChatError> {
        self.indicators.on_settle();
        self.state = SessionState::Idle;

        if let Err(err) = &res {
            if err.is_credential() {
                self.reject_credential();
            }
        }

        return res;
    }

    fn reject_credential(&mut self) {
        tracing::warn!("Backend rejected the credential, waiting for a new one");
        if let Err(err) = self.store.clear() {
            tracing::error!(error = ?err, store = %self.store.name(), "Failed to clear rejected credential");
        }

        self.credential = None;
        self.credential_rejected = true;
        self.state = SessionState::AwaitingCredential;
    }
}
