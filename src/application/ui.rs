#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io;
use std::io::Write;

use anyhow::bail;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use dialoguer::Select;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatCommand;
use crate::domain::models::ChatError;
use crate::domain::models::CredentialStoreName;
use crate::domain::models::Message;
use crate::domain::models::MessageLog;
use crate::domain::models::Role;
use crate::domain::models::SessionState;
use crate::domain::services::SessionController;
use crate::domain::services::SessionOptions;
use crate::infrastructure::credentials::CredentialStoreManager;
use crate::infrastructure::transports::http::HttpTransport;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /image [PROMPT] - Sends the prompt to the image endpoint of the backend instead of the chat endpoint.
- /reset (/clear) - Clears the chat history kept by the backend.
- /refresh - Reloads the chat history from the backend.
- /model (/m) - Shows the active model. The model can only be chosen before the chat starts.
- /logout - Forgets the stored API key and starts a new session.
- /quit /exit (/q) - Exit parley.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

fn paint_label(role: Role) -> Paint<&'static str> {
    match role {
        Role::System => return Paint::new("system").dimmed(),
        Role::User => return Paint::cyan("you").bold(),
        Role::Assistant => return Paint::green("assistant").bold(),
        Role::Info => return Paint::yellow("info"),
        Role::Image => return Paint::magenta("image"),
        Role::Unknown => return Paint::new("other").dimmed(),
    }
}

pub fn format_message(message: &Message) -> String {
    return format!("{}: {}", paint_label(message.role), message.content);
}

#[derive(Debug, PartialEq, Eq)]
pub enum RenderUpdate {
    Unchanged,
    Append(Vec<Message>),
    Reprint(Vec<Message>),
}

/// Tracks what has been printed so only new messages are written when the
/// log grows, and the whole conversation is reprinted when it was replaced
/// with something else.
#[derive(Default)]
pub struct Renderer {
    shown: Vec<Message>,
}

impl Renderer {
    pub fn update(&mut self, log: &MessageLog) -> RenderUpdate {
        let next = log.displayable().cloned().collect::<Vec<Message>>();

        let res = if next == self.shown {
            RenderUpdate::Unchanged
        } else if next.len() > self.shown.len() && next.starts_with(&self.shown) {
            RenderUpdate::Append(next[self.shown.len()..].to_vec())
        } else {
            RenderUpdate::Reprint(next.clone())
        };

        self.shown = next;
        return res;
    }

    pub fn forget(&mut self) {
        self.shown.clear();
    }

    pub fn render(&mut self, log: &MessageLog) {
        match self.update(log) {
            RenderUpdate::Unchanged => {}
            RenderUpdate::Append(messages) => {
                print_messages(&messages);
            }
            RenderUpdate::Reprint(messages) => {
                println!("{}", Paint::new("--- chat history ---").dimmed());
                if messages.is_empty() {
                    println!("{}", Paint::new("(empty)").dimmed());
                }
                print_messages(&messages);
            }
        }
    }
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        println!("{}", format_message(message));
    }
}

fn print_info(text: &str) {
    println!("{}", Paint::yellow(text));
}

fn print_error(err: &ChatError) {
    eprintln!("{}", Paint::red(format!("Error: {err}")));
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    return Some(value.to_string());
}

/// Answers the questions asked while a session is being opened.
pub trait Prompter {
    /// `rejected` is set when the backend turned the previous key down.
    fn credential(&mut self, rejected: bool) -> Result<String>;
    fn model(&mut self, models: &[String]) -> Result<String>;
    fn target_url(&mut self) -> Result<String>;
}

pub struct DialoguerPrompter {}

impl Prompter for DialoguerPrompter {
    fn credential(&mut self, rejected: bool) -> Result<String> {
        if rejected {
            print_info("The backend rejected the API key, please enter a new one.");
        }

        let key = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("API key")
            .allow_empty_password(true)
            .interact()?;

        return Ok(key);
    }

    fn model(&mut self, models: &[String]) -> Result<String> {
        if models.is_empty() {
            let model = Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt("Model")
                .interact_text()?;
            return Ok(model);
        }

        let idx = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Which model would you like to chat with?")
            .default(0)
            .items(models)
            .interact()?;

        return Ok(models[idx].to_string());
    }

    fn target_url(&mut self) -> Result<String> {
        let url = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Page URL")
            .interact_text()?;

        return Ok(url);
    }
}

/// Values applied to every new session before anything is asked. Blank
/// values count as unset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionDefaults {
    pub model: Option<String>,
    pub target_url: Option<String>,
    pub models: Vec<String>,
}

impl SessionDefaults {
    pub fn new(model: &str, target_url: &str, models: Vec<String>) -> SessionDefaults {
        return SessionDefaults {
            model: non_blank(model),
            target_url: non_blank(target_url),
            models,
        };
    }

    pub fn from_config() -> SessionDefaults {
        return SessionDefaults::new(
            &Config::get(ConfigKey::Model),
            &Config::get(ConfigKey::TargetURL),
            Config::get_list(ConfigKey::Models),
        );
    }
}

pub struct Frontend {
    controller: SessionController,
    renderer: Renderer,
    prompter: Box<dyn Prompter>,
    defaults: SessionDefaults,
}

impl Frontend {
    pub fn new(
        controller: SessionController,
        prompter: Box<dyn Prompter>,
        defaults: SessionDefaults,
    ) -> Frontend {
        return Frontend {
            controller,
            renderer: Renderer::default(),
            prompter,
            defaults,
        };
    }

    /// Asks for an API key until the controller accepts one. Does nothing
    /// unless the controller is waiting for a credential.
    pub fn ensure_credential(&mut self) -> Result<()> {
        if !self.controller.input_disabled() {
            return Ok(());
        }

        while self.controller.state() == SessionState::AwaitingCredential {
            let key = self
                .prompter
                .credential(self.controller.credential_rejected())?;

            if let Err(err) = self.controller.supply_credential(&key) {
                print_error(&err);
            }
        }

        return Ok(());
    }

    fn ensure_model(&mut self) -> Result<()> {
        if !self.controller.session().model_id.is_empty() {
            return Ok(());
        }

        let model = match &self.defaults.model {
            Some(model) => model.to_string(),
            None => self.prompter.model(&self.defaults.models)?,
        };
        self.controller.select_model(&model);

        return Ok(());
    }

    fn ensure_target_url(&mut self) -> Result<()> {
        if !self.controller.session().target_url.is_empty() {
            return Ok(());
        }

        let url = match &self.defaults.target_url {
            Some(url) => url.to_string(),
            None if self.controller.options().require_target_url => {
                self.prompter.target_url()?
            }
            None => return Ok(()),
        };
        self.controller.set_target_url(&url);

        return Ok(());
    }

    /// Collects whatever the session is missing and starts it. Backend
    /// failures are reported and leave the session closed, the next line of
    /// input tries again. Only prompt failures are returned.
    pub async fn open_session(&mut self) -> Result<()> {
        if self.controller.session().enabled {
            return Ok(());
        }
        self.controller.startup();

        loop {
            if !self.controller.has_credential() {
                self.ensure_credential()?;
            }
            self.ensure_model()?;
            self.ensure_target_url()?;

            let res = self.controller.start().await;
            if self.controller.session().enabled {
                self.renderer.render(self.controller.messages());
                if let Err(err) = res {
                    print_error(&err);
                    print_info("Use /refresh to try loading the chat history again.");
                }
                return Ok(());
            }

            let err = match res {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };
            print_error(&err);

            // Each of these sends the loop back to a prompt.
            if err.is_credential() || matches!(err, ChatError::Precondition(_)) {
                continue;
            }

            print_info("The chat has not started. Press enter to try again, or /quit to exit.");
            return Ok(());
        }
    }

    /// Reports a failed request. A rejected key leaves the controller waiting
    /// for a new one, which `ensure_credential` asks for before the next line.
    fn handle_chat_error(&mut self, err: ChatError) {
        print_error(&err);
        self.renderer.render(self.controller.messages());

        if err.is_credential() {
            print_info("Enter a new API key, then try again.");
        }
    }

    async fn submit(&mut self, text: &str) {
        match self.controller.begin_submit(text) {
            Ok(true) => {}
            Ok(false) => return,
            Err(err) => return self.handle_chat_error(err),
        }

        self.renderer.render(self.controller.messages());
        if self.controller.indicators().assistant_loading {
            println!("{}", Paint::new("thinking...").dimmed());
        }

        if let Err(err) = self.controller.complete_submit().await {
            return self.handle_chat_error(err);
        }

        self.renderer.render(self.controller.messages());
    }

    async fn handle_command(&mut self, cmd: ChatCommand) -> Result<()> {
        if cmd.is_help() {
            println!("{}", help_text());
        } else if cmd.is_reset() {
            match self.controller.reset().await {
                Ok(()) => {
                    print_info("Chat history cleared.");
                    self.renderer.render(self.controller.messages());
                }
                Err(err) => self.handle_chat_error(err),
            }
        } else if cmd.is_refresh() {
            match self.controller.refresh().await {
                Ok(()) => self.renderer.render(self.controller.messages()),
                Err(err) => self.handle_chat_error(err),
            }
        } else if cmd.is_model() {
            let requested = cmd.args.join(" ");
            if !requested.is_empty() && self.controller.select_model(&requested) {
                print_info(&format!("Model set to {requested}."));
            } else {
                print_info(&format!(
                    "Chatting with {}. The model can only be chosen before the chat starts, use /logout to start over.",
                    self.controller.session().model_id
                ));
            }
        } else if cmd.is_logout() {
            if let Err(err) = self.controller.logout() {
                print_error(&err);
            }
            self.renderer.forget();
            print_info("Logged out.");
            self.open_session().await?;
        }

        return Ok(());
    }

    /// Handles one line of input. Returns false when the user asked to quit.
    pub async fn handle_line(&mut self, line: &str) -> Result<bool> {
        self.controller.on_user_input_changed(line);
        let cmd = ChatCommand::parse(line);

        if cmd.as_ref().map(|e| return e.is_quit()).unwrap_or(false) {
            return Ok(false);
        }

        if !self.controller.session().enabled {
            self.open_session().await?;
            return Ok(true);
        }

        match cmd {
            Some(cmd) => self.handle_command(cmd).await?,
            None => self.submit(line).await,
        }

        return Ok(true);
    }
}

pub async fn start() -> Result<()> {
    let store_name = match CredentialStoreName::parse(Config::get(ConfigKey::CredentialStore)) {
        Some(name) => name,
        None => bail!(format!(
            "Unknown credential store '{}'",
            Config::get(ConfigKey::CredentialStore)
        )),
    };

    let options = SessionOptions {
        require_target_url: Config::get_bool(ConfigKey::RequireTargetURL),
        init_page: Config::get_bool(ConfigKey::InitPage),
    };
    let controller = SessionController::new(
        Box::new(HttpTransport::from_config()?),
        CredentialStoreManager::get(store_name)?,
        options,
    );
    let mut frontend = Frontend::new(
        controller,
        Box::new(DialoguerPrompter {}),
        SessionDefaults::from_config(),
    );

    frontend.open_session().await?;
    print_info("Type /help for a list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        frontend.ensure_credential()?;

        print!("{} ", Paint::cyan(">").bold());
        io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        if !frontend.handle_line(&line).await? {
            break;
        }
    }

    return Ok(());
}
