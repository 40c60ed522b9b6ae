#[cfg(test)]
#[path = "chat_command_test.rs"]
mod tests;

/// Commands handled by the terminal frontend itself. `/image` is deliberately
/// absent: image prompts go to the backend, see `PromptEndpoint::route`.
pub struct ChatCommand {
    command: String,
    pub args: Vec<String>,
}

impl ChatCommand {
    pub fn parse(text: &str) -> Option<ChatCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }

        let prefix = args.remove(0);
        let cmd = ChatCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_reset()
            || cmd.is_refresh()
            || cmd.is_logout()
            || cmd.is_model()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_reset(&self) -> bool {
        return ["/reset", "/clear"].contains(&self.command.as_str());
    }

    pub fn is_refresh(&self) -> bool {
        return self.command == "/refresh";
    }

    pub fn is_logout(&self) -> bool {
        return self.command == "/logout";
    }

    pub fn is_model(&self) -> bool {
        return ["/m", "/model"].contains(&self.command.as_str());
    }
}
