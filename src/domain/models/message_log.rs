#[cfg(test)]
#[path = "message_log_test.rs"]
mod tests;

use super::Message;

/// Ordered chat history. Local changes only ever append; anything the server
/// says about the history replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new(messages: Vec<Message>) -> MessageLog {
        return MessageLog { messages };
    }

    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn last(&self) -> Option<&Message> {
        return self.messages.last();
    }

    pub fn len(&self) -> usize {
        return self.messages.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.messages.is_empty();
    }

    pub fn displayable(&self) -> impl Iterator<Item = &Message> {
        return self.messages.iter().filter(|msg| return msg.is_displayable());
    }
}
