mod chat_command;
mod credential;
mod error;
mod indicator;
mod message;
mod message_log;
mod session;
mod transport;

pub use chat_command::*;
pub use credential::*;
pub use error::*;
pub use indicator::*;
pub use message::*;
pub use message_log::*;
pub use session::*;
pub use transport::*;
