mod dispatcher;
#[cfg(test)]
pub mod fake_transport;
mod session_controller;

pub use dispatcher::*;
pub use session_controller::*;
