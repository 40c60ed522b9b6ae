pub mod credentials;
pub mod transports;
