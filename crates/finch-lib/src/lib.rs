//! finch-lib: USB HID connection and protocol core for Finch robots.

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod keepalive;
pub mod protocol;
pub mod registry;
pub mod retry;
pub mod robot;
pub mod transport;

pub use connection::FinchConnection;
pub use error::FinchError;
pub use registry::ConnectionRegistry;
pub use robot::Finch;
