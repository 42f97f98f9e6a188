pub mod chat;
pub mod client;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod emitter;
pub mod session;
pub mod signal;
pub mod sinks;
pub mod transport;

pub use brainchat_types as types;
pub use client::{connect, connect_with_config, Client, ServerRx};
pub use session::{Input, Mode, Session};
pub use transport::{Transport, TransportError, TransportEvent};

#[cfg(feature = "utils")]
pub use brainchat_utils as utils;
