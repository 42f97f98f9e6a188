pub const DEFAULT_URL: &str = "ws://127.0.0.1:5000/ws";
pub const DEFAULT_CAPACITY: usize = 1024;

pub const USER_AGENT_HEADER: &str = "User-Agent";
pub const USER_AGENT: &str = concat!("brainchat/", env!("CARGO_PKG_VERSION"));
