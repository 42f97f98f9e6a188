use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use crate::client::config::Config;
use crate::client::consts::{USER_AGENT, USER_AGENT_HEADER};
use crate::transport::TransportError;

pub fn build_request(config: &Config) -> Result<Request, TransportError> {
    let url = config.url();
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        return Err(TransportError::InvalidUrl(url.to_string()));
    }
    let mut request = url.into_client_request()?;
    request.headers_mut().insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));
    Ok(request)
}
