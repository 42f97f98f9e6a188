pub mod client;
pub mod server;

use client::*;
use server::*;

use crate::response::AgentResponsePayload;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "brain_signal")]
    BrainSignal(BrainSignalEvent),
    #[serde(rename = "text_input")]
    TextInput(TextInputEvent),
}

impl ClientEvent {
    /// Wire name of the event, as it appears in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::BrainSignal(_) => "brain_signal",
            ClientEvent::TextInput(_) => "text_input",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "close")]
    Close {
        reason: Option<String>,
    },
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "ai_response")]
    AiResponse(AgentResponsePayload),
}
