use crate::signal::SignalSample;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BrainSignalEvent {
    signal: SignalSample,
}

impl BrainSignalEvent {
    pub fn new(signal: SignalSample) -> Self {
        Self { signal }
    }

    pub fn signal(&self) -> &SignalSample {
        &self.signal
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TextInputEvent {
    text: String,
}

impl TextInputEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
