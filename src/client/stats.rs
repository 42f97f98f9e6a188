use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    signals_sent: u64,
    texts_sent: u64,
    responses_received: u64,
    publish_failures: u64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_signal_sent(&mut self) {
        self.signals_sent += 1;
    }

    pub(crate) fn record_text_sent(&mut self) {
        self.texts_sent += 1;
    }

    pub(crate) fn record_response(&mut self) {
        self.responses_received += 1;
    }

    pub(crate) fn record_publish_failure(&mut self) {
        self.publish_failures += 1;
    }

    pub fn signals_sent(&self) -> u64 {
        self.signals_sent
    }

    pub fn texts_sent(&self) -> u64 {
        self.texts_sent
    }

    pub fn responses_received(&self) -> u64 {
        self.responses_received
    }

    pub fn publish_failures(&self) -> u64 {
        self.publish_failures
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "signals sent: {}, texts sent: {}, responses received: {}, publish failures: {}",
            self.signals_sent, self.texts_sent, self.responses_received, self.publish_failures
        )
    }
}
