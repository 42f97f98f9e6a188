#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    message: String,
}

impl ErrorEvent {
    pub fn message(&self) -> &str {
        &self.message
    }
}
