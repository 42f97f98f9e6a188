use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResponseError {
    #[error("agent response is missing the required `text` field")]
    MissingText,
}

/// Frequency bins and their power, as two parallel sequences.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrequencySpectrum {
    frequencies: Vec<f32>,
    powers: Vec<f32>,
}

impl FrequencySpectrum {
    pub fn new(frequencies: Vec<f32>, powers: Vec<f32>) -> Self {
        Self { frequencies, powers }
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    pub fn powers(&self) -> &[f32] {
        &self.powers
    }

    /// Frequency/power pairs; extra values on the longer side are ignored.
    pub fn bins(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.frequencies.iter().copied().zip(self.powers.iter().copied())
    }
}

/// Server-side analysis of the signal that produced a response.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BrainData {
    #[serde(default, alias = "rawSignal", skip_serializing_if = "Option::is_none")]
    raw_signal: Option<Vec<f32>>,
    #[serde(default, alias = "frequencySpectrum", skip_serializing_if = "Option::is_none")]
    frequency_spectrum: Option<FrequencySpectrum>,
    /// Keyed by band name as sent by the server; unknown names are kept here
    /// and filtered when rendered.
    #[serde(default, alias = "bandPowers", skip_serializing_if = "Option::is_none")]
    band_powers: Option<BTreeMap<String, f32>>,
}

impl BrainData {
    pub fn raw_signal(&self) -> Option<&[f32]> {
        self.raw_signal.as_deref()
    }

    pub fn frequency_spectrum(&self) -> Option<&FrequencySpectrum> {
        self.frequency_spectrum.as_ref()
    }

    pub fn band_powers(&self) -> Option<&BTreeMap<String, f32>> {
        self.band_powers.as_ref()
    }
}

/// An `ai_response` payload exactly as received. Every field is optional on
/// the wire; [`AgentResponse::try_from`] enforces the required ones.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AgentResponsePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, alias = "brainData", skip_serializing_if = "Option::is_none")]
    brain_data: Option<BrainData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
    #[serde(default, alias = "thinkingProcess", skip_serializing_if = "Option::is_none")]
    thinking_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<Vec<f32>>,
}

impl AgentResponsePayload {
    pub fn builder() -> AgentResponsePayloadBuilder {
        AgentResponsePayloadBuilder::new()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

pub struct AgentResponsePayloadBuilder {
    payload: AgentResponsePayload,
}

impl Default for AgentResponsePayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentResponsePayloadBuilder {
    pub fn new() -> Self {
        Self {
            payload: AgentResponsePayload::default(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.payload.text = Some(text.to_string());
        self
    }

    pub fn with_raw_signal(mut self, raw_signal: Vec<f32>) -> Self {
        self.brain_data().raw_signal = Some(raw_signal);
        self
    }

    pub fn with_frequency_spectrum(mut self, spectrum: FrequencySpectrum) -> Self {
        self.brain_data().frequency_spectrum = Some(spectrum);
        self
    }

    pub fn with_band_power(mut self, band: &str, power: f32) -> Self {
        self.brain_data()
            .band_powers
            .get_or_insert_with(BTreeMap::new)
            .insert(band.to_string(), power);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.payload.confidence = Some(confidence);
        self
    }

    pub fn with_thinking_process(mut self, thinking_process: &str) -> Self {
        self.payload.thinking_process = Some(thinking_process.to_string());
        self
    }

    pub fn with_audio(mut self, audio: Vec<f32>) -> Self {
        self.payload.audio = Some(audio);
        self
    }

    pub fn build(self) -> AgentResponsePayload {
        self.payload
    }

    fn brain_data(&mut self) -> &mut BrainData {
        self.payload.brain_data.get_or_insert_with(BrainData::default)
    }
}

/// A validated agent response, ready to be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    text: String,
    brain_data: Option<BrainData>,
    confidence: Option<f32>,
    thinking_process: Option<String>,
    audio: Option<Vec<f32>>,
}

impl AgentResponse {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn brain_data(&self) -> Option<&BrainData> {
        self.brain_data.as_ref()
    }

    /// `Some(0.0)` is a real confidence, distinct from an absent one.
    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    pub fn thinking_process(&self) -> Option<&str> {
        self.thinking_process.as_deref()
    }

    pub fn audio(&self) -> Option<&[f32]> {
        self.audio.as_deref()
    }
}

impl TryFrom<AgentResponsePayload> for AgentResponse {
    type Error = ResponseError;

    fn try_from(payload: AgentResponsePayload) -> Result<Self, Self::Error> {
        let text = payload.text.ok_or(ResponseError::MissingText)?;
        Ok(Self {
            text,
            brain_data: payload.brain_data,
            confidence: payload.confidence,
            thinking_process: payload.thinking_process,
            audio: payload.audio,
        })
    }
}
