use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chat::{MessageLog, Origin};
use crate::sinks::Sinks;
use crate::types::{AgentResponse, AgentResponsePayload, Band, BrainData, ResponseError};

/// Shown when a response carries no thinking process.
pub const THINKING_PLACEHOLDER: &str = "Processing response...";

/// Response audio is mono PCM at this rate.
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Fans one agent response out to the message log and the sinks.
pub struct Dispatcher {
    rng: StdRng,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeds the generator behind the placeholder confidence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Handles one response completely and returns its log position.
    ///
    /// A payload without text is rejected before the log or any sink is
    /// touched.
    pub fn dispatch(
        &mut self,
        payload: AgentResponsePayload,
        log: &mut MessageLog,
        sinks: &mut Sinks,
    ) -> Result<usize, ResponseError> {
        let response = AgentResponse::try_from(payload)?;

        let entry = log.append(response.text().to_string(), Origin::Agent);
        sinks.dashboard.show_message(entry);
        let position = entry.position();

        if let Some(brain_data) = response.brain_data() {
            render_brain_data(brain_data, sinks);
        }

        let confidence = match response.confidence() {
            Some(confidence) => unit_interval(confidence),
            None => self.rng.gen_range(0.0..=1.0),
        };
        sinks.dashboard.set_confidence(confidence);

        sinks
            .dashboard
            .set_thinking_process(response.thinking_process().unwrap_or(THINKING_PLACEHOLDER));

        if let Some(audio) = response.audio() {
            if audio.is_empty() {
                tracing::debug!("ignoring empty audio buffer");
            } else {
                sinks.audio.play(audio, AUDIO_SAMPLE_RATE);
            }
        }

        tracing::debug!("dispatched agent response #{}", position);
        Ok(position)
    }
}

fn render_brain_data(brain_data: &BrainData, sinks: &mut Sinks) {
    if let Some(raw_signal) = brain_data.raw_signal() {
        sinks.dashboard.plot_time_series(raw_signal);
    }
    if let Some(spectrum) = brain_data.frequency_spectrum() {
        sinks.dashboard.plot_spectrum(spectrum);
    }
    if let Some(band_powers) = brain_data.band_powers() {
        sinks.dashboard.set_band_intensities(&band_intensities(band_powers));
    }
}

/// Maps band powers to indicator intensities, keeping only known bands.
pub fn band_intensities(band_powers: &BTreeMap<String, f32>) -> BTreeMap<Band, f32> {
    band_powers
        .iter()
        .filter_map(|(name, &power)| match name.parse::<Band>() {
            Ok(band) => Some((band, unit_interval(power))),
            Err(_) => {
                tracing::debug!("ignoring unknown band {:?}", name);
                None
            }
        })
        .collect()
}

fn unit_interval(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
