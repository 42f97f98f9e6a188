use std::collections::BTreeMap;

use crate::chat::ChatEntry;
use crate::session::Mode;
use crate::types::{Band, FrequencySpectrum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Connected,
    NoDevice,
}

/// Every visual surface the session draws on.
#[cfg_attr(test, mockall::automock)]
pub trait Dashboard {
    /// Switches between the streaming indicator and the text entry area.
    fn show_mode(&mut self, mode: Mode);
    fn show_message(&mut self, entry: &ChatEntry);
    fn set_connection_status(&mut self, status: ConnectionStatus);
    fn set_device_status(&mut self, status: DeviceStatus);
    fn plot_time_series(&mut self, samples: &[f32]);
    fn plot_spectrum(&mut self, spectrum: &FrequencySpectrum);
    /// Intensities are in `[0, 1]`.
    fn set_band_intensities(&mut self, intensities: &BTreeMap<Band, f32>);
    /// `confidence` is the filled proportion of the meter, in `[0, 1]`.
    fn set_confidence(&mut self, confidence: f32);
    fn set_thinking_process(&mut self, text: &str);
}

#[cfg_attr(test, mockall::automock)]
pub trait AudioSink {
    /// Plays a mono buffer once.
    fn play(&mut self, pcm: &[f32], sample_rate: u32);
}

/// Audio sink for builds and sessions without an output device.
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, pcm: &[f32], sample_rate: u32) {
        tracing::debug!(
            "audio output disabled, skipping {} samples at {}hz",
            pcm.len(),
            sample_rate
        );
    }
}

#[cfg(feature = "utils")]
impl AudioSink for brainchat_utils::AudioPlayer {
    fn play(&mut self, pcm: &[f32], sample_rate: u32) {
        if let Err(e) = brainchat_utils::AudioPlayer::play(self, pcm, sample_rate) {
            tracing::warn!("failed to play audio response: {:#}", e);
        }
    }
}

/// Handles to the rendering collaborators, passed to the session.
pub struct Sinks {
    pub dashboard: Box<dyn Dashboard>,
    pub audio: Box<dyn AudioSink>,
}

impl Sinks {
    pub fn new(dashboard: impl Dashboard + 'static, audio: Box<dyn AudioSink>) -> Self {
        Self {
            dashboard: Box::new(dashboard),
            audio,
        }
    }
}
