use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::chat::{ChatEntry, Origin};
use crate::session::Mode;
use crate::sinks::{ConnectionStatus, Dashboard, DeviceStatus};
use crate::types::{Band, FrequencySpectrum};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;
const BAR_WIDTH: usize = 20;

/// Text rendering of the dashboard, one line per update.
pub struct ConsoleDashboard<W: Write> {
    out: W,
}

impl ConsoleDashboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleDashboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            tracing::warn!("failed to write to console: {}", e);
        }
    }
}

impl<W: Write> Dashboard for ConsoleDashboard<W> {
    fn show_mode(&mut self, mode: Mode) {
        match mode {
            Mode::Streaming => {
                self.line(format_args!("[mode] think: streaming brain signal (/type to write)"))
            }
            Mode::Typing => {
                self.line(format_args!("[mode] type: enter a message (/think to stream again)"))
            }
        }
    }

    fn show_message(&mut self, entry: &ChatEntry) {
        let prefix = match entry.origin() {
            Origin::User => "you>",
            Origin::Agent => "ai>",
        };
        self.line(format_args!("{} {}", prefix, entry.text()));
    }

    fn set_connection_status(&mut self, status: ConnectionStatus) {
        let status = match status {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        };
        self.line(format_args!("[status] {}", status));
    }

    fn set_device_status(&mut self, status: DeviceStatus) {
        let status = match status {
            DeviceStatus::Connected => "Device connected",
            DeviceStatus::NoDevice => "No Device",
        };
        self.line(format_args!("[device] {}", status));
    }

    fn plot_time_series(&mut self, samples: &[f32]) {
        self.line(format_args!("[activity] {}", sparkline(samples, SPARK_WIDTH)));
    }

    fn plot_spectrum(&mut self, spectrum: &FrequencySpectrum) {
        match spectrum.bins().max_by(|a, b| a.1.total_cmp(&b.1)) {
            Some((frequency, power)) => self.line(format_args!(
                "[spectrum] {} bins, peak {:.1} Hz ({:.3}) {}",
                spectrum.frequencies().len(),
                frequency,
                power,
                sparkline(spectrum.powers(), SPARK_WIDTH)
            )),
            None => self.line(format_args!("[spectrum] empty")),
        }
    }

    fn set_band_intensities(&mut self, intensities: &BTreeMap<Band, f32>) {
        for (band, intensity) in intensities {
            self.line(format_args!("[{:>5}] {}", band, bar(*intensity, BAR_WIDTH)));
        }
    }

    fn set_confidence(&mut self, confidence: f32) {
        self.line(format_args!(
            "[confidence] {} {:>3.0}%",
            bar(confidence, BAR_WIDTH),
            confidence * 100.0
        ));
    }

    fn set_thinking_process(&mut self, text: &str) {
        self.line(format_args!("[thinking] {}", text));
    }
}

/// Horizontal bar `width` cells wide with `fraction` of them filled.
pub fn bar(fraction: f32, width: usize) -> String {
    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    let filled = (fraction * width as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Unicode sparkline of `values`, scaled between their min and max and
/// downsampled to at most `width` characters by averaging.
pub fn sparkline(values: &[f32], width: usize) -> String {
    let values: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let bucket = values.len().div_ceil(width);
    let averaged: Vec<f32> = values
        .chunks(bucket)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect();

    let min = averaged.iter().copied().fold(f32::INFINITY, f32::min);
    let max = averaged.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = max - min;
    averaged
        .iter()
        .map(|v| {
            if span <= f32::EPSILON {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                let level = ((v - min) / span * (SPARK_LEVELS.len() - 1) as f32).round() as usize;
                SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect()
}
