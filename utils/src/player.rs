use anyhow::Context;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapProd;
use rubato::{FastFixedIn, Resampler};

use crate::audio;

const OUTPUT_CHUNK_SIZE: usize = 1024;
const OUTPUT_LATENCY_MS: usize = 1000;
const RESAMPLER_CHUNK_SIZE: usize = 160;

/// Plays mono PCM buffers on an output device.
///
/// The cpal stream runs for the lifetime of the player and pulls from a ring
/// buffer; [`AudioPlayer::play`] resamples a buffer to the device rate and
/// queues it once. When the ring buffer is full the remainder is dropped.
pub struct AudioPlayer {
    _stream: cpal::Stream,
    producer: HeapProd<f32>,
    resampler: FastFixedIn<f32>,
    source_rate: u32,
    output_rate: u32,
}

impl AudioPlayer {
    pub fn new(device_name: Option<&str>) -> anyhow::Result<Self> {
        let output = crate::device::get_or_default_output(device_name)?;
        let default_config = output
            .default_output_config()
            .context("failed to get default output config")?;
        let output_config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: default_config.sample_rate(),
            buffer_size: cpal::BufferSize::Fixed(FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
        };
        let output_channel_count = output_config.channels as usize;
        let output_rate = output_config.sample_rate.0;
        tracing::debug!("output: device={:?}, config={:?}", output.name().ok(), &output_config);

        let buffer = audio::shared_buffer(output_rate as usize * OUTPUT_LATENCY_MS / 1000 * 30);
        let (producer, mut consumer) = buffer.split();

        let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(output_channel_count) {
                let sample = consumer.try_pop().unwrap_or(0.0);
                // mono source: same sample on every channel
                frame.fill(sample);
            }
        };
        let stream = output
            .build_output_stream(
                &output_config,
                output_data_fn,
                move |err| tracing::error!("an error occurred on output stream: {}", err),
                None,
            )
            .context("failed to build output stream")?;
        stream.play().context("failed to play output stream")?;

        let source_rate = audio::RESPONSE_AUDIO_SAMPLE_RATE;
        let resampler =
            audio::create_resampler(source_rate as f64, output_rate as f64, RESAMPLER_CHUNK_SIZE)?;

        Ok(Self {
            _stream: stream,
            producer,
            resampler,
            source_rate,
            output_rate,
        })
    }

    /// Queues `pcm`, recorded at `sample_rate`, for playback.
    pub fn play(&mut self, pcm: &[f32], sample_rate: u32) -> anyhow::Result<()> {
        if sample_rate != self.source_rate {
            self.resampler = audio::create_resampler(
                sample_rate as f64,
                self.output_rate as f64,
                RESAMPLER_CHUNK_SIZE,
            )?;
            self.source_rate = sample_rate;
        }
        self.resampler.reset();

        let pcm = audio::sanitize(pcm);
        let chunk_size = self.resampler.input_frames_next();
        let mut dropped = 0usize;
        for samples in audio::split_for_chunks(&pcm, chunk_size) {
            let resamples = self
                .resampler
                .process(&[samples.as_slice()], None)
                .context("failed to resample audio")?;
            if let Some(resamples) = resamples.first() {
                dropped += resamples.len() - self.producer.push_slice(resamples);
            }
        }
        if dropped > 0 {
            tracing::warn!("playback buffer full, dropped {} samples", dropped);
        }
        Ok(())
    }
}
