use ringbuf::HeapRb;
use rubato::{FastFixedIn, PolynomialDegree};

/// Sample rate of the synthesized speech the server sends, mono.
pub const RESPONSE_AUDIO_SAMPLE_RATE: u32 = 16000;

pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1
    )?;
    Ok(resampler)
}

/// Splits `samples` into chunks of exactly `chunk_size`, zero-padding the last one.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples.chunks(chunk_size).map(|chunk| {
        let mut chunk = chunk.to_vec();
        chunk.resize(chunk_size, 0.0);
        chunk
    }).collect()
}

pub fn shared_buffer(size: usize) -> HeapRb<f32> {
    HeapRb::new(size)
}

/// Clamps every sample into `[-1, 1]`; non-finite samples become silence.
pub fn sanitize(pcm: &[f32]) -> Vec<f32> {
    pcm.iter()
        .map(|&sample| if sample.is_finite() { sample.clamp(-1.0, 1.0) } else { 0.0 })
        .collect()
}
