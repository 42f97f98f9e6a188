use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{SignalError, SignalSample, SIGNAL_SAMPLE_LEN};

/// Where emitted signal samples come from.
///
/// Acquisition hardware plugs in here; [`SyntheticSource`] stands in for it
/// during development and tests.
pub trait SignalSource {
    fn next_sample(&mut self) -> Result<SignalSample, SignalError>;
}

impl<F> SignalSource for F
where
    F: FnMut() -> Result<SignalSample, SignalError>,
{
    fn next_sample(&mut self) -> Result<SignalSample, SignalError> {
        self()
    }
}

/// Uniform random amplitudes in `[-1, 1]`.
pub struct SyntheticSource {
    rng: StdRng,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SignalSource for SyntheticSource {
    fn next_sample(&mut self) -> Result<SignalSample, SignalError> {
        let values = (0..SIGNAL_SAMPLE_LEN)
            .map(|_| self.rng.gen_range(-1.0f32..=1.0))
            .collect();
        SignalSample::new(values)
    }
}
