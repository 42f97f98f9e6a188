/// Number of amplitudes in one emitted signal batch.
pub const SIGNAL_SAMPLE_LEN: usize = 250;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("signal sample must hold {expected} values, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("signal value {value} at index {index} is outside [-1, 1]")]
    OutOfRange { index: usize, value: f32 },
}

/// One fixed-length batch of raw signal amplitudes, each in `[-1, 1]`.
///
/// A `SignalSample` can only be built through [`SignalSample::new`], so every
/// value that reaches the wire has already been checked.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct SignalSample(Vec<f32>);

impl SignalSample {
    pub fn new(values: Vec<f32>) -> Result<Self, SignalError> {
        if values.len() != SIGNAL_SAMPLE_LEN {
            return Err(SignalError::WrongLength {
                expected: SIGNAL_SAMPLE_LEN,
                actual: values.len(),
            });
        }
        // NaN fails `contains`, so it is rejected here as well.
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(-1.0..=1.0).contains(*v))
        {
            return Err(SignalError::OutOfRange { index, value });
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<f32>> for SignalSample {
    type Error = SignalError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<SignalSample> for Vec<f32> {
    fn from(sample: SignalSample) -> Self {
        sample.0
    }
}
