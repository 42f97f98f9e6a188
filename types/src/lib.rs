pub mod bands;
pub mod events;
pub mod response;
pub mod signal;

pub use bands::Band;
pub use events::{ClientEvent, ServerEvent};
pub use response::{
    AgentResponse, AgentResponsePayload, BrainData, FrequencySpectrum, ResponseError,
};
pub use signal::{SignalError, SignalSample, SIGNAL_SAMPLE_LEN};
