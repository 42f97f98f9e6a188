use std::fmt;
use std::ops::ControlFlow;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use crate::chat::{ChatEntry, MessageLog, Origin};
use crate::dispatch::Dispatcher;
use crate::emitter::SignalEmitter;
use crate::sinks::{ConnectionStatus, DeviceStatus, Sinks};
use crate::transport::{Transport, TransportEvent};
use crate::types::events::client::{BrainSignalEvent, TextInputEvent};
use crate::types::{AgentResponsePayload, ClientEvent, ResponseError, ServerEvent, SignalSample};

/// Input mode of the session. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Signal samples are streamed to the service ("think").
    Streaming,
    /// The user types messages ("type").
    Typing,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Streaming => f.write_str("think"),
            Mode::Typing => f.write_str("type"),
        }
    }
}

/// User actions fed into [`Session::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Think,
    Type,
    Submit(String),
    /// Redraws every logged message.
    ReplayLog,
    Quit,
}

impl Input {
    /// Reads one line of console input. Lines that are not a command are
    /// submitted as text.
    pub fn from_line(line: &str) -> Self {
        match line.trim() {
            "/think" => Input::Think,
            "/type" => Input::Type,
            "/log" => Input::ReplayLog,
            "/quit" | "/exit" => Input::Quit,
            _ => Input::Submit(line.to_string()),
        }
    }
}

/// Client-side session: current mode, emission timer, message log and the
/// sinks replies are rendered to.
///
/// All state changes happen through `&mut self` on one task, so each
/// reaction (mode switch, tick, submission, dispatch) finishes before the
/// next one starts.
pub struct Session<T: Transport> {
    mode: Mode,
    transport: T,
    emitter: SignalEmitter,
    log: MessageLog,
    dispatcher: Dispatcher,
    sinks: Sinks,
}

impl<T: Transport> Session<T> {
    /// Creates a session in streaming mode with the emitter running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(transport: T, emitter: SignalEmitter, sinks: Sinks) -> Self {
        Self::with_dispatcher(transport, emitter, sinks, Dispatcher::new())
    }

    pub fn with_dispatcher(
        transport: T,
        emitter: SignalEmitter,
        sinks: Sinks,
        dispatcher: Dispatcher,
    ) -> Self {
        let mut session = Self {
            mode: Mode::Streaming,
            transport,
            emitter,
            log: MessageLog::new(),
            dispatcher,
            sinks,
        };
        session.enter_streaming();
        session
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_emitting(&self) -> bool {
        self.emitter.is_running()
    }

    pub fn messages(&self) -> &[ChatEntry] {
        self.log.entries()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Switches to streaming. Always restarts the emitter, so the next
    /// sample is one full period away.
    pub fn enter_streaming(&mut self) {
        self.mode = Mode::Streaming;
        self.emitter.restart();
        self.sinks.dashboard.show_mode(self.mode);
        tracing::info!("mode: {}, emitting every {:?}", self.mode, self.emitter.period());
    }

    pub fn enter_typing(&mut self) {
        self.mode = Mode::Typing;
        if self.emitter.stop() {
            tracing::debug!("signal emission stopped");
        }
        self.sinks.dashboard.show_mode(self.mode);
        tracing::info!("mode: {}", self.mode);
    }

    /// Sends the trimmed contents of `input` and logs them, then clears
    /// `input`. Blank input is ignored. Works in either mode.
    pub fn submit_text(&mut self, input: &mut String) -> bool {
        let text = input.trim();
        if text.is_empty() {
            return false;
        }
        let text = text.to_string();

        let event = ClientEvent::TextInput(TextInputEvent::new(&text));
        if let Err(e) = self.transport.publish(event) {
            tracing::warn!("failed to publish text input: {}", e);
        }
        let entry = self.log.append(text, Origin::User);
        self.sinks.dashboard.show_message(entry);
        input.clear();
        true
    }

    /// Publishes one signal sample; a failed publish loses the sample.
    pub fn emit(&mut self, sample: SignalSample) {
        tracing::debug!("emitting signal sample of {} values", sample.len());
        let event = ClientEvent::BrainSignal(BrainSignalEvent::new(sample));
        if let Err(e) = self.transport.publish(event) {
            tracing::debug!("signal sample dropped: {}", e);
        }
    }

    pub fn dispatch(&mut self, payload: AgentResponsePayload) -> Result<usize, ResponseError> {
        self.dispatcher.dispatch(payload, &mut self.log, &mut self.sinks)
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                tracing::info!("connected");
                self.sinks.dashboard.set_connection_status(ConnectionStatus::Connected);
                self.sinks.dashboard.set_device_status(DeviceStatus::Connected);
            }
            TransportEvent::Disconnected { reason } => {
                tracing::info!("disconnected: {}", reason.as_deref().unwrap_or("no reason given"));
                self.on_disconnected();
            }
            TransportEvent::Server(ServerEvent::AiResponse(payload)) => {
                if let Err(e) = self.dispatch(payload) {
                    tracing::warn!("dropping agent response: {}", e);
                }
            }
            TransportEvent::Server(ServerEvent::Error(e)) => {
                tracing::warn!("server error: {}", e.message());
            }
            TransportEvent::Server(ServerEvent::Close { reason }) => {
                tracing::info!("server closed the session: {:?}", reason);
                self.on_disconnected();
            }
        }
    }

    pub fn handle_input(&mut self, input: Input) -> ControlFlow<()> {
        match input {
            Input::Think => self.enter_streaming(),
            Input::Type => self.enter_typing(),
            Input::Submit(mut text) => {
                self.submit_text(&mut text);
            }
            Input::ReplayLog => {
                for entry in self.log.entries() {
                    self.sinks.dashboard.show_message(entry);
                }
            }
            Input::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Runs the session until [`Input::Quit`] or until `inputs` closes.
    ///
    /// User input is served first, then inbound events, then emitter ticks.
    pub async fn run(
        &mut self,
        mut inputs: mpsc::Receiver<Input>,
        mut events: broadcast::Receiver<TransportEvent>,
    ) {
        let mut events_open = true;
        loop {
            tokio::select! {
                biased;
                input = inputs.recv() => match input {
                    Some(input) => {
                        if self.handle_input(input).is_break() {
                            break;
                        }
                    }
                    None => break,
                },
                event = events.recv(), if events_open => match event {
                    Ok(event) => self.handle_transport_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("fell behind, skipped {} inbound events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("inbound event channel closed");
                        events_open = false;
                    }
                },
                sample = self.emitter.tick() => match sample {
                    Ok(sample) => self.emit(sample),
                    Err(e) => tracing::warn!("signal source failed: {}", e),
                },
            }
        }
        tracing::info!("session ended with {} messages", self.log.len());
    }

    fn on_disconnected(&mut self) {
        self.sinks.dashboard.set_connection_status(ConnectionStatus::Disconnected);
        self.sinks.dashboard.set_device_status(DeviceStatus::NoDevice);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use mockall::predicate::eq;

    use super::*;
    use crate::dispatch::{AUDIO_SAMPLE_RATE, THINKING_PLACEHOLDER};
    use crate::signal::SyntheticSource;
    use crate::sinks::{MockAudioSink, MockDashboard};
    use crate::transport::{MockTransport, TransportError};
    use crate::types::{Band, FrequencySpectrum, SIGNAL_SAMPLE_LEN};

    const PERIOD: Duration = Duration::from_millis(1000);

    fn dashboard() -> MockDashboard {
        let mut dashboard = MockDashboard::new();
        dashboard.expect_show_mode().return_const(());
        dashboard
    }

    fn session(
        transport: MockTransport,
        dashboard: MockDashboard,
        audio: MockAudioSink,
    ) -> Session<MockTransport> {
        let emitter = SignalEmitter::new(PERIOD, SyntheticSource::with_seed(3));
        let sinks = Sinks {
            dashboard: Box::new(dashboard),
            audio: Box::new(audio),
        };
        Session::with_dispatcher(transport, emitter, sinks, Dispatcher::with_seed(3))
    }

    fn is_valid_signal(event: &ClientEvent) -> bool {
        match event {
            ClientEvent::BrainSignal(e) => {
                let values = e.signal().values();
                values.len() == SIGNAL_SAMPLE_LEN && values.iter().all(|v| (-1.0..=1.0).contains(v))
            }
            _ => false,
        }
    }

    #[tokio::test]
    async fn test_starts_streaming() {
        let mut dashboard = MockDashboard::new();
        dashboard.expect_show_mode().with(eq(Mode::Streaming)).times(1).return_const(());
        let session = session(MockTransport::new(), dashboard, MockAudioSink::new());
        assert_eq!(session.mode(), Mode::Streaming);
        assert!(session.is_emitting());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_emission_follows_mode() {
        let mut session = session(MockTransport::new(), dashboard(), MockAudioSink::new());
        let steps: [fn(&mut Session<MockTransport>); 7] = [
            Session::enter_typing,
            Session::enter_typing,
            Session::enter_streaming,
            Session::enter_streaming,
            Session::enter_typing,
            Session::enter_streaming,
            Session::enter_typing,
        ];
        for step in steps {
            step(&mut session);
            assert_eq!(session.is_emitting(), session.mode() == Mode::Streaming);
        }
        assert_eq!(session.mode(), Mode::Typing);
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let mut transport = MockTransport::new();
        transport.expect_publish().never();
        let mut session = session(transport, dashboard(), MockAudioSink::new());

        for text in ["", "   ", "\t\n"] {
            let mut input = text.to_string();
            assert!(!session.submit_text(&mut input));
            assert_eq!(input, text);
        }
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_submission_is_trimmed_published_and_logged() {
        let mut transport = MockTransport::new();
        transport
            .expect_publish()
            .withf(|event| matches!(event, ClientEvent::TextInput(e) if e.text() == "hello"))
            .times(1)
            .returning(|_| Ok(()));
        let mut dashboard = dashboard();
        dashboard
            .expect_show_message()
            .withf(|entry| {
                entry.text() == "hello" && entry.origin() == Origin::User && entry.position() == 0
            })
            .times(1)
            .return_const(());
        let mut session = session(transport, dashboard, MockAudioSink::new());

        let mut input = " hello ".to_string();
        assert!(session.submit_text(&mut input));
        assert!(input.is_empty());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text(), "hello");
        assert_eq!(session.messages()[0].origin(), Origin::User);
        // submitting does not leave streaming mode
        assert_eq!(session.mode(), Mode::Streaming);
        assert!(session.is_emitting());
    }

    #[tokio::test]
    async fn test_submission_is_logged_when_publish_fails() {
        let mut transport = MockTransport::new();
        transport
            .expect_publish()
            .times(1)
            .returning(|_| Err(TransportError::NotConnected));
        let mut dashboard = dashboard();
        dashboard.expect_show_message().times(1).return_const(());
        let mut session = session(transport, dashboard, MockAudioSink::new());

        session.enter_typing();
        let mut input = "anyone there?".to_string();
        assert!(session.submit_text(&mut input));
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_text_only_uses_placeholders() {
        let mut dashboard = dashboard();
        dashboard
            .expect_show_message()
            .withf(|entry| entry.text() == "hi" && entry.origin() == Origin::Agent)
            .times(1)
            .return_const(());
        dashboard
            .expect_set_confidence()
            .withf(|confidence| (0.0..=1.0).contains(confidence))
            .times(1)
            .return_const(());
        dashboard
            .expect_set_thinking_process()
            .withf(|text| text == THINKING_PLACEHOLDER)
            .times(1)
            .return_const(());
        dashboard.expect_plot_time_series().never();
        dashboard.expect_plot_spectrum().never();
        dashboard.expect_set_band_intensities().never();
        let mut audio = MockAudioSink::new();
        audio.expect_play().never();
        let mut session = session(MockTransport::new(), dashboard, audio);

        let payload = AgentResponsePayload::builder().with_text("hi").build();
        assert_eq!(session.dispatch(payload), Ok(0));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].origin(), Origin::Agent);
    }

    #[tokio::test]
    async fn test_dispatch_clamps_band_power() {
        let mut dashboard = dashboard();
        dashboard.expect_show_message().return_const(());
        dashboard.expect_set_confidence().return_const(());
        dashboard.expect_set_thinking_process().return_const(());
        dashboard
            .expect_set_band_intensities()
            .withf(|intensities| {
                intensities.len() == 1 && intensities.get(&Band::Alpha) == Some(&1.0)
            })
            .times(1)
            .return_const(());
        dashboard.expect_plot_time_series().never();
        dashboard.expect_plot_spectrum().never();
        let mut session = session(MockTransport::new(), dashboard, MockAudioSink::new());

        let payload = AgentResponsePayload::builder()
            .with_text("calm")
            .with_band_power("alpha", 1.5)
            .build();
        assert!(session.dispatch(payload).is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_without_text_touches_nothing() {
        // only the initial mode switch is allowed; any other sink call panics
        let mut dashboard = MockDashboard::new();
        dashboard.expect_show_mode().times(1).return_const(());
        let mut session = session(MockTransport::new(), dashboard, MockAudioSink::new());

        let payload = AgentResponsePayload::builder()
            .with_band_power("alpha", 0.5)
            .with_confidence(0.9)
            .with_thinking_process("hmm")
            .with_audio(vec![0.1; 16])
            .build();
        assert_eq!(session.dispatch(payload), Err(ResponseError::MissingText));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_full_response() {
        let mut dashboard = dashboard();
        dashboard.expect_show_message().times(1).return_const(());
        dashboard
            .expect_plot_time_series()
            .withf(|samples| samples == [0.1, 0.2, 0.3])
            .times(1)
            .return_const(());
        dashboard
            .expect_plot_spectrum()
            .withf(|spectrum| {
                spectrum.frequencies() == [8.0, 10.0] && spectrum.powers() == [0.3, 0.6]
            })
            .times(1)
            .return_const(());
        dashboard.expect_set_band_intensities().times(1).return_const(());
        // an explicit zero confidence is rendered as zero
        dashboard.expect_set_confidence().with(eq(0.0)).times(1).return_const(());
        dashboard
            .expect_set_thinking_process()
            .withf(|text| text == "weighing options")
            .times(1)
            .return_const(());
        let mut audio = MockAudioSink::new();
        audio
            .expect_play()
            .withf(|pcm, rate| pcm.len() == 3 && *rate == AUDIO_SAMPLE_RATE)
            .times(1)
            .return_const(());
        let mut session = session(MockTransport::new(), dashboard, audio);

        let payload = AgentResponsePayload::builder()
            .with_text("here you go")
            .with_raw_signal(vec![0.1, 0.2, 0.3])
            .with_frequency_spectrum(FrequencySpectrum::new(vec![8.0, 10.0], vec![0.3, 0.6]))
            .with_band_power("beta", 0.4)
            .with_confidence(0.0)
            .with_thinking_process("weighing options")
            .with_audio(vec![0.0, 0.5, -0.5])
            .build();
        assert!(session.dispatch(payload).is_ok());
    }

    #[tokio::test]
    async fn test_device_status_follows_connection() {
        let mut dashboard = dashboard();
        dashboard
            .expect_set_connection_status()
            .with(eq(ConnectionStatus::Connected))
            .times(1)
            .return_const(());
        dashboard
            .expect_set_connection_status()
            .with(eq(ConnectionStatus::Disconnected))
            .times(1)
            .return_const(());
        dashboard
            .expect_set_device_status()
            .with(eq(DeviceStatus::Connected))
            .times(1)
            .return_const(());
        dashboard
            .expect_set_device_status()
            .with(eq(DeviceStatus::NoDevice))
            .times(1)
            .return_const(());
        let mut session = session(MockTransport::new(), dashboard, MockAudioSink::new());

        session.handle_transport_event(TransportEvent::Connected);
        session.handle_transport_event(TransportEvent::Disconnected { reason: None });
    }

    #[tokio::test]
    async fn test_input_from_line() {
        assert_eq!(Input::from_line("/think"), Input::Think);
        assert_eq!(Input::from_line(" /type "), Input::Type);
        assert_eq!(Input::from_line("/log"), Input::ReplayLog);
        assert_eq!(Input::from_line("/quit"), Input::Quit);
        assert_eq!(Input::from_line("hello /think"), Input::Submit("hello /think".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_once_per_period() {
        let mut transport = MockTransport::new();
        transport
            .expect_publish()
            .withf(is_valid_signal)
            .times(3)
            .returning(|_| Ok(()));
        let mut session = session(transport, dashboard(), MockAudioSink::new());

        let (input_tx, input_rx) = mpsc::channel(8);
        let (_event_tx, event_rx) = broadcast::channel(8);
        let driver = async move {
            tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
            drop(input_tx);
        };
        tokio::join!(session.run(input_rx, event_rx), driver);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_emitting_in_typing_mode() {
        let mut transport = MockTransport::new();
        transport
            .expect_publish()
            .withf(is_valid_signal)
            .times(1)
            .returning(|_| Ok(()));
        let mut session = session(transport, dashboard(), MockAudioSink::new());

        let (input_tx, input_rx) = mpsc::channel(8);
        let (_event_tx, event_rx) = broadcast::channel(8);
        let driver = async move {
            tokio::time::sleep(PERIOD + PERIOD / 2).await;
            input_tx.send(Input::Type).await.unwrap();
            tokio::time::sleep(PERIOD * 4).await;
            input_tx.send(Input::Quit).await.unwrap();
        };
        tokio::join!(session.run(input_rx, event_rx), driver);
        assert_eq!(session.mode(), Mode::Typing);
        assert!(!session.is_emitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_dispatches_inbound_responses_in_order() {
        let mut dashboard = dashboard();
        dashboard.expect_set_connection_status().return_const(());
        dashboard.expect_set_device_status().return_const(());
        dashboard.expect_show_message().times(2).return_const(());
        dashboard.expect_set_confidence().times(2).return_const(());
        dashboard.expect_set_thinking_process().times(2).return_const(());
        let mut transport = MockTransport::new();
        transport.expect_publish().never();
        let mut session = session(transport, dashboard, MockAudioSink::new());

        let (input_tx, input_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = broadcast::channel(8);
        event_tx.send(TransportEvent::Connected).unwrap();
        for text in ["first", "second"] {
            let payload = AgentResponsePayload::builder().with_text(text).build();
            event_tx.send(TransportEvent::Server(ServerEvent::AiResponse(payload))).unwrap();
        }
        // rejected: no text
        let payload = AgentResponsePayload::builder().with_confidence(0.5).build();
        event_tx.send(TransportEvent::Server(ServerEvent::AiResponse(payload))).unwrap();

        let driver = async move {
            tokio::time::sleep(PERIOD / 2).await;
            input_tx.send(Input::Quit).await.unwrap();
        };
        tokio::join!(session.run(input_rx, event_rx), driver);

        let texts: Vec<_> = session.messages().iter().map(|e| e.text()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_emitting_when_signal_publish_fails() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let mut transport = MockTransport::new();
        transport
            .expect_publish()
            .withf(is_valid_signal)
            .returning(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TransportError::Closed)
            });
        let mut session = session(transport, dashboard(), MockAudioSink::new());

        let (input_tx, input_rx) = mpsc::channel(8);
        let (_event_tx, event_rx) = broadcast::channel(8);
        let driver = async move {
            tokio::time::sleep(PERIOD * 4 + PERIOD / 2).await;
            drop(input_tx);
        };
        tokio::join!(session.run(input_rx, event_rx), driver);

        // one attempt per period, lost samples are not retried
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(session.mode(), Mode::Streaming);
        assert!(session.is_emitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentering_streaming_resets_cadence() {
        let start = tokio::time::Instant::now();
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let recorded = ticks.clone();
        let mut transport = MockTransport::new();
        transport
            .expect_publish()
            .withf(is_valid_signal)
            .returning(move |_| {
                recorded.lock().unwrap().push(start.elapsed().as_millis());
                Ok(())
            });
        let mut session = session(transport, dashboard(), MockAudioSink::new());

        let (input_tx, input_rx) = mpsc::channel(8);
        let (_event_tx, event_rx) = broadcast::channel(8);
        let driver = async move {
            tokio::time::sleep(Duration::from_millis(600)).await;
            input_tx.send(Input::Think).await.unwrap();
            input_tx.send(Input::Think).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2300)).await;
            drop(input_tx);
        };
        tokio::join!(session.run(input_rx, event_rx), driver);

        // the tick due at 1000 ms is replaced by one a full period after 600 ms
        assert_eq!(*ticks.lock().unwrap(), vec![1600, 2600]);
        assert!(session.is_emitting());
    }
}
