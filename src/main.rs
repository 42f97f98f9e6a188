use anyhow::{Context, Result};
use brainchat::config::Config;
use brainchat::console::ConsoleDashboard;
use brainchat::emitter::SignalEmitter;
use brainchat::signal::SyntheticSource;
use brainchat::sinks::{AudioSink, NullAudio, Sinks};
use brainchat::{Input, Session};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Chat with an inference service by thinking or typing")]
struct Cli {
    /// WebSocket endpoint of the service
    #[arg(long)]
    url: Option<String>,
    /// Milliseconds between signal samples while streaming
    #[arg(long)]
    period_ms: Option<u64>,
    /// Do not play audio responses
    #[arg(long)]
    no_audio: bool,
    /// Name of the audio output device
    #[arg(long)]
    output_device: Option<String>,
    /// List audio output devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load application configuration")?;
    let args = Cli::parse();
    if args.list_devices {
        println!("{}", list_output_devices()?);
        return Ok(());
    }
    if let Some(url) = args.url {
        config.url = url;
    }
    if let Some(period_ms) = args.period_ms {
        config = config.with_emit_period_ms(period_ms)?;
    }
    if args.no_audio {
        config.audio_enabled = false;
    }
    if args.output_device.is_some() {
        config.output_device = args.output_device;
    }

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    // --- 3. Connect ---
    let mut client = brainchat::connect_with_config(config.client_config())
        .await
        .with_context(|| format!("Failed to connect to {}", config.url))?;
    let events = client.server_events()?;

    // --- 4. Build the session ---
    let emitter = SignalEmitter::new(config.emit_period, SyntheticSource::new());
    let sinks = Sinks::new(ConsoleDashboard::stdout(), audio_sink(&config));
    let mut session = Session::new(client, emitter, sinks);

    let (input_tx, input_rx) = mpsc::channel::<Input>(64);
    tokio::spawn(read_console(input_tx.clone()));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down...");
            let _ = input_tx.send(Input::Quit).await;
        }
    });

    // --- 5. Run until the user quits ---
    session.run(input_rx, events).await;

    tracing::info!("{}", session.transport().stats());
    if session.transport().is_connected() {
        session.transport_mut().disconnect();
    } else {
        tracing::info!("connection already closed");
    }
    Ok(())
}

async fn read_console(input_tx: mpsc::Sender<Input>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = match lines.next_line().await {
            Ok(Some(line)) => Input::from_line(&line),
            Ok(None) => Input::Quit,
            Err(e) => {
                tracing::error!("failed to read console input: {}", e);
                Input::Quit
            }
        };
        let quit = input == Input::Quit;
        if input_tx.send(input).await.is_err() || quit {
            break;
        }
    }
}

#[cfg(feature = "utils")]
fn list_output_devices() -> Result<String> {
    brainchat::utils::device::get_available_outputs()
}

#[cfg(not(feature = "utils"))]
fn list_output_devices() -> Result<String> {
    anyhow::bail!("audio support requires building with the `utils` feature")
}

#[cfg(feature = "utils")]
fn audio_sink(config: &Config) -> Box<dyn AudioSink> {
    if !config.audio_enabled {
        return Box::new(NullAudio);
    }
    match brainchat::utils::AudioPlayer::new(config.output_device.as_deref()) {
        Ok(player) => Box::new(player),
        Err(e) => {
            tracing::warn!("audio output unavailable, responses will be silent: {:#}", e);
            Box::new(NullAudio)
        }
    }
}

#[cfg(not(feature = "utils"))]
fn audio_sink(config: &Config) -> Box<dyn AudioSink> {
    if config.audio_enabled {
        tracing::info!("built without the `utils` feature, audio responses will be silent");
    }
    Box::new(NullAudio)
}
