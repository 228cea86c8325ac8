use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use vox_gateway::api::{ApiServer, ApiState};
use vox_gateway::capture::{CaptureEvent, MicrophoneEngine, SttCapability};
use vox_gateway::feedback::{RemoteSynthesizer, TtsCapability};
use vox_gateway::voice::{AudioCapture, SpeechToText, TextToSpeech, play_mp3};
use vox_gateway::{
    AiResponse, Config, InferenceClient, ResultKind, SearchSession, SettingsStore, i18n,
};

/// Vox - voice-driven search gateway
#[derive(Parser)]
#[command(name = "vox", version, about)]
struct Cli {
    /// Port for the HTTP API (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for headless servers without audio hardware)
    #[arg(long, env = "VOX_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single query and print the structured results
    Ask {
        /// Query text
        text: Vec<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hola, esto es una prueba del sistema de voz.")]
        text: String,
    },
    /// Reset stored settings to defaults
    ResetSettings,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,vox_gateway=info",
        1 => "info,vox_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { text } => ask(&config, &text.join(" ")).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::ResetSettings => reset_settings(&config),
        };
    }

    run_gateway(config, cli.disable_voice).await
}

/// Run the gateway: HTTP API, interactive console, voice session
async fn run_gateway(config: Config, disable_voice: bool) -> anyhow::Result<()> {
    tracing::info!(
        port = config.api_server.port,
        disable_voice,
        "starting vox gateway"
    );

    let settings = Arc::new(SettingsStore::open(config.settings_db_path())?);
    let inference = Arc::new(InferenceClient::new(
        config.inference.api_url.clone(),
        config.inference.api_key.clone(),
    ));

    let stt = stt_capability(&config, disable_voice);
    let tts = tts_capability(&config, disable_voice);

    let (session, mut capture_rx) =
        SearchSession::new(Arc::clone(&settings), Arc::clone(&inference), stt, tts);

    let api_state = Arc::new(ApiState {
        inference,
        settings: Arc::clone(&settings),
    });
    let api = ApiServer::new(api_state, config.api_server.port).spawn();

    let (_hotkey_manager, mut hotkey_rx) = spawn_hotkey_listener();

    session.arm_auto_listen();

    println!("Vox gateway ready.");
    println!("Type a query, /voice to toggle listening, /clear, /quit (or Ctrl+Space for voice).");
    if let Some(warning) = session.support_warning() {
        println!("⚠ {warning}");
    }
    let examples = i18n::example_queries(settings.get().language);
    println!("Try: {}", examples.join(" · "));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
            Some(event) = capture_rx.recv() => {
                let is_transcript = matches!(&event, CaptureEvent::Transcript(_));
                if let CaptureEvent::Transcript(transcript) = &event {
                    println!("🎤 {transcript}");
                }
                session.handle_capture_event(event).await;
                if is_transcript {
                    render_session(&session);
                }
            }
            Some(()) = hotkey_rx.recv() => {
                session.toggle_listening().await;
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                let line = line.trim();
                match line {
                    "" => {}
                    "/quit" | "/exit" => break,
                    "/voice" => session.toggle_listening().await,
                    "/clear" => {
                        session.clear();
                        println!("Cleared.");
                    }
                    query => {
                        session.submit(query).await;
                        render_session(&session);
                    }
                }
            }
        }
    }

    session.shutdown().await;
    api.abort();
    Ok(())
}

/// Build the speech-to-text capability from config
fn stt_capability(config: &Config, disable_voice: bool) -> SttCapability {
    if disable_voice {
        return SttCapability::Unavailable;
    }

    let Some(key) = &config.voice.speech_api_key else {
        tracing::info!("no speech API key configured, voice input disabled");
        return SttCapability::Unavailable;
    };

    match SpeechToText::new(
        config.voice.stt_url.clone(),
        key.clone(),
        config.voice.stt_model.clone(),
    ) {
        Ok(stt) => SttCapability::Available(Arc::new(MicrophoneEngine::new(stt))),
        Err(e) => {
            tracing::warn!(error = %e, "transcription unavailable");
            SttCapability::Unavailable
        }
    }
}

/// Build the text-to-speech capability from config
fn tts_capability(config: &Config, disable_voice: bool) -> TtsCapability {
    if disable_voice {
        return TtsCapability::Unavailable;
    }

    let Some(key) = &config.voice.speech_api_key else {
        tracing::info!("no speech API key configured, voice feedback disabled");
        return TtsCapability::Unavailable;
    };

    match TextToSpeech::new(
        config.voice.tts_url.clone(),
        key.clone(),
        config.voice.tts_voice.clone(),
        config.voice.tts_model.clone(),
    ) {
        Ok(tts) => TtsCapability::Available(Arc::new(RemoteSynthesizer::new(tts))),
        Err(e) => {
            tracing::warn!(error = %e, "synthesis unavailable");
            TtsCapability::Unavailable
        }
    }
}

/// Register Ctrl+Space as a global voice toggle
///
/// The manager must stay alive for the registration to hold; failures are
/// logged and the gateway runs without the shortcut.
fn spawn_hotkey_listener() -> (Option<GlobalHotKeyManager>, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(4);

    let manager = match GlobalHotKeyManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            tracing::warn!(error = %e, "global hotkey manager unavailable");
            return (None, rx);
        }
    };

    let hotkey = HotKey::new(Some(Modifiers::CONTROL), Code::Space);
    if let Err(e) = manager.register(hotkey) {
        tracing::warn!(error = %e, "failed to register voice toggle hotkey");
        return (Some(manager), rx);
    }

    std::thread::spawn(move || {
        while let Ok(event) = GlobalHotKeyEvent::receiver().recv() {
            if event.state == HotKeyState::Pressed && tx.blocking_send(()).is_err() {
                break;
            }
        }
    });

    tracing::info!("voice toggle hotkey registered (Ctrl+Space)");
    (Some(manager), rx)
}

/// Print the session's banner and current response
fn render_session(session: &SearchSession) {
    if let Some(banner) = session.banner() {
        println!("[{}]", banner.message);
    }
    if let Some(response) = session.response() {
        render_response(&response);
    }
}

/// Pretty-print a structured response
fn render_response(response: &AiResponse) {
    println!("\n{}", response.interpretation);
    println!("  intent: {}", response.intent);

    for result in &response.results {
        let kind = match result.kind {
            ResultKind::Web => "web",
            ResultKind::Action => "action",
            ResultKind::Answer => "answer",
        };
        println!("  [{kind}] {} — {}", result.title, result.description);
        println!("         {}", result.url);
    }

    if !response.suggestions.is_empty() {
        println!("  try: {}", response.suggestions.join(" · "));
    }
    println!();
}

/// Run a single query through the inference path and print the results
async fn ask(config: &Config, query: &str) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!("empty query");
    }

    let settings = SettingsStore::open(config.settings_db_path())?;
    let snapshot = settings.get();
    let inference = InferenceClient::new(
        config.inference.api_url.clone(),
        config.inference.api_key.clone(),
    );

    let response = inference
        .infer(query, &snapshot.custom_commands, snapshot.language)
        .await?;
    render_response(&response);

    Ok(())
}

/// Test microphone input with a level meter
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working.");
    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let key = config
        .voice
        .speech_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("speech API key required (set OPENAI_API_KEY)"))?;

    let tts = TextToSpeech::new(
        config.voice.tts_url.clone(),
        key,
        config.voice.tts_voice.clone(),
        config.voice.tts_model.clone(),
    )?;

    println!("Synthesizing speech...");
    let audio = tts.synthesize(text, 1.0).await?;
    println!("Got {} bytes of audio data", audio.len());

    println!("Playing audio...");
    let cancel = AtomicBool::new(false);
    tokio::task::block_in_place(|| play_mp3(&audio, &cancel))?;

    println!("\n---");
    println!("If you heard the speech, TTS is working.");
    Ok(())
}

/// Reset stored settings to defaults
fn reset_settings(config: &Config) -> anyhow::Result<()> {
    let settings = SettingsStore::open(config.settings_db_path())?;
    settings.reset()?;
    println!("Settings reset to defaults.");
    Ok(())
}
