//! Application entry point: push-to-talk voice commands.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Start the cpal capture stream; the handle stays on the main thread.
//! 5. Build the transcriber, router, context source and tool executor.
//! 6. Spawn the pipeline coordinator on the tokio runtime.
//! 7. Spawn the hotkey listener thread.
//! 8. Block on Ctrl-C.

use std::sync::Arc;

use anyhow::Context as _;
use tokio::sync::mpsc;
use voice_command::{
    actions::{DesktopSystem, SystemActions, ToolExecutor},
    audio::{AudioCapture, CaptureBuffer, MicRecorder, StreamHandle},
    config::{AppConfig, AppPaths},
    context::LiveContext,
    focus::platform_inspector,
    hotkey::{Hotkey, HotkeyEvent, HotkeyListener},
    inject::TextDelivery,
    pipeline::{new_shared_state, PipelineCoordinator, PipelineServices, RecordingSession},
    router::ApiRouter,
    transcribe::WhisperApiClient,
};

/// Open the default microphone.  `None` leaves the app running without audio;
/// presses then report the microphone as unavailable.
fn start_capture(buffer: &Arc<CaptureBuffer>) -> Option<StreamHandle> {
    let capture = match AudioCapture::new() {
        Ok(capture) => capture,
        Err(e) => {
            log::warn!("Audio capture unavailable: {e}");
            return None;
        }
    };

    match capture.start(Arc::clone(buffer)) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Failed to start audio stream: {e}");
            None
        }
    }
}

fn parse_hotkey(spec: &str, fallback: Hotkey) -> Hotkey {
    spec.parse().unwrap_or_else(|e| {
        log::warn!("Invalid hotkey {spec:?} ({e}); using {fallback:?}");
        fallback
    })
}

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-command starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    // 3. Tokio runtime (2 worker threads: the coordinator plus one run)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Microphone
    let buffer = Arc::new(CaptureBuffer::new(config.audio.level_bars));
    let _stream = start_capture(&buffer);

    // 5. Services
    let system: Arc<dyn SystemActions> = Arc::new(DesktopSystem);
    let executor = ToolExecutor::new(
        Arc::clone(&system),
        TextDelivery::system(&config.inject),
        platform_inspector(),
        &config.actions,
    );
    let services = PipelineServices {
        transcriber: Arc::new(WhisperApiClient::from_config(&config.transcription)),
        router: Arc::new(ApiRouter::from_config(&config.router)),
        context: Arc::new(LiveContext::new(
            system,
            &config.router,
            &config.actions,
            &paths,
        )),
        executor,
        recordings_dir: config
            .audio
            .keep_recordings
            .then(|| paths.recordings_dir.clone()),
    };

    let session = RecordingSession::new(
        Box::new(MicRecorder::new(buffer)),
        config.audio.min_duration(),
    );

    // 6. Coordinator
    let (hotkey_tx, hotkey_rx) = mpsc::channel::<HotkeyEvent>(16);
    let state = new_shared_state();
    let coordinator = PipelineCoordinator::new(state, session, services);
    let pipeline = rt.spawn(coordinator.run(hotkey_rx));

    // 7. Hotkey listener thread
    let push_to_talk = parse_hotkey(&config.hotkey.push_to_talk_key, Hotkey::new(rdev::Key::F9));
    let paste_last = config
        .hotkey
        .paste_last_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .and_then(|key| match key.parse::<Hotkey>() {
            Ok(hotkey) => Some(hotkey),
            Err(e) => {
                log::warn!("Invalid paste-last hotkey {key:?} ({e}); disabled");
                None
            }
        });
    let listener = HotkeyListener::start(push_to_talk, paste_last, hotkey_tx)
        .context("failed to start hotkey listener")?;
    log::info!("Hold {} to talk", config.hotkey.push_to_talk_key);

    // 8. Run until Ctrl-C
    rt.block_on(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Cannot listen for Ctrl-C: {e}");
        }
    });

    log::info!("Shutting down");
    drop(listener);
    pipeline.abort();
    Ok(())
}
