//! Unseen - binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The binary bridges `unseen_engine` (oracle state) and [`ui`] (rendering),
//! providing RAII-based terminal management with guaranteed cleanup.
//!
//! # Event Loop
//!
//! A fixed ~30 FPS frame cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain the input queue (non-blocking)
//! 3. Advance application state (`app.tick()`), landing any finished gaze
//! 4. Render frame
//!
//! The gaze itself (pacing floor joined with the provider fetch) runs as a
//! spawned task feeding a oneshot channel, so the swirl animation keeps
//! moving while the oracle deliberates. The runtime is single-threaded:
//! the audio output stream is not `Send`, and nothing here needs more than
//! one execution context.

mod ui;

use anyhow::{Context as _, Result};
use crossterm::{
    event::{Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::{Backend, CrosstermBackend, Terminal};
use std::{
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tokio::sync::oneshot;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use unseen_audio::AudioEngine;
use unseen_config::UnseenConfig;
use unseen_engine::{Oracle, await_insight};
use unseen_provider::{GeminiOracle, fallback};
use unseen_types::{ApiKey, Insight};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // If we can't open a log file, prefer "no logs" over corrupting the
    // TUI by writing to stdout/stderr.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.unseen/logs/unseen.log
    if let Some(config_path) = UnseenConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("unseen.log"));
    }

    // Fallback: ./.unseen/logs/unseen.log
    candidates.push(PathBuf::from(".unseen").join("logs").join("unseen.log"));

    candidates
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop: raw
/// mode and the alternate screen are restored even after panics or early
/// returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Application state: the oracle plus the in-flight gaze, if any.
pub struct App {
    oracle: Oracle<GeminiOracle>,
    pending_gaze: Option<oneshot::Receiver<Insight>>,
    frame: usize,
}

impl App {
    fn new(oracle: Oracle<GeminiOracle>) -> Self {
        Self {
            oracle,
            pending_gaze: None,
            frame: 0,
        }
    }

    #[must_use]
    pub fn oracle(&self) -> &Oracle<GeminiOracle> {
        &self.oracle
    }

    #[must_use]
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Primary gesture: start a gaze unless one is already in flight.
    fn request_gaze(&mut self) {
        if !self.oracle.begin_gaze() {
            return;
        }

        let provider = self.oracle.provider().clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(await_insight(&provider).await);
        });
        self.pending_gaze = Some(rx);
    }

    /// Secondary gesture: back to the idle orb. A still-pending completion
    /// will be dropped by the engine's staleness guard when it lands.
    fn reset(&mut self) {
        self.oracle.reset();
    }

    /// Advance one frame: land a finished gaze, bump the animation clock.
    fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);

        if let Some(rx) = &mut self.pending_gaze {
            match rx.try_recv() {
                Ok(insight) => {
                    self.pending_gaze = None;
                    self.oracle.complete_gaze(insight);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    // The gaze task died; the experience must not. Land a
                    // fallback instead of surfacing an error.
                    tracing::error!("Gaze task dropped its channel");
                    self.pending_gaze = None;
                    self.oracle.complete_gaze(fallback::random_fallback());
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let config = UnseenConfig::load()
        .context("loading configuration")?
        .unwrap_or_default();

    let api_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .and_then(ApiKey::new)
        .or_else(|| config.google_api_key().and_then(ApiKey::new));

    let mut provider = GeminiOracle::new(api_key);
    if let Some(model) = config.model() {
        provider = provider.with_model(model);
    }

    let oracle = Oracle::new(provider, AudioEngine::new(config.muted()));
    let mut app = App::new(oracle);

    let mut session = TerminalSession::new()?;
    run_app(&mut session.terminal, &mut app).await
}

const FRAME_DURATION: Duration = Duration::from_millis(33);

async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: Backend,
{
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        frames.tick().await;

        // Non-blocking input (drain queue only).
        while crossterm::event::poll(Duration::ZERO)? {
            if let Event::Key(key) = crossterm::event::read()?
                && key.kind == KeyEventKind::Press
            {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Enter | KeyCode::Char('g' | ' ') => app.request_gaze(),
                    KeyCode::Char('r') => app.reset(),
                    _ => {}
                }
            }
        }

        app.tick();

        terminal.draw(|frame| ui::draw(frame, app))?;
    }
}
