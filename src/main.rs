//! A terminal stage for a scroll-driven portfolio page.
//!
//! The hero plays a pre-rendered image sequence as you scroll, the projects
//! section locks the page and scrolls a rail of cards sideways, and Home /
//! End / number keys run staged jumps across both.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, widgets::Paragraph, Terminal};
use tokio::sync::mpsc;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    frame_runtime::{FrameLoader, FrameUpdate},
    handler,
    state::AppState,
};
use crate::core::frames::{discover_frame_count, DirFrameSource, FrameSource};
use crate::ui::{layout::AppLayout, page_view::PageView, theme::Theme};

/// Frames assumed when none can be found on disk.
const DEFAULT_FRAME_COUNT: usize = 232;
/// Refresh period of the animation loop.
const REFRESH: Duration = Duration::from_millis(16);

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Scroll-driven page in the terminal")]
struct Cli {
    /// Directory holding the hero image sequence.
    #[arg(long, default_value = "frames")]
    frames: PathBuf,

    /// Number of frames (counted from the directory when omitted).
    #[arg(long)]
    frame_count: Option<usize>,

    /// File name prefix before the 3-digit frame number.
    #[arg(long, default_value = "ezgif-frame-")]
    prefix: String,

    /// Frame file extension.
    #[arg(long, default_value = "png")]
    ext: String,

    /// Jump instead of animating page scroll.
    #[arg(long)]
    reduced_motion: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // Only visible when RUST_LOG is set; never pollutes stdout.
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    let mut config = config::AppConfig::load();
    if let Err(err) = config.init_file() {
        tracing::warn!(%err, "could not write default config");
    }
    config.reduced_motion |= cli.reduced_motion;

    let frame_count = match cli.frame_count {
        Some(n) => n,
        None => match discover_frame_count(&cli.frames, &cli.prefix) {
            0 => {
                tracing::warn!(dir = %cli.frames.display(), "no frames found");
                DEFAULT_FRAME_COUNT
            }
            n => n,
        },
    };
    tracing::info!(frame_count, dir = %cli.frames.display(), "starting");
    let source: Arc<dyn FrameSource> = Arc::new(
        DirFrameSource::new(&cli.frames, cli.prefix.clone(), frame_count)
            .with_extension(cli.ext.clone()),
    );

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config, frame_count, source).await;

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    config: config::AppConfig,
    frame_count: usize,
    source: Arc<dyn FrameSource>,
) -> Result<()> {
    let size = terminal.size()?;
    let start = Instant::now();
    let batch_size = config.batch_size;
    let batch_pause = Duration::from_millis(config.batch_pause_ms);
    let area = Rect::new(0, 0, size.width, size.height);
    let mut state = AppState::new(config, frame_count, area, start);

    // ── async channels ────────────────────────────────────────
    let mut events = spawn_event_reader(Duration::from_millis(50));
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<FrameUpdate>();
    let mut loader = FrameLoader::new(source, frame_tx, batch_size, batch_pause, start);
    let mut refresh = tokio::time::interval(REFRESH);
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // ── event loop ────────────────────────────────────────────
    loop {
        terminal.draw(|frame| {
            let layout = AppLayout::from_area(frame.area());
            frame.render_stateful_widget(
                PageView {
                    coordinator: &state.coordinator,
                    canvas: &state.canvas,
                },
                layout.page_area,
                &mut state.thumb,
            );

            let (text, style) = match &state.status_message {
                Some(msg) => (msg.clone(), Theme::status_bar_style()),
                None if state.coordinator.is_staging() => {
                    (state.status_summary(), Theme::staging_style())
                }
                None => (
                    format!("{} | {}", state.status_summary(), state.config.status_bar_hint()),
                    Theme::status_bar_style(),
                ),
            };
            frame.render_widget(Paragraph::new(text).style(style), layout.status_area);
        })?;

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k, Instant::now()),
                    AppEvent::Wheel(notch) => handler::handle_wheel(&mut state, notch),
                    AppEvent::Resize(w, h) => handler::handle_resize(&mut state, w, h),
                }
            }

            Some(update) = frame_rx.recv() => {
                // Drain everything already decoded before the next redraw.
                let now = Instant::now();
                let mut settled = loader.settle(&mut state.frames, update, now);
                while let Ok(update) = frame_rx.try_recv() {
                    settled.extend(loader.settle(&mut state.frames, update, now));
                }
                state.on_frame_events(&settled);
            }

            _ = refresh.tick() => {
                let now = Instant::now();
                state.tick(now);
                loader.pump(&mut state.frames, now);
            }
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
