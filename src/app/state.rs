//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::time::Instant;

use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::core::coordinator::ScrollCoordinator;
use crate::core::frames::{FrameCanvas, FrameEvent, FrameStore};
use crate::core::page::PageLayout;
use crate::ui::layout::AppLayout;
use crate::ui::page_view::HeroThumb;

/// Top-level application state.
pub struct AppState {
    /// Page scroll, rail, frame driver and staged jumps.
    pub coordinator: ScrollCoordinator,
    /// Decoded hero frames.
    pub frames: FrameStore,
    /// What the hero canvas currently shows.
    pub canvas: FrameCanvas,
    /// Resized copy of the shown frame for the current terminal size.
    pub thumb: HeroThumb,
    /// Key bindings and tunables.
    pub config: AppConfig,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// `true` once every frame is ready or permanently missing.
    pub frames_settled: bool,
    /// Last known terminal size.
    pub terminal_area: Rect,
}

impl AppState {
    pub fn new(config: AppConfig, frame_count: usize, terminal_area: Rect, now: Instant) -> Self {
        let viewport = AppLayout::from_area(terminal_area).viewport();
        let coordinator = ScrollCoordinator::new(
            PageLayout::portfolio(viewport),
            frame_count,
            config.coordinator_tuning(),
            now,
        );
        Self {
            coordinator,
            frames: FrameStore::new(frame_count),
            canvas: FrameCanvas::default(),
            thumb: HeroThumb::default(),
            config,
            should_quit: false,
            status_message: None,
            frames_settled: false,
            terminal_area,
        }
    }

    /// One refresh: advance the scroll core and redraw the hero canvas.
    pub fn tick(&mut self, now: Instant) {
        let frame = self.coordinator.tick(now);
        self.canvas.draw(frame, &self.frames);
    }

    /// React to frame-store notifications.
    pub fn on_frame_events(&mut self, events: &[FrameEvent]) {
        for event in events {
            match event {
                FrameEvent::FirstFrameReady => {
                    let frame = self.coordinator.signals().frame;
                    self.canvas.invalidate();
                    self.canvas.draw(frame, &self.frames);
                }
                FrameEvent::AllSettled => {
                    self.frames_settled = true;
                    let missing = self.frames.len() - self.frames.ready_count();
                    if missing > 0 {
                        self.status_message =
                            Some(format!("{missing} of {} frames unavailable", self.frames.len()));
                    }
                }
            }
        }
    }

    /// Short description of what the scroll core is doing.
    pub fn status_summary(&self) -> String {
        let signals = self.coordinator.signals();
        let loading = if self.frames_settled {
            String::new()
        } else {
            format!(" | frames {}/{}", self.frames.ready_count(), self.frames.len())
        };
        let mut flags = String::new();
        if signals.page_moving {
            flags.push_str(" ~");
        }
        if signals.rail.locked {
            flags.push_str(" | rail locked");
        }
        if signals.jump_queued {
            flags.push_str(" | jump queued");
        }
        format!(
            "{:?} | y {:.0}{} | frame {}/{}{}",
            signals.mode,
            signals.scroll_y,
            flags,
            signals.frame + 1,
            self.frames.len(),
            loading,
        )
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;

    #[test]
    fn first_frame_is_drawn_as_soon_as_it_arrives() {
        let now = Instant::now();
        let mut state = AppState::new(AppConfig::default(), 3, Rect::new(0, 0, 80, 25), now);
        state.tick(now);
        assert_eq!(state.canvas.last_drawn(), None);

        state.frames.request(0);
        let events = state.frames.complete(0, Ok(RgbaImage::new(2, 2)));
        state.on_frame_events(&events);
        assert_eq!(state.canvas.last_drawn(), Some(0));
        assert!(state.canvas.image().is_some());
    }

    #[test]
    fn summary_mentions_loading_and_queued_jumps() {
        use crate::core::orchestrator::JumpTarget;
        use crate::core::page::FOOTER_SECTION;

        let now = Instant::now();
        let mut state = AppState::new(AppConfig::default(), 3, Rect::new(0, 0, 80, 25), now);
        let summary = state.status_summary();
        assert!(summary.contains("frame 1/3"), "{summary}");
        assert!(summary.contains("frames 0/3"), "{summary}");

        state
            .coordinator
            .jump_to(JumpTarget::section(FOOTER_SECTION), now)
            .unwrap();
        state.coordinator.jump_to_top(now);
        assert!(state.status_summary().contains("jump queued"));
    }

    #[test]
    fn missing_frames_are_reported_once_settled() {
        use crate::core::frames::FrameError;

        let now = Instant::now();
        let mut state = AppState::new(AppConfig::default(), 2, Rect::new(0, 0, 80, 25), now);
        for index in state.frames.next_batch(2) {
            let result = if index == 0 {
                Ok(RgbaImage::new(1, 1))
            } else {
                Err(FrameError::OutOfRange { index, count: 1 })
            };
            let events = state.frames.complete(index, result);
            state.on_frame_events(&events);
        }
        assert!(state.frames_settled);
        assert_eq!(state.status_message.as_deref(), Some("1 of 2 frames unavailable"));
        assert_eq!(state.canvas.last_drawn(), Some(0));
    }
}
