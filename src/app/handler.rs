//! Input handling: maps key/wheel/resize events to state mutations.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::config::Action;
use crate::core::orchestrator::JumpTarget;
use crate::core::page::{FOOTER_SECTION, RAIL_SECTION};
use crate::core::rail::RailKey;
use crate::ui::layout::AppLayout;

use super::event::WheelNotch;
use super::state::AppState;

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent, now: Instant) {
    // Ctrl+c always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };
    state.status_message = None;
    let line = state.config.wheel_line_px;

    match action {
        Action::Quit => state.should_quit = true,
        Action::ScrollDown => {
            state.coordinator.on_wheel(0.0, line);
        }
        Action::ScrollUp => {
            state.coordinator.on_wheel(0.0, -line);
        }
        Action::PageDown => page_jump(state, 1.0, now),
        Action::PageUp => page_jump(state, -1.0, now),
        Action::RailLeft => {
            state.coordinator.on_rail_key(RailKey::Left);
        }
        Action::RailRight => {
            state.coordinator.on_rail_key(RailKey::Right);
        }
        Action::JumpTop => state.coordinator.jump_to_top(now),
        Action::JumpAbout => jump(state, JumpTarget::section("about"), now),
        Action::JumpProjects => jump(state, JumpTarget::section(RAIL_SECTION), now),
        Action::JumpExperience => jump(state, JumpTarget::section("experience"), now),
        Action::JumpFooter => jump(state, JumpTarget::section(FOOTER_SECTION), now),
    }
}

fn jump(state: &mut AppState, target: JumpTarget, now: Instant) {
    if let Err(err) = state.coordinator.jump_to(target, now) {
        tracing::warn!(%err, "jump ignored");
        state.status_message = Some(err.to_string());
    }
}

/// Jump one viewport height up or down, staged like any other jump.
fn page_jump(state: &mut AppState, direction: f64, now: Instant) {
    let height = state.coordinator.page().viewport().height;
    let y = state.coordinator.scroll_y() + direction * height;
    jump(state, JumpTarget::Offset(y), now);
}

pub fn handle_wheel(state: &mut AppState, notch: WheelNotch) {
    let (dx, dy) = notch.delta(state.config.wheel_line_px);
    state.coordinator.on_wheel(dx, dy);
}

pub fn handle_resize(state: &mut AppState, width: u16, height: u16) {
    state.terminal_area = Rect::new(0, 0, width, height);
    let viewport = AppLayout::from_area(state.terminal_area).viewport();
    tracing::debug!(width = viewport.width, height = viewport.height, "viewport resized");
    state.coordinator.on_resize(viewport);
    state.canvas.invalidate();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::AppConfig;

    fn state(now: Instant) -> AppState {
        let mut config = AppConfig::default();
        config.reduced_motion = true;
        AppState::new(config, 24, Rect::new(0, 0, 100, 41), now)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn settle(state: &mut AppState, mut now: Instant) -> Instant {
        for _ in 0..1000 {
            now += Duration::from_millis(16);
            state.tick(now);
            if !state.coordinator.is_staging() {
                break;
            }
        }
        now
    }

    #[test]
    fn end_stages_a_crossing_to_the_footer() {
        let now = Instant::now();
        let mut s = state(now);
        handle_key(&mut s, press(KeyCode::End), now);
        assert!(s.coordinator.is_staging());
        settle(&mut s, now);
        assert!(!s.coordinator.is_staging());
        assert_eq!(s.coordinator.scroll_y(), s.coordinator.page().max_scroll());
        assert!(s.coordinator.rail().state().reached_end);
    }

    #[test]
    fn scroll_keys_move_the_page_by_one_line() {
        let now = Instant::now();
        let mut s = state(now);
        handle_key(&mut s, press(KeyCode::Char('j')), now);
        s.tick(now);
        assert_eq!(s.coordinator.scroll_y(), 100.0);
        handle_wheel(&mut s, WheelNotch::Up);
        s.tick(now);
        assert_eq!(s.coordinator.scroll_y(), 0.0);
    }

    #[test]
    fn page_keys_jump_a_viewport_at_a_time() {
        let now = Instant::now();
        let mut s = state(now);
        let height = s.coordinator.page().viewport().height;
        handle_key(&mut s, press(KeyCode::PageDown), now);
        let now = settle(&mut s, now);
        assert_eq!(s.coordinator.scroll_y(), height);
        handle_key(&mut s, press(KeyCode::Char(' ')), now);
        let now = settle(&mut s, now);
        assert_eq!(s.coordinator.scroll_y(), 2.0 * height);
        handle_key(&mut s, press(KeyCode::PageUp), now);
        settle(&mut s, now);
        assert_eq!(s.coordinator.scroll_y(), height);
    }

    #[test]
    fn quit_and_ctrl_c_stop_the_loop() {
        let now = Instant::now();
        let mut s = state(now);
        handle_key(&mut s, press(KeyCode::Char('q')), now);
        assert!(s.should_quit);

        let mut s = state(now);
        handle_key(&mut s, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), now);
        assert!(s.should_quit);
    }

    #[test]
    fn jumping_to_a_removed_section_reports_in_the_status_bar() {
        let now = Instant::now();
        let mut s = state(now);
        s.coordinator.remove_section("experience");
        handle_key(&mut s, press(KeyCode::Char('3')), now);
        assert!(!s.coordinator.is_staging());
        assert_eq!(s.status_message.as_deref(), Some("section `experience` is not on the page"));
    }

    #[test]
    fn resize_rebuilds_the_viewport() {
        let now = Instant::now();
        let mut s = state(now);
        handle_resize(&mut s, 50, 21);
        assert_eq!(s.coordinator.page().viewport().width, 400.0);
        assert_eq!(s.coordinator.page().viewport().height, 320.0);
    }
}
