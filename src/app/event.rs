//! Terminal event abstraction.
//!
//! Wraps crossterm events into a simpler enum and runs a background task that
//! forwards them over a channel so the main loop stays non-blocking.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEventKind};
use tokio::sync::mpsc;

/// One mouse-wheel notch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelNotch {
    Up,
    Down,
    Left,
    Right,
}

impl WheelNotch {
    /// `(delta_x, delta_y)` in page pixels, positive meaning right / down.
    pub fn delta(self, line_px: f64) -> (f64, f64) {
        match self {
            Self::Up => (0.0, -line_px),
            Self::Down => (0.0, line_px),
            Self::Left => (-line_px, 0.0),
            Self::Right => (line_px, 0.0),
        }
    }
}

/// High-level events consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Wheel(WheelNotch),
    Resize(u16, u16),
}

/// Reduce a raw terminal event to what the page cares about.
pub fn translate(ev: CtEvent) -> Option<AppEvent> {
    match ev {
        CtEvent::Key(k) if k.kind != KeyEventKind::Release => Some(AppEvent::Key(k)),
        CtEvent::Mouse(m) => {
            let notch = match m.kind {
                MouseEventKind::ScrollUp => WheelNotch::Up,
                MouseEventKind::ScrollDown => WheelNotch::Down,
                MouseEventKind::ScrollLeft => WheelNotch::Left,
                MouseEventKind::ScrollRight => WheelNotch::Right,
                _ => return None,
            };
            Some(AppEvent::Wheel(notch))
        }
        CtEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

/// Spawns a background task that polls the terminal for events and sends them
/// through the returned channel.
pub fn spawn_event_reader(poll_rate: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            if !event::poll(poll_rate).unwrap_or(false) {
                continue;
            }
            let Ok(ev) = event::read() else {
                continue;
            };
            if let Some(app_event) = translate(ev) {
                if tx.send(app_event).is_err() {
                    break; // receiver dropped
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers, MouseEvent};

    use super::*;

    fn mouse(kind: MouseEventKind) -> CtEvent {
        CtEvent::Mouse(MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn wheel_notches_become_pixel_deltas() {
        assert!(matches!(
            translate(mouse(MouseEventKind::ScrollDown)),
            Some(AppEvent::Wheel(WheelNotch::Down))
        ));
        assert_eq!(WheelNotch::Down.delta(100.0), (0.0, 100.0));
        assert_eq!(WheelNotch::Left.delta(100.0), (-100.0, 0.0));
    }

    #[test]
    fn clicks_and_key_releases_are_dropped() {
        assert!(translate(mouse(MouseEventKind::Moved)).is_none());
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(translate(CtEvent::Key(release)).is_none());
        assert!(matches!(translate(CtEvent::Resize(80, 24)), Some(AppEvent::Resize(80, 24))));
    }
}
