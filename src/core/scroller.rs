//! Page scroller: the smooth-scroll primitive under the whole core.
//!
//! Two motions share one position:
//!
//! * **wheel glide**: wheel deltas move a glide target; each tick the
//!   position closes a fixed fraction of the remaining gap, so the page
//!   decelerates visibly into place.
//! * **legs**: programmatic `scroll_to` calls with a duration and easing,
//!   each reporting completion (or cancellation) exactly once.
//!
//! [`InstantScroller`] is the fallback when motion is unwanted: every move
//! lands immediately and completion is reported on the next tick.

use std::time::{Duration, Instant};

use super::ease::Ease;
use super::tween::Tween;

/// Handle identifying one `scroll_to` leg.
pub type LegId = u64;

/// Below this many pixels the glide snaps onto its target.
const GLIDE_SNAP_PX: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOptions {
    pub duration: Duration,
    pub ease: Ease,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1500),
            ease: Ease::InOutCubic,
        }
    }
}

/// Things that happened during a tick, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollerEvent {
    Scrolled(f64),
    LegComplete(LegId),
    /// The leg was superseded by another leg, by user wheel input or by
    /// [`SmoothScroll::stop`].
    LegCancelled(LegId),
}

/// Contract the scroll core relies on.
pub trait SmoothScroll: std::fmt::Debug + Send {
    fn position(&self) -> f64;
    /// New maximum scroll offset; the position is clamped into it.
    fn set_bounds(&mut self, max_scroll: f64);
    /// Start a leg toward `target`.  Any running leg is cancelled.
    fn scroll_to(&mut self, target: f64, options: ScrollOptions, now: Instant) -> LegId;
    /// User wheel input.  Returns `false` while stopped.
    fn wheel(&mut self, delta_y: f64) -> bool;
    /// Suspend user scrolling and cancel any motion in flight.
    fn stop(&mut self);
    fn start(&mut self);
    fn is_moving(&self) -> bool;
    fn tick(&mut self, now: Instant) -> Vec<ScrollerEvent>;
}

#[derive(Debug, Clone, Copy)]
struct Leg {
    id: LegId,
    tween: Tween,
}

// ───────────────────────────────────────── eased ─────────────

#[derive(Debug)]
pub struct EasedScroller {
    position: f64,
    max_scroll: f64,
    stopped: bool,
    glide_target: f64,
    /// Fraction of the remaining glide gap closed per tick.
    glide_speed: f64,
    leg: Option<Leg>,
    next_leg: LegId,
    pending: Vec<ScrollerEvent>,
}

impl EasedScroller {
    pub fn new(position: f64, max_scroll: f64, glide_speed: f64) -> Self {
        let max_scroll = max_scroll.max(0.0);
        let position = position.clamp(0.0, max_scroll);
        Self {
            position,
            max_scroll,
            stopped: false,
            glide_target: position,
            glide_speed: glide_speed.clamp(0.05, 0.95),
            leg: None,
            next_leg: 1,
            pending: Vec::new(),
        }
    }

    fn cancel_leg(&mut self) {
        if let Some(leg) = self.leg.take() {
            tracing::debug!(leg = leg.id, at = self.position, "scroll leg cancelled");
            self.pending.push(ScrollerEvent::LegCancelled(leg.id));
        }
    }

    fn move_to(&mut self, y: f64, out: &mut Vec<ScrollerEvent>) {
        let y = y.clamp(0.0, self.max_scroll);
        if y != self.position {
            self.position = y;
            out.push(ScrollerEvent::Scrolled(y));
        }
    }
}

impl SmoothScroll for EasedScroller {
    fn position(&self) -> f64 {
        self.position
    }

    fn set_bounds(&mut self, max_scroll: f64) {
        self.max_scroll = max_scroll.max(0.0);
        self.glide_target = self.glide_target.clamp(0.0, self.max_scroll);
        let clamped = self.position.clamp(0.0, self.max_scroll);
        if clamped != self.position {
            self.position = clamped;
            self.pending.push(ScrollerEvent::Scrolled(clamped));
        }
    }

    fn scroll_to(&mut self, target: f64, options: ScrollOptions, now: Instant) -> LegId {
        self.cancel_leg();
        let id = self.next_leg;
        self.next_leg += 1;
        let to = target.clamp(0.0, self.max_scroll);
        tracing::debug!(leg = id, from = self.position, to, "scroll leg");
        self.leg = Some(Leg {
            id,
            tween: Tween::new(self.position, to, now, options.duration, options.ease),
        });
        self.glide_target = to;
        id
    }

    fn wheel(&mut self, delta_y: f64) -> bool {
        if self.stopped {
            return false;
        }
        if self.leg.is_some() {
            self.cancel_leg();
            self.glide_target = self.position;
        }
        self.glide_target = (self.glide_target + delta_y).clamp(0.0, self.max_scroll);
        true
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.cancel_leg();
        self.glide_target = self.position;
    }

    fn start(&mut self) {
        self.stopped = false;
    }

    fn is_moving(&self) -> bool {
        self.leg.is_some() || self.glide_target != self.position
    }

    fn tick(&mut self, now: Instant) -> Vec<ScrollerEvent> {
        let mut out = std::mem::take(&mut self.pending);

        if let Some(leg) = self.leg {
            self.move_to(leg.tween.sample(now), &mut out);
            if leg.tween.is_done(now) {
                self.leg = None;
                self.glide_target = self.position;
                out.push(ScrollerEvent::LegComplete(leg.id));
            }
            return out;
        }

        if self.stopped {
            return out;
        }

        let gap = self.glide_target - self.position;
        if gap != 0.0 {
            let remaining = gap * (1.0 - self.glide_speed);
            let next = if remaining.abs() < GLIDE_SNAP_PX {
                self.glide_target
            } else {
                self.glide_target - remaining
            };
            self.move_to(next, &mut out);
        }
        out
    }
}

// ───────────────────────────────────────── instant ───────────

/// Motionless fallback: jumps immediately, completes on the next tick.
#[derive(Debug)]
pub struct InstantScroller {
    position: f64,
    max_scroll: f64,
    stopped: bool,
    next_leg: LegId,
    pending: Vec<ScrollerEvent>,
}

impl InstantScroller {
    pub fn new(position: f64, max_scroll: f64) -> Self {
        let max_scroll = max_scroll.max(0.0);
        Self {
            position: position.clamp(0.0, max_scroll),
            max_scroll,
            stopped: false,
            next_leg: 1,
            pending: Vec::new(),
        }
    }

    fn jump(&mut self, y: f64) {
        let y = y.clamp(0.0, self.max_scroll);
        if y != self.position {
            self.position = y;
            self.pending.push(ScrollerEvent::Scrolled(y));
        }
    }
}

impl SmoothScroll for InstantScroller {
    fn position(&self) -> f64 {
        self.position
    }

    fn set_bounds(&mut self, max_scroll: f64) {
        self.max_scroll = max_scroll.max(0.0);
        self.jump(self.position);
    }

    fn scroll_to(&mut self, target: f64, _options: ScrollOptions, _now: Instant) -> LegId {
        let id = self.next_leg;
        self.next_leg += 1;
        self.jump(target);
        self.pending.push(ScrollerEvent::LegComplete(id));
        id
    }

    fn wheel(&mut self, delta_y: f64) -> bool {
        if self.stopped {
            return false;
        }
        self.jump(self.position + delta_y);
        true
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn start(&mut self) {
        self.stopped = false;
    }

    fn is_moving(&self) -> bool {
        !self.pending.is_empty()
    }

    fn tick(&mut self, _now: Instant) -> Vec<ScrollerEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(16);

    fn run_until_idle(s: &mut dyn SmoothScroll, mut now: Instant) -> (Vec<ScrollerEvent>, Instant) {
        let mut all = Vec::new();
        for _ in 0..2000 {
            now += TICK;
            all.extend(s.tick(now));
            if !s.is_moving() {
                break;
            }
        }
        (all, now)
    }

    #[test]
    fn wheel_glide_decelerates_onto_target() {
        let t0 = Instant::now();
        let mut s = EasedScroller::new(0.0, 5000.0, 0.3);
        assert!(s.wheel(100.0));
        match s.tick(t0 + TICK).as_slice() {
            [ScrollerEvent::Scrolled(y)] => assert!((y - 30.0).abs() < 1e-9),
            other => panic!("unexpected events {other:?}"),
        }
        run_until_idle(&mut s, t0 + TICK);
        assert_eq!(s.position(), 100.0);
    }

    #[test]
    fn leg_reports_completion_once_at_target() {
        let t0 = Instant::now();
        let mut s = EasedScroller::new(0.0, 5000.0, 0.3);
        let id = s.scroll_to(3000.0, ScrollOptions::default(), t0);
        let mid = s.tick(t0 + Duration::from_millis(750));
        assert_eq!(mid, vec![ScrollerEvent::Scrolled(1500.0)]);
        let end = s.tick(t0 + Duration::from_millis(1500));
        assert_eq!(end, vec![ScrollerEvent::Scrolled(3000.0), ScrollerEvent::LegComplete(id)]);
        assert!(s.tick(t0 + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn new_leg_cancels_previous() {
        let t0 = Instant::now();
        let mut s = EasedScroller::new(0.0, 5000.0, 0.3);
        let a = s.scroll_to(3000.0, ScrollOptions::default(), t0);
        let b = s.scroll_to(100.0, ScrollOptions::default(), t0);
        let events = s.tick(t0 + Duration::from_secs(2));
        assert_eq!(events.first(), Some(&ScrollerEvent::LegCancelled(a)));
        assert_eq!(events.last(), Some(&ScrollerEvent::LegComplete(b)));
    }

    #[test]
    fn user_wheel_interrupts_a_leg() {
        let t0 = Instant::now();
        let mut s = EasedScroller::new(0.0, 5000.0, 0.3);
        let id = s.scroll_to(3000.0, ScrollOptions::default(), t0);
        s.tick(t0 + Duration::from_millis(500));
        s.wheel(50.0);
        let events = s.tick(t0 + Duration::from_millis(516));
        assert_eq!(events.first(), Some(&ScrollerEvent::LegCancelled(id)));
    }

    #[test]
    fn stop_freezes_position_and_rejects_wheel() {
        let t0 = Instant::now();
        let mut s = EasedScroller::new(0.0, 5000.0, 0.3);
        s.wheel(500.0);
        s.tick(t0 + TICK);
        let frozen = s.position();
        s.stop();
        assert!(!s.wheel(100.0));
        for i in 2..20 {
            s.tick(t0 + TICK * i);
        }
        assert_eq!(s.position(), frozen);
        s.start();
        assert!(s.wheel(100.0));
    }

    #[test]
    fn bounds_clamp_targets_and_position() {
        let t0 = Instant::now();
        let mut s = EasedScroller::new(900.0, 1000.0, 0.3);
        s.set_bounds(500.0);
        assert_eq!(s.position(), 500.0);
        assert_eq!(s.tick(t0), vec![ScrollerEvent::Scrolled(500.0)]);
        let id = s.scroll_to(-200.0, ScrollOptions::default(), t0);
        let (events, _) = run_until_idle(&mut s, t0);
        assert_eq!(s.position(), 0.0);
        assert_eq!(events.last(), Some(&ScrollerEvent::LegComplete(id)));
    }

    #[test]
    fn instant_scroller_jumps_and_completes_next_tick() {
        let t0 = Instant::now();
        let mut s = InstantScroller::new(0.0, 4000.0);
        let id = s.scroll_to(2500.0, ScrollOptions::default(), t0);
        assert_eq!(s.position(), 2500.0);
        assert_eq!(
            s.tick(t0),
            vec![ScrollerEvent::Scrolled(2500.0), ScrollerEvent::LegComplete(id)]
        );
        s.stop();
        assert!(!s.wheel(10.0));
    }
}
