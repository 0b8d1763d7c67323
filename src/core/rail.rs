//! Horizontal rail controller.
//!
//! A finite-state machine over [`RailPhase`].  While `Locked` the page does
//! not scroll: vertical wheel input moves the card rail sideways instead,
//! and pushing past either end releases the lock.  Page-scroll direction
//! decides when to lock; a staged jump suppresses those automatic decisions
//! and drives the rail through the control surface at the bottom of this
//! file instead.

use std::time::{Duration, Instant};

use super::ease::Ease;
use super::page::SectionRect;
use super::tween::Tween;

/// Offsets within this many pixels of an end count as being at that end.
const EDGE_TOLERANCE: f64 = 5.0;

/// Downward lock band: section top within `[-50, 5]` of the viewport top…
const LOCK_DOWN_TOP_MIN: f64 = -50.0;
const LOCK_DOWN_TOP_MAX: f64 = 5.0;
/// …while its bottom is still below 30% of the viewport.
const LOCK_DOWN_MIN_BOTTOM_VH: f64 = 0.3;
/// Upward re-entry band, only after leaving through the bottom.
const LOCK_UP_TOP_MIN: f64 = -10.0;
const LOCK_UP_TOP_MAX: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailTuning {
    /// Wheel `delta_y` is scaled by this before moving the rail.
    pub wheel_multiplier: f64,
    /// Arrow-key step in pixels.
    pub key_step: f64,
    /// Length of [`RailController::animate_to`].
    pub animation: Duration,
}

impl Default for RailTuning {
    fn default() -> Self {
        Self {
            wheel_multiplier: 1.5,
            key_step: 300.0,
            animation: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailPhase {
    Unlocked,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailEdge {
    Start,
    End,
}

/// Why the rail released the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailExit {
    /// Pushed down past the last card.
    Forward,
    /// Pushed up past the first card.
    Backward,
    /// The section left the viewport while locked.
    Safety,
    /// The rail has nothing to scroll (`max_offset <= 0`).
    Inconsistent,
    /// Unlocked through the control surface.
    Forced,
}

/// Phase change the host must react to (stop / start page scrolling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailTransition {
    Locked,
    Unlocked(RailExit),
}

/// What the page should do with a wheel event after the rail saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelOutcome {
    /// Not the rail's business; scroll the page.
    PassThrough,
    /// The rail swallowed it; the page must not move.
    Consumed,
    /// The rail unlocked on this event.  The event itself is swallowed; the
    /// page scrolls again from the next one.
    Released(RailExit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailKey {
    Left,
    Right,
}

/// Snapshot of the rail for readers outside the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailState {
    pub offset: f64,
    pub max_offset: f64,
    pub locked: bool,
    pub reached_start: bool,
    pub reached_end: bool,
    pub exited_from_bottom: bool,
}

#[derive(Debug, Clone, Copy)]
struct RailAnimation {
    tween: Tween,
    edge: RailEdge,
}

#[derive(Debug)]
pub struct RailController {
    phase: RailPhase,
    offset: f64,
    max_offset: f64,
    reached_start: bool,
    reached_end: bool,
    exited_from_bottom: bool,
    last_scroll_y: f64,
    animation: Option<RailAnimation>,
    tuning: RailTuning,
}

impl RailController {
    pub fn new(content_width: f64, viewport_width: f64, scroll_y: f64, tuning: RailTuning) -> Self {
        Self {
            phase: RailPhase::Unlocked,
            offset: 0.0,
            max_offset: (content_width - viewport_width).max(0.0),
            reached_start: true,
            reached_end: false,
            exited_from_bottom: false,
            last_scroll_y: scroll_y,
            animation: None,
            tuning,
        }
    }

    pub fn state(&self) -> RailState {
        RailState {
            offset: self.offset,
            max_offset: self.max_offset,
            locked: self.is_locked(),
            reached_start: self.reached_start,
            reached_end: self.reached_end,
            exited_from_bottom: self.exited_from_bottom,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.phase == RailPhase::Locked
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn max_offset(&self) -> f64 {
        self.max_offset
    }

    /// Rail progress in `[0, 1]`; zero for a rail with nothing to scroll.
    pub fn progress(&self) -> f64 {
        if self.max_offset <= 0.0 {
            0.0
        } else {
            self.offset / self.max_offset
        }
    }

    /// 1-based index of the card under the rail's leading edge, biased by
    /// half a card; the last card once its start has been reached.
    pub fn card_counter(&self, card_width: f64, card_count: usize) -> usize {
        if card_count == 0 {
            return 0;
        }
        let width = if card_width > 0.0 { card_width } else { 1.0 };
        if self.offset >= width * (card_count - 1) as f64 {
            return card_count;
        }
        let idx = ((self.offset + width / 2.0) / width).floor() as usize + 1;
        idx.clamp(1, card_count)
    }

    /// Viewport or content width changed.
    pub fn resize(&mut self, content_width: f64, viewport_width: f64) {
        self.max_offset = (content_width - viewport_width).max(0.0);
        self.set_offset(self.offset);
    }

    // ── event-driven path ───────────────────────────────────────

    /// Page scrolled to `scroll_y`; `rect` is the rail section relative to
    /// the viewport.  Returns the phase change, if any.
    pub fn on_page_scroll(
        &mut self,
        scroll_y: f64,
        rect: SectionRect,
        viewport_height: f64,
        staging: bool,
    ) -> Option<RailTransition> {
        let scrolling_down = scroll_y > self.last_scroll_y;
        let scrolling_up = scroll_y < self.last_scroll_y;
        self.last_scroll_y = scroll_y;

        if let Some(released) = self.on_viewport_change(rect, viewport_height) {
            return Some(released);
        }

        if staging || self.is_locked() || self.max_offset <= 0.0 {
            return None;
        }

        if scrolling_down
            && (LOCK_DOWN_TOP_MIN..=LOCK_DOWN_TOP_MAX).contains(&rect.top)
            && rect.bottom > viewport_height * LOCK_DOWN_MIN_BOTTOM_VH
            && !self.reached_end
        {
            self.exited_from_bottom = false;
            return self.engage();
        }

        if scrolling_up
            && self.exited_from_bottom
            && (LOCK_UP_TOP_MIN..=LOCK_UP_TOP_MAX).contains(&rect.top)
        {
            self.exited_from_bottom = false;
            self.offset = self.max_offset;
            self.refresh_edges();
            return self.engage();
        }

        None
    }

    /// Geometry changed under a still page (resize, a section removed).
    /// Only the safety release applies: a locked rail whose section is no
    /// longer on screen lets go of the page.
    pub fn on_viewport_change(
        &mut self,
        rect: SectionRect,
        viewport_height: f64,
    ) -> Option<RailTransition> {
        if rect.intersects(viewport_height) {
            return None;
        }
        if rect.bottom < 0.0 {
            self.exited_from_bottom = true;
        }
        if !self.is_locked() {
            return None;
        }
        tracing::debug!(top = rect.top, "rail section left the viewport while locked");
        self.release(RailExit::Safety)
    }

    /// Wheel input.  Horizontal-dominant gestures never move the rail.
    pub fn on_wheel(&mut self, delta_x: f64, delta_y: f64) -> WheelOutcome {
        if delta_x.abs() > delta_y.abs() {
            return if self.is_locked() {
                WheelOutcome::Consumed
            } else {
                WheelOutcome::PassThrough
            };
        }
        if !self.is_locked() {
            return WheelOutcome::PassThrough;
        }
        if self.max_offset <= 0.0 {
            self.release(RailExit::Inconsistent);
            return WheelOutcome::Released(RailExit::Inconsistent);
        }

        let delta = delta_y * self.tuning.wheel_multiplier;

        if delta > 0.0 && self.reached_end {
            self.exited_from_bottom = true;
            self.release(RailExit::Forward);
            return WheelOutcome::Released(RailExit::Forward);
        }
        if delta < 0.0 && self.reached_start {
            self.reached_end = false;
            self.exited_from_bottom = false;
            self.release(RailExit::Backward);
            return WheelOutcome::Released(RailExit::Backward);
        }

        self.set_offset(self.offset + delta);
        WheelOutcome::Consumed
    }

    /// Arrow keys while locked.  Returns `true` when consumed.
    pub fn on_key(&mut self, key: RailKey) -> bool {
        if !self.is_locked() || self.max_offset <= 0.0 {
            return false;
        }
        let step = match key {
            RailKey::Left => -self.tuning.key_step,
            RailKey::Right => self.tuning.key_step,
        };
        self.set_offset(self.offset + step);
        true
    }

    fn engage(&mut self) -> Option<RailTransition> {
        if self.lock() {
            tracing::debug!(offset = self.offset, "rail locked");
            Some(RailTransition::Locked)
        } else {
            None
        }
    }

    fn release(&mut self, exit: RailExit) -> Option<RailTransition> {
        if self.unlock() {
            tracing::debug!(?exit, offset = self.offset, "rail unlocked");
            Some(RailTransition::Unlocked(exit))
        } else {
            None
        }
    }

    fn refresh_edges(&mut self) {
        self.reached_end = self.offset >= self.max_offset - EDGE_TOLERANCE;
        self.reached_start = self.offset <= EDGE_TOLERANCE;
    }

    // ── control surface (staged jumps) ──────────────────────────

    /// Returns `true` if the phase changed.
    pub fn lock(&mut self) -> bool {
        let changed = self.phase != RailPhase::Locked;
        self.phase = RailPhase::Locked;
        changed
    }

    /// Returns `true` if the phase changed.
    pub fn unlock(&mut self) -> bool {
        let changed = self.phase != RailPhase::Unlocked;
        self.phase = RailPhase::Unlocked;
        changed
    }

    /// Move the rail without animation, clamped to `[0, max_offset]`.
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset.clamp(0.0, self.max_offset);
        self.refresh_edges();
    }

    pub fn set_edge(&mut self, edge: RailEdge) {
        match edge {
            RailEdge::Start => self.set_offset(0.0),
            RailEdge::End => self.set_offset(self.max_offset),
        }
    }

    pub fn reset_flags(
        &mut self,
        reached_end: bool,
        reached_start: bool,
        exited_from_bottom: bool,
    ) {
        self.reached_end = reached_end;
        self.reached_start = reached_start;
        self.exited_from_bottom = exited_from_bottom;
    }

    /// Start an eased animation to `edge`; completion is reported by
    /// [`RailController::tick`].
    pub fn animate_to(&mut self, edge: RailEdge, now: Instant) {
        let to = match edge {
            RailEdge::Start => 0.0,
            RailEdge::End => self.max_offset,
        };
        tracing::debug!(?edge, from = self.offset, to, "rail animation");
        self.animation = Some(RailAnimation {
            tween: Tween::new(self.offset, to, now, self.tuning.animation, Ease::InOutCubic),
            edge,
        });
    }

    /// Advance a running animation.  Returns the edge once it finishes.
    pub fn tick(&mut self, now: Instant) -> Option<RailEdge> {
        let anim = self.animation?;
        self.set_offset(anim.tween.sample(now));
        if !anim.tween.is_done(now) {
            return None;
        }
        self.animation = None;
        self.reached_end = anim.edge == RailEdge::End;
        self.reached_start = anim.edge == RailEdge::Start;
        Some(anim.edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VH: f64 = 1000.0;

    fn rail(max_offset: f64) -> RailController {
        RailController::new(max_offset + 1600.0, 1600.0, 0.0, RailTuning::default())
    }

    fn rect(top: f64) -> SectionRect {
        SectionRect {
            top,
            bottom: top + VH,
        }
    }

    /// Scroll the page so the section top sits at `top`; the section's
    /// absolute top is 5000.
    fn scroll_to(r: &mut RailController, top: f64, staging: bool) -> Option<RailTransition> {
        r.on_page_scroll(5000.0 - top, rect(top), VH, staging)
    }

    #[test]
    fn ten_wheel_steps_then_clamp_and_release_forward() {
        let mut r = rail(4000.0);
        r.lock();
        for _ in 0..10 {
            assert_eq!(r.on_wheel(0.0, 150.0), WheelOutcome::Consumed);
        }
        assert_eq!(r.offset(), 2250.0);
        assert!(!r.state().reached_end);

        for _ in 0..8 {
            assert_eq!(r.on_wheel(0.0, 150.0), WheelOutcome::Consumed);
        }
        assert_eq!(r.offset(), 4000.0);
        assert!(r.state().reached_end);

        assert_eq!(r.on_wheel(0.0, 150.0), WheelOutcome::Released(RailExit::Forward));
        assert!(!r.is_locked());
        assert!(r.state().exited_from_bottom);
        assert_eq!(r.offset(), 4000.0);
    }

    #[test]
    fn eleventh_step_clamps_on_a_short_rail() {
        let mut r = rail(2400.0);
        r.lock();
        for _ in 0..10 {
            r.on_wheel(0.0, 150.0);
        }
        assert_eq!(r.offset(), 2250.0);
        r.on_wheel(0.0, 150.0);
        assert_eq!(r.offset(), 2400.0);
        assert!(r.state().reached_end);
    }

    #[test]
    fn offset_stays_clamped_for_any_delta_sequence() {
        let mut r = rail(3000.0);
        r.lock();
        let mut seed: u64 = 0x5eed;
        for _ in 0..5000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let delta = ((seed >> 33) % 2001) as f64 - 1000.0;
            if let WheelOutcome::Released(_) = r.on_wheel(0.0, delta) {
                r.lock();
            }
            let s = r.state();
            assert!(s.offset >= 0.0 && s.offset <= s.max_offset, "offset {}", s.offset);
        }
    }

    #[test]
    fn upward_push_at_start_releases_backward() {
        let mut r = rail(2000.0);
        r.lock();
        assert_eq!(r.on_wheel(0.0, -40.0), WheelOutcome::Released(RailExit::Backward));
        let s = r.state();
        assert!(!s.locked);
        assert!(!s.reached_end);
        assert!(!s.exited_from_bottom);
    }

    #[test]
    fn horizontal_gestures_are_swallowed_only_while_locked() {
        let mut r = rail(2000.0);
        assert_eq!(r.on_wheel(120.0, 10.0), WheelOutcome::PassThrough);
        r.lock();
        assert_eq!(r.on_wheel(120.0, 10.0), WheelOutcome::Consumed);
        assert_eq!(r.offset(), 0.0);
    }

    #[test]
    fn unlocked_wheel_passes_through() {
        let mut r = rail(2000.0);
        assert_eq!(r.on_wheel(0.0, 100.0), WheelOutcome::PassThrough);
        assert_eq!(r.offset(), 0.0);
    }

    #[test]
    fn zero_width_rail_never_locks_and_releases_immediately() {
        let mut r = RailController::new(800.0, 1600.0, 0.0, RailTuning::default());
        assert_eq!(r.max_offset(), 0.0);
        scroll_to(&mut r, 200.0, false);
        assert_eq!(scroll_to(&mut r, 0.0, false), None);
        r.lock();
        assert_eq!(r.on_wheel(0.0, 100.0), WheelOutcome::Released(RailExit::Inconsistent));
        assert!(!r.is_locked());
    }

    #[test]
    fn scrolling_down_into_band_locks() {
        let mut r = rail(2000.0);
        scroll_to(&mut r, 400.0, false);
        assert_eq!(scroll_to(&mut r, 100.0, false), None);
        assert_eq!(scroll_to(&mut r, 3.0, false), Some(RailTransition::Locked));
        assert!(r.is_locked());
    }

    #[test]
    fn scrolling_up_from_above_does_not_lock() {
        // Start further down the page, so every step below is upward.
        let mut r = RailController::new(3600.0, 1600.0, 6000.0, RailTuning::default());
        assert_eq!(scroll_to(&mut r, -30.0, false), None);
        assert_eq!(scroll_to(&mut r, 0.0, false), None);
        assert!(!r.is_locked());
    }

    #[test]
    fn staging_suppresses_automatic_lock() {
        let mut r = rail(2000.0);
        scroll_to(&mut r, 400.0, true);
        assert_eq!(scroll_to(&mut r, 0.0, true), None);
        assert!(!r.is_locked());
    }

    #[test]
    fn fully_traversed_rail_does_not_relock_downward() {
        let mut r = rail(2000.0);
        r.set_edge(RailEdge::End);
        scroll_to(&mut r, 400.0, false);
        assert_eq!(scroll_to(&mut r, 0.0, false), None);
    }

    #[test]
    fn reentering_from_below_locks_at_the_end() {
        let mut r = rail(2000.0);
        // Section scrolled fully above the viewport.
        scroll_to(&mut r, -1500.0, false);
        assert!(r.state().exited_from_bottom);
        scroll_to(&mut r, -400.0, false);
        assert_eq!(scroll_to(&mut r, 10.0, false), Some(RailTransition::Locked));
        let s = r.state();
        assert_eq!(s.offset, 2000.0);
        assert!(s.reached_end && !s.reached_start && !s.exited_from_bottom);
    }

    #[test]
    fn safety_unlock_when_section_leaves_viewport() {
        let mut r = rail(2000.0);
        r.lock();
        assert_eq!(
            scroll_to(&mut r, 1200.0, false),
            Some(RailTransition::Unlocked(RailExit::Safety))
        );
        assert!(!r.is_locked());
    }

    #[test]
    fn geometry_change_releases_a_stranded_rail() {
        let mut r = rail(2000.0);
        r.lock();
        assert_eq!(r.on_viewport_change(rect(-200.0), VH), None);
        assert!(r.is_locked());

        // Section pushed entirely above the viewport.
        let above = SectionRect {
            top: -1200.0,
            bottom: -200.0,
        };
        assert_eq!(
            r.on_viewport_change(above, VH),
            Some(RailTransition::Unlocked(RailExit::Safety))
        );
        assert!(r.state().exited_from_bottom);
        // Already free: nothing more to report.
        assert_eq!(r.on_viewport_change(rect(5200.0), VH), None);
    }

    #[test]
    fn arrow_keys_step_only_while_locked() {
        let mut r = rail(1000.0);
        assert!(!r.on_key(RailKey::Right));
        r.lock();
        assert!(r.on_key(RailKey::Right));
        assert_eq!(r.offset(), 300.0);
        for _ in 0..5 {
            r.on_key(RailKey::Right);
        }
        assert_eq!(r.offset(), 1000.0);
        assert!(r.is_locked());
        r.on_key(RailKey::Left);
        assert_eq!(r.offset(), 700.0);
    }

    #[test]
    fn animate_to_end_reports_completion_and_sets_edges() {
        let mut r = rail(2000.0);
        let t0 = Instant::now();
        r.animate_to(RailEdge::End, t0);
        assert_eq!(r.tick(t0 + Duration::from_millis(750)), None);
        assert!((r.offset() - 1000.0).abs() < 1e-6);
        assert_eq!(r.tick(t0 + Duration::from_millis(1500)), Some(RailEdge::End));
        let s = r.state();
        assert_eq!(s.offset, 2000.0);
        assert!(s.reached_end && !s.reached_start);
        assert_eq!(r.tick(t0 + Duration::from_secs(2)), None);
    }

    #[test]
    fn instant_animation_completes_on_first_tick() {
        let tuning = RailTuning {
            animation: Duration::ZERO,
            ..RailTuning::default()
        };
        let mut r = RailController::new(3600.0, 1600.0, 0.0, tuning);
        r.set_edge(RailEdge::End);
        let t0 = Instant::now();
        r.animate_to(RailEdge::Start, t0);
        assert_eq!(r.tick(t0), Some(RailEdge::Start));
        assert_eq!(r.offset(), 0.0);
    }

    #[test]
    fn resize_reclamps_offset() {
        let mut r = rail(2000.0);
        r.set_edge(RailEdge::End);
        r.resize(2600.0, 1600.0);
        assert_eq!(r.max_offset(), 1000.0);
        assert_eq!(r.offset(), 1000.0);
        assert!(r.state().reached_end);
    }

    #[test]
    fn card_counter_tracks_centre_and_snaps_to_last() {
        let mut r = rail(2000.0);
        assert_eq!(r.card_counter(500.0, 5), 1);
        r.set_offset(260.0);
        assert_eq!(r.card_counter(500.0, 5), 2);
        r.set_offset(2000.0);
        assert_eq!(r.card_counter(500.0, 5), 5);
        assert_eq!(r.card_counter(500.0, 0), 0);
        assert!((r.progress() - 1.0).abs() < 1e-12);
    }
}
