//! Time-based numeric tweens: the animation primitive behind scroll legs
//! and rail edge animations.

use std::time::{Duration, Instant};

use super::ease::Ease;

/// A single `from → to` animation over a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f64,
    to: f64,
    start: Instant,
    duration: Duration,
    ease: Ease,
}

impl Tween {
    pub fn new(from: f64, to: f64, start: Instant, duration: Duration, ease: Ease) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            ease,
        }
    }

    /// Eased value at `now`.  A zero-length tween is already at `to`.
    pub fn sample(&self, now: Instant) -> f64 {
        let t = self.linear_progress(now);
        self.from + (self.to - self.from) * self.ease.apply(t)
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.linear_progress(now) >= 1.0
    }

    fn linear_progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_endpoints_and_midpoint() {
        let t0 = Instant::now();
        let tw = Tween::new(100.0, 300.0, t0, Duration::from_millis(1000), Ease::InOutCubic);
        assert_eq!(tw.sample(t0), 100.0);
        assert!((tw.sample(t0 + Duration::from_millis(500)) - 200.0).abs() < 1e-9);
        assert_eq!(tw.sample(t0 + Duration::from_millis(1000)), 300.0);
        assert_eq!(tw.sample(t0 + Duration::from_secs(5)), 300.0);
        assert!(!tw.is_done(t0 + Duration::from_millis(999)));
        assert!(tw.is_done(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn zero_duration_is_immediately_done() {
        let t0 = Instant::now();
        let tw = Tween::new(0.0, 42.0, t0, Duration::ZERO, Ease::Linear);
        assert!(tw.is_done(t0));
        assert_eq!(tw.sample(t0), 42.0);
    }

    #[test]
    fn sampling_before_start_holds_origin() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_secs(1);
        let tw = Tween::new(5.0, 10.0, later, Duration::from_secs(1), Ease::Linear);
        assert_eq!(tw.sample(t0), 5.0);
    }
}
