//! Animation driver: once per refresh, ease the displayed frame toward the
//! target frame.
//!
//! How hard it chases depends on who is driving:
//!
//! * **Idle**: nobody has scrolled for a while; an autoplay sweep ping-pongs
//!   across the sequence and the display tracks it tightly.
//! * **Scrolling**: the user is scrolling; moderate easing.
//! * **Staged**: a programmatic multi-leg jump is running; very slow easing
//!   so fast scroll legs do not flash through frames.

use std::time::{Duration, Instant};

/// Knobs for the driver; defaults match the shipped page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverTuning {
    pub lerp_idle: f64,
    pub lerp_scrolling: f64,
    pub lerp_staged: f64,
    /// Below this distance the display snaps onto the target.
    pub snap_threshold: f64,
    /// Inactivity after a scroll event before autoplay resumes.
    pub idle_delay: Duration,
    /// Delay before the very first autoplay after load.
    pub initial_idle_delay: Duration,
    /// Autoplay sweep speed in frames per second.
    pub idle_fps: f64,
    /// Longest time step a single autoplay tick may integrate.
    pub idle_max_step: Duration,
}

impl Default for DriverTuning {
    fn default() -> Self {
        Self {
            lerp_idle: 0.5,
            lerp_scrolling: 0.2,
            lerp_staged: 0.04,
            snap_threshold: 0.3,
            idle_delay: Duration::from_millis(2000),
            initial_idle_delay: Duration::from_millis(500),
            idle_fps: 24.0,
            idle_max_step: Duration::from_millis(50),
        }
    }
}

/// Who is currently driving the target frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrivingMode {
    /// Autoplay sweep.  `position` is the continuous sweep head.
    Idle { position: f64, last_tick: Instant },
    /// User scroll; autoplay resumes at `idle_at` unless another scroll
    /// event pushes it back.
    Scrolling { last_event: Instant, idle_at: Instant },
    /// A staged programmatic jump owns the scroll position.
    Staged,
}

/// Payload-free view of [`DrivingMode`] for consumers that only need the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Idle,
    Scrolling,
    Staged,
}

impl DrivingMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Idle { .. } => ModeKind::Idle,
            Self::Scrolling { .. } => ModeKind::Scrolling,
            Self::Staged => ModeKind::Staged,
        }
    }
}

/// Interpolated display position plus its authoritative destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayState {
    pub current_frame: f64,
    pub target_frame: usize,
    pub mode: DrivingMode,
}

#[derive(Debug)]
pub struct AnimationDriver {
    state: DisplayState,
    tuning: DriverTuning,
    last_frame: usize,
    /// +1.0 sweeping forward, -1.0 sweeping back; survives idle sessions.
    idle_direction: f64,
}

impl AnimationDriver {
    pub fn new(frame_count: usize, tuning: DriverTuning, now: Instant) -> Self {
        Self {
            state: DisplayState {
                current_frame: 0.0,
                target_frame: 0,
                mode: DrivingMode::Scrolling {
                    last_event: now,
                    idle_at: now + tuning.initial_idle_delay,
                },
            },
            tuning,
            last_frame: frame_count.max(1) - 1,
            idle_direction: 1.0,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// A scroll event mapped to `target`.  Cancels autoplay and restarts the
    /// inactivity deadline; during a staged jump only the target moves.
    pub fn on_scroll(&mut self, target: usize, now: Instant) {
        self.state.target_frame = target.min(self.last_frame);
        if self.state.mode != DrivingMode::Staged {
            self.arm_idle(now);
        }
    }

    /// The same scroll offset now maps to `target` (the page was
    /// re-measured).  Moves the destination only; the idle timer and the
    /// mode are left alone.
    pub fn retarget(&mut self, target: usize) {
        if !matches!(self.state.mode, DrivingMode::Idle { .. }) {
            self.state.target_frame = target.min(self.last_frame);
        }
    }

    pub fn enter_staged(&mut self) {
        self.state.mode = DrivingMode::Staged;
    }

    /// Staged jump finished: behave as if the user had just scrolled.
    pub fn exit_staged(&mut self, now: Instant) {
        if self.state.mode == DrivingMode::Staged {
            self.arm_idle(now);
        }
    }

    fn arm_idle(&mut self, now: Instant) {
        self.state.mode = DrivingMode::Scrolling {
            last_event: now,
            idle_at: now + self.tuning.idle_delay,
        };
    }

    pub fn lerp_factor(&self) -> f64 {
        match self.state.mode {
            DrivingMode::Idle { .. } => self.tuning.lerp_idle,
            DrivingMode::Scrolling { .. } => self.tuning.lerp_scrolling,
            DrivingMode::Staged => self.tuning.lerp_staged,
        }
    }

    /// Advance one refresh.  Returns the frame index to draw.
    pub fn tick(&mut self, now: Instant) -> usize {
        if let DrivingMode::Scrolling { idle_at, .. } = self.state.mode {
            if now >= idle_at {
                tracing::trace!(frame = self.state.current_frame, "autoplay resumes");
                self.state.mode = DrivingMode::Idle {
                    position: self.state.current_frame,
                    last_tick: now,
                };
            }
        }

        if let DrivingMode::Idle { position, last_tick } = self.state.mode {
            let dt = now
                .saturating_duration_since(last_tick)
                .min(self.tuning.idle_max_step)
                .as_secs_f64();
            let position = self.sweep(position, dt);
            self.state.mode = DrivingMode::Idle {
                position,
                last_tick: now,
            };
            self.state.target_frame = (position.round() as usize).min(self.last_frame);
        }

        let diff = self.state.target_frame as f64 - self.state.current_frame;
        if diff.abs() > self.tuning.snap_threshold {
            self.state.current_frame += diff * self.lerp_factor();
        } else {
            self.state.current_frame = self.state.target_frame as f64;
        }

        (self.state.current_frame.round().max(0.0) as usize).min(self.last_frame)
    }

    /// Ping-pong the sweep head, reversing exactly at both ends.
    fn sweep(&mut self, position: f64, dt: f64) -> f64 {
        let last = self.last_frame as f64;
        let next = position + self.idle_direction * self.tuning.idle_fps * dt;
        if next >= last {
            self.idle_direction = -1.0;
            last
        } else if next <= 0.0 {
            self.idle_direction = 1.0;
            0.0
        } else {
            next
        }
    }
}
