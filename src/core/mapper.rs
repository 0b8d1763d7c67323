//! Scroll position mapper: vertical offset to frame index and fade values.
//!
//! Everything here is a pure function of the live scroll offset and the
//! spacer geometry; nothing is cached between calls.

/// Frame progress at which the hero content starts fading out.
const CONTENT_FADE_START: f64 = 0.8;
/// Hero content rises this many pixels by the end of its fade.
const CONTENT_RISE_PX: f64 = 60.0;
/// The scroll hint hides once frame progress passes this.
const HINT_HIDE_AFTER: f64 = 0.1;

/// Everything derived from one scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    /// Progress through the whole spacer, `[0, 1]`.
    pub full_progress: f64,
    /// Progress through the shortened frame range, `[0, 1]`.
    pub frame_progress: f64,
    /// Destination frame index in `[0, N-1]`.
    pub target_frame: usize,
    /// Opacity of the hero overlay (canvas layer).
    pub overlay_opacity: f64,
    /// `false` once the overlay has fully faded and must not take input.
    pub overlay_interactive: bool,
    /// Opacity of the hero text content.
    pub content_opacity: f64,
    /// Vertical translation of the hero text, non-positive pixels.
    pub content_shift: f64,
    /// Whether the "scroll down" hint is shown.
    pub hint_visible: bool,
}

impl ScrollSample {
    /// A spacer that cannot scroll: progress is zero wherever the page is.
    const AT_REST: Self = Self {
        full_progress: 0.0,
        frame_progress: 0.0,
        target_frame: 0,
        overlay_opacity: 1.0,
        overlay_interactive: true,
        content_opacity: 1.0,
        content_shift: 0.0,
        hint_visible: true,
    };
}

/// Maps scroll offset onto an `N`-frame sequence.
#[derive(Debug, Clone, Copy)]
pub struct ScrollMapper {
    frame_count: usize,
}

impl ScrollMapper {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count: frame_count.max(1),
        }
    }

    fn last_frame(&self) -> usize {
        self.frame_count - 1
    }

    /// `(N-2)/(N-1)`: the last frame lands one frame-step before the spacer
    /// ends, so the content below starts revealing during the final frames.
    pub fn transition_ratio(&self) -> f64 {
        if self.frame_count <= 2 {
            return 1.0;
        }
        (self.frame_count - 2) as f64 / (self.frame_count - 1) as f64
    }

    /// Scroll distance over which the whole spacer is traversed.
    pub fn full_max_scroll(spacer_height: f64, viewport_height: f64) -> f64 {
        spacer_height - viewport_height
    }

    /// Scroll offset at which the frame animation completes.
    pub fn frame_max_scroll(&self, spacer_height: f64, viewport_height: f64) -> f64 {
        Self::full_max_scroll(spacer_height, viewport_height) * self.transition_ratio()
    }

    pub fn sample(&self, scroll_y: f64, spacer_height: f64, viewport_height: f64) -> ScrollSample {
        let full_max = Self::full_max_scroll(spacer_height, viewport_height);
        if full_max <= 0.0 {
            return ScrollSample::AT_REST;
        }
        let frame_max = self.frame_max_scroll(spacer_height, viewport_height);

        let full_progress = ratio(scroll_y, full_max);
        let frame_progress = ratio(scroll_y, frame_max);

        let target_frame =
            ((frame_progress * self.last_frame() as f64).floor() as usize).min(self.last_frame());

        let (overlay_opacity, overlay_interactive) = if frame_progress >= 1.0 {
            // With N <= 2 there is no fade range: the overlay is simply gone.
            let fade = if full_max > frame_max {
                ratio(scroll_y - frame_max, full_max - frame_max)
            } else {
                1.0
            };
            (1.0 - fade, fade < 1.0)
        } else {
            (1.0, true)
        };

        let (content_opacity, content_shift) = if frame_progress > CONTENT_FADE_START {
            let f = (frame_progress - CONTENT_FADE_START) / (1.0 - CONTENT_FADE_START);
            (1.0 - f, -CONTENT_RISE_PX * f)
        } else {
            (1.0, 0.0)
        };

        ScrollSample {
            full_progress,
            frame_progress,
            target_frame,
            overlay_opacity,
            overlay_interactive,
            content_opacity,
            content_shift,
            hint_visible: frame_progress <= HINT_HIDE_AFTER,
        }
    }

    /// Shortcut for the frame index alone.
    pub fn target_frame(&self, scroll_y: f64, spacer_height: f64, viewport_height: f64) -> usize {
        self.sample(scroll_y, spacer_height, viewport_height).target_frame
    }
}

/// `clamp(value / range, 0, 1)`; an empty range is zero progress.
fn ratio(value: f64, range: f64) -> f64 {
    if range <= 0.0 {
        return 0.0;
    }
    (value / range).clamp(0.0, 1.0)
}
