//! Easing curves shared by page scroll legs and rail animations.

/// Normalised easing curve: maps `t ∈ [0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    /// Symmetric cubic ease-in-out.  Used for every staged scroll leg and
    /// for the rail's animate-to-edge (power3 in-out is the same curve).
    #[default]
    InOutCubic,
}

impl Ease {
    pub const ALL: [Ease; 2] = [Ease::Linear, Ease::InOutCubic];

    /// Name used in the config file.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::InOutCubic => "in_out_cubic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name().eq_ignore_ascii_case(name))
    }

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}
