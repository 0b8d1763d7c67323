//! User configuration: keybindings, choreography tunables and persistence.
//!
//! Everything is stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/scrollstage/config.toml` (default
//! `~/.config/scrollstage/config.toml`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::coordinator::CoordinatorTuning;
use crate::core::driver::DriverTuning;
use crate::core::ease::Ease;
use crate::core::rail::RailTuning;
use crate::core::scroller::ScrollOptions;

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    RailLeft,
    RailRight,
    JumpTop,
    JumpAbout,
    JumpProjects,
    JumpExperience,
    JumpFooter,
    Quit,
}

impl Action {
    /// Ordered list of all actions (config file order).
    pub const ALL: &[Action] = &[
        Action::ScrollDown,
        Action::ScrollUp,
        Action::PageDown,
        Action::PageUp,
        Action::RailLeft,
        Action::RailRight,
        Action::JumpTop,
        Action::JumpAbout,
        Action::JumpProjects,
        Action::JumpExperience,
        Action::JumpFooter,
        Action::Quit,
    ];

    fn config_key(self) -> &'static str {
        match self {
            Action::ScrollDown => "scroll_down",
            Action::ScrollUp => "scroll_up",
            Action::PageDown => "page_down",
            Action::PageUp => "page_up",
            Action::RailLeft => "rail_left",
            Action::RailRight => "rail_right",
            Action::JumpTop => "jump_top",
            Action::JumpAbout => "jump_about",
            Action::JumpProjects => "jump_projects",
            Action::JumpExperience => "jump_experience",
            Action::JumpFooter => "jump_footer",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// Named keys as written in the config file, with their status-bar glyph.
const NAMED_KEYS: &[(&str, KeyCode, &str)] = &[
    ("Up", KeyCode::Up, "↑"),
    ("Down", KeyCode::Down, "↓"),
    ("Left", KeyCode::Left, "←"),
    ("Right", KeyCode::Right, "→"),
    ("Home", KeyCode::Home, "Home"),
    ("End", KeyCode::End, "End"),
    ("PageUp", KeyCode::PageUp, "PgUp"),
    ("PageDown", KeyCode::PageDown, "PgDn"),
    ("Enter", KeyCode::Enter, "⏎"),
    ("Esc", KeyCode::Esc, "Esc"),
    ("Tab", KeyCode::Tab, "Tab"),
    ("Space", KeyCode::Char(' '), "Space"),
];

const MODIFIER_NAMES: &[(&str, KeyModifiers)] = &[
    ("Ctrl", KeyModifiers::CONTROL),
    ("Alt", KeyModifiers::ALT),
    ("Shift", KeyModifiers::SHIFT),
];

/// A key code plus the modifiers that must be held.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Compares CTRL/ALT/SHIFT only. SHIFT is ignored for characters since
    /// `G` already arrives shifted.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mut mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        if let KeyCode::Char(_) = self.code {
            mask.remove(KeyModifiers::SHIFT);
        }
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Short form for the status bar, e.g. `↓` or `Ctrl+e`.
    pub fn display(&self) -> String {
        self.render(|entry| entry.2)
    }

    /// Config-file form, e.g. `Down` or `Alt+Shift+x`.
    fn to_config_string(&self) -> String {
        self.render(|entry| entry.0)
    }

    fn render(
        &self,
        pick: impl Fn(&(&'static str, KeyCode, &'static str)) -> &'static str,
    ) -> String {
        let key = match NAMED_KEYS.iter().find(|(_, code, _)| *code == self.code) {
            Some(entry) => pick(entry).to_string(),
            None => match self.code {
                KeyCode::Char(c) => c.to_string(),
                KeyCode::F(n) => format!("F{n}"),
                other => format!("{other:?}"),
            },
        };
        MODIFIER_NAMES
            .iter()
            .filter(|(_, m)| self.modifiers.contains(*m))
            .map(|(name, _)| *name)
            .chain(std::iter::once(key.as_str()))
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Parse `Ctrl+e`, `PageDown`, `G`, `F5`. Single characters keep their
    /// case; everything else is case-insensitive.
    fn parse(s: &str) -> Option<Self> {
        let (mods, key) = match s.rsplit_once('+') {
            Some((mods, key)) if !key.is_empty() => (Some(mods), key),
            _ => (None, s),
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in mods.into_iter().flat_map(|m| m.split('+')) {
            let (_, m) = MODIFIER_NAMES
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(part))?;
            modifiers |= *m;
        }

        let mut chars = key.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => match NAMED_KEYS.iter().find(|(name, _, _)| name.eq_ignore_ascii_case(key)) {
                Some((_, code, _)) => *code,
                None => match key.strip_prefix(['f', 'F']) {
                    Some(n) => KeyCode::F(n.parse().ok()?),
                    None => return None,
                },
            },
        };
        Some(Self::new(code, modifiers))
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration: keybindings and scroll choreography knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Frames requested per decode batch.
    pub batch_size: usize,
    /// Pause between decode batches.
    pub batch_pause_ms: u64,
    /// Pixels one wheel notch (or scroll key press) moves the page.
    pub wheel_line_px: f64,
    /// Jump instead of animating page scroll.
    pub reduced_motion: bool,
    pub lerp_idle: f64,
    pub lerp_scrolling: f64,
    pub lerp_staged: f64,
    pub idle_delay_ms: u64,
    pub idle_fps: f64,
    pub glide_speed: f64,
    pub rail_wheel_multiplier: f64,
    pub rail_key_step: f64,
    pub leg_duration_ms: u64,
    /// Easing of programmatic page scroll legs.
    pub leg_ease: Ease,
    pub rail_duration_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let driver = DriverTuning::default();
        let rail = RailTuning::default();
        Self {
            bindings: Self::default_bindings(),
            batch_size: 5,
            batch_pause_ms: 150,
            wheel_line_px: 100.0,
            reduced_motion: false,
            lerp_idle: driver.lerp_idle,
            lerp_scrolling: driver.lerp_scrolling,
            lerp_staged: driver.lerp_staged,
            idle_delay_ms: driver.idle_delay.as_millis() as u64,
            idle_fps: driver.idle_fps,
            glide_speed: 0.3,
            rail_wheel_multiplier: rail.wheel_multiplier,
            rail_key_step: rail.key_step,
            leg_duration_ms: ScrollOptions::default().duration.as_millis() as u64,
            leg_ease: ScrollOptions::default().ease,
            rail_duration_ms: rail.animation.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(ScrollDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(ScrollUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(
            Action::PageDown,
            vec![KeyBind::new(KeyCode::PageDown, n), KeyBind::new(Char(' '), n)],
        );
        m.insert(Action::PageUp, vec![KeyBind::new(KeyCode::PageUp, n)]);
        m.insert(RailLeft, vec![KeyBind::new(Left, n), KeyBind::new(Char('h'), n)]);
        m.insert(RailRight, vec![KeyBind::new(Right, n), KeyBind::new(Char('l'), n)]);
        m.insert(JumpTop, vec![KeyBind::new(Home, n), KeyBind::new(Char('g'), n)]);
        m.insert(JumpAbout, vec![KeyBind::new(Char('1'), n)]);
        m.insert(JumpProjects, vec![KeyBind::new(Char('2'), n)]);
        m.insert(JumpExperience, vec![KeyBind::new(Char('3'), n)]);
        m.insert(JumpFooter, vec![KeyBind::new(End, n), KeyBind::new(Char('G'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n), KeyBind::new(Esc, n)]);

        m
    }

    /// The action bound to `event`. The binding with the most modifiers
    /// wins, so `Ctrl+g` can shadow `g`.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .flat_map(|(&action, binds)| binds.iter().map(move |bind| (action, bind)))
            .filter(|(_, bind)| bind.matches(event))
            .max_by_key(|(_, bind)| bind.modifiers.bits().count_ones())
            .map(|(action, _)| action)
    }

    fn first_key(&self, action: Action) -> String {
        self.bindings
            .get(&action)
            .and_then(|binds| binds.first())
            .map_or_else(|| "?".into(), KeyBind::display)
    }

    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: scroll | {}/{}: page | {}/{}: rail | {}: top | {}: footer | {}: quit",
            self.first_key(Action::ScrollDown),
            self.first_key(Action::ScrollUp),
            self.first_key(Action::PageDown),
            self.first_key(Action::PageUp),
            self.first_key(Action::RailLeft),
            self.first_key(Action::RailRight),
            self.first_key(Action::JumpTop),
            self.first_key(Action::JumpFooter),
            self.first_key(Action::Quit),
        )
    }

    /// Tunables in the shape the scroll core wants.
    pub fn coordinator_tuning(&self) -> CoordinatorTuning {
        let defaults = CoordinatorTuning::default();
        CoordinatorTuning {
            driver: DriverTuning {
                lerp_idle: self.lerp_idle,
                lerp_scrolling: self.lerp_scrolling,
                lerp_staged: self.lerp_staged,
                idle_delay: Duration::from_millis(self.idle_delay_ms),
                idle_fps: self.idle_fps,
                ..defaults.driver
            },
            rail: RailTuning {
                wheel_multiplier: self.rail_wheel_multiplier,
                key_step: self.rail_key_step,
                animation: Duration::from_millis(self.rail_duration_ms),
            },
            leg: ScrollOptions {
                duration: Duration::from_millis(self.leg_duration_ms),
                ease: self.leg_ease,
            },
            glide_speed: self.glide_speed,
            reduced_motion: self.reduced_motion,
        }
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(_) => Self::default(),
        }
    }

    /// Write the current config to the default location unless a file is
    /// already there, so users get an annotated file to edit.
    pub fn init_file(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        if !path.exists() {
            self.save_to(&path)?;
        }
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if config.apply_tunable(key, value) {
                continue;
            }

            let Some(action) = Action::from_config_key(key) else {
                tracing::debug!(key, "unknown config key");
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                let part = part.trim().trim_matches('"');
                if let Some(bind) = KeyBind::parse(part) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    /// Returns `true` if `key` named a tunable (even when its value was
    /// rejected).  Values are clamped into sane ranges.
    fn apply_tunable(&mut self, key: &str, value: &str) -> bool {
        // `NaN` and `inf` parse as floats but are never valid settings.
        let float = |lo: f64, hi: f64| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(lo, hi))
        };
        let millis = |lo: u64, hi: u64| value.parse::<u64>().ok().map(|v| v.clamp(lo, hi));
        match key {
            "batch_size" => {
                if let Ok(v) = value.parse::<usize>() {
                    self.batch_size = v.clamp(1, 64);
                }
            }
            "batch_pause_ms" => set(&mut self.batch_pause_ms, millis(0, 5000)),
            "wheel_line_px" => set(&mut self.wheel_line_px, float(1.0, 2000.0)),
            "reduced_motion" => self.reduced_motion = value == "true",
            "lerp_idle" => set(&mut self.lerp_idle, float(0.01, 1.0)),
            "lerp_scrolling" => set(&mut self.lerp_scrolling, float(0.01, 1.0)),
            "lerp_staged" => set(&mut self.lerp_staged, float(0.01, 1.0)),
            "idle_delay_ms" => set(&mut self.idle_delay_ms, millis(0, 60_000)),
            "idle_fps" => set(&mut self.idle_fps, float(1.0, 240.0)),
            "glide_speed" => set(&mut self.glide_speed, float(0.05, 0.95)),
            "rail_wheel_multiplier" => set(&mut self.rail_wheel_multiplier, float(0.1, 10.0)),
            "rail_key_step" => set(&mut self.rail_key_step, float(1.0, 5000.0)),
            "leg_duration_ms" => set(&mut self.leg_duration_ms, millis(0, 10_000)),
            "leg_ease" => set(&mut self.leg_ease, Ease::from_name(value)),
            "rail_duration_ms" => set(&mut self.rail_duration_ms, millis(0, 10_000)),
            _ => return false,
        }
        true
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# scrollstage configuration".to_string(),
            String::new(),
            "# Frame loading".to_string(),
            format!("batch_size = {}", self.batch_size),
            format!("batch_pause_ms = {}", self.batch_pause_ms),
            String::new(),
            "# Scrolling".to_string(),
            format!("wheel_line_px = {}", self.wheel_line_px),
            format!("reduced_motion = {}", self.reduced_motion),
            format!("glide_speed = {}", self.glide_speed),
            format!("leg_duration_ms = {}", self.leg_duration_ms),
            "# linear | in_out_cubic".to_string(),
            format!("leg_ease = {}", self.leg_ease.name()),
            String::new(),
            "# Hero animation".to_string(),
            format!("lerp_idle = {}", self.lerp_idle),
            format!("lerp_scrolling = {}", self.lerp_scrolling),
            format!("lerp_staged = {}", self.lerp_staged),
            format!("idle_delay_ms = {}", self.idle_delay_ms),
            format!("idle_fps = {}", self.idle_fps),
            String::new(),
            "# Project rail".to_string(),
            format!("rail_wheel_multiplier = {}", self.rail_wheel_multiplier),
            format!("rail_key_step = {}", self.rail_key_step),
            format!("rail_duration_ms = {}", self.rail_duration_ms),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/scrollstage/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("scrollstage").join("config.toml")
}
