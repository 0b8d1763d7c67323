//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Colours and styles for every widget.
pub struct Theme;

impl Theme {
    // ── page ───────────────────────────────────────────────────
    pub fn section_border_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn section_title_style() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    /// Hero headline, faded toward black as `opacity` drops.
    pub fn hero_title_style(opacity: f64) -> Style {
        Style::default()
            .fg(fade(Color::Rgb(240, 240, 240), opacity))
            .add_modifier(Modifier::BOLD)
    }

    pub fn hint_style() -> Style {
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC)
    }

    // ── rail ───────────────────────────────────────────────────
    pub fn card_style() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn card_border_style(current: bool) -> Style {
        if current {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        }
    }

    pub fn rail_progress_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn rail_track_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn nav_style() -> Style {
        Style::default().bg(Color::Black).fg(Color::White)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn staging_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }
}

/// Scale an RGB colour toward black; named colours pass through.
pub fn fade(color: Color, opacity: f64) -> Color {
    let k = opacity.clamp(0.0, 1.0);
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(scale(r, k), scale(g, k), scale(b, k)),
        other => other,
    }
}

fn scale(channel: u8, k: f64) -> u8 {
    (f64::from(channel) * k).round() as u8
}
