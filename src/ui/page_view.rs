//! The simulated page: stacked sections, the project rail, the fixed hero
//! canvas overlay and the bottom navigation.

use image::imageops::FilterType;
use image::RgbaImage;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Color,
    text::Line,
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::core::coordinator::{ScrollCoordinator, Signals};
use crate::core::frames::FrameCanvas;
use crate::core::page::{HERO_SECTION, RAIL_SECTION};

use super::layout::{px_to_cols, px_to_rows};
use super::theme::{fade, Theme};

const HERO_TITLE: &str = "S C R O L L S T A G E";
const SCROLL_HINT: &str = "scroll ↓";
const NAV_TEXT: &str = " Home top · 1 about · 2 projects · 3 experience · End footer ";

// ─── hero thumbnail cache ───────────────────────────────────────

/// The hero frame resized for the current page area.  Resizing is the
/// expensive part of a draw, so it only reruns when the frame or the area
/// changes.
#[derive(Debug, Default)]
pub struct HeroThumb {
    key: Option<(usize, u16, u16)>,
    image: Option<RgbaImage>,
}

impl HeroThumb {
    pub fn fitted(
        &mut self,
        index: usize,
        source: &RgbaImage,
        cols: u16,
        rows: u16,
    ) -> Option<&RgbaImage> {
        let key = (index, cols, rows);
        if self.key != Some(key) {
            self.image = fit_halfblocks(source, cols, rows);
            self.key = Some(key);
        }
        self.image.as_ref()
    }
}

/// Resize to fit `cols × rows` half-block cells (1 px wide, 2 px tall each),
/// preserving aspect ratio.
fn fit_halfblocks(source: &RgbaImage, cols: u16, rows: u16) -> Option<RgbaImage> {
    if cols == 0 || rows == 0 || source.width() == 0 || source.height() == 0 {
        return None;
    }
    let max_px_w = f64::from(cols);
    let max_px_h = f64::from(rows) * 2.0;
    let src_w = f64::from(source.width());
    let src_h = f64::from(source.height());

    let scale = (max_px_w / src_w).min(max_px_h / src_h);
    let fit_w = (src_w * scale).round().max(1.0) as u32;
    let fit_h = (src_h * scale).round().max(1.0) as u32;
    Some(image::imageops::resize(source, fit_w, fit_h, FilterType::Triangle))
}

/// Paint `img` with `▀` half-blocks, centred in `area`, faded by `opacity`.
fn render_halfblocks(img: &RgbaImage, opacity: f64, area: Rect, buf: &mut Buffer) {
    let (iw, ih) = (img.width(), img.height());
    let col_offset = area.width.saturating_sub(iw as u16) / 2;
    let row_offset = area.height.saturating_sub(ih.div_ceil(2) as u16) / 2;

    for row in 0..area.height.saturating_sub(row_offset) {
        let yt = u32::from(row) * 2;
        let yb = yt + 1;
        if yt >= ih {
            break;
        }
        for col in 0..iw.min(u32::from(area.width)) {
            let t = img.get_pixel(col, yt);
            let fg = fade(Color::Rgb(t[0], t[1], t[2]), opacity);
            let bg = if yb < ih {
                let b = img.get_pixel(col, yb);
                fade(Color::Rgb(b[0], b[1], b[2]), opacity)
            } else {
                Color::Reset
            };
            let pos = Position::new(area.x + col_offset + col as u16, area.y + row_offset + row);
            if let Some(cell) = buf.cell_mut(pos) {
                cell.set_char('▀').set_fg(fg).set_bg(bg);
            }
        }
    }
}

// ─── clipping ───────────────────────────────────────────────────

/// A span clipped to a visible range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Clipped {
    start: u16,
    len: u16,
    cut_start: bool,
    cut_end: bool,
}

/// Clip `[start, start + len)` (relative to `origin`) to `[origin, origin + extent)`.
fn clip(start: i32, len: i32, origin: u16, extent: u16) -> Option<Clipped> {
    let lo = start.max(0);
    let hi = (start + len).min(i32::from(extent));
    if hi <= lo {
        return None;
    }
    Some(Clipped {
        start: origin + lo as u16,
        len: (hi - lo) as u16,
        cut_start: start < 0,
        cut_end: start + len > i32::from(extent),
    })
}

/// Borders for a box whose edges may have been clipped away.
fn open_borders(horizontal: Clipped, vertical: Clipped) -> Borders {
    let mut borders = Borders::ALL;
    if horizontal.cut_start {
        borders.remove(Borders::LEFT);
    }
    if horizontal.cut_end {
        borders.remove(Borders::RIGHT);
    }
    if vertical.cut_start {
        borders.remove(Borders::TOP);
    }
    if vertical.cut_end {
        borders.remove(Borders::BOTTOM);
    }
    borders
}

// ─── page widget ────────────────────────────────────────────────

pub struct PageView<'a> {
    pub coordinator: &'a ScrollCoordinator,
    pub canvas: &'a FrameCanvas,
}

impl StatefulWidget for PageView<'_> {
    type State = HeroThumb;

    fn render(self, area: Rect, buf: &mut Buffer, thumb: &mut HeroThumb) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let signals = self.coordinator.signals();
        let full_width = Clipped {
            start: area.x,
            len: area.width,
            cut_start: false,
            cut_end: false,
        };

        for section in self.coordinator.page().sections() {
            if section.id == HERO_SECTION {
                continue;
            }
            let rect = section.rect_at(signals.scroll_y);
            let top = px_to_rows(rect.top);
            let Some(rows) = clip(top, px_to_rows(rect.bottom) - top, area.y, area.height) else {
                continue;
            };
            let block = Block::default()
                .borders(open_borders(full_width, rows))
                .border_style(Theme::section_border_style())
                .title(Line::styled(format!(" {} ", section.id), Theme::section_title_style()));
            let section_area = Rect::new(area.x, rows.start, area.width, rows.len);
            let inner = block.inner(section_area);
            block.render(section_area, buf);

            if section.id == RAIL_SECTION {
                render_rail(&self, &signals, inner, buf);
            }
        }

        if signals.sample.overlay_opacity > 0.0 {
            render_hero(&self, &signals, area, buf, thumb);
        }

        if signals.nav_visible {
            let nav = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
            Paragraph::new(NAV_TEXT)
                .style(Theme::nav_style())
                .centered()
                .render(nav, buf);
        }
    }
}

fn render_hero(
    view: &PageView<'_>,
    signals: &Signals,
    area: Rect,
    buf: &mut Buffer,
    thumb: &mut HeroThumb,
) {
    let opacity = signals.sample.overlay_opacity;
    if let (Some(index), Some(source)) = (view.canvas.last_drawn(), view.canvas.image()) {
        if let Some(img) = thumb.fitted(index, source, area.width, area.height) {
            render_halfblocks(img, opacity, area, buf);
        }
    }

    let content_opacity = signals.sample.content_opacity * opacity;
    if content_opacity > 0.05 {
        let row = i32::from(area.height / 2) + px_to_rows(signals.sample.content_shift);
        if let Some(rows) = clip(row, 1, area.y, area.height) {
            Paragraph::new(HERO_TITLE)
                .style(Theme::hero_title_style(content_opacity))
                .centered()
                .render(Rect::new(area.x, rows.start, area.width, 1), buf);
        }
    }

    if signals.sample.hint_visible && area.height > 2 {
        let hint = Rect::new(area.x, area.y + area.height - 2, area.width, 1);
        Paragraph::new(SCROLL_HINT)
            .style(Theme::hint_style())
            .centered()
            .render(hint, buf);
    }
}

fn render_rail(view: &PageView<'_>, signals: &Signals, inner: Rect, buf: &mut Buffer) {
    if inner.width == 0 || inner.height < 2 {
        return;
    }
    let page = view.coordinator.page();
    let content = page.rail_content();
    let card_cols = px_to_cols(content.card_width(page.viewport())).max(4);
    let offset_cols = px_to_cols(signals.rail.offset);
    let card_rows = Clipped {
        start: inner.y,
        len: inner.height - 1,
        cut_start: false,
        cut_end: false,
    };

    for i in 0..content.card_count {
        let x = i as i32 * card_cols - offset_cols;
        // One column of gap between cards.
        let Some(cols) = clip(x, card_cols - 1, inner.x, inner.width) else {
            continue;
        };
        let current = i + 1 == signals.card;
        let card_area = Rect::new(cols.start, card_rows.start, cols.len, card_rows.len);
        let block = Block::default()
            .borders(open_borders(cols, card_rows))
            .border_style(Theme::card_border_style(current))
            .title(format!(" Project {:02} ", i + 1));
        let body = block.inner(card_area);
        block.render(card_area, buf);
        if body.height > 0 {
            Paragraph::new(format!("#{:02}", i + 1))
                .style(Theme::card_style())
                .centered()
                .render(body, buf);
        }
    }

    let counter = format!(" {:02} / {:02} ", signals.card, signals.card_count);
    let width = (counter.chars().count() as u16).min(inner.width);
    Paragraph::new(counter)
        .style(Theme::rail_progress_style())
        .render(Rect::new(inner.x + inner.width - width, inner.y, width, 1), buf);

    let track_y = inner.y + inner.height - 1;
    let filled = (signals.rail_progress * f64::from(inner.width)).round() as u16;
    for col in 0..inner.width {
        let (ch, style) = if col < filled {
            ('━', Theme::rail_progress_style())
        } else {
            ('─', Theme::rail_track_style())
        };
        if let Some(cell) = buf.cell_mut(Position::new(inner.x + col, track_y)) {
            cell.set_char(ch).set_style(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::core::coordinator::CoordinatorTuning;
    use crate::core::orchestrator::JumpTarget;
    use crate::core::page::{PageLayout, Viewport};
    use crate::ui::layout::{CELL_HEIGHT_PX, CELL_WIDTH_PX};

    fn coordinator(area: Rect) -> ScrollCoordinator {
        let viewport = Viewport::new(
            f64::from(area.width) * CELL_WIDTH_PX,
            f64::from(area.height) * CELL_HEIGHT_PX,
        );
        let tuning = CoordinatorTuning {
            reduced_motion: true,
            ..CoordinatorTuning::default()
        };
        ScrollCoordinator::new(PageLayout::portfolio(viewport), 8, tuning, Instant::now())
    }

    fn render(c: &ScrollCoordinator, area: Rect) -> String {
        let mut buf = Buffer::empty(area);
        let canvas = FrameCanvas::default();
        PageView {
            coordinator: c,
            canvas: &canvas,
        }
        .render(area, &mut buf, &mut HeroThumb::default());
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn hero_shows_title_and_hint_at_the_top() {
        let area = Rect::new(0, 0, 80, 24);
        let text = render(&coordinator(area), area);
        assert!(text.contains(HERO_TITLE));
        assert!(text.contains(SCROLL_HINT));
        assert!(!text.contains("Project"));
    }

    #[test]
    fn rail_cards_follow_the_offset() {
        let area = Rect::new(0, 0, 80, 24);
        let mut c = coordinator(area);
        let rail_top = c.page().rail_section().unwrap().top;
        let now = Instant::now();
        c.jump_to(JumpTarget::Offset(rail_top), now).unwrap();
        c.tick(now + Duration::from_millis(16));

        let text = render(&c, area);
        assert!(text.contains(" projects "));
        assert!(text.contains("Project 01"));
        assert!(text.contains("01 / 06"));
        assert!(!text.contains(HERO_TITLE));
    }

    #[test]
    fn clipping_reports_cut_edges() {
        assert_eq!(
            clip(-3, 10, 5, 20),
            Some(Clipped { start: 5, len: 7, cut_start: true, cut_end: false })
        );
        assert_eq!(
            clip(15, 10, 0, 20),
            Some(Clipped { start: 15, len: 5, cut_start: false, cut_end: true })
        );
        assert_eq!(clip(20, 5, 0, 20), None);
        assert_eq!(clip(-5, 5, 0, 20), None);
    }

    #[test]
    fn thumb_is_fitted_once_per_frame_and_size() {
        let source = RgbaImage::from_pixel(100, 50, image::Rgba([9, 9, 9, 255]));
        let mut thumb = HeroThumb::default();
        let img = thumb.fitted(0, &source, 20, 10).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(thumb.key, Some((0, 20, 10)));
        assert!(thumb.fitted(0, &source, 20, 10).is_some());
        assert_eq!(thumb.key, Some((0, 20, 10)));
        let img = thumb.fitted(0, &source, 40, 5).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(thumb.key, Some((0, 40, 5)));
    }
}
