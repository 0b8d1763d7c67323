//! Layout helpers: split the terminal area into regions and convert cells
//! to page pixels.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::core::page::Viewport;

/// Page pixels covered by one terminal column.
pub const CELL_WIDTH_PX: f64 = 8.0;
/// Page pixels covered by one terminal row.
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Primary screen layout: the simulated page and a bottom status bar.
pub struct AppLayout {
    pub page_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // page (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            page_area: chunks[0],
            status_area: chunks[1],
        }
    }

    /// The page viewport in pixels.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            f64::from(self.page_area.width) * CELL_WIDTH_PX,
            f64::from(self.page_area.height) * CELL_HEIGHT_PX,
        )
    }
}

/// Page pixels to whole terminal rows, rounding toward negative infinity.
pub fn px_to_rows(px: f64) -> i32 {
    (px / CELL_HEIGHT_PX).floor() as i32
}

/// Page pixels to whole terminal columns, rounding toward negative infinity.
pub fn px_to_cols(px: f64) -> i32 {
    (px / CELL_WIDTH_PX).floor() as i32
}
