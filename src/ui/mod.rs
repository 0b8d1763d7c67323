//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer reads the core's published signals and turns them into cells
//! on the terminal.  Nothing here mutates scroll state.

pub mod layout;
pub mod page_view;
pub mod theme;
