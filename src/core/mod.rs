//! Core scroll choreography: frame sequence, scroll mapping, the animation
//! driver, the horizontal rail and staged jumps.
//!
//! Nothing in this module depends on any TUI or rendering crate.

pub mod coordinator;
pub mod driver;
pub mod ease;
pub mod frames;
pub mod mapper;
pub mod orchestrator;
pub mod page;
pub mod rail;
pub mod scroller;
pub mod tween;
