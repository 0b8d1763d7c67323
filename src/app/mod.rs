//! Application orchestration: state, the event loop's inputs, and input
//! handling.

pub mod event;
pub mod frame_runtime;
pub mod handler;
pub mod state;
