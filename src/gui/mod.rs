//! Status window and command dispatch

mod constants;
mod window;

pub use window::{AppState, run_gui};
