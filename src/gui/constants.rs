//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Status window dimensions
pub const WINDOW_WIDTH: f32 = 420.0;
pub const WINDOW_HEIGHT: f32 = 320.0;
pub const WINDOW_MIN_WIDTH: f32 = 360.0;
pub const WINDOW_MIN_HEIGHT: f32 = 260.0;

/// Layout spacing
pub const PADDING: f32 = 10.0;
pub const SECTION_SPACING: f32 = 15.0;

/// Status colors
pub const STATUS_RUNNING: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_STOPPED: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);

/// Idle repaint interval so queued commands are drained promptly
pub const COMMAND_POLL_INTERVAL_MS: u64 = 250;
