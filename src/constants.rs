//! Application-wide constants
//!
//! This module contains the string literals and fixed values used throughout
//! the application, providing a single source of truth for constant values.

/// Application identity
pub mod app {
    /// Human-readable application name (window title, tray tooltip, dialogs)
    pub const NAME: &str = "WebDesk";

    /// Per-user application directory under the home directory
    pub const DIR: &str = ".webdesk";

    /// Single-instance marker file inside the application directory
    pub const LOCK_FILE: &str = "webdesk.lck";

    /// Configuration file inside the application directory
    pub const CONFIG_FILE: &str = "config.json";
}

/// Tray menu entries
pub mod menu {
    /// Opens the served root page in the default browser
    pub const OPEN: &str = "Open";

    /// Opens the API index in the default browser
    pub const API_BROWSER: &str = "API Browser";

    /// Shuts the application down
    pub const EXIT: &str = "Exit";
}

/// Paths served by the embedded server
pub mod paths {
    /// Greeting page
    pub const ROOT: &str = "/";

    /// JSON service index
    pub const API: &str = "/api";
}

/// Embedded server defaults
pub mod server {
    /// Default greeting message when none is configured
    pub const DEFAULT_GREETING: &str = "Hello World";

    /// Thread name for the server runtime
    pub const THREAD_NAME: &str = "webdesk-server";
}
