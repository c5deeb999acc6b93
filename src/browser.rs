//! Default-browser launching
//!
//! Browsing is a convenience, not a requirement: every failure here is
//! logged and swallowed, the embedded server keeps running either way.

use std::net::SocketAddr;
use tracing::{error, info};

/// Fully qualified URL for a path on the embedded server
pub fn page_url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

/// Open a served path in the default browser
pub fn open_path(addr: SocketAddr, path: &str) {
    open_url(&page_url(addr, path));
}

/// Open a fully qualified URL in the default browser
///
/// The launch is detached so the caller never blocks on the browser
/// process.
pub fn open_url(url: &str) {
    info!(url = %url, "Opening in default browser");
    if let Err(err) = open::that_detached(url) {
        error!(url = %url, error = ?err, "Failed to open default browser");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_root() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(page_url(addr, "/"), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_page_url_api_path() {
        let addr: SocketAddr = "127.0.0.1:49152".parse().unwrap();
        assert_eq!(page_url(addr, "/api"), "http://127.0.0.1:49152/api");
    }

    #[test]
    fn test_page_url_ipv6_brackets() {
        let addr: SocketAddr = "[::1]:8080".parse().unwrap();
        assert_eq!(page_url(addr, "/"), "http://[::1]:8080/");
    }
}
