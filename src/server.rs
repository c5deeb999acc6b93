//! Embedded demo web server
//!
//! The lifecycle component only consumes a narrow surface of this module:
//! the bound-address query and the graceful-shutdown hook on
//! `ServerHandle`. Behind it sits a small axum app serving the two demo
//! pages the tray menu points the browser at.

use anyhow::{anyhow, Context, Result};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use serde_json::{json, Value};
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::constants::{app, paths, server};

/// Running embedded server
///
/// Exposes the bound address and an idempotent graceful shutdown; the rest
/// of the server is private to this module.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

/// Bind and serve on a dedicated runtime thread
///
/// Binding happens synchronously so the bound address is known before this
/// returns. Port 0 picks an ephemeral port.
pub fn start(port: u16, greeting: String) -> Result<ServerHandle> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .context(format!("Failed to bind 127.0.0.1:{port}"))?;
    listener
        .set_nonblocking(true)
        .context("Failed to configure listener")?;
    let addr = listener
        .local_addr()
        .context("Failed to query bound address")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let thread = thread::Builder::new()
        .name(server::THREAD_NAME.to_string())
        .spawn(move || serve(listener, greeting, shutdown_rx))
        .context("Failed to spawn server thread")?;

    info!(addr = %addr, "Embedded server started");
    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        thread: Some(thread),
    })
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Signal graceful shutdown and wait for the server thread to finish
    ///
    /// Idempotent: later calls find nothing left to stop.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // A closed receiver means the server already stopped on its own
            let _ = shutdown_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| anyhow!("Server thread panicked"))?;
            info!("Embedded server stopped");
        }
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn serve(listener: TcpListener, greeting: String, shutdown_rx: oneshot::Receiver<()>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = ?err, "Failed to build server runtime");
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(err) => {
                error!(error = ?err, "Failed to adopt listener into runtime");
                return;
            }
        };

        let result = axum::serve(listener, router(greeting))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
                info!("Embedded server shutting down");
            })
            .await;

        if let Err(err) = result {
            error!(error = ?err, "Embedded server exited with error");
        }
    });
}

fn router(greeting: String) -> Router {
    Router::new()
        .route(
            paths::ROOT,
            get(move || {
                let greeting = greeting.clone();
                async move { Html(greeting_page(&greeting)) }
            }),
        )
        .route(paths::API, get(|| async { Json(api_index()) }))
}

/// Greeting page: configured message plus the server time
fn greeting_page(greeting: &str) -> String {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>{name}</title></head>\n\
         <body>\n\
         <h1>{greeting}</h1>\n\
         <p>Served by {name} at {now}</p>\n\
         <p><a href=\"{api}\">API index</a></p>\n\
         </body>\n\
         </html>\n",
        name = app::NAME,
        greeting = greeting,
        api = paths::API,
        now = now,
    )
}

/// JSON index of everything the server exposes
fn api_index() -> Value {
    json!({
        "name": app::NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [paths::ROOT, paths::API],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_binds_loopback_ephemeral_port() {
        let mut handle = start(0, "Hello World".to_string()).unwrap();
        assert_ne!(handle.port(), 0);
        assert!(handle.addr().ip().is_loopback());
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut handle = start(0, "Hello World".to_string()).unwrap();
        handle.shutdown().unwrap();
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_two_servers_bind_distinct_ports() {
        let first = start(0, "a".to_string()).unwrap();
        let second = start(0, "b".to_string()).unwrap();
        assert_ne!(first.port(), second.port());
    }

    #[test]
    fn test_greeting_page_contains_message() {
        let page = greeting_page("Howdy");
        assert!(page.contains("<h1>Howdy</h1>"));
        assert!(page.contains(app::NAME));
        assert!(page.contains(paths::API));
    }

    #[test]
    fn test_api_index_lists_endpoints() {
        let index = api_index();
        assert_eq!(index["name"], app::NAME);
        let endpoints: Vec<&str> = index["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|value| value.as_str().unwrap())
            .collect();
        assert_eq!(endpoints, vec![paths::ROOT, paths::API]);
    }
}
