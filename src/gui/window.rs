//! Status window implemented with egui/eframe
//!
//! Owns the running half of the lifecycle: drains the command channel fed
//! by the tray and the signal watcher, toggles window visibility, and runs
//! the ordered shutdown sequence on Exit. The window is created once at
//! startup and starts hidden; closing it hides it again instead of
//! destroying it.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{Context, Result};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{error, info};

use super::constants::*;
use crate::browser;
use crate::constants::{app, paths};
use crate::instance::LockHandle;
use crate::lifecycle::{self, AppCommand, Lifecycle, Phase};
use crate::server::ServerHandle;
use crate::tray::{self, TraySession};

/// Everything the status window takes ownership of at startup
pub struct AppState {
    pub lifecycle: Lifecycle,
    pub lock: Arc<LockHandle>,
    pub server: ServerHandle,
    pub commands: std::sync::mpsc::Sender<AppCommand>,
    pub command_rx: Receiver<AppCommand>,
}

struct DeskApp {
    lifecycle: Lifecycle,
    lock: Arc<LockHandle>,
    server: Option<ServerHandle>,
    tray: Option<TraySession>,
    command_rx: Receiver<AppCommand>,
    visible: bool,
    allow_close: bool,
}

impl DeskApp {
    fn new(cc: &CreationContext<'_>, mut state: AppState) -> Result<Self> {
        info!("Initializing status window");

        let notify = {
            let ctx = cc.egui_ctx.clone();
            move || ctx.request_repaint()
        };

        #[cfg(unix)]
        crate::signals::spawn_watcher(state.commands.clone(), state.lock.clone(), notify.clone())
            .context("Failed to start signal watcher")?;

        let tray = tray::install(tray::menu_blueprint(), state.commands.clone(), notify)
            .context("Failed to install tray icon")?;

        state.lifecycle.advance(Phase::Running);

        Ok(Self {
            lifecycle: state.lifecycle,
            lock: state.lock,
            server: Some(state.server),
            tray: Some(tray),
            command_rx: state.command_rx,
            visible: false,
            allow_close: false,
        })
    }

    fn dispatch(&mut self, ctx: &egui::Context, command: AppCommand) {
        if self.lifecycle.phase() != Phase::Running {
            // Late commands after Exit are dropped
            return;
        }
        match command {
            AppCommand::ShowWindow => self.show_window(ctx),
            AppCommand::OpenRoot => {
                if let Some(server) = &self.server {
                    browser::open_path(server.addr(), paths::ROOT);
                }
            }
            AppCommand::OpenApi => {
                if let Some(server) = &self.server {
                    browser::open_path(server.addr(), paths::API);
                }
            }
            AppCommand::Exit => self.exit(ctx),
        }
    }

    /// Show the window and bring it to the front
    ///
    /// Already shown is a visibility no-op, but the focus request still
    /// applies.
    fn show_window(&mut self, ctx: &egui::Context) {
        if !self.visible {
            ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
            self.visible = true;
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
    }

    fn hide_window(&mut self, ctx: &egui::Context) {
        ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
        self.visible = false;
    }

    /// Ordered best-effort shutdown: server, then tray, then lock
    fn run_shutdown(&mut self) {
        if !self.lifecycle.advance(Phase::ShuttingDown) {
            return;
        }

        let mut server = self.server.take();
        let tray = self.tray.take();
        let lock = self.lock.clone();

        let failures = lifecycle::run_best_effort(vec![
            (
                "server-shutdown",
                Box::new(move || match server.as_mut() {
                    Some(server) => server.shutdown(),
                    None => Ok(()),
                }),
            ),
            (
                "tray-teardown",
                Box::new(move || match tray {
                    Some(tray) => tray.teardown(),
                    None => Ok(()),
                }),
            ),
            (
                "lock-release",
                Box::new(move || {
                    lock.release();
                    Ok(())
                }),
            ),
        ]);

        if failures > 0 {
            error!(failures, "Shutdown finished with failed steps");
        }
    }

    fn exit(&mut self, ctx: &egui::Context) {
        info!("Exit requested");
        self.run_shutdown();
        self.allow_close = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

impl eframe::App for DeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(command) = self.command_rx.try_recv() {
            self.dispatch(ctx, command);
        }

        if ctx.input(|i| i.viewport().close_requested()) && !self.allow_close {
            // Closing the window only hides it; Exit lives in the tray menu
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.hide_window(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(PADDING);
            ui.heading(app::NAME);
            ui.add_space(SECTION_SPACING);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Embedded Server").strong());
                match &self.server {
                    Some(server) => {
                        ui.colored_label(STATUS_RUNNING, "\u{25CF}  Running");
                        ui.label(browser::page_url(server.addr(), paths::ROOT));
                    }
                    None => {
                        ui.colored_label(STATUS_STOPPED, "\u{25CF}  Stopped");
                    }
                }
            });

            ui.add_space(SECTION_SPACING);

            ui.horizontal(|ui| {
                if ui.button("Open in Browser").clicked() {
                    self.dispatch(ctx, AppCommand::OpenRoot);
                }
                if ui.button("API Browser").clicked() {
                    self.dispatch(ctx, AppCommand::OpenApi);
                }
            });

            ui.add_space(SECTION_SPACING);
            ui.separator();
            ui.add_space(SECTION_SPACING);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Tips").strong());
                ui.label("• The tray icon keeps the application running");
                ui.label("• Closing this window only hides it");
                ui.label("• Left-click the tray icon to show it again");
            });
        });

        ctx.request_repaint_after(Duration::from_millis(COMMAND_POLL_INTERVAL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Normally a no-op: the Exit command already ran the sequence
        self.run_shutdown();
        self.lifecycle.advance(Phase::Terminated);
        info!("Status window closed");
    }
}

/// Run the status window event loop; returns when the application exits
pub fn run_gui(state: AppState) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title(app::NAME)
            .with_visible(false),
        ..Default::default()
    };

    eframe::run_native(
        app::NAME,
        options,
        Box::new(
            move |cc| -> Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>> {
                let app = DeskApp::new(cc, state)?;
                Ok(Box::new(app))
            },
        ),
    )
    .map_err(|err| anyhow::anyhow!("Failed to run status window: {err}"))
}
