//! System tray controller
//!
//! One icon, a fixed menu, and a command channel toward the UI thread.
//! Tray callbacks only enqueue commands; they never touch window state and
//! never block. On Linux the icon lives on a dedicated GTK thread because
//! the status window runs a winit event loop; elsewhere the icon shares
//! the UI thread.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::mpsc::Sender;
use tracing::info;
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

use crate::constants::{app, menu};
use crate::lifecycle::AppCommand;

#[cfg(target_os = "linux")]
use anyhow::anyhow;
#[cfg(target_os = "linux")]
use std::sync::Arc;
#[cfg(target_os = "linux")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "linux")]
use std::thread::JoinHandle;
#[cfg(target_os = "linux")]
use std::time::Duration;

/// How often the tray thread checks for the teardown flag
#[cfg(target_os = "linux")]
const STOP_POLL_MS: u64 = 200;

/// Fixed menu layout: label plus the command it dispatches
pub fn menu_blueprint() -> Vec<(&'static str, AppCommand)> {
    vec![
        (menu::OPEN, AppCommand::OpenRoot),
        (menu::API_BROWSER, AppCommand::OpenApi),
        (menu::EXIT, AppCommand::Exit),
    ]
}

/// Whether the platform can host a tray icon at all
///
/// A negative answer is a supported terminal path, not an error: the
/// caller exits cleanly without showing any UI.
#[cfg(target_os = "linux")]
pub fn is_supported() -> bool {
    std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
}

#[cfg(not(target_os = "linux"))]
pub fn is_supported() -> bool {
    true
}

/// Installed tray icon
///
/// On Linux the icon lives on its own GTK thread; dropping the session
/// without calling `teardown` still stops that thread.
pub struct TraySession {
    #[cfg(target_os = "linux")]
    stop: Arc<AtomicBool>,
    #[cfg(target_os = "linux")]
    thread: Option<JoinHandle<()>>,
    #[cfg(not(target_os = "linux"))]
    _tray: TrayIcon,
}

impl TraySession {
    /// Remove the icon as part of the Exit sequence
    #[cfg(target_os = "linux")]
    pub fn teardown(mut self) -> Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| anyhow!("Tray thread panicked"))?;
        }
        info!("Tray icon removed");
        Ok(())
    }

    /// Remove the icon as part of the Exit sequence
    #[cfg(not(target_os = "linux"))]
    pub fn teardown(self) -> Result<()> {
        drop(self);
        info!("Tray icon removed");
        Ok(())
    }
}

#[cfg(target_os = "linux")]
impl Drop for TraySession {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Install the tray icon and wire its events into the command channel
///
/// `notify` is pinged after each enqueued command so the UI thread wakes
/// up promptly. Installation failure is fatal to the application: there is
/// no headless fallback.
#[cfg(target_os = "linux")]
pub fn install<F>(
    entries: Vec<(&'static str, AppCommand)>,
    commands: Sender<AppCommand>,
    notify: F,
) -> Result<TraySession>
where
    F: Fn() + Send + Sync + Clone + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = stop.clone();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel();

    let thread = std::thread::Builder::new()
        .name("webdesk-tray".to_string())
        .spawn(move || {
            if let Err(err) = gtk::init() {
                let _ = ready_tx.send(Err(anyhow!("Failed to initialize GTK: {err}")));
                return;
            }

            let (tray, id_map) = match build_tray(&entries) {
                Ok(built) => built,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            register_handlers(id_map, commands, notify);
            let _ = ready_tx.send(Ok(()));

            // Pump GTK until teardown raises the stop flag
            let loop_stop = thread_stop;
            gtk::glib::timeout_add_local(Duration::from_millis(STOP_POLL_MS), move || {
                if loop_stop.load(Ordering::Relaxed) {
                    gtk::main_quit();
                    gtk::glib::ControlFlow::Break
                } else {
                    gtk::glib::ControlFlow::Continue
                }
            });
            gtk::main();

            drop(tray);
            info!("Tray thread stopped");
        })
        .context("Failed to spawn tray thread")?;

    match ready_rx.recv_timeout(Duration::from_secs(5)) {
        Ok(Ok(())) => Ok(TraySession {
            stop,
            thread: Some(thread),
        }),
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(_) => Err(anyhow!("Tray thread did not report readiness")),
    }
}

/// Install the tray icon and wire its events into the command channel
#[cfg(not(target_os = "linux"))]
pub fn install<F>(
    entries: Vec<(&'static str, AppCommand)>,
    commands: Sender<AppCommand>,
    notify: F,
) -> Result<TraySession>
where
    F: Fn() + Send + Sync + Clone + 'static,
{
    let (tray, id_map) = build_tray(&entries)?;
    register_handlers(id_map, commands, notify);
    Ok(TraySession { _tray: tray })
}

fn register_handlers<F>(
    id_map: HashMap<MenuId, AppCommand>,
    commands: Sender<AppCommand>,
    notify: F,
) where
    F: Fn() + Send + Sync + Clone + 'static,
{
    let menu_commands = commands.clone();
    let menu_notify = notify.clone();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        if let Some(&command) = id_map.get(event.id()) {
            info!(command = ?command, "Tray menu activated");
            if menu_commands.send(command).is_ok() {
                menu_notify();
            }
        }
    }));

    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        // A left-click release on the icon acts like the show-window entry
        if let TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Up,
            ..
        } = event
        {
            if commands.send(AppCommand::ShowWindow).is_ok() {
                notify();
            }
        }
    }));
}

fn build_tray(
    entries: &[(&'static str, AppCommand)],
) -> Result<(TrayIcon, HashMap<MenuId, AppCommand>)> {
    let icon = load_tray_icon()?;

    let tray_menu = Menu::new();
    let mut id_map = HashMap::new();
    for &(label, command) in entries {
        if command == AppCommand::Exit {
            tray_menu
                .append(&PredefinedMenuItem::separator())
                .context("Failed to append menu separator")?;
        }
        let item = MenuItem::new(label, true, None);
        id_map.insert(item.id().clone(), command);
        tray_menu
            .append(&item)
            .context(format!("Failed to append menu entry: {label}"))?;
    }

    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(tray_menu))
        .with_tooltip(app::NAME)
        .with_icon(icon)
        .build()
        .context("Failed to build tray icon")?;

    info!("Tray icon created");

    Ok((tray, id_map))
}

fn load_tray_icon() -> Result<Icon> {
    let icon_bytes = include_bytes!("../assets/tray-icon.png");
    let decoder = png::Decoder::new(Cursor::new(icon_bytes));
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    let rgba = &buf[..frame.buffer_size()];

    // tray-icon expects RGBA format directly
    let rgba_vec = match frame.color_type {
        png::ColorType::Rgba => rgba.to_vec(),
        png::ColorType::Rgb => {
            let mut rgba_data = Vec::with_capacity(rgba.len() / 3 * 4);
            for chunk in rgba.chunks_exact(3) {
                rgba_data.extend_from_slice(chunk);
                rgba_data.push(0xFF);
            }
            rgba_data
        }
        other => {
            return Err(anyhow::anyhow!(
                "Unsupported tray icon color type {:?} (expected RGB or RGBA)",
                other
            ));
        }
    };

    Icon::from_rgba(rgba_vec, frame.width, frame.height)
        .context("Failed to create icon from RGBA data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_blueprint_order_and_commands() {
        let blueprint = menu_blueprint();
        assert_eq!(
            blueprint,
            vec![
                ("Open", AppCommand::OpenRoot),
                ("API Browser", AppCommand::OpenApi),
                ("Exit", AppCommand::Exit),
            ]
        );
    }

    #[test]
    fn test_each_entry_maps_to_exactly_one_command() {
        let blueprint = menu_blueprint();
        let mut commands: Vec<AppCommand> = blueprint.iter().map(|(_, command)| *command).collect();
        commands.dedup();
        assert_eq!(commands.len(), blueprint.len());
    }

    #[test]
    fn test_embedded_icon_decodes() {
        load_tray_icon().unwrap();
    }
}
