mod commands;
mod core;
mod models;

use anyhow::Context;
use crate::core::app_log;
use crate::core::geometry_worker::{self, GeometryMessage, GeometryWorker};
use crate::core::persistence::StateFile;
use crate::core::selection_menu::{ContextMenuHandler, COPY_SELECTION_ID};
use crate::core::window_events::TransitionTracker;
use crate::core::window_geometry::{GeometryConfig, WindowGeometryManager};
use crate::core::window_host::{TauriScreenHost, TauriWindowHost};
use crate::models::Settings;
use std::time::Duration;
use tauri::{AppHandle, Manager, WebviewWindow, WindowEvent};

const MAIN_WINDOW_LABEL: &str = "main";
const STATE_FILE_NAME: &str = "state.json";
const RESET_WINDOW_ARG: &str = "--reset-window";

fn has_reset_flag<I>(args: I) -> bool
where
    I: IntoIterator<Item = String>,
{
    args.into_iter().skip(1).any(|arg| arg == RESET_WINDOW_ARG)
}

/// Manifest sizes are logical; the geometry code works in physical pixels.
fn manifest_default_size(width: f64, height: f64, scale_factor: Option<f64>) -> (u32, u32) {
    let scale = scale_factor
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(1.0);
    (
        (width * scale).round().max(1.0) as u32,
        (height * scale).round().max(1.0) as u32,
    )
}

fn geometry_config(app: &AppHandle, window: &WebviewWindow, settings: &Settings) -> GeometryConfig {
    let defaults = GeometryConfig::default();
    let primary_scale = window
        .primary_monitor()
        .ok()
        .flatten()
        .map(|monitor| monitor.scale_factor());
    let default_size = app
        .config()
        .app
        .windows
        .iter()
        .find(|w| w.label == MAIN_WINDOW_LABEL)
        .map(|w| manifest_default_size(w.width, w.height, primary_scale))
        .unwrap_or(defaults.default_size);

    GeometryConfig {
        save_debounce: Duration::from_millis(settings.save_debounce_ms as u64),
        transition_ignore: Duration::from_millis(settings.transition_ignore_ms as u64),
        default_size,
        ..defaults
    }
}

fn setup(app: &AppHandle) -> anyhow::Result<()> {
    let log_dir = app.path().app_log_dir().context("Failed to resolve log dir")?;
    app_log::init(log_dir).map_err(anyhow::Error::msg)?;
    app_log::install_panic_hook();
    app_log::info("app", "startup");

    let state_path = app
        .path()
        .app_data_dir()
        .context("Failed to resolve app data dir")?
        .join(STATE_FILE_NAME);
    let state = StateFile::open_or_default(state_path);
    let settings = state.settings();
    app.manage(settings.clone());

    let window = app
        .get_webview_window(MAIN_WINDOW_LABEL)
        .context("Main window not found")?;
    let config = geometry_config(app, &window, &settings);

    let mut manager = WindowGeometryManager::new(
        TauriWindowHost(window.clone()),
        TauriScreenHost(window.clone()),
        state,
        config,
    );
    let outcome = manager.startup(has_reset_flag(std::env::args()));
    app_log::info_with(
        "window/geometry",
        "startup",
        serde_json::json!({ "outcome": outcome.as_str(), "record": manager.record() }),
    );

    // the window starts hidden so the restore above doesn't flicker
    window.show().context("Failed to show main window")?;

    let tracker = TransitionTracker::new(
        window.is_maximized().unwrap_or(false),
        window.is_minimized().unwrap_or(false),
    );
    geometry_worker::start(GeometryWorker::new(
        manager,
        tracker,
        TauriScreenHost(window),
    ));
    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_clipboard_manager::init())
        .manage(ContextMenuHandler::new())
        .on_menu_event(|app, event| {
            if event.id().as_ref() == COPY_SELECTION_ID {
                commands::context_menu::handle_copy_selection(app);
            }
        })
        .setup(|app| {
            setup(app.handle())?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::context_menu::show_selection_menu,
            commands::settings::get_settings,
            commands::logs::append_log,
            commands::logs::read_logs,
            commands::logs::clear_logs,
        ])
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }
            let maximized = window.is_maximized().unwrap_or(false);
            let minimized = window.is_minimized().unwrap_or(false);
            match event {
                WindowEvent::Moved(position) => geometry_worker::send(GeometryMessage::Moved {
                    x: position.x,
                    y: position.y,
                    maximized,
                    minimized,
                }),
                WindowEvent::Resized(size) => geometry_worker::send(GeometryMessage::Resized {
                    width: size.width,
                    height: size.height,
                    maximized,
                    minimized,
                }),
                WindowEvent::ScaleFactorChanged { .. } => {
                    geometry_worker::send(GeometryMessage::DisplayChanged)
                }
                WindowEvent::CloseRequested { api, .. } => {
                    // the worker writes pending saves, then closes the window
                    if geometry_worker::request_close() {
                        api.prevent_close();
                    }
                }
                _ => {}
            }
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reset_flag_is_detected_after_program_name() {
        assert!(has_reset_flag(args(&["streamdesk", "--reset-window"])));
        assert!(has_reset_flag(args(&["streamdesk", "--verbose", "--reset-window"])));
        assert!(!has_reset_flag(args(&["streamdesk"])));
        assert!(!has_reset_flag(args(&["--reset-window"])));
        assert!(!has_reset_flag(args(&["streamdesk", "--reset-window=1"])));
    }

    #[test]
    fn manifest_size_is_scaled_to_physical_pixels() {
        assert_eq!(manifest_default_size(960.0, 540.0, Some(1.0)), (960, 540));
        assert_eq!(manifest_default_size(960.0, 540.0, Some(1.5)), (1440, 810));
        assert_eq!(manifest_default_size(960.0, 540.0, Some(f64::NAN)), (960, 540));
        assert_eq!(manifest_default_size(0.0, 0.0, Some(2.0)), (1, 1));
        // no primary monitor reported
        assert_eq!(manifest_default_size(960.0, 540.0, None), (960, 540));
    }
}
