use crate::core::geometry::Rect;
use crate::core::window_geometry::{ScreenHost, WindowHost};
use tauri::{Monitor, PhysicalPosition, PhysicalSize, Position, Size, WebviewWindow};

/// Window geometry backed by a Tauri webview window.
///
/// Position is the outer (frame) position, size is the inner size: these are
/// the units `Moved`/`Resized` report and `set_position`/`set_size` accept.
#[derive(Clone)]
pub struct TauriWindowHost(pub WebviewWindow);

impl WindowHost for TauriWindowHost {
    fn geometry(&self) -> Result<Rect, String> {
        let position = self
            .0
            .outer_position()
            .map_err(|e| format!("Failed to read window position: {}", e))?;
        let size = self
            .0
            .inner_size()
            .map_err(|e| format!("Failed to read window size: {}", e))?;
        Ok(Rect::new(position.x, position.y, size.width, size.height))
    }

    fn resize_to(&self, width: u32, height: u32) -> Result<(), String> {
        self.0
            .set_size(Size::Physical(PhysicalSize { width, height }))
            .map_err(|e| format!("Failed to resize window: {}", e))
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), String> {
        self.0
            .set_position(Position::Physical(PhysicalPosition { x, y }))
            .map_err(|e| format!("Failed to move window: {}", e))
    }

    // destroy, not close: close would raise CloseRequested again
    fn close(&self) -> Result<(), String> {
        self.0
            .destroy()
            .map_err(|e| format!("Failed to close window: {}", e))
    }
}

/// Monitors as seen from the main window, primary monitor first.
#[derive(Clone)]
pub struct TauriScreenHost(pub WebviewWindow);

fn monitor_rect(monitor: &Monitor) -> Rect {
    let pos = monitor.position();
    let size = monitor.size();
    Rect::new(pos.x, pos.y, size.width, size.height)
}

/// Moves `primary` to the front, keeping the host order of the others.
fn primary_first(mut screens: Vec<Rect>, primary: Option<Rect>) -> Vec<Rect> {
    if let Some(primary) = primary {
        if let Some(idx) = screens.iter().position(|r| *r == primary) {
            let main = screens.remove(idx);
            screens.insert(0, main);
        }
    }
    screens
}

impl ScreenHost for TauriScreenHost {
    fn screens(&self) -> Vec<Rect> {
        let Ok(monitors) = self.0.available_monitors() else {
            return Vec::new();
        };
        let primary = self
            .0
            .primary_monitor()
            .ok()
            .flatten()
            .map(|m| monitor_rect(&m));
        primary_first(monitors.iter().map(monitor_rect).collect(), primary)
    }
}
