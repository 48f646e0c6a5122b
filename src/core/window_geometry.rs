//! Restores, validates and persists the main window's geometry.
//!
//! [`WindowGeometryManager`] is a plain state machine: the host feeds it
//! window events together with the current instant and calls [`poll`] when
//! the next deadline passes. It never sleeps and never reads the clock.
//!
//! [`poll`]: WindowGeometryManager::poll

use crate::core::app_log;
use crate::core::geometry::{self, Rect, Visibility};
use crate::core::persistence::WindowRecordStore;
use crate::core::timers::Timers;
use crate::models::WindowRecord;
use serde_json::json;
use std::time::{Duration, Instant};

const LOG_SCOPE: &str = "window/geometry";

/// Moves the host reports while a window is being maximized (`-8,-8`) or
/// minimized (`-32000,-32000`) on Windows.
const TRANSIENT_POSITIONS: [(i32, i32); 2] = [(-8, -8), (-32_000, -32_000)];

pub trait WindowHost {
    /// Current outer bounds of the window.
    fn geometry(&self) -> Result<Rect, String>;
    fn resize_to(&self, width: u32, height: u32) -> Result<(), String>;
    fn move_to(&self, x: i32, y: i32) -> Result<(), String>;
    /// Closes the window without asking again.
    fn close(&self) -> Result<(), String>;
}

pub trait ScreenHost {
    /// Screen bounds with the main screen first. Empty when enumeration fails.
    fn screens(&self) -> Vec<Rect>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEvent {
    Moved { x: i32, y: i32 },
    Resized { width: u32, height: u32 },
    Maximized,
    Unmaximized,
    Minimized,
    Restored,
    DisplayBoundsChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryConfig {
    pub save_debounce: Duration,
    pub transition_ignore: Duration,
    /// Window size used when the window has to be re-centered.
    pub default_size: (u32, u32),
    pub filter_transient_positions: bool,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(1_000),
            transition_ignore: Duration::from_millis(2_000),
            default_size: (960, 540),
            filter_transient_positions: cfg!(target_os = "windows"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// The reset flag was given; the record was cleared.
    Cleared,
    /// The saved (or initial) geometry is fully visible.
    Validated,
    /// The window was moved to the center of the main screen.
    Recentered,
}

impl StartupOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cleared => "cleared",
            Self::Validated => "validated",
            Self::Recentered => "recentered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Timer {
    SaveSize,
    SavePosition,
    EndIgnore,
}

pub struct WindowGeometryManager<W, S, R> {
    window: W,
    screens: S,
    store: R,
    config: GeometryConfig,
    record: WindowRecord,
    ignore: bool,
    pending_position: Option<(i32, i32)>,
    pending_size: Option<(u32, u32)>,
    timers: Timers<Timer>,
}

impl<W: WindowHost, S: ScreenHost, R: WindowRecordStore> WindowGeometryManager<W, S, R> {
    pub fn new(window: W, screens: S, store: R, config: GeometryConfig) -> Self {
        Self {
            window,
            screens,
            store,
            config,
            record: WindowRecord::new(),
            ignore: false,
            pending_position: None,
            pending_size: None,
            timers: Timers::new(),
        }
    }

    pub fn record(&self) -> &WindowRecord {
        &self.record
    }

    #[cfg(test)]
    fn is_ignoring(&self) -> bool {
        self.ignore
    }

    /// Loads (or creates) the window record, then either clears it or
    /// restores and validates it.
    pub fn startup(&mut self, reset_window: bool) -> StartupOutcome {
        self.record = self.load_or_create();

        if reset_window {
            self.record.clear_geometry();
            self.persist("reset");
            return StartupOutcome::Cleared;
        }

        self.restore();

        // validate the restored window position and reset it if it's invalid
        if self.is_window_fully_visible() {
            StartupOutcome::Validated
        } else {
            self.reset_to_center();
            StartupOutcome::Recentered
        }
    }

    fn load_or_create(&mut self) -> WindowRecord {
        match self.store.find_all() {
            Ok(records) => {
                if let Some(record) = records.into_iter().next() {
                    return record;
                }
            }
            Err(e) => {
                app_log::error_with(LOG_SCOPE, "load_failed", json!({ "error": e.to_string() }));
            }
        }

        let record = WindowRecord::new();
        if let Err(e) = self.store.save(&record) {
            app_log::error_with(LOG_SCOPE, "create_failed", json!({ "error": e.to_string() }));
        }
        record
    }

    fn restore(&mut self) {
        if let Some((width, height)) = self.record.size() {
            if let Err(e) = self.window.resize_to(width, height) {
                app_log::warn_with(LOG_SCOPE, "restore_size_failed", json!({ "error": e }));
            }
        }
        if let Some((x, y)) = self.record.position() {
            if let Err(e) = self.window.move_to(x, y) {
                app_log::warn_with(LOG_SCOPE, "restore_position_failed", json!({ "error": e }));
            }
        }
    }

    fn current_visibility(&self) -> Visibility {
        match self.window.geometry() {
            Ok(rect) => geometry::visibility(&rect, &self.screens.screens()),
            Err(_) => Visibility::Unknown,
        }
    }

    /// Strict check used at startup and on display changes: without screens
    /// the window can't be validated and counts as not visible.
    fn is_window_fully_visible(&self) -> bool {
        match self.window.geometry() {
            Ok(rect) => geometry::is_fully_visible(&rect, &self.screens.screens()),
            Err(_) => false,
        }
    }

    /// Lenient check used before saving a move/resize: only a window that is
    /// known to be offscreen blocks the save.
    fn may_save_current(&self) -> bool {
        self.current_visibility() != Visibility::Offscreen
    }

    /// Applies the default size, centers the window on the main screen and
    /// saves the result.
    pub fn reset_to_center(&mut self) {
        // whatever was pending describes the geometry being replaced
        self.timers.cancel(Timer::SavePosition);
        self.timers.cancel(Timer::SaveSize);
        self.pending_position = None;
        self.pending_size = None;

        let (width, height) = self.config.default_size;
        if let Err(e) = self.window.resize_to(width, height) {
            app_log::warn_with(LOG_SCOPE, "reset_size_failed", json!({ "error": e }));
        }

        let (x, y) = match self.screens.screens().first() {
            Some(main) => {
                let (x, y) = geometry::centered_on(main, width, height);
                if let Err(e) = self.window.move_to(x, y) {
                    app_log::warn_with(LOG_SCOPE, "reset_position_failed", json!({ "error": e }));
                }
                (x, y)
            }
            None => {
                // nowhere to center on; keep the position the host chose
                app_log::warn_with(LOG_SCOPE, "no_screens", json!({ "action": "reset_to_center" }));
                match self.window.geometry() {
                    Ok(rect) => (rect.x, rect.y),
                    Err(e) => {
                        app_log::warn_with(LOG_SCOPE, "reset_read_failed", json!({ "error": e }));
                        return;
                    }
                }
            }
        };

        self.record.x = Some(x);
        self.record.y = Some(y);
        self.record.width = Some(width);
        self.record.height = Some(height);
        self.persist("recenter");
    }

    pub fn handle_event(&mut self, event: GeometryEvent, now: Instant) {
        match event {
            GeometryEvent::Moved { x, y } => {
                if self.ignore {
                    return;
                }
                self.pending_position = Some((x, y));
                self.timers
                    .schedule(Timer::SavePosition, now, self.config.save_debounce);
            }
            GeometryEvent::Resized { width, height } => {
                if self.ignore {
                    return;
                }
                self.pending_size = Some((width, height));
                self.timers
                    .schedule(Timer::SaveSize, now, self.config.save_debounce);
            }
            GeometryEvent::Maximized
            | GeometryEvent::Unmaximized
            | GeometryEvent::Minimized
            | GeometryEvent::Restored => {
                self.ignore = true;
                self.timers
                    .schedule(Timer::EndIgnore, now, self.config.transition_ignore);
            }
            GeometryEvent::DisplayBoundsChanged => {
                if !self.is_window_fully_visible() {
                    app_log::info(LOG_SCOPE, "display_changed_offscreen");
                    self.reset_to_center();
                }
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Runs every timer that is due at `now`.
    pub fn poll(&mut self, now: Instant) {
        for timer in self.timers.take_due(now) {
            self.fire(timer);
        }
    }

    /// Applies pending debounced saves immediately, e.g. before the window closes.
    pub fn flush(&mut self) {
        for timer in self.timers.drain() {
            self.fire(timer);
        }
    }

    /// Flushes pending saves, then closes the window.
    pub fn close(&mut self) {
        self.flush();
        if let Err(e) = self.window.close() {
            app_log::error_with(LOG_SCOPE, "close_failed", json!({ "error": e }));
        }
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::SavePosition => {
                if let Some((x, y)) = self.pending_position.take() {
                    self.save_position(x, y);
                }
            }
            Timer::SaveSize => {
                if let Some((width, height)) = self.pending_size.take() {
                    self.save_size(width, height);
                }
            }
            Timer::EndIgnore => self.ignore = false,
        }
    }

    fn is_transient_position(&self, x: i32, y: i32) -> bool {
        self.config.filter_transient_positions && TRANSIENT_POSITIONS.contains(&(x, y))
    }

    fn save_position(&mut self, x: i32, y: i32) {
        // the transition may have been reported after the move it caused
        if self.ignore {
            return;
        }
        if self.is_transient_position(x, y) {
            return;
        }
        if !self.may_save_current() {
            return;
        }
        if self.record.size().is_none() {
            // first save: the record holds a full rectangle or nothing
            let Ok(rect) = self.window.geometry() else {
                return;
            };
            self.record.width = Some(rect.width);
            self.record.height = Some(rect.height);
        }
        self.record.x = Some(x);
        self.record.y = Some(y);
        self.persist("move");
    }

    fn save_size(&mut self, width: u32, height: u32) {
        if self.ignore {
            return;
        }
        if !self.may_save_current() {
            return;
        }
        if self.record.position().is_none() {
            let Ok(rect) = self.window.geometry() else {
                return;
            };
            self.record.x = Some(rect.x);
            self.record.y = Some(rect.y);
        }
        self.record.width = Some(width);
        self.record.height = Some(height);
        self.persist("resize");
    }

    fn persist(&mut self, reason: &str) {
        if let Err(e) = self.store.save(&self.record) {
            app_log::error_with(
                LOG_SCOPE,
                "save_failed",
                json!({ "reason": reason, "error": e.to_string() }),
            );
        }
    }
}
