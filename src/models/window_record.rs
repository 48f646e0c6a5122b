use serde::{Deserialize, Serialize};

/// The application keeps exactly one window record.
pub const WINDOW_RECORD_ID: u32 = 1;

/// Persisted geometry of the main window, in physical pixels.
///
/// All four fields are `None` until the window has been positioned once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowRecord {
    pub id: u32,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for WindowRecord {
    fn default() -> Self {
        Self {
            id: WINDOW_RECORD_ID,
            x: None,
            y: None,
            width: None,
            height: None,
        }
    }
}

impl WindowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_geometry(&mut self) {
        self.x = None;
        self.y = None;
        self.width = None;
        self.height = None;
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        Some((self.width?, self.height?))
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        Some((self.x?, self.y?))
    }

    #[cfg(test)]
    pub fn is_unset(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }
}
