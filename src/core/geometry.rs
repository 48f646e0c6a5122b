use serde::{Deserialize, Serialize};

/// A rectangle in physical screen coordinates.
///
/// Used for both window outer bounds and monitor bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if `inner` lies entirely within `self`; shared edges count as inside.
    pub fn contains_rect(&self, inner: &Rect) -> bool {
        // subtract the screen offset from the window position
        let pos_x = inner.x as i64 - self.x as i64;
        let pos_y = inner.y as i64 - self.y as i64;

        pos_x >= 0
            && pos_y >= 0
            && pos_x + inner.width as i64 <= self.width as i64
            && pos_y + inner.height as i64 <= self.height as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Fully inside at least one screen.
    Visible,
    /// Screens are known and none of them fully contains the window.
    Offscreen,
    /// No screens could be enumerated.
    Unknown,
}

pub fn visibility(window: &Rect, screens: &[Rect]) -> Visibility {
    if screens.is_empty() {
        return Visibility::Unknown;
    }
    if screens.iter().any(|screen| screen.contains_rect(window)) {
        Visibility::Visible
    } else {
        Visibility::Offscreen
    }
}

/// The window needs to be fully visible on one screen.
pub fn is_fully_visible(window: &Rect, screens: &[Rect]) -> bool {
    visibility(window, screens) == Visibility::Visible
}

// Half-way values round towards positive infinity, so -0.5 becomes 0.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Position that centers a `width` x `height` window on `screen`, including the screen offset.
pub fn centered_on(screen: &Rect, width: u32, height: u32) -> (i32, i32) {
    let free_w = screen.width as f64 - width as f64;
    let free_h = screen.height as f64 - height as f64;
    let x = screen.x as i64 + round_half_up(free_w / 2.0);
    let y = screen.y as i64 + round_half_up(free_h / 2.0);
    (clamp_i32(x), clamp_i32(y))
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
