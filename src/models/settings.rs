use serde::{Deserialize, Serialize};

pub const DEFAULT_SAVE_DEBOUNCE_MS: u32 = 1_000;
pub const DEFAULT_TRANSITION_IGNORE_MS: u32 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub save_debounce_ms: u32,
    pub transition_ignore_ms: u32,
    pub selection_menu_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            transition_ignore_ms: DEFAULT_TRANSITION_IGNORE_MS,
            selection_menu_enabled: true,
        }
    }
}

fn normalize_save_debounce_ms(ms: u32) -> u32 {
    ms.clamp(100, 10_000)
}

fn normalize_transition_ignore_ms(ms: u32) -> u32 {
    ms.clamp(250, 10_000)
}

impl Settings {
    /// Hand-edited state files may carry values the geometry worker can't use.
    pub fn normalized(mut self) -> Self {
        self.save_debounce_ms = normalize_save_debounce_ms(self.save_debounce_ms);
        self.transition_ignore_ms = normalize_transition_ignore_ms(self.transition_ignore_ms);
        self
    }
}
