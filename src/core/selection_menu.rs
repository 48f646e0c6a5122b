//! Native "Copy selection" context menu for selectable text.

use parking_lot::Mutex;
use serde::Deserialize;
use tauri::menu::{MenuBuilder, MenuItemBuilder};
use tauri::{AppHandle, LogicalPosition, WebviewWindow};
use tauri_plugin_clipboard_manager::ClipboardExt;

pub const COPY_SELECTION_ID: &str = "copy_selection";
pub const COPY_SELECTION_LABEL: &str = "Copy selection";

/// What the web view reports for a `contextmenu` event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextMenuRequest {
    pub selected_text: String,
    /// Tag name of the element the event originated from.
    pub target_tag: String,
    pub x: f64,
    pub y: f64,
    /// Set by elements that opt out of the custom menu.
    pub no_contextmenu: bool,
}

impl ContextMenuRequest {
    fn target_is_link(&self) -> bool {
        self.target_tag.eq_ignore_ascii_case("a")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionMenu {
    pub label: &'static str,
    pub enabled: bool,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Decides which menu, if any, replaces the default one.
pub fn plan(request: &ContextMenuRequest, menu_enabled: bool) -> Option<SelectionMenu> {
    if request.no_contextmenu || !menu_enabled {
        return None;
    }

    let has_selection = !request.selected_text.is_empty();
    // links keep the default menu unless text is selected
    if !has_selection && request.target_is_link() {
        return None;
    }

    Some(SelectionMenu {
        label: COPY_SELECTION_LABEL,
        enabled: has_selection,
        text: request.selected_text.clone(),
        x: request.x,
        y: request.y,
    })
}

pub trait MenuHost {
    fn popup(&self, menu: &SelectionMenu) -> Result<(), String>;
}

pub trait ClipboardHost {
    fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Remembers the selection of the last shown menu until its item is clicked.
#[derive(Debug, Default)]
pub struct ContextMenuHandler {
    pending: Mutex<Option<String>>,
}

impl ContextMenuHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows the menu for `request`. Returns whether a menu was shown.
    pub fn on_context_menu(
        &self,
        request: &ContextMenuRequest,
        menu_enabled: bool,
        host: &impl MenuHost,
    ) -> Result<bool, String> {
        let Some(menu) = plan(request, menu_enabled) else {
            return Ok(false);
        };

        *self.pending.lock() = menu.enabled.then(|| menu.text.clone());
        host.popup(&menu)?;
        Ok(true)
    }

    /// Copies the selection captured when the menu was opened.
    pub fn on_copy_clicked(&self, clipboard: &impl ClipboardHost) -> Result<(), String> {
        let Some(text) = self.pending.lock().take() else {
            return Ok(());
        };
        clipboard.write_text(&text)
    }
}

pub struct TauriMenuHost<'a>(pub &'a WebviewWindow);

impl MenuHost for TauriMenuHost<'_> {
    fn popup(&self, menu: &SelectionMenu) -> Result<(), String> {
        let window = self.0;
        let item = MenuItemBuilder::with_id(COPY_SELECTION_ID, menu.label)
            .enabled(menu.enabled)
            .build(window)
            .map_err(|e| format!("Failed to build menu item: {}", e))?;
        let native = MenuBuilder::new(window)
            .item(&item)
            .build()
            .map_err(|e| format!("Failed to build menu: {}", e))?;

        window
            .popup_menu_at(&native, LogicalPosition::new(menu.x, menu.y))
            .map_err(|e| format!("Failed to show menu: {}", e))
    }
}

pub struct TauriClipboard<'a>(pub &'a AppHandle);

impl ClipboardHost for TauriClipboard<'_> {
    fn write_text(&self, text: &str) -> Result<(), String> {
        self.0
            .clipboard()
            .write_text(text.to_string())
            .map_err(|e| format!("Failed to write clipboard: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingMenu(RefCell<Vec<SelectionMenu>>);

    impl MenuHost for RecordingMenu {
        fn popup(&self, menu: &SelectionMenu) -> Result<(), String> {
            self.0.borrow_mut().push(menu.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingClipboard(RefCell<Vec<String>>);

    impl ClipboardHost for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<(), String> {
            self.0.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn request(selected: &str, tag: &str) -> ContextMenuRequest {
        ContextMenuRequest {
            selected_text: selected.to_string(),
            target_tag: tag.to_string(),
            x: 12.0,
            y: 34.5,
            no_contextmenu: false,
        }
    }

    #[test]
    fn link_without_selection_keeps_default_menu() {
        assert_eq!(plan(&request("", "A"), true), None);
        assert_eq!(plan(&request("", "a"), true), None);
    }

    #[test]
    fn empty_selection_elsewhere_shows_disabled_item() {
        let menu = plan(&request("", "DIV"), true).expect("menu");
        assert_eq!(menu.label, "Copy selection");
        assert!(!menu.enabled);
    }

    #[test]
    fn selection_on_a_link_still_shows_the_menu() {
        let menu = plan(&request("stream title", "A"), true).expect("menu");
        assert!(menu.enabled);
        assert_eq!(menu.text, "stream title");
        assert_eq!((menu.x, menu.y), (12.0, 34.5));
    }

    #[test]
    fn opt_out_suppresses_menu_for_any_selection() {
        for (selected, tag) in [("", "A"), ("", "DIV"), ("text", "A"), ("text", "SPAN")] {
            let mut req = request(selected, tag);
            req.no_contextmenu = true;
            assert_eq!(plan(&req, true), None);
            assert_eq!(plan(&request(selected, tag), false), None);
        }
    }

    #[test]
    fn clicking_the_item_copies_exactly_the_selection() {
        let handler = ContextMenuHandler::new();
        let menu = RecordingMenu::default();
        let clipboard = RecordingClipboard::default();

        let shown = handler
            .on_context_menu(&request("  twitch.tv/xyz \n", "P"), true, &menu)
            .expect("popup");
        assert!(shown);
        assert_eq!(menu.0.borrow().len(), 1);

        handler.on_copy_clicked(&clipboard).expect("copy");
        assert_eq!(*clipboard.0.borrow(), vec!["  twitch.tv/xyz \n".to_string()]);

        // a second click without a new menu copies nothing
        handler.on_copy_clicked(&clipboard).expect("copy");
        assert_eq!(clipboard.0.borrow().len(), 1);
    }

    #[test]
    fn suppressed_request_shows_nothing_and_copies_nothing() {
        let handler = ContextMenuHandler::new();
        let menu = RecordingMenu::default();
        let clipboard = RecordingClipboard::default();

        let shown = handler
            .on_context_menu(&request("", "A"), true, &menu)
            .expect("no popup");
        assert!(!shown);
        assert!(menu.0.borrow().is_empty());

        handler.on_copy_clicked(&clipboard).expect("copy");
        assert!(clipboard.0.borrow().is_empty());
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let req: ContextMenuRequest = serde_json::from_str(
            r#"{"selectedText":"hi","targetTag":"SPAN","x":1,"y":2,"noContextmenu":true}"#,
        )
        .expect("deserialize");
        assert_eq!(req.selected_text, "hi");
        assert!(req.no_contextmenu);

        let minimal: ContextMenuRequest =
            serde_json::from_str(r#"{"targetTag":"A"}"#).expect("deserialize");
        assert!(minimal.target_is_link());
        assert!(!minimal.no_contextmenu);
    }
}
