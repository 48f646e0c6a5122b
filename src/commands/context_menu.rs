use crate::core::app_log;
use crate::core::selection_menu::{
    ContextMenuHandler, ContextMenuRequest, TauriClipboard, TauriMenuHost,
};
use crate::models::Settings;
use tauri::{AppHandle, Manager, State, WebviewWindow};

/// Called by the web view on `contextmenu`; the web view prevents the default
/// menu only when this returns `true`.
#[tauri::command]
pub async fn show_selection_menu(
    window: WebviewWindow,
    handler: State<'_, ContextMenuHandler>,
    settings: State<'_, Settings>,
    request: ContextMenuRequest,
) -> Result<bool, String> {
    handler.on_context_menu(
        &request,
        settings.selection_menu_enabled,
        &TauriMenuHost(&window),
    )
}

/// Routes the "Copy selection" menu item click to the handler.
pub fn handle_copy_selection(app: &AppHandle) {
    let handler = app.state::<ContextMenuHandler>();
    if let Err(e) = handler.on_copy_clicked(&TauriClipboard(app)) {
        app_log::error_with(
            "selection_menu",
            "copy_failed",
            serde_json::json!({ "error": e }),
        );
    }
}
