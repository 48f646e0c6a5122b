use crate::models::Settings;
use tauri::State;

#[tauri::command]
pub async fn get_settings(settings: State<'_, Settings>) -> Result<Settings, String> {
    Ok(settings.inner().clone())
}
