use crate::core::app_log::{self, AppLogRecord};
use serde_json::Value;

#[tauri::command]
pub async fn append_log(
    level: String,
    scope: String,
    message: String,
    data: Option<Value>,
) -> Result<(), String> {
    app_log::append(AppLogRecord::now(&level, &scope, &message, data))
}

#[tauri::command]
pub async fn read_logs(
    limit: Option<u32>,
    query: Option<String>,
    tail_bytes: Option<u64>,
) -> Result<Vec<AppLogRecord>, String> {
    let limit = limit.unwrap_or(500).clamp(1, 5000) as usize;
    app_log::read(limit, query, tail_bytes)
}

#[tauri::command]
pub async fn clear_logs() -> Result<(), String> {
    app_log::clear()
}
