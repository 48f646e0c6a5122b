use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

const LOG_FILE_NAME: &str = "app.log.jsonl";
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const MAX_ROTATIONS: usize = 3;
const DEFAULT_TAIL_BYTES: u64 = 2 * 1024 * 1024;

// Holds the log directory once `init` ran; the lock also serializes writers.
static LOG_DIR: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppLogRecord {
    pub ts_ms: i64,
    pub level: String,
    pub scope: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AppLogRecord {
    pub fn now(level: &str, scope: &str, message: &str, data: Option<Value>) -> Self {
        Self {
            ts_ms: Utc::now().timestamp_millis(),
            level: level.to_string(),
            scope: scope.to_string(),
            message: message.to_string(),
            data,
        }
    }
}

/// Registers the directory records are written to. Records appended before
/// this call are dropped.
pub fn init(dir: PathBuf) -> Result<(), String> {
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create log dir: {}", e))?;
    *LOG_DIR.lock() = Some(dir);
    Ok(())
}

fn log_path(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE_NAME)
}

fn rotated_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("app.log.{}.jsonl", index))
}

fn rotate_if_needed(dir: &Path) -> Result<(), String> {
    let path = log_path(dir);
    let Ok(meta) = fs::metadata(&path) else {
        return Ok(());
    };
    if meta.len() < MAX_LOG_BYTES {
        return Ok(());
    }

    let oldest = rotated_path(dir, MAX_ROTATIONS);
    if oldest.exists() {
        fs::remove_file(&oldest)
            .map_err(|e| format!("Failed to remove old log {}: {}", oldest.display(), e))?;
    }

    for i in (1..MAX_ROTATIONS).rev() {
        let src = rotated_path(dir, i);
        let dst = rotated_path(dir, i + 1);
        if src.exists() {
            fs::rename(&src, &dst).map_err(|e| {
                format!("Failed to rotate log ({} -> {}): {}", src.display(), dst.display(), e)
            })?;
        }
    }

    let first = rotated_path(dir, 1);
    fs::rename(&path, &first).map_err(|e| {
        format!("Failed to rotate log ({} -> {}): {}", path.display(), first.display(), e)
    })?;
    Ok(())
}

fn append_in(dir: &Path, record: &AppLogRecord) -> Result<(), String> {
    rotate_if_needed(dir)?;
    let path = log_path(dir);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("Failed to open log file: {}", e))?;

    let line = serde_json::to_string(record)
        .map_err(|e| format!("Failed to serialize log record: {}", e))?;
    file.write_all(line.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .map_err(|e| format!("Failed to write log record: {}", e))?;
    Ok(())
}

pub fn append(record: AppLogRecord) -> Result<(), String> {
    let guard = LOG_DIR.lock();
    let Some(dir) = guard.as_ref() else {
        return Ok(());
    };
    append_in(dir, &record)
}

pub fn info(scope: &str, message: &str) {
    let _ = append(AppLogRecord::now("info", scope, message, None));
}

pub fn info_with(scope: &str, message: &str, data: Value) {
    let _ = append(AppLogRecord::now("info", scope, message, Some(data)));
}

pub fn warn_with(scope: &str, message: &str, data: Value) {
    let _ = append(AppLogRecord::now("warn", scope, message, Some(data)));
}

pub fn error_with(scope: &str, message: &str, data: Value) {
    let _ = append(AppLogRecord::now("error", scope, message, Some(data)));
}

fn read_tail(path: &Path, max_bytes: u64) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| format!("Failed to open log file: {}", e))?;
    let size = file
        .metadata()
        .map_err(|e| format!("Failed to read log metadata: {}", e))?
        .len();

    let start = size.saturating_sub(max_bytes);
    file.seek(SeekFrom::Start(start))
        .map_err(|e| format!("Failed to seek log file: {}", e))?;

    let mut buf = String::new();
    file.read_to_string(&mut buf)
        .map_err(|e| format!("Failed to read log file: {}", e))?;

    if start > 0 {
        if let Some(idx) = buf.find('\n') {
            return Ok(buf[idx + 1..].to_string());
        }
        return Ok(String::new());
    }

    Ok(buf)
}

fn read_in(
    dir: &Path,
    limit: usize,
    query: Option<String>,
    tail_bytes: Option<u64>,
) -> Result<Vec<AppLogRecord>, String> {
    let q = query.map(|s| s.to_lowercase()).filter(|s| !s.trim().is_empty());
    let mut records = Vec::new();

    let mut paths: Vec<PathBuf> = (1..=MAX_ROTATIONS).rev().map(|i| rotated_path(dir, i)).collect();
    paths.push(log_path(dir));

    for path in paths {
        if !path.exists() {
            continue;
        }
        let content = read_tail(&path, tail_bytes.unwrap_or(DEFAULT_TAIL_BYTES))?;
        for line in content.lines() {
            let Ok(rec) = serde_json::from_str::<AppLogRecord>(line) else {
                continue;
            };
            if let Some(q) = &q {
                let hay = format!("{} {} {}", rec.level, rec.scope, rec.message).to_lowercase();
                if !hay.contains(q) {
                    continue;
                }
            }
            records.push(rec);
        }
    }

    if records.len() > limit {
        records.drain(0..records.len().saturating_sub(limit));
    }
    Ok(records)
}

pub fn read(
    limit: usize,
    query: Option<String>,
    tail_bytes: Option<u64>,
) -> Result<Vec<AppLogRecord>, String> {
    let guard = LOG_DIR.lock();
    let dir = guard
        .as_ref()
        .ok_or_else(|| "Log directory not initialized".to_string())?;
    read_in(dir, limit, query, tail_bytes)
}

fn clear_in(dir: &Path) -> Result<(), String> {
    let mut paths = vec![log_path(dir)];
    for i in 1..=MAX_ROTATIONS {
        paths.push(rotated_path(dir, i));
    }

    for p in paths {
        if p.exists() {
            fs::remove_file(&p)
                .map_err(|e| format!("Failed to remove log file {}: {}", p.display(), e))?;
        }
    }
    Ok(())
}

pub fn clear() -> Result<(), String> {
    let guard = LOG_DIR.lock();
    let dir = guard
        .as_ref()
        .ok_or_else(|| "Log directory not initialized".to_string())?;
    clear_in(dir)
}

pub fn install_panic_hook() {
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "panic".to_string()
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        // try_lock: the panic may have happened while a record was being written
        if let Some(guard) = LOG_DIR.try_lock() {
            if let Some(dir) = guard.as_ref() {
                let message = format!("{} ({})", payload, location);
                let _ = append_in(dir, &AppLogRecord::now("error", "panic", &message, None));
            }
        }

        prev(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_filters_by_query() {
        let dir = tempfile::tempdir().expect("tempdir");
        append_in(dir.path(), &AppLogRecord::now("info", "window", "restored", None))
            .expect("append");
        append_in(
            dir.path(),
            &AppLogRecord::now("warn", "selection_menu", "popup_failed", None),
        )
        .expect("append");

        let all = read_in(dir.path(), 10, None, None).expect("read");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "restored");

        let filtered = read_in(dir.path(), 10, Some("POPUP".to_string()), None).expect("read");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].scope, "selection_menu");
    }

    #[test]
    fn read_keeps_only_the_newest_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        for i in 0..5 {
            append_in(
                dir.path(),
                &AppLogRecord::now("info", "window", &format!("m{}", i), None),
            )
            .expect("append");
        }
        let tail = read_in(dir.path(), 2, None, None).expect("read");
        let messages: Vec<_> = tail.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["m3", "m4"]);
    }

    #[test]
    fn clear_removes_current_and_rotated_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        append_in(dir.path(), &AppLogRecord::now("info", "app", "startup", None)).expect("append");
        fs::write(rotated_path(dir.path(), 1), b"{}\n").expect("write rotated");

        clear_in(dir.path()).expect("clear");
        assert!(!log_path(dir.path()).exists());
        assert!(!rotated_path(dir.path(), 1).exists());
    }
}
