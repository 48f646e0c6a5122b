use crate::models::{Settings, WindowRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const CURRENT_STATE_VERSION: u32 = 1;

fn default_state_version() -> u32 {
    CURRENT_STATE_VERSION
}

/// Access to the persisted window records.
///
/// The application only ever uses the first record; `save` inserts or
/// replaces by id.
pub trait WindowRecordStore {
    fn find_all(&self) -> io::Result<Vec<WindowRecord>>;
    fn save(&mut self, record: &WindowRecord) -> io::Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default = "default_state_version")]
    version: u32,
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    windows: Vec<WindowRecord>,
}

/// `state.json` in the app data directory, rewritten atomically on every save.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    state: PersistedState,
}

impl StateFile {
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let state = load(&path)?.unwrap_or_default();
        Ok(Self { path, state })
    }

    /// Like `open`, but an unreadable file is reported and replaced by an empty state
    /// on the next save.
    pub fn open_or_default(path: PathBuf) -> Self {
        match Self::open(path.clone()) {
            Ok(file) => file,
            Err(e) => {
                crate::core::app_log::error_with(
                    "persistence",
                    "load_failed",
                    serde_json::json!({ "path": path.display().to_string(), "error": e.to_string() }),
                );
                Self {
                    path,
                    state: PersistedState::default(),
                }
            }
        }
    }

    pub fn settings(&self) -> Settings {
        self.state.settings.clone().normalized()
    }
}

impl WindowRecordStore for StateFile {
    fn find_all(&self) -> io::Result<Vec<WindowRecord>> {
        Ok(self.state.windows.clone())
    }

    fn save(&mut self, record: &WindowRecord) -> io::Result<()> {
        match self.state.windows.iter_mut().find(|w| w.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => self.state.windows.push(record.clone()),
        }
        self.state.version = CURRENT_STATE_VERSION;
        write_state_atomically(&self.path, &self.state)
    }
}

fn load(path: &Path) -> io::Result<Option<PersistedState>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let state: PersistedState = serde_json::from_slice(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(state))
}

fn write_state_atomically(path: &Path, state: &PersistedState) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    serde_json::to_writer(&mut file, state).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    file.write_all(b"\n")?;
    file.sync_all()?;

    // rename replaces the old file, so readers never see it missing
    fs::rename(tmp, path)?;
    Ok(())
}

/// In-memory store that remembers every save, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Vec<WindowRecord>,
    pub saves: Vec<WindowRecord>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_record(record: WindowRecord) -> Self {
        Self {
            records: vec![record],
            saves: Vec::new(),
        }
    }
}

#[cfg(test)]
impl WindowRecordStore for MemoryStore {
    fn find_all(&self) -> io::Result<Vec<WindowRecord>> {
        Ok(self.records.clone())
    }

    fn save(&mut self, record: &WindowRecord) -> io::Result<()> {
        match self.records.iter_mut().find(|w| w.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => self.records.push(record.clone()),
        }
        self.saves.push(record.clone());
        Ok(())
    }
}
