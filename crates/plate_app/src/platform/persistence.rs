use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use plate_engine::{read_if_exists, AtomicFileWriter, KeyValueStore, StoreError};
use plate_logging::{plate_info, plate_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".plate_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    entries: BTreeMap<String, String>,
    #[serde(default)]
    saved_utc: Option<String>,
}

/// Key-value store kept in a RON file inside the state directory.
pub(crate) struct RonFileStore {
    writer: AtomicFileWriter,
    state: PersistedState,
}

impl RonFileStore {
    /// Loads the store; a missing or unreadable file yields an empty store.
    pub(crate) fn open(dir: &Path) -> Self {
        Self {
            writer: AtomicFileWriter::new(PathBuf::from(dir)),
            state: load_state(dir),
        }
    }
}

impl KeyValueStore for RonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state.entries.insert(key.to_string(), value.to_string());
        self.state.saved_utc = Some(Utc::now().to_rfc3339());

        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&self.state, pretty)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        self.writer.write(STATE_FILENAME, &content)?;
        Ok(())
    }
}

fn load_state(dir: &Path) -> PersistedState {
    let path = dir.join(STATE_FILENAME);
    let content = match read_if_exists(&path) {
        Ok(Some(text)) => text,
        Ok(None) => return PersistedState::default(),
        Err(err) => {
            plate_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return PersistedState::default();
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => {
            plate_info!(
                "Loaded {} persisted entries from {:?}",
                state.entries.len(),
                path
            );
            state
        }
        Err(err) => {
            plate_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            PersistedState::default()
        }
    }
}
