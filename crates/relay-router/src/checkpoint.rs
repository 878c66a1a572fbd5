//! Checkpoint persistence
//!
//! State is saved after every node so a crashed turn can resume instead of
//! replaying completed work. The store is a trait seam; the router only
//! needs load-by-session and save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    state::ConversationState,
};

/// Persistence seam for conversation checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint for a session, if one exists
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>>;

    /// Persist the checkpoint, replacing any previous one for the session
    async fn save(&self, state: &ConversationState) -> Result<()>;
}

/// In-process store backed by a HashMap. Suited to tests and single-run
/// sessions that do not need to survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, ConversationState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.sessions.lock().get(session_id).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        self.sessions
            .lock()
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }
}

/// Store that writes one JSON file per session under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Checkpoint(format!("create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }
}

#[async_trait]
impl CheckpointStore for FileStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Checkpoint(format!("read {}: {}", path.display(), e)))?;
        let state = serde_json::from_str(&contents)
            .map_err(|e| Error::Checkpoint(format!("parse {}: {}", path.display(), e)))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        let path = self.path_for(&state.session_id);
        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| Error::Checkpoint(format!("serialize checkpoint: {}", e)))?;
        write_atomic(&path, &contents)
            .map_err(|e| Error::Checkpoint(format!("write {}: {}", path.display(), e)))
    }
}

// Write via a sibling temp file so a crash mid-write never truncates the
// previous checkpoint.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}
