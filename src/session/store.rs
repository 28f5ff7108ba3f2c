use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::risk::{ScoringSession, SESSION_FORMAT_VERSION};

/// Durable handoff of the last scoring result between screens.
///
/// `save` is last-write-wins. `load` never fails: a missing, unreadable or
/// malformed payload is logged and reported as "no session".
///
/// `update` is a read-modify-write held under the store's lock: no `save`
/// or other `update` can land between its read and its write.
pub trait SessionStore: Send + Sync {
    fn save(&self, session: &ScoringSession) -> Result<()>;
    fn load(&self) -> Option<ScoringSession>;
    fn clear(&self) -> Result<()>;
    /// Apply `edit` to the stored session and persist it if `edit` returns true.
    fn update(&self, edit: &mut dyn FnMut(&mut ScoringSession) -> bool) -> Result<Updated>;
}

/// What `SessionStore::update` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Updated {
    NoSession,
    Unchanged,
    Saved,
}

/// Get the default session file path (~/.config/risk-desk/session.json)
pub fn get_session_path() -> PathBuf {
    crate::config::get_config_dir().join("session.json")
}

/// Parse a stored payload, rejecting bad shapes, unknown versions and
/// sessions older than `max_age`.
fn decode_session(raw: &[u8], max_age: Option<Duration>) -> Option<ScoringSession> {
    let session: ScoringSession = match serde_json::from_slice(raw) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "stored session is malformed, ignoring it");
            return None;
        }
    };

    if session.version != SESSION_FORMAT_VERSION {
        tracing::warn!(
            version = session.version,
            "stored session has unsupported version, ignoring it"
        );
        return None;
    }

    if let Some(max_age) = max_age {
        let age = session.age().to_std().unwrap_or_default();
        if age > max_age {
            tracing::info!(
                age = %humantime::format_duration(Duration::from_secs(age.as_secs())),
                "stored session expired"
            );
            return None;
        }
    }

    Some(session)
}

/// In-memory store, used by tests and as the backing for throwaway sessions.
///
/// Holds the serialized payload rather than the value so loads go through
/// the same decoding path as the file store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    payload: Mutex<Option<Vec<u8>>>,
    max_age: Option<Duration>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an arbitrary payload, valid or not
    pub fn with_raw_payload(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Mutex::new(Some(raw.into())),
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &ScoringSession) -> Result<()> {
        let raw = serde_json::to_vec(session).context("Failed to serialize session")?;
        *self.payload.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }

    fn update(&self, edit: &mut dyn FnMut(&mut ScoringSession) -> bool) -> Result<Updated> {
        let mut payload = self.payload.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(mut session) = payload
            .as_deref()
            .and_then(|raw| decode_session(raw, self.max_age))
        else {
            return Ok(Updated::NoSession);
        };
        if !edit(&mut session) {
            return Ok(Updated::Unchanged);
        }
        *payload = Some(serde_json::to_vec(&session).context("Failed to serialize session")?);
        Ok(Updated::Saved)
    }

    fn load(&self) -> Option<ScoringSession> {
        let guard = self.payload.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_deref().and_then(|raw| decode_session(raw, self.max_age))
    }

    fn clear(&self) -> Result<()> {
        *self.payload.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file store that survives restarts.
///
/// Writes are atomic so a crash never leaves a half-written session. A
/// mutex serializes access within this process only; `update` is the way
/// to change a session without losing a concurrent save.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    max_age: Option<Duration>,
    guard: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            max_age: None,
            guard: Mutex::new(()),
        }
    }

    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSessionStore {
    fn write_unlocked(&self, session: &ScoringSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let mut file = AtomicWriteFile::open(&self.path).with_context(|| {
            format!("Failed to open atomic write file at {}", self.path.display())
        })?;

        serde_json::to_writer_pretty(&mut file, session)
            .context("Failed to serialize session")?;

        file.commit().context("Failed to save session")?;

        tracing::debug!(
            path = %self.path.display(),
            records = session.len(),
            "session saved"
        );
        Ok(())
    }

    fn read_unlocked(&self) -> Option<ScoringSession> {
        if !self.path.exists() {
            return None;
        }

        match std::fs::read(&self.path) {
            Ok(raw) => decode_session(&raw, self.max_age),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read stored session"
                );
                None
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &ScoringSession) -> Result<()> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_unlocked(session)
    }

    fn load(&self) -> Option<ScoringSession> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_unlocked()
    }

    fn clear(&self) -> Result<()> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove stored session"),
        }
    }

    fn update(&self, edit: &mut dyn FnMut(&mut ScoringSession) -> bool) -> Result<Updated> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(mut session) = self.read_unlocked() else {
            return Ok(Updated::NoSession);
        };
        if !edit(&mut session) {
            return Ok(Updated::Unchanged);
        }
        self.write_unlocked(&session)?;
        Ok(Updated::Saved)
    }
}
