pub mod prompt;

use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::AuthConfig;

pub use prompt::prompt_for_credentials;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials. Try {user_id} / {password}")]
    InvalidCredentials { user_id: String, password: String },
    #[error("Not logged in. Run `risk-desk login` first.")]
    NotAuthenticated,
    #[error("Failed to persist login state: {0}")]
    Persist(#[source] std::io::Error),
}

/// What is remembered about a login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    pub user_id: String,
    pub logged_in_at: DateTime<Utc>,
}

#[derive(Debug)]
enum Backing {
    Memory,
    File(PathBuf),
}

/// Get the default auth state path (~/.config/risk-desk/auth.json)
pub fn get_auth_path() -> PathBuf {
    crate::config::get_config_dir().join("auth.json")
}

/// The single authority on whether the analyst is logged in.
#[derive(Debug)]
pub struct AuthSession {
    backing: Backing,
    credentials: AuthConfig,
    state: Option<AuthState>,
}

impl AuthSession {
    /// Session that lives only as long as this value
    pub fn in_memory(credentials: AuthConfig) -> Self {
        Self {
            backing: Backing::Memory,
            credentials,
            state: None,
        }
    }

    /// Session persisted at `path`. An unreadable state file counts as logged out.
    pub fn load(path: PathBuf, credentials: AuthConfig) -> Self {
        let state = match std::fs::read(&path) {
            Ok(raw) => match serde_json::from_slice::<AuthState>(&raw) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring malformed auth state");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read auth state");
                None
            }
        };
        Self {
            backing: Backing::File(path),
            credentials,
            state,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn state(&self) -> Option<&AuthState> {
        self.state.as_ref()
    }

    /// Fail with `NotAuthenticated` unless logged in
    pub fn require(&self) -> Result<&AuthState, AuthError> {
        self.state.as_ref().ok_or(AuthError::NotAuthenticated)
    }

    /// Check the pair against the configured credentials and record the login.
    pub fn login(&mut self, user_id: &str, password: &str) -> Result<(), AuthError> {
        if user_id.trim() != self.credentials.user_id || password != self.credentials.password {
            tracing::info!(user_id = user_id.trim(), "login rejected");
            return Err(AuthError::InvalidCredentials {
                user_id: self.credentials.user_id.clone(),
                password: self.credentials.password.clone(),
            });
        }

        let state = AuthState {
            user_id: self.credentials.user_id.clone(),
            logged_in_at: Utc::now(),
        };
        self.persist(Some(&state)).map_err(AuthError::Persist)?;
        self.state = Some(state);
        tracing::debug!(user_id = %self.credentials.user_id, "logged in");
        Ok(())
    }

    /// Forget the login. Logging out while logged out is a no-op.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.persist(None).map_err(AuthError::Persist)?;
        self.state = None;
        Ok(())
    }

    fn persist(&self, state: Option<&AuthState>) -> std::io::Result<()> {
        let Backing::File(path) = &self.backing else {
            return Ok(());
        };

        match state {
            Some(state) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let raw = serde_json::to_vec_pretty(state)?;
                let mut file = AtomicWriteFile::open(path)?;
                file.write_all(&raw)?;
                file.commit()
            }
            None => match std::fs::remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        }
    }
}
