// ABOUTME: Deploy lock to prevent concurrent deploys from the same checkout.
// ABOUTME: Uses atomic file creation with lock info stored next to the ledger.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AppName;

pub const LOCK_FILENAME: &str = "deploy.lock";

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub app: String,
}

impl LockInfo {
    pub fn new(app: &AppName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            app: app.to_string(),
        }
    }

    /// Locks older than an hour are assumed abandoned.
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    pub fn lock_path(state_dir: &Path) -> PathBuf {
        state_dir.join(LOCK_FILENAME)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error(
        "deploy lock held by {holder} (pid {pid}) since {started_at}; use --force to break it"
    )]
    Held {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("deploy lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock acquired by another process during break")]
    Contended,
}

/// A held deploy lock. Call [`DeployLock::release`] when done; dropping it
/// leaves the file behind to be broken as stale later.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
}

impl DeployLock {
    /// Acquire the lock in `state_dir`.
    ///
    /// Creation uses `create_new`, so two processes can't both succeed.
    /// Stale (>1 hour) and unreadable locks are broken with a warning, and
    /// `force` breaks a live one.
    pub fn acquire(state_dir: &Path, app: &AppName, force: bool) -> Result<Self, LockError> {
        std::fs::create_dir_all(state_dir).map_err(|source| LockError::Io {
            path: state_dir.to_path_buf(),
            source,
        })?;

        let path = LockInfo::lock_path(state_dir);
        let info = LockInfo::new(app);

        match Self::try_create(&path, &info) {
            Ok(()) => return Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(source) => return Err(LockError::Io { path, source }),
        }

        if !Self::should_break(&path, force)? {
            return Err(Self::held_error(&path));
        }

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        if let Err(source) = std::fs::remove_file(&path)
            && source.kind() != std::io::ErrorKind::NotFound
        {
            return Err(LockError::Io { path, source });
        }

        match Self::try_create(&path, &info) {
            Ok(()) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(LockError::Contended),
            Err(source) => Err(LockError::Io { path, source }),
        }
    }

    fn try_create(path: &Path, info: &LockInfo) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        let json = serde_json::to_string(info).map_err(std::io::Error::other)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()
    }

    fn read_info(path: &Path) -> Option<LockInfo> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Decide whether an existing lock should be broken (stale, forced, or corrupted).
    fn should_break(path: &Path, force: bool) -> Result<bool, LockError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            // Released between our create attempt and now.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(source) => {
                return Err(LockError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        match serde_json::from_str::<LockInfo>(&content) {
            Ok(existing) if force => {
                tracing::warn!(
                    "Breaking lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                Ok(true)
            }
            Ok(existing) if existing.is_stale() => {
                tracing::warn!(
                    "Auto-breaking stale lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(_) => {
                tracing::warn!("Lock info corrupted, breaking lock");
                Ok(true)
            }
        }
    }

    fn held_error(path: &Path) -> LockError {
        match Self::read_info(path) {
            Some(existing) => LockError::Held {
                holder: existing.holder,
                pid: existing.pid,
                started_at: existing.started_at,
            },
            None => LockError::Contended,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self) -> Result<(), LockError> {
        std::fs::remove_file(&self.path).map_err(|source| LockError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
