//! Cooldown between submissions.
//!
//! The timestamp of the last successful submission is kept in a
//! [`DebounceStore`] under [`LAST_SUBMIT_KEY`], as decimal milliseconds since
//! the Unix epoch. The entry expires together with the ignore period, so a
//! store that honors TTLs never holds a stale timestamp for long.

use crate::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Store key holding the last successful submission time.
pub const LAST_SUBMIT_KEY: &str = "last_submit_date";

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Key-value storage with expiry, backing the debounce gate.
///
/// `now_ms` is passed in so expiry is evaluated against the same clock the
/// gate uses.
pub trait DebounceStore: Send + Sync {
    /// Read a value. Expired entries read as `None`.
    fn get(&self, key: &str, now_ms: i64) -> Result<Option<String>>;

    /// Write a value that expires `ttl` after `now_ms`.
    fn put(&self, key: &str, value: &str, ttl: Duration, now_ms: i64) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    value: String,
    expires_at_ms: i64,
}

fn expiry(now_ms: i64, ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(ttl_ms)
}

/// File-backed store: one JSON file per key under a state directory.
#[derive(Debug, Clone)]
pub struct FileDebounceStore {
    dir: PathBuf,
}

impl FileDebounceStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform state directory.
    pub fn with_default_dir() -> Result<Self> {
        Ok(Self::new(Self::default_dir()?))
    }

    /// Platform state directory, e.g. `~/.local/share/pingmap` on Linux
    pub fn default_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "outfitter", "pingmap")
            .ok_or_else(|| Error::Storage("Failed to determine state directory".into()))?;
        Ok(dirs.data_local_dir().to_path_buf())
    }

    /// Directory holding the state files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Storage(format!("Invalid store key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DebounceStore for FileDebounceStore {
    fn get(&self, key: &str, now_ms: i64) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {e}", path.display())))?;
        let envelope: Envelope = match serde_json::from_str(&json) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt debounce state");
                return Ok(None);
            },
        };

        if envelope.expires_at_ms <= now_ms {
            debug!(path = %path.display(), "Removing expired debounce state");
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove expired debounce state");
            }
            return Ok(None);
        }
        Ok(Some(envelope.value))
    }

    fn put(&self, key: &str, value: &str, ttl: Duration, now_ms: i64) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Storage(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        let envelope = Envelope {
            value: value.to_string(),
            expires_at_ms: expiry(now_ms, ttl),
        };
        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| Error::Storage(format!("Failed to serialize debounce state: {e}")))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| Error::Storage(format!("Failed to write temp state: {e}")))?;
        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to remove existing state: {e}")))?;
        }
        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Storage(format!("Failed to persist debounce state: {e}")))?;

        debug!(path = %path.display(), "Saved debounce state");
        Ok(())
    }
}

/// In-process store, for tests and single-shot embedding.
#[derive(Debug, Default)]
pub struct MemoryDebounceStore {
    entries: Mutex<HashMap<String, Envelope>>,
}

impl MemoryDebounceStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl DebounceStore for MemoryDebounceStore {
    fn get(&self, key: &str, now_ms: i64) -> Result<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("debounce store lock poisoned".into()))?;
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > now_ms => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            },
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &str, ttl: Duration, now_ms: i64) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("debounce store lock poisoned".into()))?;
        entries.insert(
            key.to_string(),
            Envelope {
                value: value.to_string(),
                expires_at_ms: expiry(now_ms, ttl),
            },
        );
        Ok(())
    }
}

/// Result of evaluating the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceDecision {
    /// Ignore period is zero.
    Disabled,
    /// No recent submission; go ahead.
    Proceed,
    /// A submission happened within the ignore period.
    Skip {
        /// When the previous submission happened, in epoch milliseconds
        last_submit_ms: i64,
        /// Time left until the cooldown ends
        remaining: Duration,
    },
}

/// Cooldown guard over a [`DebounceStore`].
#[derive(Clone)]
pub struct DebounceGate {
    store: Arc<dyn DebounceStore>,
    ignore_period: Duration,
}

impl DebounceGate {
    /// Gate with the given cooldown. A zero period disables it.
    pub fn new(store: Arc<dyn DebounceStore>, ignore_period: Duration) -> Self {
        Self {
            store,
            ignore_period,
        }
    }

    /// Whether the gate does anything at all
    pub const fn is_enabled(&self) -> bool {
        !self.ignore_period.is_zero()
    }

    /// Evaluate the gate at `now_ms`.
    ///
    /// An unparseable stored value is treated as absent.
    pub fn check(&self, now_ms: i64) -> Result<DebounceDecision> {
        if !self.is_enabled() {
            return Ok(DebounceDecision::Disabled);
        }
        let Some(raw) = self.store.get(LAST_SUBMIT_KEY, now_ms)? else {
            return Ok(DebounceDecision::Proceed);
        };
        let last_submit_ms = match raw.trim().parse::<i64>() {
            Ok(ms) => ms,
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring unparseable last submit timestamp");
                return Ok(DebounceDecision::Proceed);
            },
        };

        let until = expiry(last_submit_ms, self.ignore_period);
        if now_ms < until {
            let remaining = Duration::from_millis(u64::try_from(until - now_ms).unwrap_or(0));
            Ok(DebounceDecision::Skip {
                last_submit_ms,
                remaining,
            })
        } else {
            Ok(DebounceDecision::Proceed)
        }
    }

    /// True iff a submission happened less than one ignore period before `now_ms`.
    pub fn should_skip(&self, now_ms: i64) -> Result<bool> {
        Ok(matches!(self.check(now_ms)?, DebounceDecision::Skip { .. }))
    }

    /// Record a successful submission at `now_ms`.
    pub fn record_success(&self, now_ms: i64) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.store.put(
            LAST_SUBMIT_KEY,
            &now_ms.to_string(),
            self.ignore_period,
            now_ms,
        )
    }
}
