use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::schema::ConversationConfig;
use crate::error::{Error, Result};

/// One message in a thread, tagged with the tool that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl Turn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            files: Vec::new(),
            tool: None,
        }
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tool = Some(tool.to_owned());
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every write; the TTL counts from here.
    pub updated_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

/// Conversation threads keyed by id, expiring `ttl` after their last write.
///
/// Threads are kept in memory. When a store path is set the whole table is
/// rewritten to that JSON file after each change and reloaded on open.
pub struct ConversationStore {
    threads: Mutex<HashMap<String, Thread>>,
    ttl: Duration,
    path: Option<PathBuf>,
}

impl ConversationStore {
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
            ttl,
            path: None,
        }
    }

    pub fn open(path: &Path, ttl: Duration) -> Result<Self> {
        let store = Self {
            threads: Mutex::new(HashMap::new()),
            ttl,
            path: Some(path.to_path_buf()),
        };

        if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|err| {
                Error::Storage(format!(
                    "failed to read conversation store {}: {err}",
                    path.display()
                ))
            })?;
            let saved: Vec<Thread> = serde_json::from_str(&raw).map_err(|err| {
                Error::Storage(format!(
                    "failed to parse conversation store {}: {err}",
                    path.display()
                ))
            })?;

            let now = Utc::now();
            let mut threads = store.threads();
            for thread in saved {
                if !store.is_expired(&thread, now) {
                    threads.insert(thread.id.clone(), thread);
                }
            }
            tracing::debug!(path = %path.display(), threads = threads.len(), "loaded conversation store");
        }

        Ok(store)
    }

    pub fn from_config(config: &ConversationConfig) -> Result<Self> {
        let ttl = Duration::from_secs(config.ttl_secs);
        match &config.store_path {
            Some(path) => Self::open(path, ttl),
            None => Ok(Self::in_memory(ttl)),
        }
    }

    fn threads(&self) -> MutexGuard<'_, HashMap<String, Thread>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, thread: &Thread, now: DateTime<Utc>) -> bool {
        // A timestamp in the future (clock skew) counts as fresh.
        (now - thread.updated_at)
            .to_std()
            .is_ok_and(|age| age > self.ttl)
    }

    pub fn create_thread(&self) -> Result<Thread> {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            turns: Vec::new(),
        };

        let mut threads = self.threads();
        threads.insert(thread.id.clone(), thread.clone());
        self.persist(&threads)?;
        tracing::debug!(thread = %thread.id, "created conversation thread");
        Ok(thread)
    }

    /// `Ok(None)` for unknown or expired ids. Expired threads are dropped.
    pub fn get(&self, id: &str) -> Result<Option<Thread>> {
        let mut threads = self.threads();
        let Some(thread) = threads.get(id) else {
            return Ok(None);
        };

        if self.is_expired(thread, Utc::now()) {
            tracing::debug!(thread = id, "conversation thread expired");
            threads.remove(id);
            self.persist(&threads)?;
            return Ok(None);
        }
        Ok(Some(thread.clone()))
    }

    pub fn add_turn(&self, id: &str, turn: Turn) -> Result<Thread> {
        let now = Utc::now();
        let mut threads = self.threads();

        let expired = threads
            .get(id)
            .is_some_and(|thread| self.is_expired(thread, now));
        if expired {
            threads.remove(id);
        }
        let Some(thread) = threads.get_mut(id) else {
            return Err(Error::NotFound(format!("conversation thread '{id}'")));
        };

        thread.turns.push(turn);
        thread.updated_at = now;
        let updated = thread.clone();
        self.persist(&threads)?;
        Ok(updated)
    }

    fn persist(&self, threads: &HashMap<String, Thread>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut saved: Vec<&Thread> = threads.values().collect();
        saved.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        let raw = serde_json::to_string_pretty(&saved)
            .map_err(|err| Error::Storage(format!("failed to encode conversation store: {err}")))?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::Storage(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        std::fs::write(path, raw).map_err(|err| {
            Error::Storage(format!(
                "failed to write conversation store {}: {err}",
                path.display()
            ))
        })
    }
}
