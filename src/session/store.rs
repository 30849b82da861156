use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::types::SessionEntry;

/// Sessions idle longer than this are treated as new.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// How often the background sweeper runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Per-session state storage.
///
/// Calls for the same id are serialized for the whole closure; calls for
/// different ids never wait on each other's work.
pub trait SessionStore: Send + Sync {
    /// Run `f` with exclusive access to the session, creating it if missing
    /// and resetting it if it has expired.
    fn with_session<R, F>(&self, id: &str, f: F) -> R
    where
        F: FnOnce(&mut SessionEntry) -> R;

    /// Drop a session. Returns whether it existed.
    fn remove(&self, id: &str) -> bool;

    /// Evict idle sessions. Returns how many were removed.
    fn sweep_expired(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: SessionStore> SessionStore for Arc<T> {
    fn with_session<R, F>(&self, id: &str, f: F) -> R
    where
        F: FnOnce(&mut SessionEntry) -> R,
    {
        (**self).with_session(id, f)
    }

    fn remove(&self, id: &str) -> bool {
        (**self).remove(id)
    }

    fn sweep_expired(&self) -> usize {
        (**self).sweep_expired()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// In-process session store with a lock per session.
///
/// The outer map lock is only held to look up or insert a slot, never
/// while a session closure runs.
pub struct MemorySessionStore {
    ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Mutex<SessionEntry>>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, id: &str) -> Arc<Mutex<SessionEntry>> {
        let mut slots = lock(&self.slots);
        slots
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", id);
                Arc::new(Mutex::new(SessionEntry::new()))
            })
            .clone()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore for MemorySessionStore {
    fn with_session<R, F>(&self, id: &str, f: F) -> R
    where
        F: FnOnce(&mut SessionEntry) -> R,
    {
        loop {
            let slot = self.slot(id);
            let mut entry = lock(&slot);
            if entry.is_evicted() {
                // The sweeper removed this slot after we looked it up.
                continue;
            }

            let now = Instant::now();
            if entry.is_expired(self.ttl, now) {
                info!("Session {} expired, starting fresh", id);
                entry.reset();
            }
            entry.touch(now);
            return f(&mut entry);
        }
    }

    fn remove(&self, id: &str) -> bool {
        let removed = lock(&self.slots).remove(id);
        match removed {
            Some(slot) => {
                lock(&slot).mark_evicted();
                true
            }
            None => false,
        }
    }

    fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut slots = lock(&self.slots);
        let before = slots.len();

        slots.retain(|id, slot| {
            let mut entry = match slot.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                // Busy sessions are in use, so not idle.
                Err(TryLockError::WouldBlock) => return true,
            };
            if entry.is_expired(ttl, now) {
                entry.mark_evicted();
                debug!("Evicting idle session {}", id);
                false
            } else {
                true
            }
        });

        before - slots.len()
    }

    fn len(&self) -> usize {
        lock(&self.slots).len()
    }
}

/// Periodically evict idle sessions on the tokio runtime.
pub fn spawn_sweeper<S>(store: Arc<S>, every: Duration) -> JoinHandle<()>
where
    S: SessionStore + 'static,
{
    let every = every.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = store.sweep_expired();
            if evicted > 0 {
                info!("Session sweeper evicted {} idle sessions", evicted);
            }
        }
    })
}
