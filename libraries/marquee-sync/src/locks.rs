//! Keyed async mutex serializing refreshes of one playlist.

use marquee_core::PlaylistId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<PlaylistId, Arc<AsyncMutex<()>>>;

/// One async mutex per playlist id, created on demand
///
/// An entry lives as long as a guard holds it or a task waits on it.
#[derive(Debug, Clone, Default)]
pub struct PlaylistLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl PlaylistLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to playlist `id`
    ///
    /// Cancelling the wait releases the entry like dropping a guard does.
    pub async fn lock(&self, id: PlaylistId) -> PlaylistLockGuard {
        let entry = Entry {
            id,
            locks: self.clone(),
        };
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(id).or_default())
        };

        // A cancelled wait drops the pending lock future before `entry`
        let guard = mutex.lock_owned().await;
        PlaylistLockGuard {
            _guard: guard,
            entry,
        }
    }

    /// Whether someone holds or waits for the lock of `id`
    pub fn is_held(&self, id: PlaylistId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Number of playlists currently locked or waited on
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, id: PlaylistId) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map's own reference left: nobody holds or awaits it
        if map.get(&id).is_some_and(|m| Arc::strong_count(m) == 1) {
            map.remove(&id);
        }
    }
}

/// Map entry of one waiter or holder; cleans up after itself on drop
#[derive(Debug)]
struct Entry {
    id: PlaylistId,
    locks: PlaylistLocks,
}

impl Drop for Entry {
    fn drop(&mut self) {
        self.locks.release(self.id);
    }
}

/// Exclusive access to one playlist; released on drop
#[derive(Debug)]
pub struct PlaylistLockGuard {
    // Dropped before `entry`
    _guard: OwnedMutexGuard<()>,
    entry: Entry,
}

impl PlaylistLockGuard {
    pub fn playlist_id(&self) -> PlaylistId {
        self.entry.id
    }
}
