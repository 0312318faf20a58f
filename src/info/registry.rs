use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use super::error::InfoError;
use super::service::{TorrentId, TorrentInfo};
use crate::constants::AWAIT_TIMEOUT;

/// Process-wide directory of running info services, keyed by torrent id.
///
/// The application creates one registry and threads the handle through;
/// consumers that race a torrent's startup use [`await_torrent`] to block
/// for a bounded time until the service appears. At most one service per
/// torrent id may be registered; a collision is a startup error for the
/// second registrant.
///
/// [`await_torrent`]: ServiceRegistry::await_torrent
#[derive(Default)]
pub struct ServiceRegistry {
    torrents: DashMap<TorrentId, Arc<TorrentInfo>>,
    arrivals: Notify,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a built service under its torrent id.
    pub fn register(&self, info: Arc<TorrentInfo>) -> Result<(), InfoError> {
        let id = info.torrent_id();
        match self.torrents.entry(id) {
            Entry::Occupied(_) => {
                warn!(torrent_id = id, "registry collision");
                Err(InfoError::AlreadyRegistered(id))
            }
            Entry::Vacant(slot) => {
                slot.insert(info);
                debug!(torrent_id = id, "torrent registered");
                self.arrivals.notify_waiters();
                Ok(())
            }
        }
    }

    /// Removes and returns the service for `id`, if registered.
    pub fn deregister(&self, id: TorrentId) -> Option<Arc<TorrentInfo>> {
        let removed = self.torrents.remove(&id).map(|(_, info)| info);
        if removed.is_some() {
            debug!(torrent_id = id, "torrent deregistered");
        }
        removed
    }

    /// Non-blocking lookup.
    pub fn lookup(&self, id: TorrentId) -> Option<Arc<TorrentInfo>> {
        self.torrents.get(&id).map(|entry| entry.clone())
    }

    /// Number of registered torrents.
    pub fn len(&self) -> usize {
        self.torrents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.torrents.is_empty()
    }

    /// Waits up to the default bound for the service of `id` to appear.
    pub async fn await_torrent(&self, id: TorrentId) -> Result<Arc<TorrentInfo>, InfoError> {
        self.await_torrent_for(id, AWAIT_TIMEOUT).await
    }

    /// Waits up to `bound` for the service of `id` to appear.
    ///
    /// Abandoning the returned future is safe at any point; the registry
    /// holds no per-waiter state beyond the wakeup registration.
    pub async fn await_torrent_for(
        &self,
        id: TorrentId,
        bound: Duration,
    ) -> Result<Arc<TorrentInfo>, InfoError> {
        let deadline = Instant::now() + bound;
        loop {
            // Register for wakeup before the lookup so a registration
            // landing in between cannot be missed.
            let arrival = self.arrivals.notified();
            if let Some(info) = self.lookup(id) {
                return Ok(info);
            }
            if timeout_at(deadline, arrival).await.is_err() {
                return Err(InfoError::AwaitTimeout(id));
            }
        }
    }
}
