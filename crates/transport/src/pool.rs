//! Connection pool keyed by connection id.
//!
//! A pool holds at most one connection per id. Registering a connection for an id
//! that already has one replaces it (last writer wins) and hands the old one back
//! to the caller for closing.

use std::sync::Arc;

use dashmap::DashMap;

use crate::core::transport::ConnectionInterface;
use crate::error::Error;
use crate::error::Result;

/// Connection pool of a transport.
pub struct Pool<C> {
    connections: DashMap<String, Arc<C>>,
}

impl<C> Default for Pool<C> {
    fn default() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }
}

impl<C: ConnectionInterface> Pool<C> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `conn` under `cid`, returning the connection it replaced.
    pub fn replace(&self, cid: &str, conn: Arc<C>) -> Option<Arc<C>> {
        self.connections
            .insert(cid.to_string(), conn.clone())
            .filter(|old| !Arc::ptr_eq(old, &conn))
    }

    /// Remove the entry of `cid` only if it still holds `conn`.
    /// An old connection being released must not evict its replacement.
    pub fn remove_if_same(&self, cid: &str, conn: &Arc<C>) -> bool {
        self.connections
            .remove_if(cid, |_, current| Arc::ptr_eq(current, conn))
            .is_some()
    }

    /// Remove all entries.
    pub fn drain(&self) -> Vec<(String, Arc<C>)> {
        let ids = self.connection_ids();
        ids.into_iter()
            .filter_map(|cid| self.connections.remove(&cid))
            .collect()
    }

    /// Get the connection of `cid`.
    pub fn connection(&self, cid: &str) -> Result<Arc<C>> {
        self.connections
            .get(cid)
            .map(|c| c.value().clone())
            .ok_or_else(|| Error::ConnectionNotFound(cid.to_string()))
    }

    /// All registered connections.
    pub fn connections(&self) -> Vec<(String, Arc<C>)> {
        self.connections
            .iter()
            .map(|kv| (kv.key().clone(), kv.value().clone()))
            .collect()
    }

    /// Ids of all registered connections.
    pub fn connection_ids(&self) -> Vec<String> {
        self.connections.iter().map(|kv| kv.key().clone()).collect()
    }
}
