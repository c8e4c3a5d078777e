//! Process-wide set of open connections.
//!
//! Every connection claims its device path here before opening it, so two
//! connections never drive the same robot, and the host application calls
//! [`ConnectionRegistry::close_all`] during shutdown to return every robot to
//! idle and release its handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use crate::connection::{FinchConnection, Inner};
use crate::transport::DevicePath;

/// Claimed device paths and the connections holding them.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: Mutex<HashMap<DevicePath, Weak<Inner>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every connection created without an explicit one.
    pub fn global() -> Arc<ConnectionRegistry> {
        static GLOBAL: OnceLock<Arc<ConnectionRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ConnectionRegistry::new())))
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<DevicePath, Weak<Inner>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `path` as taken. Returns `false` if it was already claimed.
    pub fn claim(&self, path: &DevicePath) -> bool {
        let mut entries = self.entries();
        if entries.contains_key(path) {
            return false;
        }
        entries.insert(path.clone(), Weak::new());
        true
    }

    /// Associate a claimed path with the connection now holding it.
    pub(crate) fn attach(&self, path: &DevicePath, owner: Weak<Inner>) {
        self.entries().insert(path.clone(), owner);
    }

    /// Give a path back to the pool.
    pub fn release(&self, path: &DevicePath) {
        if self.entries().remove(path).is_some() {
            log::debug!("released {path}");
        }
    }

    pub fn is_claimed(&self, path: &DevicePath) -> bool {
        self.entries().contains_key(path)
    }

    /// Claimed paths, sorted.
    pub fn claimed_paths(&self) -> Vec<DevicePath> {
        let mut paths: Vec<DevicePath> = self.entries().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of claimed paths.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Every connection that is currently open.
    pub fn all_open(&self) -> Vec<FinchConnection> {
        // Upgrade under the lock, inspect outside it: dropping the last
        // handle of a connection re-enters `release`.
        let live: Vec<Arc<Inner>> = self.entries().values().filter_map(Weak::upgrade).collect();
        live.into_iter()
            .map(FinchConnection::from_inner)
            .filter(FinchConnection::is_open)
            .collect()
    }

    /// Close every open connection. Returns how many were closed.
    ///
    /// The registry lock is not held while closing, since each close
    /// releases its own path.
    pub fn close_all(&self) -> usize {
        let open = self.all_open();
        let count = open.len();
        for connection in open {
            connection.close();
        }
        if count > 0 {
            log::info!("closed {count} open connection(s)");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_exclusive() {
        let registry = ConnectionRegistry::new();
        let path = DevicePath::from("mock://finch-0");
        assert!(registry.claim(&path));
        assert!(!registry.claim(&path));
        assert!(registry.is_claimed(&path));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn release_makes_path_available() {
        let registry = ConnectionRegistry::new();
        let path = DevicePath::from("mock://finch-0");
        assert!(registry.claim(&path));
        registry.release(&path);
        assert!(!registry.is_claimed(&path));
        assert!(registry.claim(&path));
    }

    #[test]
    fn release_unknown_path_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.release(&DevicePath::from("mock://nowhere"));
        assert!(registry.is_empty());
    }

    #[test]
    fn claimed_paths_sorted() {
        let registry = ConnectionRegistry::new();
        registry.claim(&DevicePath::from("b"));
        registry.claim(&DevicePath::from("a"));
        assert_eq!(
            registry.claimed_paths(),
            vec![DevicePath::from("a"), DevicePath::from("b")]
        );
    }

    #[test]
    fn claimed_but_unattached_paths_are_not_open() {
        let registry = ConnectionRegistry::new();
        registry.claim(&DevicePath::from("mock://finch-0"));
        assert!(registry.all_open().is_empty());
        assert_eq!(registry.close_all(), 0);
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        let registry = Arc::new(ConnectionRegistry::new());
        let path = DevicePath::from("mock://finch-0");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let path = path.clone();
                std::thread::spawn(move || registry.claim(&path))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(
            &ConnectionRegistry::global(),
            &ConnectionRegistry::global()
        ));
    }
}
