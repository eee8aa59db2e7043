// src/services/proxy.rs

//! Shared proxy pool with exclusive leases.
//!
//! A pool may be shared by any number of concurrent runs; a checked-out
//! entry is unavailable until its lease drops, so two runs are never
//! pinned to the same proxy at once.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Process-wide pool of proxy URLs.
#[derive(Debug, Default)]
pub struct ProxyPool {
    available: Mutex<VecDeque<String>>,
}

impl ProxyPool {
    /// Build a pool from proxy URLs, e.g. `socks5://127.0.0.1:9050`.
    pub fn new<I, S>(proxies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            available: Mutex::new(proxies.into_iter().map(Into::into).collect()),
        })
    }

    /// Check out a proxy for exclusive use.
    ///
    /// Returns `None` when every entry is currently leased. The entry
    /// goes back to the pool when the lease drops.
    pub fn checkout(self: &Arc<Self>) -> Option<ProxyLease> {
        let url = self.lock().pop_front()?;
        Some(ProxyLease {
            url,
            pool: Arc::clone(self),
        })
    }

    /// Number of currently available entries.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        // Lock poisoning cannot leave the queue inconsistent; recover it.
        self.available
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn restore(&self, url: String) {
        self.lock().push_back(url);
    }
}

/// Exclusive hold on one proxy entry; returned to the pool on drop.
#[derive(Debug)]
pub struct ProxyLease {
    url: String,
    pool: Arc<ProxyPool>,
}

impl ProxyLease {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ProxyLease {
    fn drop(&mut self) {
        self.pool.restore(std::mem::take(&mut self.url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_is_exclusive() {
        let pool = ProxyPool::new(["http://a:8080", "http://b:8080"]);
        let first = pool.checkout().unwrap();
        let second = pool.checkout().unwrap();
        assert_ne!(first.url(), second.url());
        assert!(pool.checkout().is_none());
    }

    #[test]
    fn test_lease_returns_on_drop() {
        let pool = ProxyPool::new(["http://a:8080"]);
        {
            let lease = pool.checkout().unwrap();
            assert_eq!(lease.url(), "http://a:8080");
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.checkout().unwrap().url(), "http://a:8080");
    }

    #[test]
    fn test_empty_pool() {
        let pool = ProxyPool::new(Vec::<String>::new());
        assert!(pool.checkout().is_none());
    }

    #[test]
    fn test_concurrent_checkout_never_shares() {
        let pool = ProxyPool::new((0..8).map(|i| format!("http://p{i}:8080")));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || pool.checkout().map(|l| l.url().to_string()))
            })
            .collect();

        let mut urls: Vec<String> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 8, "no two runs may share a proxy");
    }
}
