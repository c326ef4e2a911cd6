//! Requested-transactions ledger.

use parking_lot::Mutex;
use spv_chain::Hash256;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct LedgerInner {
    /// Outstanding hashes per peer host, in request order.
    by_peer: HashMap<String, Vec<Hash256>>,
    /// Reverse index: hash -> host it is outstanding under.
    owners: HashMap<Hash256, String>,
}

/// Transactions currently requested from each peer.
///
/// Every read and write goes through one mutex, so admission checks and the
/// inserts that follow them are serialized across all peers. A hash is
/// outstanding under at most one host at a time.
#[derive(Debug, Default)]
pub struct RequestedTransactions {
    inner: Mutex<LedgerInner>,
}

impl RequestedTransactions {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `candidates` as requested from `host`.
    ///
    /// Candidates already outstanding under any peer, or repeated within the
    /// batch, are skipped. Returns the hashes actually recorded, in order.
    pub fn claim(&self, host: &str, candidates: impl IntoIterator<Item = Hash256>) -> Vec<Hash256> {
        let mut inner = self.inner.lock();
        let mut claimed = Vec::new();

        for hash in candidates {
            if inner.owners.contains_key(&hash) {
                continue;
            }
            inner.owners.insert(hash, host.to_string());
            claimed.push(hash);
        }

        if !claimed.is_empty() {
            inner
                .by_peer
                .entry(host.to_string())
                .or_default()
                .extend(claimed.iter().copied());
        }

        claimed
    }

    /// Remove `hashes` from `host`'s outstanding set.
    ///
    /// Hashes not outstanding under `host` are ignored. Returns how many were
    /// removed.
    pub fn release(&self, host: &str, hashes: &[Hash256]) -> usize {
        let mut inner = self.inner.lock();
        let LedgerInner { by_peer, owners } = &mut *inner;

        let Some(outstanding) = by_peer.get_mut(host) else {
            return 0;
        };

        let before = outstanding.len();
        outstanding.retain(|h| !hashes.contains(h));
        let removed = before - outstanding.len();

        for hash in hashes {
            if owners.get(hash).map(String::as_str) == Some(host) {
                owners.remove(hash);
            }
        }

        if outstanding.is_empty() {
            by_peer.remove(host);
        }

        removed
    }

    /// Drop everything outstanding under `host`, returning what was dropped.
    pub fn drop_peer(&self, host: &str) -> Vec<Hash256> {
        let mut inner = self.inner.lock();
        let dropped = inner.by_peer.remove(host).unwrap_or_default();
        for hash in &dropped {
            inner.owners.remove(hash);
        }
        dropped
    }

    /// Whether `hash` is outstanding under any peer.
    pub fn is_requested(&self, hash: &Hash256) -> bool {
        self.inner.lock().owners.contains_key(hash)
    }

    /// Host `hash` is outstanding under, if any.
    pub fn owner_of(&self, hash: &Hash256) -> Option<String> {
        self.inner.lock().owners.get(hash).cloned()
    }

    /// Hashes outstanding under `host`, in request order.
    pub fn requested_for(&self, host: &str) -> Vec<Hash256> {
        self.inner
            .lock()
            .by_peer
            .get(host)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `host` has an entry.
    pub fn has_peer(&self, host: &str) -> bool {
        self.inner.lock().by_peer.contains_key(host)
    }

    /// Number of peers with outstanding requests.
    pub fn peer_count(&self) -> usize {
        self.inner.lock().by_peer.len()
    }

    /// Total number of outstanding hashes.
    pub fn len(&self) -> usize {
        self.inner.lock().owners.len()
    }

    /// Whether nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().owners.is_empty()
    }
}
