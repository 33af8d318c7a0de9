//! Correlation-id allocation for in-flight requests.
//!
//! Every `request` frame carries an id the TV echoes back in its reply; the
//! session matches replies to suspended callers solely by that id.  Ids must
//! therefore be unique among all currently-pending requests of a session.
//! A monotonically increasing counter satisfies that for the lifetime of a
//! session (ids of completed requests are never reissued before `u64` wraps,
//! which does not happen in practice).
//!
//! The registration handshake is the one exception: it uses the fixed
//! [`REGISTER_ID`] the protocol expects, and there is never more than one
//! registration in flight.

use std::sync::atomic::{AtomicU64, Ordering};

/// Correlation id of the `register` handshake frame.
pub const REGISTER_ID: &str = "register_0";

/// A thread-safe counter issuing correlation ids of the form `req_0`,
/// `req_1`, ….
///
/// # Examples
///
/// ```rust
/// use ssap_core::protocol::correlation::CorrelationCounter;
///
/// let ids = CorrelationCounter::new();
/// assert_eq!(ids.next(), "req_0");
/// assert_eq!(ids.next(), "req_1");
/// ```
pub struct CorrelationCounter {
    inner: AtomicU64,
}

impl CorrelationCounter {
    /// Creates a new counter starting at `req_0`.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns the next correlation id and atomically advances the counter.
    ///
    /// `Ordering::Relaxed` is sufficient: the ids are only compared for
    /// equality, never used for memory synchronisation between threads.
    pub fn next(&self) -> String {
        let n = self.inner.fetch_add(1, Ordering::Relaxed);
        format!("req_{n}")
    }
}

impl Default for CorrelationCounter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_sequential() {
        let ids = CorrelationCounter::new();
        assert_eq!(ids.next(), "req_0");
        assert_eq!(ids.next(), "req_1");
        assert_eq!(ids.next(), "req_2");
    }

    #[test]
    fn test_ids_never_collide_with_register_id() {
        let ids = CorrelationCounter::new();
        for _ in 0..100 {
            assert_ne!(ids.next(), REGISTER_ID);
        }
    }

    #[test]
    fn test_concurrent_allocation_yields_unique_ids() {
        // Arrange: 8 threads each draw 250 ids from the same counter.
        let ids = Arc::new(CorrelationCounter::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ids = Arc::clone(&ids);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| ids.next()).collect::<Vec<_>>()
            }));
        }

        // Act
        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                // Assert: no id is ever issued twice
                assert!(seen.insert(id.clone()), "duplicate correlation id {id}");
            }
        }
        assert_eq!(seen.len(), 8 * 250);
    }
}
