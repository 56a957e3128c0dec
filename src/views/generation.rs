//! Per-view generation counter.
//!
//! A view takes a ticket before awaiting a remote call and applies the result only
//! if the ticket is still current. Tearing the view down advances the counter, so
//! results that arrive afterwards are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn ticket(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.ticket() == ticket
    }

    /// Invalidate every outstanding ticket.
    pub fn teardown(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_invalidates_clones() {
        let generation = Generation::default();
        let handle = generation.clone();
        let ticket = generation.ticket();

        assert!(generation.is_current(ticket));
        handle.teardown();
        assert!(!generation.is_current(ticket));
    }
}
