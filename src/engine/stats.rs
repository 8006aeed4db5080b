//! Pool counters.
//!
//! Shared between the clone pool and the source registry. Diagnostics only:
//! nothing reads them to make decisions.

use std::cell::Cell;

use serde::Serialize;

/// Live counters, adjusted at their increment points.
#[derive(Debug, Default)]
pub struct Counters {
    total_sources: Cell<usize>,
    total_errors: Cell<usize>,
    total_used_clones: Cell<usize>,
    total_free_clones: Cell<usize>,
    total_hits: Cell<usize>,
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

fn drop_one(cell: &Cell<usize>) {
    cell.set(cell.get().saturating_sub(1));
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn source_created(&self) {
        bump(&self.total_sources);
    }

    pub(crate) fn source_failed(&self) {
        bump(&self.total_errors);
    }

    /// A free clone left its free list.
    pub(crate) fn free_clone_taken(&self) {
        drop_one(&self.total_free_clones);
    }

    pub(crate) fn clone_checked_out(&self) {
        bump(&self.total_used_clones);
        bump(&self.total_hits);
    }

    pub(crate) fn clone_released(&self) {
        bump(&self.total_free_clones);
        drop_one(&self.total_used_clones);
    }

    /// Every clone was destroyed.
    pub(crate) fn clones_destroyed(&self) {
        self.total_free_clones.set(0);
        self.total_used_clones.set(0);
    }

    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            total_sources: self.total_sources.get(),
            total_errors: self.total_errors.get(),
            total_used_clones: self.total_used_clones.get(),
            total_free_clones: self.total_free_clones.get(),
            total_hits: self.total_hits.get(),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub total_sources: usize,
    pub total_errors: usize,
    pub total_used_clones: usize,
    pub total_free_clones: usize,
    pub total_hits: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_never_underflows() {
        let counters = Counters::new();
        counters.clone_released();
        counters.free_clone_taken();
        counters.free_clone_taken();

        let stats = counters.snapshot();
        assert_eq!(stats.total_used_clones, 0);
        assert_eq!(stats.total_free_clones, 0);
    }

    #[test]
    fn test_checkout_counts_hit() {
        let counters = Counters::new();
        counters.clone_checked_out();
        counters.clone_checked_out();
        counters.clone_released();

        let stats = counters.snapshot();
        assert_eq!(stats.total_hits, 2);
        assert_eq!(stats.total_used_clones, 1);
        assert_eq!(stats.total_free_clones, 1);
    }
}
