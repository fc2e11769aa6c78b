use std::sync::RwLock;

use autoscale_cuckoo_filter::CuckooFilter;

/// Expected number of managers and false-positive rate.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Probabilistic set of employee ids that manage some unit.
///
/// A miss is definitive: the employee manages nothing. A hit still has to
/// be confirmed against the cache or the store.
pub struct ManagerFilter {
    inner: RwLock<CuckooFilter<u64>>,
}

impl Default for ManagerFilter {
    fn default() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }
}

impl ManagerFilter {
    /// Check if an employee might manage a unit (false positives possible)
    pub fn might_manage(&self, employee_id: u64) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&employee_id)
    }

    /// Always adds, even on a hit. Pair every insert with one
    /// [`remove`](Self::remove).
    pub fn insert(&self, employee_id: u64) {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .add(&employee_id);
    }

    /// Only call for ids that were inserted, cuckoo removal is by fingerprint.
    pub fn remove(&self, employee_id: u64) {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&employee_id);
    }

    /// Insert a batch of manager ids under a single write lock
    pub fn insert_batch(&self, employee_ids: &[u64]) {
        let mut filter = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for id in employee_ids {
            filter.add(id);
        }
    }
}
