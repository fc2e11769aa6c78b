use std::time::Duration;

use moka::future::Cache;

use crate::model::organization::Organization;

/// Positive `managerOf` answers: employee id -> managed organization.
#[derive(Clone)]
pub struct ManagerCache {
    inner: Cache<u64, Organization>,
}

impl ManagerCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, employee_id: u64) -> Option<Organization> {
        self.inner.get(&employee_id).await
    }

    pub async fn put(&self, employee_id: u64, organization: Organization) {
        self.inner.insert(employee_id, organization).await;
    }

    pub async fn invalidate(&self, employee_id: u64) {
        self.inner.invalidate(&employee_id).await;
    }

    /// Batch insert, awaiting all insertions concurrently
    pub async fn put_batch(&self, organizations: &[Organization]) {
        let futures: Vec<_> = organizations
            .iter()
            .filter_map(|org| {
                org.manager_id
                    .map(|manager| self.inner.insert(manager, org.clone()))
            })
            .collect();

        futures::future::join_all(futures).await;
    }
}
