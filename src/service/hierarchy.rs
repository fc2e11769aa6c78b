//! Walks the organization tree upward from a position to answer "who are
//! this employee's supervisors", and answers "which unit does this employee
//! manage" from an in-process index.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{employee::Employee, organization::Organization, role::Role},
    service::org_tree::{ancestors, descendant_ids, ensure_oversees, get_organization},
    store::Store,
    utils::{manager_cache::ManagerCache, manager_filter::ManagerFilter},
};

/// Negative filter plus positive cache in front of the store for
/// `managerOf`, which runs on every authenticated request.
pub struct ManagerIndex {
    filter: ManagerFilter,
    cache: ManagerCache,
}

impl ManagerIndex {
    pub fn new(ttl: Duration) -> Self {
        Self {
            filter: ManagerFilter::default(),
            cache: ManagerCache::new(ttl),
        }
    }

    /// Keeps the index in step with a manager reference change.
    pub async fn manager_changed(&self, previous: Option<u64>, current: Option<u64>) {
        if let Some(old) = previous {
            self.cache.invalidate(old).await;
            if current != Some(old) {
                self.filter.remove(old);
            }
        }
        if let Some(new) = current {
            self.cache.invalidate(new).await;
            if previous != Some(new) {
                self.filter.insert(new);
            }
        }
    }
}

/// Loads every current manager into the index, in batches.
pub async fn warmup_manager_index<S: Store>(
    store: &S,
    index: &ManagerIndex,
    batch_size: usize,
) -> AppResult<()> {
    let managed = store.managed_organizations().await?;

    for chunk in managed.chunks(batch_size.max(1)) {
        let ids: Vec<u64> = chunk.iter().filter_map(|o| o.manager_id).collect();
        index.filter.insert_batch(&ids);
        index.cache.put_batch(chunk).await;
    }

    log::info!("Manager index warmup complete: {} managers", managed.len());
    Ok(())
}

/// The live organization whose manager is `employee_id`, if any.
pub async fn manager_of<S: Store>(
    store: &S,
    index: &ManagerIndex,
    employee_id: u64,
) -> AppResult<Option<Organization>> {
    // 1️⃣ filter: fast negative
    if !index.filter.might_manage(employee_id) {
        return Ok(None);
    }

    // 2️⃣ cache: fast positive
    if let Some(org) = index.cache.get(employee_id).await {
        return Ok(Some(org));
    }

    // 3️⃣ store fallback
    let org = store.organization_managed_by(employee_id).await?;
    if let Some(org) = &org {
        index.cache.put(employee_id, org.clone()).await;
    }
    Ok(org)
}

/// Names from the root down to the organization itself.
pub async fn organization_path<S: Store>(store: &S, organization_id: u64) -> AppResult<Vec<String>> {
    let org = get_organization(store, organization_id).await?;
    let chain = ancestors(store, &org).await?;
    Ok(chain.into_iter().map(|o| o.name).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Supervisor {
    pub employee_id: u64,
    pub name: String,
    #[schema(nullable = true)]
    pub position_title: Option<String>,
    #[schema(nullable = true)]
    pub phone: Option<String>,
}

/// One slot per tree level. A unit without a manager leaves its slot empty;
/// the other levels do not shift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Supervisors {
    pub level1_boss: Option<Supervisor>,
    pub level2_boss: Option<Supervisor>,
    pub level3_boss: Option<Supervisor>,
}

impl Supervisors {
    fn slot(&mut self, level: u8) -> Option<&mut Option<Supervisor>> {
        match level {
            1 => Some(&mut self.level1_boss),
            2 => Some(&mut self.level2_boss),
            3 => Some(&mut self.level3_boss),
            _ => None,
        }
    }
}

async fn supervisor_entry<S: Store>(store: &S, manager_id: u64) -> AppResult<Option<Supervisor>> {
    let Some(manager) = store.get_employee(manager_id).await? else {
        debug!(manager_id, "Manager reference points to a missing employee");
        return Ok(None);
    };

    let position_title = match manager.position_id {
        Some(position_id) => store.get_position(position_id).await?.map(|p| p.name),
        None => None,
    };

    Ok(Some(Supervisor {
        employee_id: manager.id,
        name: manager.full_name(),
        position_title,
        phone: manager.phone,
    }))
}

pub async fn supervisors_of<S: Store>(store: &S, position_id: u64) -> AppResult<Supervisors> {
    let position = store
        .get_position(position_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Position {} not found", position_id)))?;

    let org = get_organization(store, position.organization_id).await?;
    let chain = ancestors(store, &org).await?;

    let mut supervisors = Supervisors::default();
    for unit in chain {
        let Some(manager_id) = unit.manager_id else {
            continue;
        };
        let entry = supervisor_entry(store, manager_id).await?;
        if let Some(slot) = supervisors.slot(unit.level) {
            *slot = entry;
        }
    }

    Ok(supervisors)
}

/// Employees placed in any position inside the organization's subtree.
pub async fn employees_under<S: Store>(store: &S, org: &Organization) -> AppResult<Vec<Employee>> {
    let org_ids = descendant_ids(store, org).await?;
    let positions = store.positions_in(&org_ids).await?;
    let position_ids: Vec<u64> = positions.iter().map(|p| p.id).collect();
    store.employees_in_positions(&position_ids).await
}

/// Employee list scoped to the caller: admins may look at any unit, a boss
/// only at their own down-line.
pub async fn list_down_line<S: Store>(
    store: &S,
    caller: &AuthUser,
    organization_id: Option<u64>,
) -> AppResult<Vec<Employee>> {
    let target = match (caller.role, organization_id, caller.managed_organization) {
        (Role::Admin, Some(id), _) => id,
        (Role::Admin, None, _) => {
            return Err(AppError::validation("organization_id is required"));
        }
        (Role::Boss, requested, Some(managed)) => requested.unwrap_or(managed),
        _ => return Err(AppError::denied("Only admins and managers can list employees")),
    };

    let org = get_organization(store, target).await?;
    ensure_oversees(store, caller, &org).await?;
    employees_under(store, &org).await
}
