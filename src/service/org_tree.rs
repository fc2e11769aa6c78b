//! Three-level organization tree stored as flat rows with parent ids.
//!
//! Children are never embedded in their parent; descendants are recomputed
//! level by level and every walk is bounded by [`MAX_LEVEL`], so corrupt
//! parent links cannot make a traversal run away.

use tracing::{info, warn};

use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::organization::{MAX_LEVEL, NewOrganization, Organization},
    service::hierarchy::ManagerIndex,
    store::Store,
};

pub async fn get_organization<S: Store>(store: &S, id: u64) -> AppResult<Organization> {
    store
        .get_organization(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Organization {} not found", id)))
}

/// The organization and its ancestors, root first.
///
/// A chain longer than the tree depth means the parent links loop, which is
/// reported instead of followed. A dangling parent ends the chain early.
pub async fn ancestors<S: Store>(store: &S, org: &Organization) -> AppResult<Vec<Organization>> {
    let mut chain = vec![org.clone()];
    let mut next = org.parent_id;

    while let Some(parent_id) = next {
        if chain.len() >= MAX_LEVEL as usize {
            return Err(AppError::Integrity(format!(
                "Organization {} has a parent chain deeper than {} levels",
                org.id, MAX_LEVEL
            )));
        }

        match store.get_organization(parent_id).await? {
            Some(parent) => {
                next = parent.parent_id;
                chain.push(parent);
            }
            None => {
                warn!(organization_id = org.id, parent_id, "Dangling parent reference");
                break;
            }
        }
    }

    chain.reverse();
    Ok(chain)
}

/// Ids of the organization and everything below it.
pub async fn descendant_ids<S: Store>(store: &S, org: &Organization) -> AppResult<Vec<u64>> {
    let mut ids = vec![org.id];
    let mut frontier = vec![org.id];

    for _ in org.level..MAX_LEVEL {
        if frontier.is_empty() {
            break;
        }
        let children = store.child_organizations(&frontier).await?;
        frontier = children
            .into_iter()
            .map(|c| c.id)
            .filter(|id| !ids.contains(id))
            .collect();
        ids.extend(frontier.iter().copied());
    }

    Ok(ids)
}

/// Admins oversee everything; a boss oversees the unit they manage and
/// every unit below it.
pub async fn ensure_oversees<S: Store>(
    store: &S,
    caller: &AuthUser,
    org: &Organization,
) -> AppResult<()> {
    if caller.is_admin() {
        return Ok(());
    }

    if let Some(managed) = caller.managed_organization {
        let chain = ancestors(store, org).await?;
        if chain.iter().any(|o| o.id == managed) {
            return Ok(());
        }
    }

    Err(AppError::denied(format!(
        "Not a manager of organization {}",
        org.id
    )))
}

pub async fn create_organization<S: Store>(
    store: &S,
    caller: &AuthUser,
    new: NewOrganization,
) -> AppResult<Organization> {
    caller.require_admin()?;

    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Organization name is required"));
    }
    if !(1..=MAX_LEVEL).contains(&new.level) {
        return Err(AppError::validation(format!(
            "Organization level must be between 1 and {}",
            MAX_LEVEL
        )));
    }

    match (new.level, new.parent_id) {
        (1, Some(_)) => {
            return Err(AppError::validation("A level 1 organization has no parent"));
        }
        (1, None) => {}
        (_, None) => {
            return Err(AppError::validation(format!(
                "A level {} organization needs a parent",
                new.level
            )));
        }
        (level, Some(parent_id)) => {
            let parent = get_organization(store, parent_id).await?;
            if parent.level + 1 != level {
                return Err(AppError::validation(format!(
                    "Parent of a level {} organization must be level {}, got level {}",
                    level,
                    level - 1,
                    parent.level
                )));
            }
        }
    }

    let id = store
        .insert_organization(NewOrganization {
            name: name.clone(),
            ..new
        })
        .await?;

    info!(organization_id = id, level = new.level, "Organization created");

    Ok(Organization {
        id,
        name,
        level: new.level,
        parent_id: new.parent_id,
        manager_id: None,
    })
}

pub async fn list_organizations<S: Store>(store: &S) -> AppResult<Vec<Organization>> {
    store.list_organizations().await
}

/// Sets or clears the manager of a unit. An employee manages at most one
/// unit so that `managerOf` stays single-valued.
pub async fn set_manager<S: Store>(
    store: &S,
    index: &ManagerIndex,
    caller: &AuthUser,
    organization_id: u64,
    manager_id: Option<u64>,
) -> AppResult<Organization> {
    caller.require_admin()?;

    let org = get_organization(store, organization_id).await?;

    if let Some(employee_id) = manager_id {
        if store.get_employee(employee_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "Employee {} not found",
                employee_id
            )));
        }
        if let Some(other) = store.organization_managed_by(employee_id).await? {
            if other.id != org.id {
                return Err(AppError::conflict(format!(
                    "Employee {} already manages organization {}",
                    employee_id, other.id
                )));
            }
        }
    }

    if !store.set_organization_manager(org.id, manager_id).await? {
        return Err(AppError::not_found(format!(
            "Organization {} not found",
            organization_id
        )));
    }

    index.manager_changed(org.manager_id, manager_id).await;

    info!(
        organization_id,
        previous = ?org.manager_id,
        manager = ?manager_id,
        "Organization manager updated"
    );

    Ok(Organization { manager_id, ..org })
}

/// Soft-deletes a unit that has no live children and no live positions.
pub async fn delete_organization<S: Store>(
    store: &S,
    index: &ManagerIndex,
    caller: &AuthUser,
    organization_id: u64,
) -> AppResult<()> {
    caller.require_admin()?;

    let org = get_organization(store, organization_id).await?;

    if !store.child_organizations(&[org.id]).await?.is_empty() {
        return Err(AppError::conflict(
            "Organization still has child organizations",
        ));
    }
    if !store.positions_in(&[org.id]).await?.is_empty() {
        return Err(AppError::conflict("Organization still has positions"));
    }

    if !store.soft_delete_organization(org.id).await? {
        return Err(AppError::not_found(format!(
            "Organization {} not found",
            organization_id
        )));
    }

    index.manager_changed(org.manager_id, None).await;

    info!(organization_id, "Organization deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Fixture;

    fn new_org(name: &str, level: u8, parent_id: Option<u64>) -> NewOrganization {
        NewOrganization {
            name: name.to_string(),
            level,
            parent_id,
        }
    }

    #[actix_web::test]
    async fn level_rules_are_enforced() {
        let fx = Fixture::build().await;
        let admin = AuthUser::admin();

        let err = create_organization(&fx.store, &admin, new_org("Root", 1, Some(fx.org_a)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");

        let err = create_organization(&fx.store, &admin, new_org("Orphan", 2, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");

        // level 3 under level 1 skips a level
        let err = create_organization(&fx.store, &admin, new_org("Skip", 3, Some(fx.org_a)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");

        let err = create_organization(&fx.store, &admin, new_org("Deep", 4, Some(fx.org_c)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");

        let err = create_organization(&fx.store, &admin, new_org("Lost", 2, Some(9999)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        let ok = create_organization(&fx.store, &admin, new_org(" Sales ", 2, Some(fx.org_a)))
            .await
            .unwrap();
        assert_eq!(ok.name, "Sales");
        assert_eq!(ok.level, 2);
    }

    #[actix_web::test]
    async fn only_admins_create() {
        let fx = Fixture::build().await;
        let err = create_organization(
            &fx.store,
            &AuthUser::boss(fx.m1, fx.org_c),
            new_org("Root", 1, None),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "permission_denied");
    }

    #[actix_web::test]
    async fn descendants_cover_the_subtree() {
        let fx = Fixture::build().await;
        let a = get_organization(&fx.store, fx.org_a).await.unwrap();

        let mut ids = descendant_ids(&fx.store, &a).await.unwrap();
        ids.sort();
        let mut expected = vec![fx.org_a, fx.org_b, fx.org_c, fx.org_d];
        expected.sort();
        assert_eq!(ids, expected);

        let c = get_organization(&fx.store, fx.org_c).await.unwrap();
        assert_eq!(descendant_ids(&fx.store, &c).await.unwrap(), vec![fx.org_c]);
    }

    #[actix_web::test]
    async fn delete_requires_empty_unit() {
        let fx = Fixture::build().await;
        let admin = AuthUser::admin();

        let err = delete_organization(&fx.store, &fx.index, &admin, fx.org_b)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");

        let err = delete_organization(&fx.store, &fx.index, &admin, fx.org_c)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");

        let empty = create_organization(&fx.store, &admin, new_org("Empty", 3, Some(fx.org_b)))
            .await
            .unwrap();
        delete_organization(&fx.store, &fx.index, &admin, empty.id)
            .await
            .unwrap();
        assert!(fx.store.get_organization(empty.id).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn an_employee_manages_one_unit() {
        let fx = Fixture::build().await;
        let admin = AuthUser::admin();

        let err = set_manager(&fx.store, &fx.index, &admin, fx.org_b, Some(fx.m1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");

        // reassigning to the same unit is fine
        set_manager(&fx.store, &fx.index, &admin, fx.org_c, Some(fx.m1))
            .await
            .unwrap();

        let err = set_manager(&fx.store, &fx.index, &admin, fx.org_b, Some(424242))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[actix_web::test]
    async fn boss_oversees_only_their_subtree() {
        let fx = Fixture::build().await;
        let c = get_organization(&fx.store, fx.org_c).await.unwrap();
        let d = get_organization(&fx.store, fx.org_d).await.unwrap();

        let boss_of_b = AuthUser::boss(fx.m2, fx.org_b);
        ensure_oversees(&fx.store, &boss_of_b, &c).await.unwrap();

        let boss_of_c = AuthUser::boss(fx.m1, fx.org_c);
        ensure_oversees(&fx.store, &boss_of_c, &c).await.unwrap();
        let err = ensure_oversees(&fx.store, &boss_of_c, &d).await.unwrap_err();
        assert_eq!(err.kind(), "permission_denied");

        let err = ensure_oversees(&fx.store, &AuthUser::employee(fx.e1), &c)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "permission_denied");
    }
}
