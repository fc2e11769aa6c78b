use tracing::info;

use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        organization::MAX_LEVEL,
        pay_item::PayItem,
        position::{NewPosition, Position},
    },
    service::org_tree::get_organization,
    store::Store,
};

// ---------- positions ----------

/// Positions hang off level 3 units only and are unique by name inside
/// their unit.
pub async fn create_position<S: Store>(
    store: &S,
    caller: &AuthUser,
    new: NewPosition,
) -> AppResult<Position> {
    caller.require_admin()?;

    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Position name is required"));
    }

    let org = get_organization(store, new.organization_id).await?;
    if org.level != MAX_LEVEL {
        return Err(AppError::validation(format!(
            "Positions belong to level {} organizations, {} is level {}",
            MAX_LEVEL, org.name, org.level
        )));
    }

    let position = NewPosition { name, ..new };
    let id = store.insert_position(position.clone()).await?;

    info!(position_id = id, organization_id = org.id, "Position created");

    Ok(Position {
        id,
        name: position.name,
        organization_id: position.organization_id,
        description: position.description,
    })
}

pub async fn delete_position<S: Store>(
    store: &S,
    caller: &AuthUser,
    position_id: u64,
) -> AppResult<()> {
    caller.require_admin()?;

    if store.get_position(position_id).await?.is_none() {
        return Err(AppError::not_found(format!("Position {} not found", position_id)));
    }
    if !store.employees_in_positions(&[position_id]).await?.is_empty() {
        return Err(AppError::conflict("Position is still held by employees"));
    }

    store.soft_delete_position(position_id).await?;
    info!(position_id, "Position deleted");
    Ok(())
}

// ---------- pay items ----------

pub async fn create_pay_item<S: Store>(store: &S, caller: &AuthUser, name: &str) -> AppResult<PayItem> {
    caller.require_admin()?;

    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Pay item name is required"));
    }
    if store.pay_item_by_name(name).await?.is_some() {
        return Err(AppError::conflict(format!("Pay item {} already exists", name)));
    }

    let id = store.insert_pay_item(name).await?;
    info!(pay_item_id = id, name, "Pay item created");

    Ok(PayItem {
        id,
        name: name.to_string(),
        active: true,
    })
}

pub async fn list_pay_items<S: Store>(store: &S) -> AppResult<Vec<PayItem>> {
    store.list_pay_items().await
}

pub async fn set_pay_item_active<S: Store>(
    store: &S,
    caller: &AuthUser,
    pay_item_id: u64,
    active: bool,
) -> AppResult<PayItem> {
    caller.require_admin()?;

    if !store.set_pay_item_active(pay_item_id, active).await? {
        return Err(AppError::not_found(format!("Pay item {} not found", pay_item_id)));
    }

    store
        .get_pay_item(pay_item_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Pay item {} not found", pay_item_id)))
}

pub async fn delete_pay_item<S: Store>(store: &S, caller: &AuthUser, pay_item_id: u64) -> AppResult<()> {
    caller.require_admin()?;

    if !store.soft_delete_pay_item(pay_item_id).await? {
        return Err(AppError::not_found(format!("Pay item {} not found", pay_item_id)));
    }
    info!(pay_item_id, "Pay item deleted");
    Ok(())
}
