use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    model::role::Role,
    models::Claims,
    service::hierarchy::{ManagerIndex, manager_of},
    store::Store,
};

/// Resolved caller context, passed explicitly into every core operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    /// Unit managed by the caller; set exactly when `role` is `Boss`
    pub managed_organization: Option<u64>,
}

/// Turns verified token claims into a caller, elevating employees who manage
/// a unit to `Boss`.
pub async fn resolve_caller<S: Store>(
    store: &S,
    index: &ManagerIndex,
    claims: Claims,
) -> AppResult<AuthUser> {
    let role = Role::from_id(claims.role)
        .ok_or_else(|| AppError::Unauthorized("Invalid role".to_string()))?;

    let mut user = AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
        managed_organization: None,
    };

    if user.role == Role::Admin {
        return Ok(user);
    }

    // boss is never trusted from the token, only derived
    user.role = Role::Employee;
    if let Some(employee_id) = user.employee_id {
        if let Some(org) = manager_of(store, index, employee_id).await? {
            user.role = Role::Boss;
            user.managed_organization = Some(org.id);
        }
    }

    Ok(user)
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(AppError::Unauthorized("Missing token".to_string()).into())),
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::denied("Admin only"))
        }
    }

    #[cfg(test)]
    pub fn admin() -> Self {
        Self {
            user_id: 1,
            username: "admin".to_string(),
            role: Role::Admin,
            employee_id: None,
            managed_organization: None,
        }
    }

    #[cfg(test)]
    pub fn employee(employee_id: u64) -> Self {
        Self {
            user_id: 100 + employee_id,
            username: format!("emp{}", employee_id),
            role: Role::Employee,
            employee_id: Some(employee_id),
            managed_organization: None,
        }
    }

    #[cfg(test)]
    pub fn boss(employee_id: u64, organization_id: u64) -> Self {
        Self {
            role: Role::Boss,
            managed_organization: Some(organization_id),
            ..Self::employee(employee_id)
        }
    }
}
