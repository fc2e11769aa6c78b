use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    model::employee::Employee,
    service::{hierarchy, hierarchy::Supervisors},
    store::{Store, mysql::MySqlStore},
};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Required for admins; managers default to their own unit
    #[schema(example = 7)]
    pub organization_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    #[schema(
        example = json!([{
            "id": 1001,
            "employee_code": "EMP-001",
            "first_name": "John",
            "last_name": "Doe",
            "phone": "+8801712345678",
            "position_id": 12
        }])
    )]
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub user: AuthUser,
    /// Absent for callers without a placed employee record
    #[schema(nullable = true)]
    pub supervisors: Option<Supervisors>,
}

/// Employees in the caller's down-line
#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, body = EmployeeListResponse),
        (status = 400, description = "Admin did not name an organization"),
        (status = 403, description = "Caller does not manage the organization")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    debug!(?query, user_id = auth.user_id, "Listing down-line");

    let data = hierarchy::list_down_line(store.get_ref(), &auth, query.organization_id).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: data.len(),
        data,
    }))
}

/// Resolved caller, including the derived boss role and supervisors
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, body = MeResponse),
        (status = 401)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn me(auth: AuthUser, store: web::Data<MySqlStore>) -> actix_web::Result<impl Responder> {
    let store = store.get_ref();

    let position_id = match auth.employee_id {
        Some(employee_id) => store.get_employee(employee_id).await?.and_then(|e| e.position_id),
        None => None,
    };
    let supervisors = match position_id {
        Some(position_id) => Some(hierarchy::supervisors_of(store, position_id).await?),
        None => None,
    };

    Ok(HttpResponse::Ok().json(MeResponse {
        user: auth,
        supervisors,
    }))
}
