use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    model::organization::{NewOrganization, Organization},
    service::{hierarchy, hierarchy::ManagerIndex, org_tree},
    store::mysql::MySqlStore,
};

#[derive(Deserialize, ToSchema)]
pub struct CreateOrganization {
    #[schema(example = "Platform Team")]
    pub name: String,
    #[schema(example = 3)]
    pub level: u8,
    #[schema(example = 4, nullable = true)]
    pub parent_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetManager {
    /// `null` clears the manager
    #[schema(example = 1001, nullable = true)]
    pub manager_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct OrganizationPath {
    pub organization_id: u64,
    #[schema(example = json!(["Head Office", "Engineering", "Platform Team"]))]
    pub path: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/api/organization",
    request_body = CreateOrganization,
    responses(
        (status = 201, body = Organization),
        (status = 400, description = "Invalid level or parent"),
        (status = 403),
        (status = 404, description = "Parent not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn create_organization(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreateOrganization>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let org = org_tree::create_organization(
        store.get_ref(),
        &auth,
        NewOrganization {
            name: payload.name,
            level: payload.level,
            parent_id: payload.parent_id,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(org))
}

#[utoipa::path(
    get,
    path = "/api/organization",
    responses(
        (status = 200, body = [Organization])
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn list_organizations(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> actix_web::Result<impl Responder> {
    let orgs = org_tree::list_organizations(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(orgs))
}

#[utoipa::path(
    get,
    path = "/api/organization/{organization_id}/path",
    params(
        ("organization_id", description = "Organization ID")
    ),
    responses(
        (status = 200, body = OrganizationPath),
        (status = 404),
        (status = 500, description = "Corrupt parent chain")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn organization_path(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let organization_id = path.into_inner();
    let names = hierarchy::organization_path(store.get_ref(), organization_id).await?;

    Ok(HttpResponse::Ok().json(OrganizationPath {
        organization_id,
        path: names,
    }))
}

#[utoipa::path(
    put,
    path = "/api/organization/{organization_id}/manager",
    request_body = SetManager,
    params(
        ("organization_id", description = "Organization ID")
    ),
    responses(
        (status = 200, body = Organization),
        (status = 404),
        (status = 409, description = "Employee already manages another unit")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn set_manager(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    index: web::Data<ManagerIndex>,
    path: web::Path<u64>,
    body: web::Json<SetManager>,
) -> actix_web::Result<impl Responder> {
    let org = org_tree::set_manager(
        store.get_ref(),
        index.get_ref(),
        &auth,
        path.into_inner(),
        body.manager_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(org))
}

#[utoipa::path(
    delete,
    path = "/api/organization/{organization_id}",
    params(
        ("organization_id", description = "Organization ID")
    ),
    responses(
        (status = 204),
        (status = 404),
        (status = 409, description = "Organization still has children or positions")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn delete_organization(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    index: web::Data<ManagerIndex>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    org_tree::delete_organization(store.get_ref(), index.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
