use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    model::position::{NewPosition, Position},
    service::{catalog, hierarchy, hierarchy::Supervisors},
    store::mysql::MySqlStore,
};

#[derive(Deserialize, ToSchema)]
pub struct CreatePosition {
    #[schema(example = "Engineer")]
    pub name: String,
    #[schema(example = 7)]
    pub organization_id: u64,
    #[schema(example = "Backend services", nullable = true)]
    pub description: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/position",
    request_body = CreatePosition,
    responses(
        (status = 201, body = Position),
        (status = 400, description = "Organization is not level 3"),
        (status = 409, description = "Name taken inside the organization")
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn create_position(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreatePosition>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let position = catalog::create_position(
        store.get_ref(),
        &auth,
        NewPosition {
            name: payload.name,
            organization_id: payload.organization_id,
            description: payload.description,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(position))
}

/// Managers of the position's unit and of each unit above it
#[utoipa::path(
    get,
    path = "/api/position/{position_id}/supervisors",
    params(
        ("position_id", description = "Position ID")
    ),
    responses(
        (status = 200, body = Supervisors),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn supervisors(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let sups = hierarchy::supervisors_of(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sups))
}

#[utoipa::path(
    delete,
    path = "/api/position/{position_id}",
    params(
        ("position_id", description = "Position ID")
    ),
    responses(
        (status = 204),
        (status = 404),
        (status = 409, description = "Position still held by employees")
    ),
    security(("bearer_auth" = [])),
    tag = "Position"
)]
pub async fn delete_position(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    catalog::delete_position(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
