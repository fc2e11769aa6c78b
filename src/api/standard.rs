use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    service::standard::{self, ResolvedStandard, StandardItemInput, StandardStatus},
    store::mysql::MySqlStore,
};

#[derive(Deserialize, ToSchema)]
pub struct SubmitStandard {
    #[schema(example = 12)]
    pub position_id: u64,
    #[schema(example = "2024-02-01", value_type = String, format = "date")]
    pub effective_date: NaiveDate,
    pub items: Vec<StandardItemInput>,
}

#[derive(Serialize, ToSchema)]
pub struct StandardChange {
    pub position_id: u64,
    /// Records touched by the call
    pub records: u64,
}

#[utoipa::path(
    post,
    path = "/api/standard",
    request_body = SubmitStandard,
    responses(
        (status = 201, body = StandardChange, description = "New pending version stored"),
        (status = 400, description = "Duplicate, inactive or nothing to register"),
        (status = 404, description = "Position or pay item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Standard"
)]
pub async fn submit_standard(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<SubmitStandard>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let count = standard::submit(
        store.get_ref(),
        &auth,
        payload.position_id,
        payload.effective_date,
        payload.items,
    )
    .await?;

    Ok(HttpResponse::Created().json(StandardChange {
        position_id: payload.position_id,
        records: count as u64,
    }))
}

/// Effective standard: latest approved amount per pay item
#[utoipa::path(
    get,
    path = "/api/standard/{position_id}",
    params(
        ("position_id", description = "Position ID")
    ),
    responses(
        (status = 200, body = ResolvedStandard),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Standard"
)]
pub async fn resolve_standard(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let resolved = standard::resolve(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(resolved))
}

#[utoipa::path(
    get,
    path = "/api/standard/{position_id}/status",
    params(
        ("position_id", description = "Position ID")
    ),
    responses(
        (status = 200, body = StandardStatus),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Standard"
)]
pub async fn standard_status(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let status = standard::status(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(status))
}

#[utoipa::path(
    put,
    path = "/api/standard/{position_id}/approve",
    params(
        ("position_id", description = "Position ID")
    ),
    responses(
        (status = 200, body = StandardChange),
        (status = 404, description = "Nothing pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Standard"
)]
pub async fn approve_standard(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let position_id = path.into_inner();
    let records = standard::review(store.get_ref(), &auth, position_id, true).await?;
    Ok(HttpResponse::Ok().json(StandardChange { position_id, records }))
}

#[utoipa::path(
    put,
    path = "/api/standard/{position_id}/reject",
    params(
        ("position_id", description = "Position ID")
    ),
    responses(
        (status = 200, body = StandardChange),
        (status = 404, description = "Nothing pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Standard"
)]
pub async fn reject_standard(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let position_id = path.into_inner();
    let records = standard::review(store.get_ref(), &auth, position_id, false).await?;
    Ok(HttpResponse::Ok().json(StandardChange { position_id, records }))
}

#[utoipa::path(
    put,
    path = "/api/standard/{position_id}/withdraw",
    params(
        ("position_id", description = "Position ID")
    ),
    responses(
        (status = 200, body = Object, example = json!({"message": "Standard withdrawn", "records": 2})),
        (status = 404, description = "Nothing pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Standard"
)]
pub async fn withdraw_standard(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let records = standard::withdraw(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Standard withdrawn",
        "records": records
    })))
}
