use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    model::review_state::ReviewState,
    service::ledger::{
        self, BatchDetail, BatchPage, EmployeeInput, LedgerSettings, RegisterOutcome,
    },
    store::mysql::MySqlStore,
};

#[derive(Deserialize, ToSchema)]
pub struct RegisterBatch {
    /// `YYYY-MM`, or any date inside the month
    #[schema(example = "2024-01")]
    pub month: String,
    #[schema(example = 7)]
    pub organization_id: u64,
    pub employees: Vec<EmployeeInput>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BatchQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,
    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct BatchState {
    #[schema(example = "202401-ORG7")]
    pub batch_id: String,
    pub status: ReviewState,
}

#[utoipa::path(
    post,
    path = "/api/ledger",
    request_body = RegisterBatch,
    responses(
        (status = 201, body = RegisterOutcome),
        (status = 400, description = "Nothing to register or malformed amount"),
        (status = 403, description = "Not a manager of the organization"),
        (status = 404, description = "Organization not found"),
        (status = 409, description = "Open batch already exists"),
        (status = 500, description = "Bonus or deduction pay item not configured")
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn register_batch(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    settings: web::Data<LedgerSettings>,
    payload: web::Json<RegisterBatch>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let pay_month = ledger::parse_pay_month(&payload.month)?;

    let outcome = ledger::register_batch(
        store.get_ref(),
        settings.get_ref(),
        &auth,
        pay_month,
        payload.organization_id,
        payload.employees,
    )
    .await?;

    Ok(HttpResponse::Created().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/ledger",
    params(BatchQuery),
    responses(
        (status = 200, body = BatchPage),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn list_batches(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<BatchQuery>,
) -> actix_web::Result<impl Responder> {
    let page = ledger::list_batches(
        store.get_ref(),
        &auth,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(10),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/ledger/{batch_id}",
    params(
        ("batch_id", description = "Batch ID, e.g. 202401-ORG7")
    ),
    responses(
        (status = 200, body = BatchDetail),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn batch_detail(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let detail = ledger::batch_detail(store.get_ref(), &auth, &path).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    put,
    path = "/api/ledger/{batch_id}/approve",
    params(
        ("batch_id", description = "Batch ID")
    ),
    responses(
        (status = 200, body = BatchState),
        (status = 404),
        (status = 409, description = "Batch is rejected or withdrawn")
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn approve_batch(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let batch_id = path.into_inner();
    let status = ledger::review_batch(store.get_ref(), &auth, &batch_id, true).await?;
    Ok(HttpResponse::Ok().json(BatchState { batch_id, status }))
}

#[utoipa::path(
    put,
    path = "/api/ledger/{batch_id}/reject",
    params(
        ("batch_id", description = "Batch ID")
    ),
    responses(
        (status = 200, body = BatchState),
        (status = 404),
        (status = 409, description = "Batch is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn reject_batch(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let batch_id = path.into_inner();
    let status = ledger::review_batch(store.get_ref(), &auth, &batch_id, false).await?;
    Ok(HttpResponse::Ok().json(BatchState { batch_id, status }))
}

#[utoipa::path(
    put,
    path = "/api/ledger/{batch_id}/withdraw",
    params(
        ("batch_id", description = "Batch ID")
    ),
    responses(
        (status = 200, body = BatchState),
        (status = 404),
        (status = 409, description = "Batch already withdrawn")
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn withdraw_batch(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let batch_id = path.into_inner();
    let status = ledger::withdraw_batch(store.get_ref(), &auth, &batch_id).await?;
    Ok(HttpResponse::Ok().json(BatchState { batch_id, status }))
}
