use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{auth::auth::AuthUser, model::pay_item::PayItem, service::catalog, store::mysql::MySqlStore};

#[derive(Deserialize, ToSchema)]
pub struct CreatePayItem {
    #[schema(example = "Allowance")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SetActive {
    #[schema(example = false)]
    pub active: bool,
}

#[utoipa::path(
    post,
    path = "/api/pay-item",
    request_body = CreatePayItem,
    responses(
        (status = 201, body = PayItem),
        (status = 409, description = "Name already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Pay Item"
)]
pub async fn create_pay_item(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreatePayItem>,
) -> actix_web::Result<impl Responder> {
    let item = catalog::create_pay_item(store.get_ref(), &auth, &payload.name).await?;
    Ok(HttpResponse::Created().json(item))
}

#[utoipa::path(
    get,
    path = "/api/pay-item",
    responses(
        (status = 200, body = [PayItem])
    ),
    security(("bearer_auth" = [])),
    tag = "Pay Item"
)]
pub async fn list_pay_items(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> actix_web::Result<impl Responder> {
    let items = catalog::list_pay_items(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[utoipa::path(
    put,
    path = "/api/pay-item/{pay_item_id}/active",
    request_body = SetActive,
    params(
        ("pay_item_id", description = "Pay item ID")
    ),
    responses(
        (status = 200, body = PayItem),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Pay Item"
)]
pub async fn set_active(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    body: web::Json<SetActive>,
) -> actix_web::Result<impl Responder> {
    let item = catalog::set_pay_item_active(store.get_ref(), &auth, path.into_inner(), body.active).await?;
    Ok(HttpResponse::Ok().json(item))
}

#[utoipa::path(
    delete,
    path = "/api/pay-item/{pay_item_id}",
    params(
        ("pay_item_id", description = "Pay item ID")
    ),
    responses(
        (status = 204),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Pay Item"
)]
pub async fn delete_pay_item(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    catalog::delete_pay_item(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
