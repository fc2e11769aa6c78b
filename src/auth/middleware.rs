use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

use crate::auth::auth::resolve_caller;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::service::hierarchy::ManagerIndex;
use crate::store::mysql::MySqlStore;

fn reject(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let resp = AppError::Unauthorized(message.to_string()).error_response();
    req.into_response(resp)
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();
    let store = req
        .app_data::<Data<MySqlStore>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Store missing"))?
        .clone();
    let index = req
        .app_data::<Data<ManagerIndex>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Manager index missing"))?
        .clone();

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".into()))?,
        None => return Ok(reject(req, "Missing Authorization header")),
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t.to_string(),
        None => return Ok(reject(req, "Authorization header must start with Bearer")),
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            return Ok(reject(req, "Invalid or expired token"));
        }
    };

    // managerOf runs on every authenticated request to derive the boss role
    let auth_user = resolve_caller(store.get_ref(), index.get_ref(), claims).await?;

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
