use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::{Context, bail};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::hierarchy::{ManagerIndex, warmup_manager_index};
use crate::service::ledger::LedgerSettings;
use crate::store::mysql::MySqlStore;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

const TOKEN_TTL_SECS: usize = 15 * 60;

#[get("/")]
async fn index() -> impl Responder {
    "Pay ledger is running"
}

/// `issue-token <user_id> <role_id> [employee_id]` prints an access token
/// signed with the configured secret, for local testing without the
/// identity provider.
fn issue_token(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let (user_id, role) = match args {
        [user_id, role, ..] => (
            user_id.parse::<u64>().context("user_id must be a number")?,
            role.parse::<u8>().context("role_id must be a number")?,
        ),
        _ => bail!("usage: issue-token <user_id> <role_id> [employee_id]"),
    };
    let employee_id = args
        .get(2)
        .map(|e| e.parse::<u64>())
        .transpose()
        .context("employee_id must be a number")?;

    let token = auth::jwt::generate_access_token(
        user_id,
        format!("user{}", user_id),
        role,
        employee_id,
        &config.jwt_secret,
        TOKEN_TTL_SECS,
    )?;
    println!("{}", token);
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("issue-token") {
        return issue_token(&config, &args[2..]);
    }

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let store = Data::new(MySqlStore::new(pool));

    let manager_index = Data::new(ManagerIndex::new(Duration::from_secs(
        config.manager_cache_ttl_secs,
    )));

    // the filter answers "not a manager" on its own, so it must be loaded
    // before the first request
    warmup_manager_index(store.get_ref(), manager_index.get_ref(), 250)
        .await
        .context("Manager index warmup failed")?;

    let settings = Data::new(LedgerSettings::from_config(&config));
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(manager_index.clone())
            .app_data(settings.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
