use crate::{
    api::{employee, ledger, organization, pay_item, position, standard},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-scope limiter. Falls back to the governor defaults if the quota
/// cannot be built.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Every route needs a verified caller
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(employee::me)))
            .service(web::resource("/employee").route(web::get().to(employee::list_employees)))
            .service(
                web::scope("/organization")
                    // /organization
                    .service(
                        web::resource("")
                            .route(web::post().to(organization::create_organization))
                            .route(web::get().to(organization::list_organizations)),
                    )
                    // /organization/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(organization::delete_organization)),
                    )
                    // /organization/{id}/path
                    .service(
                        web::resource("/{id}/path")
                            .route(web::get().to(organization::organization_path)),
                    )
                    // /organization/{id}/manager
                    .service(
                        web::resource("/{id}/manager")
                            .route(web::put().to(organization::set_manager)),
                    ),
            )
            .service(
                web::scope("/position")
                    .service(web::resource("").route(web::post().to(position::create_position)))
                    .service(
                        web::resource("/{id}").route(web::delete().to(position::delete_position)),
                    )
                    .service(
                        web::resource("/{id}/supervisors")
                            .route(web::get().to(position::supervisors)),
                    ),
            )
            .service(
                web::scope("/pay-item")
                    .service(
                        web::resource("")
                            .route(web::post().to(pay_item::create_pay_item))
                            .route(web::get().to(pay_item::list_pay_items)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(pay_item::delete_pay_item)),
                    )
                    .service(
                        web::resource("/{id}/active").route(web::put().to(pay_item::set_active)),
                    ),
            )
            .service(
                web::scope("/standard")
                    .service(web::resource("").route(web::post().to(standard::submit_standard)))
                    // /standard/{position_id}
                    .service(
                        web::resource("/{id}").route(web::get().to(standard::resolve_standard)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::get().to(standard::standard_status)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(standard::approve_standard)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(standard::reject_standard)),
                    )
                    .service(
                        web::resource("/{id}/withdraw")
                            .route(web::put().to(standard::withdraw_standard)),
                    ),
            )
            .service(
                web::scope("/ledger")
                    // /ledger
                    .service(
                        web::resource("")
                            .route(web::post().to(ledger::register_batch))
                            .route(web::get().to(ledger::list_batches)),
                    )
                    // /ledger/{batch_id}
                    .service(web::resource("/{id}").route(web::get().to(ledger::batch_detail)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(ledger::approve_batch)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(ledger::reject_batch)),
                    )
                    .service(
                        web::resource("/{id}/withdraw")
                            .route(web::put().to(ledger::withdraw_batch)),
                    ),
            ),
    );
}
