use crate::{
    api::{self, admin, availability, booking, employee},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::Context;
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once so every worker shares the same buckets.
#[derive(Clone)]
pub struct Limiters {
    pub public: Limiter,
    pub submit: Limiter,
    pub admin: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            public: build_limiter(config.rate_public_per_min).context("public rate limit")?,
            submit: build_limiter(config.rate_submit_per_min).context("submit rate limit")?,
            admin: build_limiter(config.rate_admin_per_min).context("admin rate limit")?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let per_ms = 60_000 / u64::from(requests_per_min.max(1));
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limiter settings")?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiters: &Limiters) {
    cfg.app_data(api::json_config())
        .app_data(api::query_config())
        .app_data(api::path_config());

    cfg.service(
        web::scope(api_prefix)
            // /employees/{email}
            .service(
                web::resource("/employees/{email}")
                    .wrap(limiters.public.clone())
                    .route(web::get().to(employee::get_employee)),
            )
            // /unavailable-dates
            .service(
                web::resource("/unavailable-dates")
                    .wrap(limiters.public.clone())
                    .route(web::get().to(availability::unavailable_dates)),
            )
            // /vacation-bookings/check
            .service(
                web::resource("/vacation-bookings/check")
                    .wrap(limiters.public.clone())
                    .route(web::post().to(booking::check_booking)),
            )
            // /vacation-bookings
            .service(
                web::resource("/vacation-bookings")
                    .wrap(limiters.submit.clone())
                    .route(web::post().to(booking::create_booking)),
            )
            .service(
                web::scope("/admin")
                    .wrap(limiters.admin.clone())
                    // /admin/vacation-requests
                    .service(
                        web::resource("/vacation-requests")
                            .route(web::get().to(admin::list_requests)),
                    )
                    // /admin/vacation-requests/{id}
                    .service(
                        web::resource("/vacation-requests/{id}")
                            .route(web::put().to(admin::decide_request)),
                    ),
            ),
    );
}
