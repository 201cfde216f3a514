use crate::{api::attendance, config::Config, error::ApiError};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-peer-IP limiters. Built once and cloned into every worker so all workers
/// draw from the same quota.
#[derive(Clone)]
pub struct RateLimiters {
    scan: Limiter,
    api: Limiter,
}

impl RateLimiters {
    pub fn new(config: &Config) -> Self {
        Self {
            scan: Arc::new(build_limiter(config.rate_scan_per_min)),
            api: Arc::new(build_limiter(config.rate_api_per_min)),
        }
    }
}

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    // Extractor failures answer with the same {"message"} body as the handlers
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());
    let path_config = web::PathConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                .wrap(limiters.api.clone())
                .app_data(json_config)
                .app_data(query_config)
                .app_data(path_config)
                // /attendance
                .service(web::resource("").route(web::get().to(attendance::dashboard)))
                // /attendance/scan
                .service(
                    web::resource("/scan")
                        .wrap(limiters.scan.clone())
                        .route(web::post().to(attendance::record_scan)),
                )
                .service(web::resource("/active").route(web::get().to(attendance::active_roster)))
                .service(web::resource("/shifts").route(web::get().to(attendance::shift_history)))
                // /attendance/events
                .service(
                    web::resource("/events")
                        .route(web::get().to(attendance::list_events))
                        .route(web::delete().to(attendance::reset_events)),
                )
                // /attendance/events/{id}
                .service(
                    web::resource("/events/{id}").route(web::delete().to(attendance::delete_event)),
                )
                // /attendance/employee/{employee_id}
                .service(
                    web::resource("/employee/{employee_id}")
                        .route(web::get().to(attendance::employee_events)),
                ),
        ),
    );
}

// SCAN / MANUAL ENTRY
//  └─ POST /attendance/scan            → append one event
//
// CORRECTIONS
//  ├─ DELETE /attendance/events/{id}   → drop one event
//  └─ DELETE /attendance/events?confirm=true → drop everything
//
// Every GET re-reconciles the current log; nothing derived is stored.
