use crate::{api::attendance, error::AppError};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{http::Method, middleware::DefaultHeaders, web};

pub type AttendanceGovernor = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter for the attendance endpoints. `None` when the builder
/// rejects the derived quota.
pub fn attendance_governor(requests_per_min: u32) -> Option<AttendanceGovernor> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, governor: &AttendanceGovernor) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(Governor::new(governor)) // rate limiting
            .configure(attendance_routes),
    );
}

/// The portal UI calls these from another origin, so every response,
/// errors included, carries permissive CORS headers.
pub fn attendance_routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| AppError::bad_request(err.to_string()).into());

    cfg.service(
        web::scope("/attendance")
            .app_data(json_config)
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
                    .add(("Access-Control-Allow-Headers", "Content-Type")),
            )
            // /attendance/logs
            .service(
                web::resource("/logs")
                    .route(web::post().to(attendance::fetch_logs))
                    .route(web::method(Method::OPTIONS).to(attendance::preflight)),
            )
            // /attendance/summary
            .service(
                web::resource("/summary")
                    .route(web::post().to(attendance::daily_summary))
                    .route(web::method(Method::OPTIONS).to(attendance::preflight)),
            ),
    );
}
