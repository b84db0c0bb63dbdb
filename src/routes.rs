use crate::{
    api::{attendance, health, leave_request, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Resource, middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Malformed bodies, query strings and path segments answer with the same
/// `{"message"}` shape as every other error.
pub fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    // a non-numeric id names no route
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::NotFound("Route not found".to_string()).into()),
    );
}

/// A resource whose unsupported methods fall through to the JSON 404 instead
/// of an empty 405.
fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::route().to(health::not_found))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    extractor_configs(cfg);

    cfg.service(
        resource("/api/health").route(web::get().to(health::health)),
    );

    // Public routes, plus the caller's profile
    cfg.service(
        web::scope("/api/auth")
            .default_service(web::route().to(health::not_found))
            .service(
                resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                resource("/profile")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::profile)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope("/api/leaves")
            .default_service(web::route().to(health::not_found))
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter.clone()) // rate limiting
            // /leaves
            .service(
                resource("")
                    .route(web::get().to(leave_request::leave_list))
                    .route(web::post().to(leave_request::create_leave)),
            )
            // /leaves/balance must win over /leaves/{id}
            .service(
                resource("/balance").route(web::get().to(leave_request::own_balance)),
            )
            .service(
                resource("/balance/{user_id}")
                    .route(web::get().to(leave_request::user_balance))
                    .route(web::put().to(leave_request::set_balance)),
            )
            // /leaves/{id}
            .service(
                resource("/{id}").route(web::put().to(leave_request::review_leave)),
            ),
    );

    cfg.service(
        web::scope("/api/users")
            .default_service(web::route().to(health::not_found))
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter.clone())
            .service(resource("").route(web::get().to(user::list_users)))
            .service(
                resource("/{id}")
                    .route(web::get().to(user::get_user))
                    .route(web::put().to(user::update_user))
                    .route(web::delete().to(user::delete_user)),
            ),
    );

    cfg.service(
        web::scope("/api/attendance")
            .default_service(web::route().to(health::not_found))
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(resource("").route(web::get().to(attendance::attendance_list)))
            .service(resource("/check-in").route(web::post().to(attendance::check_in)))
            .service(resource("/check-out").route(web::post().to(attendance::check_out))),
    );

    cfg.default_service(web::route().to(health::not_found));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_builds_for_any_rate() {
        // zero and rates above 60k/min would otherwise yield a zero period
        let _ = build_limiter(0);
        let _ = build_limiter(60);
        let _ = build_limiter(1_000_000);
    }
}
