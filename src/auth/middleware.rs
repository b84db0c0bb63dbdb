use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

/// Resolves `Authorization: Bearer <jwt>` into an [`AuthUser`] stored in the
/// request extensions. Any failure answers 401 before the handler runs.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("App config missing")))?;

    let auth_user = match authenticate(&req, config) {
        Ok(user) => user,
        Err(err) => {
            debug!(error = %err, path = %req.path(), "Rejected request");
            return Ok(req.error_response(err));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

fn authenticate(req: &ServiceRequest, config: &Config) -> Result<AuthUser, AppError> {
    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| {
            AppError::Authentication("Invalid Authorization header encoding".to_string())
        })?;

    let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Authentication("Authorization header must start with Bearer".to_string())
    })?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role: claims.role,
    })
}
