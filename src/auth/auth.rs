use crate::{error::AppError, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// The caller, as resolved from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    /// The auth middleware stores the caller in the request extensions; a
    /// handler outside a protected scope gets a 401 here.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Authentication("Missing token".to_string())),
        )
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Authorization(format!("{role} only")))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(Role::Admin)
    }

    /// Self-service or admin access to `user_id`'s data.
    pub fn require_self_or_admin(&self, user_id: u64) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::access_denied())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: 10,
            email: "c@dayflow.io".into(),
            role,
        }
    }

    #[test]
    fn role_gate_rejects_with_authorization_error() {
        let err = caller(Role::Employee).require_admin().unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        assert!(caller(Role::Admin).require_admin().is_ok());
        assert!(caller(Role::Employee).require_role(Role::Employee).is_ok());
    }

    #[test]
    fn self_access_is_allowed_for_everyone() {
        assert!(caller(Role::Employee).require_self_or_admin(10).is_ok());
        assert!(caller(Role::Employee).require_self_or_admin(11).is_err());
        assert!(caller(Role::Admin).require_self_or_admin(11).is_ok());
    }

    #[actix_web::test]
    async fn extractor_without_middleware_is_unauthenticated() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        let err = AuthUser::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }
}
