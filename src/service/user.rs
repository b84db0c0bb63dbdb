use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::{
    role::Role,
    user::{User, UserPatch},
};
use crate::store::UserStore;
use crate::utils::email_registry::EmailRegistry;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    #[schema(example = "Jane Q. Doe")]
    pub full_name: Option<String>,
    #[schema(example = "https://cdn.dayflow.io/avatars/jane.png")]
    pub avatar_url: Option<String>,
    /// admin only
    pub role: Option<Role>,
    /// admin only
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    emails: Arc<EmailRegistry>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, emails: Arc<EmailRegistry>) -> Self {
        Self { users, emails }
    }

    pub async fn list(&self, caller: &AuthUser) -> AppResult<Vec<User>> {
        caller.require_admin()?;
        Ok(self.users.list_users().await?)
    }

    pub async fn get(&self, caller: &AuthUser, id: u64) -> AppResult<User> {
        caller.require_self_or_admin(id)?;
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Profile fields are self-service. Role and activation changes from a
    /// non-admin are refused outright rather than dropped.
    pub async fn update(&self, caller: &AuthUser, id: u64, input: UpdateUser) -> AppResult<User> {
        caller.require_self_or_admin(id)?;

        if !caller.is_admin() && (input.role.is_some() || input.is_active.is_some()) {
            return Err(AppError::Authorization(
                "Only admins can change role or account status".to_string(),
            ));
        }

        let patch = UserPatch {
            full_name: input.full_name.map(|v| v.trim().to_string()),
            avatar_url: input.avatar_url.map(|v| v.trim().to_string()),
            role: input.role,
            is_active: input.is_active,
        };

        if patch.is_empty() {
            return self.get(caller, id).await;
        }

        let user = self
            .users
            .update_user(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        info!(user_id = id, by = caller.user_id, "User updated");
        Ok(user)
    }

    pub async fn delete(&self, caller: &AuthUser, id: u64) -> AppResult<()> {
        caller.require_admin()?;

        let user = self
            .users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !self.users.delete_user(id).await? {
            return Err(AppError::not_found("User"));
        }
        self.emails.forget(&user.email).await;

        info!(user_id = id, by = caller.user_id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::NewUser;
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, email: &str, role: Role) -> AuthUser {
        let user = store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                full_name: None,
                role,
            })
            .await
            .unwrap();
        AuthUser {
            user_id: user.id,
            email: user.email,
            role,
        }
    }

    async fn setup() -> (UserService, AuthUser, AuthUser, AuthUser) {
        let store = Arc::new(MemoryStore::new());
        let admin = seed(&store, "root@dayflow.io", Role::Admin).await;
        let ann = seed(&store, "ann@dayflow.io", Role::Employee).await;
        let ben = seed(&store, "ben@dayflow.io", Role::Employee).await;
        (
            UserService::new(store, Arc::new(EmailRegistry::new())),
            admin,
            ann,
            ben,
        )
    }

    #[actix_web::test]
    async fn only_admins_list_users() {
        let (service, admin, ann, _) = setup().await;
        assert_eq!(service.list(&admin).await.unwrap().len(), 3);
        assert!(matches!(
            service.list(&ann).await.unwrap_err(),
            AppError::Authorization(_)
        ));
    }

    #[actix_web::test]
    async fn get_is_self_or_admin() {
        let (service, admin, ann, ben) = setup().await;
        assert_eq!(service.get(&ann, ann.user_id).await.unwrap().email, "ann@dayflow.io");
        assert!(service.get(&admin, ann.user_id).await.is_ok());
        assert!(matches!(
            service.get(&ben, ann.user_id).await.unwrap_err(),
            AppError::Authorization(_)
        ));
        assert!(matches!(
            service.get(&admin, 777).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[actix_web::test]
    async fn employees_update_their_profile_but_not_their_role() {
        let (service, _, ann, _) = setup().await;
        let updated = service
            .update(
                &ann,
                ann.user_id,
                UpdateUser {
                    full_name: Some(" Ann Lee ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Ann Lee"));

        let err = service
            .update(
                &ann,
                ann.user_id,
                UpdateUser {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        assert_eq!(service.get(&ann, ann.user_id).await.unwrap().role, Role::Employee);
    }

    #[actix_web::test]
    async fn admins_can_promote() {
        let (service, admin, ann, _) = setup().await;
        let updated = service
            .update(
                &admin,
                ann.user_id,
                UpdateUser {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
    }

    #[actix_web::test]
    async fn delete_is_admin_only_and_reports_missing() {
        let (service, admin, ann, ben) = setup().await;
        assert!(matches!(
            service.delete(&ann, ben.user_id).await.unwrap_err(),
            AppError::Authorization(_)
        ));
        service.delete(&admin, ben.user_id).await.unwrap();
        assert!(matches!(
            service.delete(&admin, ben.user_id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
