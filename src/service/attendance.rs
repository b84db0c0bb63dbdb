use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceView;
use crate::store::{AttendanceStore, StoreError};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AttendanceFilter {
    /// Another user's records (admins only)
    pub user_id: Option<u64>,
}

/// Daily check-in/check-out. Days are UTC calendar days.
#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    standard_work_minutes: i64,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn AttendanceStore>, standard_work_minutes: i64) -> Self {
        Self {
            store,
            standard_work_minutes,
        }
    }

    pub async fn check_in(&self, caller: &AuthUser) -> AppResult<AttendanceView> {
        let now = Utc::now();
        match self.store.check_in(caller.user_id, now.date_naive(), now).await {
            Ok(record) => {
                info!(user_id = caller.user_id, "Checked in");
                Ok(AttendanceView::new(record, self.standard_work_minutes))
            }
            Err(StoreError::Duplicate(_)) => {
                Err(AppError::Validation("Already checked in today".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn check_out(&self, caller: &AuthUser) -> AppResult<AttendanceView> {
        let now = Utc::now();
        let record = self
            .store
            .check_out(caller.user_id, now.date_naive(), now)
            .await?
            .ok_or_else(|| AppError::Validation("No active check-in found for today".to_string()))?;

        info!(user_id = caller.user_id, "Checked out");
        Ok(AttendanceView::new(record, self.standard_work_minutes))
    }

    /// Own records for employees; admins may see everyone or one user.
    pub async fn list(
        &self,
        caller: &AuthUser,
        filter: AttendanceFilter,
    ) -> AppResult<Vec<AttendanceView>> {
        let scope = if caller.is_admin() {
            filter.user_id
        } else {
            if let Some(other) = filter.user_id {
                caller.require_self_or_admin(other)?;
            }
            Some(caller.user_id)
        };

        Ok(self
            .store
            .list_attendance(scope)
            .await?
            .into_iter()
            .map(|r| AttendanceView::new(r, self.standard_work_minutes))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{role::Role, user::NewUser};
    use crate::store::{MemoryStore, UserStore};

    async fn caller(store: &MemoryStore, email: &str, role: Role) -> AuthUser {
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

    #[actix_web::test]
    async fn check_in_once_then_check_out_once() {
        let store = Arc::new(MemoryStore::new());
        let eve = caller(&store, "eve@dayflow.io", Role::Employee).await;
        let service = AttendanceService::new(store, 480);

        let open = service.check_in(&eve).await.unwrap();
        assert!(open.check_out.is_none());
        assert!(matches!(
            service.check_in(&eve).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let closed = service.check_out(&eve).await.unwrap();
        assert!(closed.check_out.is_some());
        assert_eq!(closed.worked_minutes, Some(0));
        assert!(matches!(
            service.check_out(&eve).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[actix_web::test]
    async fn listing_is_scoped() {
        let store = Arc::new(MemoryStore::new());
        let boss = caller(&store, "boss@dayflow.io", Role::Admin).await;
        let eve = caller(&store, "eve@dayflow.io", Role::Employee).await;
        let max = caller(&store, "max@dayflow.io", Role::Employee).await;
        let service = AttendanceService::new(store, 480);

        service.check_in(&eve).await.unwrap();
        service.check_in(&max).await.unwrap();

        let own = service.list(&eve, AttendanceFilter::default()).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].user_id, eve.user_id);

        let peek = AttendanceFilter {
            user_id: Some(max.user_id),
        };
        assert!(matches!(
            service.list(&eve, peek).await.unwrap_err(),
            AppError::Authorization(_)
        ));

        assert_eq!(service.list(&boss, AttendanceFilter::default()).await.unwrap().len(), 2);
        let one = AttendanceFilter {
            user_id: Some(max.user_id),
        };
        assert_eq!(service.list(&boss, one).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn deleted_account_checking_in_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let gone = caller(&store, "gone@dayflow.io", Role::Employee).await;
        store.delete_user(gone.user_id).await.unwrap();
        let service = AttendanceService::new(store, 480);

        assert!(matches!(
            service.check_in(&gone).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
