use std::sync::Arc;

use crate::service::{attendance::AttendanceService, leave::LeaveService, user::UserService};
use crate::store::{AttendanceStore, BalanceStore, LeaveStore, MemoryStore, UserStore};
use crate::utils::email_registry::EmailRegistry;

/// Shared handles available to every handler through `web::Data<AppState>`.
///
/// Holds no per-request or per-user state; identity always arrives with the
/// request as an `AuthUser`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub leaves: Arc<dyn LeaveStore>,
    pub balances: Arc<dyn BalanceStore>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub emails: Arc<EmailRegistry>,
    standard_work_minutes: i64,
}

impl AppState {
    /// Wires every store seam to one backend implementing all of them.
    pub fn from_store<S>(store: Arc<S>, standard_work_minutes: i64) -> Self
    where
        S: UserStore + LeaveStore + BalanceStore + AttendanceStore + 'static,
    {
        Self {
            users: store.clone(),
            leaves: store.clone(),
            balances: store.clone(),
            attendance: store,
            emails: Arc::new(EmailRegistry::new()),
            standard_work_minutes,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()), 480)
    }

    pub fn leave_service(&self) -> LeaveService {
        LeaveService::new(self.leaves.clone(), self.balances.clone(), self.users.clone())
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.users.clone(), self.emails.clone())
    }

    pub fn attendance_service(&self) -> AttendanceService {
        AttendanceService::new(self.attendance.clone(), self.standard_work_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_state_is_clone() {
        // actix clones app data into every worker
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<AppState>();
    }
}
