use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{AttendanceStore, BalanceStore, LeaveStore, StoreError, StoreResult, UserStore};
use crate::model::{
    attendance::Attendance,
    leave_balance::{BalanceCounters, LeaveBalance},
    leave_request::{LeaveRequest, LeaveReview, LeaveStatus, LeaveView, NewLeave, Party},
    user::{NewUser, User, UserPatch},
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: HashMap<u64, User>,
    leaves: HashMap<u64, LeaveRequest>,
    balances: HashMap<u64, LeaveBalance>,
    attendance: HashMap<u64, Attendance>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn party(&self, id: u64, with_email: bool) -> Option<Party> {
        self.users.get(&id).map(|u| Party {
            id: u.id,
            full_name: u.full_name.clone(),
            email: with_email.then(|| u.email.clone()),
        })
    }

    /// Stands in for the foreign keys of the SQL schema.
    fn require_user(&self, id: u64) -> StoreResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference("User".to_string()))
        }
    }

    fn view(&self, request: &LeaveRequest) -> LeaveView {
        LeaveView {
            owner: self.party(request.user_id, true),
            reviewer: request.reviewed_by.and_then(|id| self.party(id, false)),
            request: request.clone(),
        }
    }
}

/// Process-local store. Every table sits behind one mutex, so each trait call
/// is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.lock()?;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        let now = Utc::now();
        let id = t.next_id();
        let created = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            avatar_url: None,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.lock()?.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn update_user(&self, id: u64, patch: UserPatch) -> StoreResult<Option<User>> {
        let mut t = self.lock()?;
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(full_name) = patch.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(avatar_url) = patch.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        let mut t = self.lock()?;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }

        t.leaves.retain(|_, l| l.user_id != id);
        for leave in t.leaves.values_mut() {
            if leave.reviewed_by == Some(id) {
                leave.reviewed_by = None;
            }
        }
        t.balances.remove(&id);
        t.attendance.retain(|_, a| a.user_id != id);
        Ok(true)
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.users.values().map(|u| u.email.clone()).collect())
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert_leave(&self, leave: NewLeave) -> StoreResult<u64> {
        let mut t = self.lock()?;
        t.require_user(leave.user_id)?;

        let id = t.next_id();
        t.leaves.insert(
            id,
            LeaveRequest {
                id,
                user_id: leave.user_id,
                leave_type: leave.leave_type,
                start_date: leave.start_date,
                end_date: leave.end_date,
                days: leave.days,
                reason: leave.reason,
                status: LeaveStatus::Pending,
                admin_comment: None,
                reviewed_by: None,
                reviewed_at: None,
                created_at: leave.created_at,
                updated_at: leave.created_at,
            },
        );
        Ok(id)
    }

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveView>> {
        let t = self.lock()?;
        Ok(t.leaves.get(&id).map(|l| t.view(l)))
    }

    async fn list_leaves(
        &self,
        owner: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> StoreResult<Vec<LeaveView>> {
        let t = self.lock()?;
        let mut rows: Vec<&LeaveRequest> = t
            .leaves
            .values()
            .filter(|l| owner.is_none_or(|o| l.user_id == o))
            .filter(|l| status.is_none_or(|s| l.status == s))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows.into_iter().map(|l| t.view(l)).collect())
    }

    async fn record_review(&self, id: u64, review: LeaveReview) -> StoreResult<bool> {
        let mut t = self.lock()?;
        let Some(leave) = t.leaves.get_mut(&id) else {
            return Ok(false);
        };

        leave.status = review.status;
        leave.admin_comment = review.admin_comment;
        leave.reviewed_by = Some(review.reviewed_by);
        leave.reviewed_at = Some(review.reviewed_at);
        leave.updated_at = review.reviewed_at;
        Ok(true)
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn get_or_init_balance(
        &self,
        user_id: u64,
        defaults: BalanceCounters,
    ) -> StoreResult<LeaveBalance> {
        let mut t = self.lock()?;
        t.require_user(user_id)?;
        let now = Utc::now();
        let balance = t.balances.entry(user_id).or_insert_with(|| LeaveBalance {
            user_id,
            paid_days: defaults.paid_days,
            sick_days: defaults.sick_days,
            unpaid_days: defaults.unpaid_days,
            created_at: now,
            updated_at: now,
        });
        Ok(balance.clone())
    }

    async fn upsert_balance(
        &self,
        user_id: u64,
        counters: BalanceCounters,
    ) -> StoreResult<LeaveBalance> {
        let mut t = self.lock()?;
        t.require_user(user_id)?;
        let now = Utc::now();
        let balance = t.balances.entry(user_id).or_insert_with(|| LeaveBalance {
            user_id,
            paid_days: 0,
            sick_days: 0,
            unpaid_days: 0,
            created_at: now,
            updated_at: now,
        });
        balance.paid_days = counters.paid_days;
        balance.sick_days = counters.sick_days;
        balance.unpaid_days = counters.unpaid_days;
        balance.updated_at = now;
        Ok(balance.clone())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Attendance> {
        let mut t = self.lock()?;
        t.require_user(user_id)?;
        if t
            .attendance
            .values()
            .any(|a| a.user_id == user_id && a.date == date)
        {
            return Err(StoreError::Duplicate("attendance".to_string()));
        }

        let id = t.next_id();
        let record = Attendance {
            id,
            user_id,
            date,
            check_in: at,
            check_out: None,
        };
        t.attendance.insert(id, record.clone());
        Ok(record)
    }

    async fn check_out(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Attendance>> {
        let mut t = self.lock()?;
        let open = t
            .attendance
            .values_mut()
            .find(|a| a.user_id == user_id && a.date == date && a.check_out.is_none());

        Ok(open.map(|record| {
            record.check_out = Some(at);
            record.clone()
        }))
    }

    async fn list_attendance(&self, user_id: Option<u64>) -> StoreResult<Vec<Attendance>> {
        let mut rows: Vec<Attendance> = self
            .lock()?
            .attendance
            .values()
            .filter(|a| user_id.is_none_or(|u| a.user_id == u))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{leave_request::LeaveType, role::Role};

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                full_name: Some(email.to_string()),
                role: Role::Employee,
            })
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        seed_user(&store, "a@dayflow.io").await;
        let err = store
            .create_user(NewUser {
                email: "a@dayflow.io".to_string(),
                password_hash: "x".to_string(),
                full_name: None,
                role: Role::Admin,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[actix_web::test]
    async fn deleting_a_user_cascades() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "b@dayflow.io").await;
        let today = Utc::now();
        store
            .insert_leave(NewLeave {
                user_id: user.id,
                leave_type: LeaveType::Paid,
                start_date: today.date_naive(),
                end_date: today.date_naive(),
                days: 1,
                reason: None,
                created_at: today,
            })
            .await
            .unwrap();
        store
            .get_or_init_balance(user.id, BalanceCounters::default())
            .await
            .unwrap();
        store
            .check_in(user.id, today.date_naive(), today)
            .await
            .unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.list_leaves(None, None).await.unwrap().is_empty());
        assert!(store.list_attendance(None).await.unwrap().is_empty());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[actix_web::test]
    async fn second_check_in_on_the_same_day_is_a_duplicate() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "c@dayflow.io").await;
        let now = Utc::now();
        store.check_in(user.id, now.date_naive(), now).await.unwrap();
        let err = store
            .check_in(user.id, now.date_naive(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[actix_web::test]
    async fn rows_for_unknown_users_are_rejected() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let err = store
            .check_in(404, now.date_naive(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));

        let err = store
            .insert_leave(NewLeave {
                user_id: 404,
                leave_type: LeaveType::Sick,
                start_date: now.date_naive(),
                end_date: now.date_naive(),
                days: 1,
                reason: None,
                created_at: now,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));

        let err = store
            .upsert_balance(404, BalanceCounters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }
}
