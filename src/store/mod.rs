//! Persistence seams. Each entity has its own store trait; `mysql` is the
//! production backend and `memory` backs local demos and tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;

use crate::model::{
    attendance::Attendance,
    leave_balance::{BalanceCounters, LeaveBalance},
    leave_request::{LeaveReview, LeaveStatus, LeaveView, NewLeave},
    user::{NewUser, User, UserPatch},
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum StoreError {
    /// A unique key rejected the write. Carries the name of the clashing field.
    #[display(fmt = "duplicate {}", _0)]
    Duplicate(String),

    /// A foreign key points at a row that does not exist (or no longer does).
    #[display(fmt = "missing {}", _0)]
    MissingReference(String),

    #[display(fmt = "{}", _0)]
    Backend(anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            // SQLSTATE 23000 covers unique, foreign key and NOT NULL failures alike
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference("Referenced record".to_string());
            }
        }
        StoreError::Backend(e.into())
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Returns `None` when no user has this id.
    async fn update_user(&self, id: u64, patch: UserPatch) -> StoreResult<Option<User>>;

    /// Hard delete. Cascades to the user's leave requests, balance and
    /// attendance. Returns false when no user has this id.
    async fn delete_user(&self, id: u64) -> StoreResult<bool>;

    /// Every registered email, for warming the email registry.
    async fn all_emails(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Returns the id of the new request.
    async fn insert_leave(&self, leave: NewLeave) -> StoreResult<u64>;

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveView>>;

    /// Newest first. `owner = None` lists every user's requests.
    async fn list_leaves(
        &self,
        owner: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> StoreResult<Vec<LeaveView>>;

    /// Unconditional write of the review fields. Returns false when no
    /// request has this id.
    async fn record_review(&self, id: u64, review: LeaveReview) -> StoreResult<bool>;
}

#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Returns the existing balance, or atomically inserts `defaults` and
    /// returns that. Never creates two rows for one user.
    async fn get_or_init_balance(
        &self,
        user_id: u64,
        defaults: BalanceCounters,
    ) -> StoreResult<LeaveBalance>;

    /// Create-or-replace all three counters.
    async fn upsert_balance(
        &self,
        user_id: u64,
        counters: BalanceCounters,
    ) -> StoreResult<LeaveBalance>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Fails with `Duplicate` when the user already has a record for `date`.
    async fn check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Attendance>;

    /// Closes the open record for `date`. `None` when there is none.
    async fn check_out(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Attendance>>;

    /// Newest date first.
    async fn list_attendance(&self, user_id: Option<u64>) -> StoreResult<Vec<Attendance>>;
}
