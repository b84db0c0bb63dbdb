use std::str::FromStr;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::TryStreamExt;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{AttendanceStore, BalanceStore, LeaveStore, StoreError, StoreResult, UserStore};
use crate::model::{
    attendance::Attendance,
    leave_balance::{BalanceCounters, LeaveBalance},
    leave_request::{LeaveRequest, LeaveReview, LeaveStatus, LeaveView, NewLeave, Party},
    user::{NewUser, User, UserPatch},
};
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse_column<T: FromStr>(column: &str, raw: &str) -> StoreResult<T> {
    raw.parse()
        .map_err(|_| StoreError::Backend(anyhow!("unexpected {column} value {raw:?} in database")))
}

// ---------------------------------------------------------------------------
// Row types. Enum columns are stored as text and parsed on the way out.
// ---------------------------------------------------------------------------

#[derive(FromRow)]
struct UserRow {
    id: u64,
    email: String,
    password_hash: String,
    full_name: Option<String>,
    avatar_url: Option<String>,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            role: parse_column("role", &row.role)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    user_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: u32,
    reason: Option<String>,
    status: String,
    admin_comment: Option<String>,
    reviewed_by: Option<u64>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_name: Option<String>,
    owner_email: Option<String>,
    reviewer_name: Option<String>,
}

impl TryFrom<LeaveRow> for LeaveView {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> StoreResult<Self> {
        // LEFT JOIN: a missing email means the owner row is gone.
        let owner = row.owner_email.map(|email| Party {
            id: row.user_id,
            full_name: row.owner_name,
            email: Some(email),
        });
        let reviewer = row.reviewed_by.map(|id| Party {
            id,
            full_name: row.reviewer_name,
            email: None,
        });

        Ok(LeaveView {
            request: LeaveRequest {
                id: row.id,
                user_id: row.user_id,
                leave_type: parse_column("leave_type", &row.leave_type)?,
                start_date: row.start_date,
                end_date: row.end_date,
                days: row.days,
                reason: row.reason,
                status: parse_column("status", &row.status)?,
                admin_comment: row.admin_comment,
                reviewed_by: row.reviewed_by,
                reviewed_at: row.reviewed_at,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            owner,
            reviewer,
        })
    }
}

#[derive(FromRow)]
struct BalanceRow {
    user_id: u64,
    paid_days: u32,
    sick_days: u32,
    unpaid_days: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BalanceRow> for LeaveBalance {
    fn from(row: BalanceRow) -> Self {
        LeaveBalance {
            user_id: row.user_id,
            paid_days: row.paid_days,
            sick_days: row.sick_days,
            unpaid_days: row.unpaid_days,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    check_in: DateTime<Utc>,
    check_out: Option<DateTime<Utc>>,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Attendance {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
        }
    }
}

const USER_COLUMNS: &str = r#"
    id, email, password_hash, full_name, avatar_url, role, is_active, created_at, updated_at
"#;

const LEAVE_SELECT: &str = r#"
    SELECT
        l.id, l.user_id, l.leave_type, l.start_date, l.end_date, l.days, l.reason,
        l.status, l.admin_comment, l.reviewed_by, l.reviewed_at, l.created_at, l.updated_at,
        o.full_name AS owner_name,
        o.email AS owner_email,
        r.full_name AS reviewer_name
    FROM leave_requests l
    LEFT JOIN users o ON o.id = l.user_id
    LEFT JOIN users r ON r.id = l.reviewed_by
"#;

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, full_name, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_ref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_user(id)
            .await?
            .ok_or_else(|| StoreError::Backend(anyhow!("user {id} vanished after insert")))
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update_user(&self, id: u64, patch: UserPatch) -> StoreResult<Option<User>> {
        let mut assignments = Vec::new();
        if let Some(full_name) = patch.full_name {
            assignments.push(("full_name", SqlValue::String(full_name)));
        }
        if let Some(avatar_url) = patch.avatar_url {
            assignments.push(("avatar_url", SqlValue::String(avatar_url)));
        }
        if let Some(role) = patch.role {
            assignments.push(("role", SqlValue::String(role.to_string())));
        }
        if let Some(is_active) = patch.is_active {
            assignments.push(("is_active", SqlValue::Bool(is_active)));
        }
        assignments.push(("updated_at", SqlValue::DateTime(Utc::now())));

        if let Some(update) = build_update_sql("users", assignments, "id", id) {
            debug!(sql = %update.sql, user_id = id, "Updating user");
            execute_update(&self.pool, update).await?;
        }

        // rows_affected is 0 for unchanged rows on MySQL, so re-read instead.
        self.find_user(id).await
    }

    async fn delete_user(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        let emails: Vec<String> = sqlx::query_scalar::<_, String>("SELECT email FROM users")
            .fetch(&self.pool)
            .try_collect()
            .await?;
        Ok(emails)
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert_leave(&self, leave: NewLeave) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, leave_type, start_date, end_date, days, reason, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.user_id)
        .bind(leave.leave_type.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.days)
        .bind(&leave.reason)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(leave.created_at)
        .bind(leave.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveView>> {
        let sql = format!("{LEAVE_SELECT} WHERE l.id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveView::try_from)
            .transpose()
    }

    async fn list_leaves(
        &self,
        owner: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> StoreResult<Vec<LeaveView>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(user_id) = owner {
            where_sql.push_str(" AND l.user_id = ?");
            args.push(FilterValue::U64(user_id));
        }

        if let Some(status) = status.as_ref() {
            where_sql.push_str(" AND l.status = ?");
            args.push(FilterValue::Str(status.as_ref()));
        }

        let sql = format!("{LEAVE_SELECT}{where_sql} ORDER BY l.created_at DESC, l.id DESC");
        debug!(sql = %sql, "Listing leave requests");

        let mut query = sqlx::query_as::<_, LeaveRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
            };
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveView::try_from)
            .collect()
    }

    async fn record_review(&self, id: u64, review: LeaveReview) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, admin_comment = ?, reviewed_by = ?, reviewed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(review.status.as_ref())
        .bind(&review.admin_comment)
        .bind(review.reviewed_by)
        .bind(review.reviewed_at)
        .bind(review.reviewed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl MySqlStore {
    async fn fetch_balance(&self, user_id: u64) -> StoreResult<LeaveBalance> {
        let row = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT user_id, paid_days, sick_days, unpaid_days, created_at, updated_at
            FROM leave_balances
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

#[async_trait]
impl BalanceStore for MySqlStore {
    async fn get_or_init_balance(
        &self,
        user_id: u64,
        defaults: BalanceCounters,
    ) -> StoreResult<LeaveBalance> {
        let now = Utc::now();
        // No-op update on conflict keeps the first writer's counters.
        sqlx::query(
            r#"
            INSERT INTO leave_balances
                (user_id, paid_days, sick_days, unpaid_days, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE user_id = user_id
            "#,
        )
        .bind(user_id)
        .bind(defaults.paid_days)
        .bind(defaults.sick_days)
        .bind(defaults.unpaid_days)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch_balance(user_id).await
    }

    async fn upsert_balance(
        &self,
        user_id: u64,
        counters: BalanceCounters,
    ) -> StoreResult<LeaveBalance> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO leave_balances
                (user_id, paid_days, sick_days, unpaid_days, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                paid_days = VALUES(paid_days),
                sick_days = VALUES(sick_days),
                unpaid_days = VALUES(unpaid_days),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(user_id)
        .bind(counters.paid_days)
        .bind(counters.sick_days)
        .bind(counters.unpaid_days)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch_balance(user_id).await
    }
}

const ATTENDANCE_COLUMNS: &str = "id, user_id, date, check_in, check_out";

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Attendance> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, check_in)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(Attendance {
            id: result.last_insert_id(),
            user_id,
            date,
            check_in: at,
            check_out: None,
        })
    }

    async fn check_out(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Attendance>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?
            WHERE user_id = ?
            AND date = ?
            AND check_out IS NULL
            "#,
        )
        .bind(at)
        .bind(user_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(row.into()))
    }

    async fn list_attendance(&self, user_id: Option<u64>) -> StoreResult<Vec<Attendance>> {
        let rows = match user_id {
            Some(user_id) => {
                let sql = format!(
                    "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? ORDER BY date DESC, id DESC"
                );
                sqlx::query_as::<_, AttendanceRow>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ATTENDANCE_COLUMNS} FROM attendance ORDER BY date DESC, id DESC"
                );
                sqlx::query_as::<_, AttendanceRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(Attendance::from).collect())
    }
}
