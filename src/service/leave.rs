//! Leave request workflow and leave balance bookkeeping.
//!
//! A request starts `pending` and an admin moves it to `approved` or
//! `rejected`. Reviews are written unconditionally: reviewing an already
//! reviewed request overwrites the previous decision (last write wins).
//! Balances are never adjusted by a review; admins set them explicitly.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::{
    leave_balance::{BalanceCounters, LeaveBalance},
    leave_request::{LeaveReview, LeaveStatus, LeaveType, LeaveView, NewLeave},
};
use crate::store::{BalanceStore, LeaveStore, UserStore};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "paid")]
    pub leave_type: String,
    #[schema(example = "2026-11-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-11-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Day count as entered by the employee. Not recomputed from the dates.
    #[schema(example = 3)]
    pub days: i64,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewLeave {
    /// approved or rejected
    #[schema(example = "approved")]
    pub status: String,
    #[schema(example = "Enjoy your time off")]
    pub admin_comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<String>,
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_leave_type(raw: &str) -> AppResult<LeaveType> {
    raw.trim().parse().map_err(|_| {
        AppError::Validation("Invalid leave type. Allowed: paid, sick, unpaid".to_string())
    })
}

fn parse_status(raw: &str) -> AppResult<LeaveStatus> {
    raw.trim().parse().map_err(|_| {
        AppError::Validation("Invalid status. Allowed: pending, approved, rejected".to_string())
    })
}

#[derive(Clone)]
pub struct LeaveService {
    leaves: Arc<dyn LeaveStore>,
    balances: Arc<dyn BalanceStore>,
    users: Arc<dyn UserStore>,
}

impl LeaveService {
    pub fn new(
        leaves: Arc<dyn LeaveStore>,
        balances: Arc<dyn BalanceStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            leaves,
            balances,
            users,
        }
    }

    /// Admins see every request; everyone else sees their own. Newest first.
    /// Reviewer details are only disclosed to admins.
    pub async fn list(&self, caller: &AuthUser, filter: LeaveFilter) -> AppResult<Vec<LeaveView>> {
        let status = filter.status.as_deref().map(parse_status).transpose()?;
        let owner = (!caller.is_admin()).then_some(caller.user_id);

        let mut rows = self.leaves.list_leaves(owner, status).await?;
        if !caller.is_admin() {
            for row in &mut rows {
                row.reviewer = None;
            }
        }
        Ok(rows)
    }

    pub async fn create(&self, caller: &AuthUser, input: CreateLeave) -> AppResult<LeaveView> {
        let leave_type = parse_leave_type(&input.leave_type)?;

        if input.days < 1 {
            return Err(AppError::Validation("days must be at least 1".to_string()));
        }
        let days = u32::try_from(input.days)
            .map_err(|_| AppError::Validation("days is too large".to_string()))?;

        if input.start_date > input.end_date {
            return Err(AppError::Validation(
                "start_date cannot be after end_date".to_string(),
            ));
        }

        if self.users.find_user(caller.user_id).await?.is_none() {
            return Err(AppError::not_found("User"));
        }

        let id = self
            .leaves
            .insert_leave(NewLeave {
                user_id: caller.user_id,
                leave_type,
                start_date: input.start_date,
                end_date: input.end_date,
                days,
                reason: clean_text(input.reason),
                created_at: Utc::now(),
            })
            .await?;

        info!(leave_id = id, user_id = caller.user_id, %leave_type, days, "Leave request submitted");

        self.leaves
            .find_leave(id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request"))
    }

    pub async fn review(
        &self,
        caller: &AuthUser,
        id: u64,
        input: ReviewLeave,
    ) -> AppResult<LeaveView> {
        caller.require_admin()?;

        let status = parse_status(&input.status)?;
        if !status.is_decision() {
            return Err(AppError::Validation(
                "status must be approved or rejected".to_string(),
            ));
        }

        let Some(current) = self.leaves.find_leave(id).await? else {
            return Err(AppError::not_found("Leave request"));
        };

        let review = LeaveReview {
            status,
            admin_comment: clean_text(input.admin_comment),
            reviewed_by: caller.user_id,
            reviewed_at: Utc::now(),
        };
        if !self.leaves.record_review(id, review).await? {
            return Err(AppError::not_found("Leave request"));
        }

        info!(
            leave_id = id,
            reviewer = caller.user_id,
            from = %current.request.status,
            to = %status,
            "Leave request reviewed"
        );

        self.leaves
            .find_leave(id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request"))
    }

    /// Reads the target's balance, creating the default allowance on first
    /// access.
    pub async fn balance(&self, caller: &AuthUser, target: Option<u64>) -> AppResult<LeaveBalance> {
        let target = target.unwrap_or(caller.user_id);
        caller.require_self_or_admin(target)?;
        self.ensure_user(target).await?;

        Ok(self
            .balances
            .get_or_init_balance(target, BalanceCounters::default())
            .await?)
    }

    /// Replaces all three counters.
    pub async fn set_balance(
        &self,
        caller: &AuthUser,
        target: u64,
        counters: BalanceCounters,
    ) -> AppResult<LeaveBalance> {
        caller.require_admin()?;
        self.ensure_user(target).await?;

        let balance = self.balances.upsert_balance(target, counters).await?;
        info!(user_id = target, admin = caller.user_id, ?counters, "Leave balance set");
        Ok(balance)
    }

    async fn ensure_user(&self, id: u64) -> AppResult<()> {
        match self.users.find_user(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("User")),
        }
    }
}
