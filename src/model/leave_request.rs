use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Paid,
    Sick,
    Unpaid,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Statuses a reviewer may move a request into.
    pub fn is_decision(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    /// owner of the request
    pub user_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// day count as submitted by the owner
    pub days: u32,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub admin_comment: Option<String>,
    pub reviewed_by: Option<u64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Human-readable reference to a user attached to a leave record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Party {
    pub id: u64,
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
}

/// A leave request joined with its owner and reviewer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveView {
    #[serde(flatten)]
    pub request: LeaveRequest,
    pub owner: Option<Party>,
    pub reviewer: Option<Party>,
}

#[derive(Debug, Clone)]
pub struct NewLeave {
    pub user_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Reviewer decision written onto a request.
#[derive(Debug, Clone)]
pub struct LeaveReview {
    pub status: LeaveStatus,
    pub admin_comment: Option<String>,
    pub reviewed_by: u64,
    pub reviewed_at: DateTime<Utc>,
}
