use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
}

impl Attendance {
    /// Minutes between check-in and check-out, once checked out.
    pub fn worked_minutes(&self) -> Option<i64> {
        self.check_out
            .map(|out| (out - self.check_in).num_minutes().max(0))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceView {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub worked_minutes: Option<i64>,
    /// minutes beyond the standard work day
    pub extra_minutes: Option<i64>,
}

impl AttendanceView {
    pub fn new(record: Attendance, standard_work_minutes: i64) -> Self {
        let worked = record.worked_minutes();
        Self {
            id: record.id,
            user_id: record.user_id,
            date: record.date,
            check_in: record.check_in,
            check_out: record.check_out,
            worked_minutes: worked,
            extra_minutes: worked.map(|m| (m - standard_work_minutes).max(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(hours: i64) -> Attendance {
        let check_in = Utc.with_ymd_and_hms(2026, 10, 28, 9, 0, 0).unwrap();
        Attendance {
            id: 1,
            user_id: 2,
            date: check_in.date_naive(),
            check_in,
            check_out: Some(check_in + Duration::hours(hours)),
        }
    }

    #[test]
    fn extra_minutes_count_past_the_standard_day() {
        let view = AttendanceView::new(record(9), 480);
        assert_eq!(view.worked_minutes, Some(540));
        assert_eq!(view.extra_minutes, Some(60));
    }

    #[test]
    fn short_days_have_no_extra_time() {
        let view = AttendanceView::new(record(4), 480);
        assert_eq!(view.worked_minutes, Some(240));
        assert_eq!(view.extra_minutes, Some(0));
    }

    #[test]
    fn open_records_have_no_totals() {
        let mut open = record(1);
        open.check_out = None;
        let view = AttendanceView::new(open, 480);
        assert_eq!(view.worked_minutes, None);
        assert_eq!(view.extra_minutes, None);
    }
}
