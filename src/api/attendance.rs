use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::service::attendance::AttendanceFilter;
use crate::state::AppState;
use actix_web::{HttpResponse, web};

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 201, description = "Checked in", body = crate::model::attendance::AttendanceView),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let record = state.attendance_service().check_in(&auth).await?;
    Ok(HttpResponse::Created().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out", body = crate::model::attendance::AttendanceView),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let record = state.attendance_service().check_out(&auth).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Attendance records, newest day first", body = [crate::model::attendance::AttendanceView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employees may only list their own records")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<AttendanceFilter>,
) -> AppResult<HttpResponse> {
    let records = state
        .attendance_service()
        .list(&auth, query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(records))
}
