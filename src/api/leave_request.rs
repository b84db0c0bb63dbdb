use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::model::leave_balance::BalanceCounters;
use crate::service::leave::{CreateLeave, LeaveFilter, ReviewLeave};
use crate::state::AppState;
use actix_web::{HttpResponse, web};

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "All requests for admins, own requests otherwise; newest first", body = [crate::model::leave_request::LeaveView]),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    let leaves = state
        .leave_service()
        .list(&auth, query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = crate::model::leave_request::LeaveView),
        (status = 400, description = "Invalid leave type, day count or date range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> AppResult<HttpResponse> {
    let leave = state
        .leave_service()
        .create(&auth, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Approve / reject (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to review")
    ),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Leave request reviewed", body = crate::model::leave_request::LeaveView),
        (status = 400, description = "Status must be approved or rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn review_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> AppResult<HttpResponse> {
    let leave_id = path.into_inner();
    let leave = state
        .leave_service()
        .review(&auth, leave_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Leave balance
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/balance",
    responses(
        (status = 200, description = "Caller's balance, created with defaults on first read", body = crate::model::leave_balance::LeaveBalance),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn own_balance(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let balance = state.leave_service().balance(&auth, None).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[utoipa::path(
    get,
    path = "/api/leaves/balance/{user_id}",
    params(
        ("user_id" = u64, Path, description = "Whose balance to read")
    ),
    responses(
        (status = 200, description = "Balance, created with defaults on first read", body = crate::model::leave_balance::LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employees may only read their own balance"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn user_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let balance = state
        .leave_service()
        .balance(&auth, Some(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[utoipa::path(
    put,
    path = "/api/leaves/balance/{user_id}",
    params(
        ("user_id" = u64, Path, description = "Whose balance to replace")
    ),
    request_body = BalanceCounters,
    responses(
        (status = 200, description = "Balance after replacement", body = crate::model::leave_balance::LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn set_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<BalanceCounters>,
) -> AppResult<HttpResponse> {
    let balance = state
        .leave_service()
        .set_balance(&auth, path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}
