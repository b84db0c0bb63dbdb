use crate::model::{
    attendance::AttendanceView,
    leave_balance::{BalanceCounters, LeaveBalance},
    leave_request::{LeaveRequest, LeaveStatus, LeaveType, LeaveView, Party},
    role::Role,
    user::User,
};
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use crate::service::{
    leave::{CreateLeave, LeaveFilter, ReviewLeave},
    user::UpdateUser,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dayflow API",
        version = "1.0.0",
        description = r#"
## Dayflow

Backend for a small-organization HR tool: accounts, leave requests with an
admin approval workflow, per-user leave balances and daily attendance.

### 🔹 Key Features
- **Accounts**
  - Register, log in, read and edit profiles
- **Leave Management**
  - Submit requests, approve or reject them, read and set balances
- **Attendance**
  - Daily check-in and check-out with worked and extra minutes

### 🔐 Security
Everything except register, login and health needs a **JWT Bearer** token.
Employees only see and act on their own records; **admins** see and act on everyone's.

### 📦 Response Format
- JSON bodies; every error is `{"message": "..."}`
"#,
    ),
    paths(
        crate::api::health::health,

        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::profile,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::review_leave,
        crate::api::leave_request::own_balance,
        crate::api::leave_request::user_balance,
        crate::api::leave_request::set_balance,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::attendance_list
    ),
    components(
        schemas(
            Role,
            User,
            UpdateUser,
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            Party,
            LeaveView,
            LeaveFilter,
            CreateLeave,
            ReviewLeave,
            LeaveBalance,
            BalanceCounters,
            AttendanceView
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Auth", description = "Registration, login and the caller's profile"),
        (name = "Leave", description = "Leave requests and balances"),
        (name = "User", description = "Account management"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
