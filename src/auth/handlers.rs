use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, AppResult},
    model::user::NewUser,
    models::{LoginReqDto, LoginResponse, RegisterReq},
    state::AppState,
    store::StoreError,
    utils::email_registry::normalize,
};
use actix_web::{HttpResponse, web};
use tracing::{debug, info, instrument};

const MIN_PASSWORD_LEN: usize = 6;

/// User registration handler
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = crate::model::user::User),
        (status = 400, description = "Missing email or password, or password too short"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    payload: web::Json<RegisterReq>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    let email = normalize(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password must not be empty".to_string(),
        ));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if !state.emails.is_available(&email, state.users.as_ref()).await? {
        info!("Registration rejected: email taken");
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash =
        hash_password(&payload.password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;

    // Safe to insert after the availability check; the unique key still
    // catches a concurrent registration of the same email.
    let user = match state
        .users
        .create_user(NewUser {
            email: email.clone(),
            password_hash,
            full_name: payload
                .full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            role: payload.role.unwrap_or_default(),
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    state.emails.mark_taken(&email).await;
    info!(user_id = user.id, role = %user.role, "User registered");

    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Bearer token and the account", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(state, config, payload),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    // 1️⃣ Basic validation
    let email = normalize(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    // 2️⃣ Fetch user
    debug!("Fetching user from store");
    let Some(user) = state.users.find_user_by_email(&email).await? else {
        info!("Invalid credentials: user not found");
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&payload.password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    }

    if !user.is_active {
        info!(user_id = user.id, "Login refused: account disabled");
        return Err(AppError::Authorization("Account is disabled".to_string()));
    }

    // 4️⃣ Generate access token
    let token = generate_access_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| anyhow::anyhow!("token encoding failed: {e}"))?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

/// The caller's own account.
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Caller account", body = crate::model::user::User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn profile(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(user))
}
