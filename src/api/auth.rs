use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentSession, CurrentUser};
use crate::api::validation::{validate_password_len, validate_payload, validate_username};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::schemas::auth::{LoginRequest, SignupRequest, TokenResponse};
use crate::schemas::user::UserResponse;
use crate::schemas::ApiResponse;

/// Max attempts per window for login/signup.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    validate_payload(&payload)?;
    validate_username(&payload.username)?;
    validate_password_len(&payload.password)?;

    enforce_rate_limit(&state, "signup", &payload.username).await?;

    let existing = repositories::users::exists_by_username_or_email(
        state.db(),
        &payload.username,
        &payload.email,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;

    if existing.is_some() {
        return Err(ApiError::Conflict(
            "USER_EXISTS",
            "User with this username or email already exists".to_string(),
        ));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            email: payload.email.trim(),
            hashed_password,
            role: UserRole::Student,
            account_status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict(
                "USER_EXISTS",
                "User with this username or email already exists".to_string(),
            )
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
    let response = issue_token(&state, user)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_code("USER_CREATED", "Signed up", response))))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    enforce_rate_limit(&state, "login", &payload.username).await?;

    let user = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active() {
        return Err(ApiError::Forbidden("ACCOUNT_INACTIVE", "Inactive user".to_string()));
    }

    repositories::users::touch_last_online(state.db(), &user.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record login"))?;

    let response = issue_token(&state, user)?;
    Ok(Json(ApiResponse::with_code("LOGIN_SUCCESS", "Logged in", response)))
}

async fn logout(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let claims = security::verify_token(&session.token, state.settings())
        .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;
    let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
        .map(|value| PrimitiveDateTime::new(value.date(), value.time()))
        .map_err(|e| ApiError::internal(e, "Invalid token expiry"))?;

    repositories::token_blocklist::revoke(
        state.db(),
        &security::token_digest(&session.token),
        &session.user.id,
        expires_at,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to revoke token"))?;

    tracing::info!(user_id = %session.user.id, "User logged out");
    Ok(Json(ApiResponse::message("LOGOUT_SUCCESS", "Logged out")))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(UserResponse::from_db(user)))
}

async fn enforce_rate_limit(state: &AppState, action: &str, identity: &str) -> Result<(), ApiError> {
    let rate_key = format!("rl:{action}:{identity}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests("Too many attempts, try again later"))
    }
}

fn issue_token(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    })
}
