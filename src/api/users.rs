use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::api::validation::{validate_password_len, validate_payload, validate_username};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::AccountStatus;
use crate::repositories;
use crate::schemas::user::{AdminUserCreate, AdminUserUpdate, UserListQuery, UserResponse};
use crate::schemas::ApiResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user).delete(delete_user))
}

async fn list_users(
    Query(page): Query<PageQuery>,
    Query(params): Query<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<UserResponse>>>, ApiError> {
    let page = page.resolve(state.settings());

    let users = repositories::users::list(state.db(), params.role, page.limit(), page.offset())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;
    let total = repositories::users::count(state.db(), params.role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;

    let items = users.into_iter().map(UserResponse::from_db).collect();
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(items, total, page))))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(user_not_found)?;

    Ok(Json(ApiResponse::ok(UserResponse::from_db(user))))
}

async fn create_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    validate_payload(&payload)?;
    validate_username(&payload.username)?;
    validate_password_len(&payload.password)?;

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
            role: payload.role,
            account_status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        role = ?user.role,
        "Admin created user"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_code("USER_CREATED", "User created", UserResponse::from_db(user))),
    ))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    validate_payload(&payload)?;

    if let Some(email) = payload.email.as_deref() {
        let taken = repositories::users::email_taken_by_other(state.db(), email, &user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check email"))?;
        if taken {
            return Err(ApiError::Conflict("EMAIL_EXISTS", "Email is already in use".to_string()));
        }
    }

    let hashed_password = match payload.password.as_deref() {
        Some(password) => {
            validate_password_len(password)?;
            Some(
                security::hash_password(password)
                    .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
            )
        }
        None => None,
    };

    let user = repositories::users::update(
        state.db(),
        &user_id,
        repositories::users::UpdateUser {
            email: payload.email.map(|email| email.trim().to_string()),
            role: payload.role,
            account_status: payload.account_status,
            hashed_password,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?
    .ok_or_else(user_not_found)?;

    Ok(Json(ApiResponse::with_code("USER_UPDATED", "User updated", UserResponse::from_db(user))))
}

async fn delete_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::validation("Admins cannot delete their own account"));
    }

    let deleted = repositories::users::delete(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;
    if !deleted {
        return Err(user_not_found());
    }

    Ok(Json(ApiResponse::message("USER_DELETED", "User deleted")))
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("USER_NOT_FOUND", "User not found".to_string())
}
