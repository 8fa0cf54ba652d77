use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::is_unique_violation_on;
use crate::repositories;
use crate::repositories::courses::CourseFilter;
use crate::schemas::course::{CourseCreate, CourseListQuery, CourseResponse, CourseUpdate};
use crate::schemas::ApiResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/code/:course_code", get(get_course_by_code))
        .route("/:course_id", get(get_course).patch(update_course).delete(delete_course))
}

async fn create_course(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<ApiResponse<CourseResponse>>), ApiError> {
    validate_payload(&payload)?;
    ensure_code_free(&state, &payload.course_code, None).await?;
    ensure_name_free(&state, &payload.course_name, None).await?;

    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            course_code: &payload.course_code,
            course_name: &payload.course_name,
            course_category: &payload.course_category,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        write_conflict(&e, &payload.course_code, &payload.course_name)
            .unwrap_or_else(|| ApiError::internal(e, "Failed to create course"))
    })?;

    tracing::info!(admin_id = %admin.id, course_code = %course.course_code, "Course created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_code(
            "COURSE_ADDED",
            "Course created",
            CourseResponse::from_db(course),
        )),
    ))
}

async fn list_courses(
    Query(page): Query<PageQuery>,
    Query(params): Query<CourseListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<CourseResponse>>>, ApiError> {
    let page = page.resolve(state.settings());
    let filter = CourseFilter { keyword: params.keyword.clone(), ids: params.id_list() };

    let courses = repositories::courses::list(state.db(), &filter, page.limit(), page.offset())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;
    let total = repositories::courses::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count courses"))?;

    let items = courses.into_iter().map(CourseResponse::from_db).collect();
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(items, total, page))))
}

async fn get_course(
    Path(course_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CourseResponse>>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(course_not_found)?;

    Ok(Json(ApiResponse::ok(CourseResponse::from_db(course))))
}

async fn get_course_by_code(
    Path(course_code): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CourseResponse>>, ApiError> {
    let course = repositories::courses::find_by_code(state.db(), &course_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(course_not_found)?;

    Ok(Json(ApiResponse::ok(CourseResponse::from_db(course))))
}

async fn update_course(
    Path(course_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<ApiResponse<CourseResponse>>, ApiError> {
    validate_payload(&payload)?;
    if let Some(code) = payload.course_code.as_deref() {
        ensure_code_free(&state, code, Some(&course_id)).await?;
    }
    if let Some(name) = payload.course_name.as_deref() {
        ensure_name_free(&state, name, Some(&course_id)).await?;
    }

    let code = payload.course_code.clone().unwrap_or_default();
    let name = payload.course_name.clone().unwrap_or_default();
    let course = repositories::courses::update(
        state.db(),
        &course_id,
        repositories::courses::UpdateCourse {
            course_code: payload.course_code,
            course_name: payload.course_name,
            course_category: payload.course_category,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        write_conflict(&e, &code, &name)
            .unwrap_or_else(|| ApiError::internal(e, "Failed to update course"))
    })?
    .ok_or_else(course_not_found)?;

    Ok(Json(ApiResponse::with_code(
        "COURSE_UPDATED",
        "Course updated",
        CourseResponse::from_db(course),
    )))
}

async fn delete_course(
    Path(course_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let in_use = repositories::courses::has_questions(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course questions"))?;
    if in_use {
        return Err(course_in_use());
    }

    // A question may still land between the check and the delete.
    let deleted = repositories::courses::delete(state.db(), &course_id).await.map_err(|e| {
        if crate::db::is_foreign_key_violation(&e) {
            course_in_use()
        } else {
            ApiError::internal(e, "Failed to delete course")
        }
    })?;
    if !deleted {
        return Err(course_not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_code_free(
    state: &AppState,
    code: &str,
    except_id: Option<&str>,
) -> Result<(), ApiError> {
    let existing = repositories::courses::find_by_code(state.db(), code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course code"))?;
    match existing {
        Some(course) if Some(course.id.as_str()) != except_id => Err(code_exists(code)),
        _ => Ok(()),
    }
}

async fn ensure_name_free(
    state: &AppState,
    name: &str,
    except_id: Option<&str>,
) -> Result<(), ApiError> {
    let existing = repositories::courses::find_by_name(state.db(), name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course name"))?;
    match existing {
        Some(course) if Some(course.id.as_str()) != except_id => Err(name_exists(name)),
        _ => Ok(()),
    }
}

/// Maps a unique violation that slipped past the pre-checks to the matching conflict.
fn write_conflict(err: &sqlx::Error, code: &str, name: &str) -> Option<ApiError> {
    if is_unique_violation_on(err, repositories::courses::CODE_CONSTRAINT) {
        Some(code_exists(code))
    } else if is_unique_violation_on(err, repositories::courses::NAME_CONSTRAINT) {
        Some(name_exists(name))
    } else {
        None
    }
}

fn name_exists(name: &str) -> ApiError {
    ApiError::Conflict("COURSE_NAME_EXISTS", format!("Course name {} already exists.", name.trim()))
}

fn code_exists(code: &str) -> ApiError {
    ApiError::Conflict(
        "COURSE_CODE_EXISTS",
        format!("Course code {} already exists.", repositories::courses::normalize_code(code)),
    )
}

fn course_in_use() -> ApiError {
    ApiError::Conflict("COURSE_IN_USE", "Course still has questions".to_string())
}

fn course_not_found() -> ApiError {
    ApiError::NotFound("COURSE_NOT_FOUND", "Course not found".to_string())
}

#[cfg(test)]
mod tests;
