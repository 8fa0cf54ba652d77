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
use crate::repositories;
use crate::repositories::questions::QuestionFilter;
use crate::schemas::question::{
    QuestionCreate, QuestionListQuery, QuestionResponse, QuestionUpdate,
};
use crate::schemas::ApiResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/:question_id", get(get_question).patch(update_question).delete(delete_question))
}

async fn create_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<ApiResponse<QuestionResponse>>), ApiError> {
    validate_payload(&payload)?;

    let course = repositories::courses::find_by_id(state.db(), &payload.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?;
    if course.is_none() {
        return Err(ApiError::NotFound("COURSE_NOT_FOUND", "Course not found".to_string()));
    }

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            course_id: &payload.course_id,
            question_text: payload.question_text.trim(),
            question_category: payload.question_category,
            question_score: payload.question_score,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_code(
            "QUESTION_ADDED",
            "Question created",
            QuestionResponse::from_db(question),
        )),
    ))
}

async fn list_questions(
    Query(page): Query<PageQuery>,
    Query(params): Query<QuestionListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<QuestionResponse>>>, ApiError> {
    let page = page.resolve(state.settings());
    let filter = QuestionFilter {
        course_id: params.course_id,
        keyword: params.keyword,
        course_name_or_code: params.course_name_or_code,
        course_category: params.course_category,
    };

    let questions =
        repositories::questions::list(state.db(), &filter, page.limit(), page.offset())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let total = repositories::questions::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    let items = questions.into_iter().map(QuestionResponse::from_db).collect();
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(items, total, page))))
}

async fn get_question(
    Path(question_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<QuestionResponse>>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(question_not_found)?;

    Ok(Json(ApiResponse::ok(QuestionResponse::from_db(question))))
}

async fn update_question(
    Path(question_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<ApiResponse<QuestionResponse>>, ApiError> {
    validate_payload(&payload)?;

    let question = repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            question_text: payload.question_text.map(|text| text.trim().to_string()),
            question_category: payload.question_category,
            question_score: payload.question_score,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(question_not_found)?;

    Ok(Json(ApiResponse::with_code(
        "QUESTION_UPDATED",
        "Question updated",
        QuestionResponse::from_db(question),
    )))
}

async fn delete_question(
    Path(question_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(question_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

fn question_not_found() -> ApiError {
    ApiError::NotFound("QUESTION_NOT_FOUND", "Question not found".to_string())
}
