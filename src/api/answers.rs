use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
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
use crate::schemas::answer::{
    AnswerCreate, AnswerListQuery, AnswerResponse, AnswerScoreUpdate, AnswerUpdate,
};
use crate::schemas::ApiResponse;
use crate::services::request_workflow::{self, PgWorkflowStore, WorkflowError};
use crate::services::scoring::score_in_range;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_answers).post(create_answer))
        .route("/:answer_id", get(get_answer).patch(update_answer).delete(delete_answer))
        .route("/:answer_id/score", post(update_score))
}

async fn create_answer(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AnswerCreate>,
) -> Result<(StatusCode, Json<ApiResponse<AnswerResponse>>), ApiError> {
    validate_payload(&payload)?;

    let question = repositories::questions::find_by_id(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or(WorkflowError::QuestionNotFound)?;
    if !score_in_range(payload.score, question.question_score) {
        return Err(WorkflowError::InvalidScore { max: question.question_score }.into());
    }

    let answer = repositories::answers::create(
        state.db(),
        repositories::answers::CreateAnswer {
            id: &Uuid::new_v4().to_string(),
            question_id: &question.id,
            llm_name: payload.llm_name.trim(),
            answer_text: &payload.answer_text,
            comment: payload.comment.as_deref(),
            score: payload.score,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create answer"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_code(
            "ANSWER_ADDED",
            "Answer created",
            AnswerResponse::from_db(answer),
        )),
    ))
}

async fn list_answers(
    Query(page): Query<PageQuery>,
    Query(params): Query<AnswerListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<AnswerResponse>>>, ApiError> {
    let page = page.resolve(state.settings());

    let answers = repositories::answers::list_by_question(
        state.db(),
        &params.question_id,
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;
    let total = repositories::answers::count_by_question(state.db(), &params.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count answers"))?;

    let items = answers.into_iter().map(AnswerResponse::from_db).collect();
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(items, total, page))))
}

async fn get_answer(
    Path(answer_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AnswerResponse>>, ApiError> {
    let answer = repositories::answers::find_by_id(state.db(), &answer_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answer"))?
        .ok_or(WorkflowError::AnswerNotFound)?;

    Ok(Json(ApiResponse::ok(AnswerResponse::from_db(answer))))
}

async fn update_answer(
    Path(answer_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AnswerUpdate>,
) -> Result<Json<ApiResponse<AnswerResponse>>, ApiError> {
    validate_payload(&payload)?;

    let answer = repositories::answers::update(
        state.db(),
        &answer_id,
        repositories::answers::UpdateAnswer {
            llm_name: payload.llm_name.map(|name| name.trim().to_string()),
            answer_text: payload.answer_text,
            comment: payload.comment,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update answer"))?
    .ok_or(WorkflowError::AnswerNotFound)?;

    Ok(Json(ApiResponse::with_code(
        "ANSWER_UPDATED",
        "Answer updated",
        AnswerResponse::from_db(answer),
    )))
}

async fn delete_answer(
    Path(answer_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::answers::delete(state.db(), &answer_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete answer"))?;
    if !deleted {
        return Err(WorkflowError::AnswerNotFound.into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Folds an admin-supplied score into the running mean, same rule as an approved
/// UPDATE_SCORE request.
async fn update_score(
    Path(answer_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AnswerScoreUpdate>,
) -> Result<Json<ApiResponse<AnswerResponse>>, ApiError> {
    let mut store = PgWorkflowStore::begin(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let answer =
        request_workflow::update_answer_score(&mut store, &answer_id, payload.score).await?;
    store.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit score update"))?;

    tracing::info!(
        answer_id = %answer.id,
        admin_id = %admin.id,
        score = answer.score,
        score_update_count = answer.score_update_count,
        "Answer score updated"
    );

    Ok(Json(ApiResponse::with_code(
        "SCORE_UPDATED",
        "Score updated",
        AnswerResponse::from_db(answer),
    )))
}
