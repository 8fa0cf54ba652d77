use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentTeacher, CurrentUser};
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Experiment, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::experiment::{
    ExperimentCreate, ExperimentListQuery, ExperimentResponse, ExperimentUpdate,
};
use crate::schemas::ApiResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_experiments).post(create_experiment))
        .route(
            "/:experiment_id",
            get(get_experiment).patch(update_experiment).delete(delete_experiment),
        )
}

async fn create_experiment(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<ExperimentCreate>,
) -> Result<(StatusCode, Json<ApiResponse<ExperimentResponse>>), ApiError> {
    validate_payload(&payload)?;

    let question = repositories::questions::find_by_id(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;
    if question.is_none() {
        return Err(ApiError::NotFound("QUESTION_NOT_FOUND", "Question not found".to_string()));
    }

    let experiment = repositories::experiments::create(
        state.db(),
        repositories::experiments::CreateExperiment {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            question_id: &payload.question_id,
            experiment_text: &payload.experiment_text,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create experiment"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_code(
            "EXPERIMENT_ADDED",
            "Experiment created",
            ExperimentResponse::from_db(experiment),
        )),
    ))
}

async fn list_my_experiments(
    Query(page): Query<PageQuery>,
    Query(params): Query<ExperimentListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<ExperimentResponse>>>, ApiError> {
    let page = page.resolve(state.settings());
    let question_id = params.question_id.as_deref();

    let experiments = repositories::experiments::list_by_user(
        state.db(),
        &user.id,
        question_id,
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list experiments"))?;
    let total = repositories::experiments::count_by_user(state.db(), &user.id, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count experiments"))?;

    let items = experiments.into_iter().map(ExperimentResponse::from_db).collect();
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(items, total, page))))
}

async fn get_experiment(
    Path(experiment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExperimentResponse>>, ApiError> {
    let experiment = load_visible(&state, &user, &experiment_id).await?;
    Ok(Json(ApiResponse::ok(ExperimentResponse::from_db(experiment))))
}

async fn update_experiment(
    Path(experiment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ExperimentUpdate>,
) -> Result<Json<ApiResponse<ExperimentResponse>>, ApiError> {
    validate_payload(&payload)?;

    let experiment = load_visible(&state, &user, &experiment_id).await?;
    if experiment.user_id != user.id {
        return Err(ApiError::forbidden("Only the author can edit an experiment"));
    }

    let updated = repositories::experiments::update_text(
        state.db(),
        &experiment_id,
        &payload.experiment_text,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update experiment"))?
    .ok_or_else(|| {
        ApiError::Conflict(
            "EXPERIMENT_ALREADY_ANSWER",
            "Experiment is already an answer.".to_string(),
        )
    })?;

    Ok(Json(ApiResponse::with_code(
        "EXPERIMENT_UPDATED",
        "Experiment updated",
        ExperimentResponse::from_db(updated),
    )))
}

async fn delete_experiment(
    Path(experiment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    load_visible(&state, &user, &experiment_id).await?;

    let deleted = repositories::experiments::delete(state.db(), &experiment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete experiment"))?;
    if !deleted {
        return Err(experiment_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// The author and admins may see an experiment; everyone else gets a 403.
async fn load_visible(
    state: &AppState,
    user: &User,
    experiment_id: &str,
) -> Result<Experiment, ApiError> {
    let experiment = repositories::experiments::find_by_id(state.db(), experiment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch experiment"))?
        .ok_or_else(experiment_not_found)?;

    if experiment.user_id != user.id && user.role != UserRole::Admin {
        return Err(ApiError::forbidden("Not allowed to access this experiment"));
    }
    Ok(experiment)
}

fn experiment_not_found() -> ApiError {
    ApiError::NotFound("EXPERIMENT_NOT_FOUND", "Experiment not found.".to_string())
}
