use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentTeacher, CurrentUser};
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::db::models::{Request, RequestPayload, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::requests::RequestFilter;
use crate::schemas::request::{
    AddCourseRequestCreate, AddExperimentRequestCreate, ExplanationUpdate, RequestListQuery,
    RequestResponse, ReviewResponse, StatusUpdate, UpdateScoreRequestCreate,
};
use crate::schemas::ApiResponse;
use crate::services::request_workflow::{self, Actor, PgWorkflowStore, WorkflowError};


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests))
        .route("/mine", get(list_my_requests))
        .route("/add-course", post(submit_add_course))
        .route("/add-experiment", post(submit_add_experiment))
        .route("/update-score", post(submit_update_score))
        .route("/:request_id", get(get_request).delete(delete_request))
        .route("/:request_id/status", put(update_status))
        .route("/:request_id/explanation", put(update_explanation))
}

async fn submit_add_course(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<AddCourseRequestCreate>,
) -> Result<(StatusCode, Json<ApiResponse<RequestResponse>>), ApiError> {
    validate_payload(&payload)?;
    let request_payload = RequestPayload::AddCourse {
        course_code: payload.course_code,
        course_name: payload.course_name,
        course_category: payload.course_category,
    };
    submit(&state, &user, payload.explanation.as_deref(), request_payload).await
}

async fn submit_add_experiment(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<AddExperimentRequestCreate>,
) -> Result<(StatusCode, Json<ApiResponse<RequestResponse>>), ApiError> {
    validate_payload(&payload)?;
    let request_payload = RequestPayload::AddExperiment {
        experiment_id: payload.experiment_id,
        llm_name: payload.llm_name.trim().to_string(),
        comment: payload.comment,
        score: payload.score,
    };
    submit(&state, &user, payload.explanation.as_deref(), request_payload).await
}

async fn submit_update_score(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<UpdateScoreRequestCreate>,
) -> Result<(StatusCode, Json<ApiResponse<RequestResponse>>), ApiError> {
    let request_payload =
        RequestPayload::UpdateScore { answer_id: payload.answer_id, new_score: payload.new_score };
    submit(&state, &user, payload.explanation.as_deref(), request_payload).await
}

async fn submit(
    state: &AppState,
    user: &User,
    explanation: Option<&str>,
    payload: RequestPayload,
) -> Result<(StatusCode, Json<ApiResponse<RequestResponse>>), ApiError> {
    let mut store = begin(state).await?;
    let request = request_workflow::submit(&mut store, &user.id, explanation, payload).await?;
    store.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit request"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_code(
            "REQUEST_SUBMITTED",
            "Request submitted for review",
            RequestResponse::from_db(request),
        )),
    ))
}

async fn update_status(
    Path(request_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
    let actor = Actor { id: &user.id, role: user.role };

    let mut store = begin(&state).await?;
    let outcome = request_workflow::review(&mut store, &request_id, actor, &payload.status).await?;
    store.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit review"))?;

    let (code, message) = (outcome.code, outcome.message);
    Ok(Json(ApiResponse::with_code(code, message, ReviewResponse::from_outcome(outcome))))
}

async fn update_explanation(
    Path(request_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ExplanationUpdate>,
) -> Result<Json<ApiResponse<RequestResponse>>, ApiError> {
    let actor = Actor { id: &user.id, role: user.role };

    let mut store = begin(&state).await?;
    let request = request_workflow::update_explanation(
        &mut store,
        &request_id,
        actor,
        payload.explanation.as_deref(),
    )
    .await?;
    store.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit explanation"))?;

    Ok(Json(ApiResponse::with_code(
        "REQUEST_UPDATED",
        "Explanation updated",
        RequestResponse::from_db(request),
    )))
}

async fn list_requests(
    Query(page): Query<PageQuery>,
    Query(params): Query<RequestListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<RequestResponse>>>, ApiError> {
    list(&state, page, params, None).await
}

async fn list_my_requests(
    Query(page): Query<PageQuery>,
    Query(params): Query<RequestListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<RequestResponse>>>, ApiError> {
    list(&state, page, params, Some(user.id)).await
}

async fn list(
    state: &AppState,
    page: PageQuery,
    params: RequestListQuery,
    requester_id: Option<String>,
) -> Result<Json<ApiResponse<PaginatedResponse<RequestResponse>>>, ApiError> {
    let page = page.resolve(state.settings());
    let filter = RequestFilter {
        requester_id,
        kind: params.request_type,
        status: params.request_status,
        newest_first: params.desc_order.unwrap_or(false),
    };

    let requests = repositories::requests::list(state.db(), &filter, page.limit(), page.offset())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list requests"))?;
    let total = repositories::requests::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count requests"))?;

    let items = requests.into_iter().map(RequestResponse::from_db).collect();
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(items, total, page))))
}

async fn get_request(
    Path(request_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RequestResponse>>, ApiError> {
    let request = load_visible(&state, &user, &request_id).await?;
    Ok(Json(ApiResponse::ok(RequestResponse::from_db(request))))
}

/// Removing a request also releases the experiment it referenced for a new submission.
async fn delete_request(
    Path(request_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    load_visible(&state, &user, &request_id).await?;

    let deleted = repositories::requests::delete(state.db(), &request_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete request"))?;
    if !deleted {
        return Err(WorkflowError::RequestNotFound.into());
    }

    tracing::info!(request_id = %request_id, user_id = %user.id, "Request deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_visible(state: &AppState, user: &User, request_id: &str) -> Result<Request, ApiError> {
    let request = repositories::requests::find_by_id(state.db(), request_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch request"))?
        .ok_or(WorkflowError::RequestNotFound)?;

    if request.requester_id != user.id && user.role != UserRole::Admin {
        return Err(WorkflowError::NoPermission.into());
    }
    Ok(request)
}

async fn begin(state: &AppState) -> Result<PgWorkflowStore, ApiError> {
    PgWorkflowStore::begin(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))
}
