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
use crate::repositories;
use crate::repositories::help_topics::HelpTopicFilter;
use crate::schemas::help_topic::{
    HelpTopicCreate, HelpTopicListQuery, HelpTopicResponse, HelpTopicUpdate,
};
use crate::schemas::ApiResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_topics).post(create_topic))
        .route("/:topic_id", get(get_topic).patch(update_topic).delete(delete_topic))
}

async fn create_topic(
    CurrentTeacher(_user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<HelpTopicCreate>,
) -> Result<(StatusCode, Json<ApiResponse<HelpTopicResponse>>), ApiError> {
    validate_payload(&payload)?;

    if let Some(course_id) = payload.course_id.as_deref() {
        let course = repositories::courses::find_by_id(state.db(), course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?;
        if course.is_none() {
            return Err(ApiError::NotFound("COURSE_NOT_FOUND", "Course not found".to_string()));
        }
    }

    let topic = repositories::help_topics::create(
        state.db(),
        repositories::help_topics::CreateHelpTopic {
            id: &Uuid::new_v4().to_string(),
            course_id: payload.course_id.as_deref(),
            topic_title: payload.topic_title.trim(),
            topic_content: payload.topic_content.as_deref(),
            topic_type: payload.topic_type,
            llm_name: payload.llm_name.as_deref(),
            llm_answer: payload.llm_answer.as_deref(),
            human_score: payload.human_score,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create help topic"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_code(
            "TOPIC_ADDED",
            "Help topic created",
            HelpTopicResponse::from_db(topic),
        )),
    ))
}

async fn list_topics(
    Query(page): Query<PageQuery>,
    Query(params): Query<HelpTopicListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaginatedResponse<HelpTopicResponse>>>, ApiError> {
    let page = page.resolve(state.settings());
    let filter = HelpTopicFilter { course_id: params.course_id, keyword: params.keyword };

    let topics =
        repositories::help_topics::list(state.db(), &filter, page.limit(), page.offset())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list help topics"))?;
    let total = repositories::help_topics::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count help topics"))?;

    let items = topics.into_iter().map(HelpTopicResponse::from_db).collect();
    Ok(Json(ApiResponse::ok(PaginatedResponse::new(items, total, page))))
}

async fn get_topic(
    Path(topic_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HelpTopicResponse>>, ApiError> {
    let topic = repositories::help_topics::find_by_id(state.db(), &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch help topic"))?
        .ok_or_else(topic_not_found)?;

    Ok(Json(ApiResponse::ok(HelpTopicResponse::from_db(topic))))
}

async fn update_topic(
    Path(topic_id): Path<String>,
    CurrentTeacher(_user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<HelpTopicUpdate>,
) -> Result<Json<ApiResponse<HelpTopicResponse>>, ApiError> {
    validate_payload(&payload)?;

    let topic = repositories::help_topics::update(
        state.db(),
        &topic_id,
        repositories::help_topics::UpdateHelpTopic {
            topic_title: payload.topic_title.map(|title| title.trim().to_string()),
            topic_content: payload.topic_content,
            topic_type: payload.topic_type,
            llm_name: payload.llm_name,
            llm_answer: payload.llm_answer,
            human_score: payload.human_score,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update help topic"))?
    .ok_or_else(topic_not_found)?;

    Ok(Json(ApiResponse::with_code(
        "TOPIC_UPDATED",
        "Help topic updated",
        HelpTopicResponse::from_db(topic),
    )))
}

async fn delete_topic(
    Path(topic_id): Path<String>,
    CurrentTeacher(_user): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::help_topics::delete(state.db(), &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete help topic"))?;
    if !deleted {
        return Err(topic_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

fn topic_not_found() -> ApiError {
    ApiError::NotFound("TOPIC_NOT_FOUND", "Help topic not found".to_string())
}
