use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::{Request, RequestPayload};
use crate::db::types::{RequestKind, RequestStatus};
use crate::schemas::answer::AnswerResponse;
use crate::schemas::course::CourseResponse;
use crate::services::request_workflow::{ApprovalEffect, ReviewOutcome};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AddCourseRequestCreate {
    #[serde(alias = "courseCode")]
    #[validate(
        length(min = 1, max = 32, message = "course_code must be 1-32 characters"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) course_code: String,
    #[serde(alias = "courseName")]
    #[validate(
        length(min = 1, max = 255, message = "course_name must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) course_name: String,
    #[serde(alias = "courseCategory")]
    #[validate(
        length(min = 1, max = 64, message = "course_category must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) course_category: String,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AddExperimentRequestCreate {
    #[serde(alias = "experimentId")]
    pub(crate) experiment_id: String,
    #[serde(alias = "llmName")]
    #[validate(
        length(min = 1, max = 128, message = "llm_name must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) llm_name: String,
    #[serde(default)]
    pub(crate) comment: Option<String>,
    pub(crate) score: f64,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateScoreRequestCreate {
    #[serde(alias = "answerId")]
    pub(crate) answer_id: String,
    #[serde(alias = "newScore")]
    pub(crate) new_score: f64,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
}

/// Target status as sent by the client; parsed by the workflow so unknown values get a
/// dedicated error code.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    #[serde(alias = "request_status")]
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExplanationUpdate {
    #[serde(default)]
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestListQuery {
    #[serde(default)]
    #[serde(alias = "requestType")]
    pub(crate) request_type: Option<RequestKind>,
    #[serde(default)]
    #[serde(alias = "requestStatus")]
    pub(crate) request_status: Option<RequestStatus>,
    #[serde(default)]
    #[serde(alias = "descOrder")]
    pub(crate) desc_order: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestResponse {
    pub(crate) id: String,
    pub(crate) requester_id: String,
    pub(crate) status: RequestStatus,
    pub(crate) explanation: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    #[serde(flatten)]
    pub(crate) payload: RequestPayload,
}

impl RequestResponse {
    pub(crate) fn from_db(request: Request) -> Self {
        Self {
            id: request.id,
            requester_id: request.requester_id,
            status: request.status,
            explanation: request.explanation,
            reviewed_by: request.reviewed_by,
            reviewed_at: format_optional(request.reviewed_at),
            created_at: format_primitive(request.created_at),
            updated_at: format_primitive(request.updated_at),
            payload: request.payload,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewResponse {
    pub(crate) request: RequestResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course: Option<CourseResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answer: Option<AnswerResponse>,
}

impl ReviewResponse {
    pub(crate) fn from_outcome(outcome: ReviewOutcome) -> Self {
        let (course, answer) = match outcome.effect {
            Some(ApprovalEffect::CourseCreated(course)) => {
                (Some(CourseResponse::from_db(course)), None)
            }
            Some(ApprovalEffect::AnswerCreated(answer) | ApprovalEffect::ScoreUpdated(answer)) => {
                (None, Some(AnswerResponse::from_db(answer)))
            }
            None => (None, None),
        };
        Self { request: RequestResponse::from_db(outcome.request), course, answer }
    }
}
