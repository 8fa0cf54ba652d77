use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{
    AccountStatus, HelpTopicType, QuestionCategory, RequestKind, RequestStatus, UserRole,
};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) account_status: AccountStatus,
    pub(crate) last_online: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) course_code: String,
    pub(crate) course_name: String,
    pub(crate) course_category: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) question_text: String,
    pub(crate) question_category: QuestionCategory,
    /// Maximum attainable score for every answer to this question.
    pub(crate) question_score: f64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct Experiment {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) question_id: String,
    pub(crate) experiment_text: String,
    pub(crate) is_answer: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) llm_name: String,
    pub(crate) answer_text: String,
    pub(crate) comment: Option<String>,
    pub(crate) score: f64,
    pub(crate) score_update_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct HelpTopic {
    pub(crate) id: String,
    pub(crate) course_id: Option<String>,
    pub(crate) topic_title: String,
    pub(crate) topic_content: Option<String>,
    pub(crate) topic_type: HelpTopicType,
    pub(crate) llm_name: Option<String>,
    pub(crate) llm_answer: Option<String>,
    pub(crate) human_score: Option<f64>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Variant-specific fields of a request. The variant decides which approval effect runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "request_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum RequestPayload {
    AddCourse { course_code: String, course_name: String, course_category: String },
    AddExperiment { experiment_id: String, llm_name: String, comment: Option<String>, score: f64 },
    UpdateScore { answer_id: String, new_score: f64 },
}

impl RequestPayload {
    pub(crate) fn kind(&self) -> RequestKind {
        match self {
            Self::AddCourse { .. } => RequestKind::AddCourse,
            Self::AddExperiment { .. } => RequestKind::AddExperiment,
            Self::UpdateScore { .. } => RequestKind::UpdateScore,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub(crate) id: String,
    pub(crate) requester_id: String,
    pub(crate) status: RequestStatus,
    pub(crate) explanation: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
    pub(crate) payload: RequestPayload,
}

impl Request {
    pub(crate) fn kind(&self) -> RequestKind {
        self.payload.kind()
    }
}

/// Flat row of the `requests` table; payload columns are populated per `kind`.
#[derive(Debug, FromRow)]
pub(crate) struct RequestRow {
    pub(crate) id: String,
    pub(crate) requester_id: String,
    pub(crate) kind: RequestKind,
    pub(crate) status: RequestStatus,
    pub(crate) explanation: Option<String>,
    pub(crate) course_code: Option<String>,
    pub(crate) course_name: Option<String>,
    pub(crate) course_category: Option<String>,
    pub(crate) experiment_id: Option<String>,
    pub(crate) llm_name: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) score: Option<f64>,
    pub(crate) answer_id: Option<String>,
    pub(crate) new_score: Option<f64>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

fn required<T>(value: Option<T>, column: &str, id: &str) -> Result<T, sqlx::Error> {
    value.ok_or_else(|| {
        sqlx::Error::Decode(format!("request {id} is missing payload column {column}").into())
    })
}

impl TryFrom<RequestRow> for Request {
    type Error = sqlx::Error;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let id = row.id.as_str();
        let payload = match row.kind {
            RequestKind::AddCourse => RequestPayload::AddCourse {
                course_code: required(row.course_code, "course_code", id)?,
                course_name: required(row.course_name, "course_name", id)?,
                course_category: required(row.course_category, "course_category", id)?,
            },
            RequestKind::AddExperiment => RequestPayload::AddExperiment {
                experiment_id: required(row.experiment_id, "experiment_id", id)?,
                llm_name: required(row.llm_name, "llm_name", id)?,
                comment: row.comment,
                score: required(row.score, "score", id)?,
            },
            RequestKind::UpdateScore => RequestPayload::UpdateScore {
                answer_id: required(row.answer_id, "answer_id", id)?,
                new_score: required(row.new_score, "new_score", id)?,
            },
        };

        Ok(Self {
            id: row.id,
            requester_id: row.requester_id,
            status: row.status,
            explanation: row.explanation,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            payload,
        })
    }
}
