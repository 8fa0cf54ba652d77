use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Answer;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerCreate {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(alias = "llmName")]
    #[validate(
        length(min = 1, max = 128, message = "llm_name must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) llm_name: String,
    #[serde(alias = "answerText")]
    #[validate(
        length(min = 1, message = "answer_text must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) answer_text: String,
    #[serde(default)]
    pub(crate) comment: Option<String>,
    pub(crate) score: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerUpdate {
    #[serde(default)]
    #[serde(alias = "llmName")]
    #[validate(
        length(min = 1, max = 128, message = "llm_name must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) llm_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "answerText")]
    #[validate(
        length(min = 1, message = "answer_text must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) answer_text: Option<String>,
    #[serde(default)]
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerScoreUpdate {
    pub(crate) score: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerListQuery {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) llm_name: String,
    pub(crate) answer_text: String,
    pub(crate) comment: Option<String>,
    pub(crate) score: f64,
    pub(crate) score_update_count: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: Answer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            llm_name: answer.llm_name,
            answer_text: answer.answer_text,
            comment: answer.comment,
            score: answer.score,
            score_update_count: answer.score_update_count,
            created_at: format_primitive(answer.created_at),
            updated_at: format_primitive(answer.updated_at),
        }
    }
}
