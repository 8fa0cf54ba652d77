use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Question;
use crate::db::types::QuestionCategory;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
    #[serde(alias = "questionText")]
    #[validate(
        length(min = 1, message = "question_text must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) question_text: String,
    #[serde(alias = "questionCategory")]
    pub(crate) question_category: QuestionCategory,
    #[serde(alias = "questionScore")]
    #[validate(range(exclusive_min = 0.0, message = "question_score must be positive"))]
    pub(crate) question_score: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[serde(alias = "questionText")]
    #[validate(
        length(min = 1, message = "question_text must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) question_text: Option<String>,
    #[serde(default)]
    #[serde(alias = "questionCategory")]
    pub(crate) question_category: Option<QuestionCategory>,
    #[serde(default)]
    #[serde(alias = "questionScore")]
    #[validate(range(exclusive_min = 0.0, message = "question_score must be positive"))]
    pub(crate) question_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionListQuery {
    #[serde(default)]
    #[serde(alias = "courseId")]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) keyword: Option<String>,
    #[serde(default)]
    #[serde(alias = "courseNameOrCode")]
    pub(crate) course_name_or_code: Option<String>,
    #[serde(default)]
    #[serde(alias = "courseCategory")]
    pub(crate) course_category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) question_text: String,
    pub(crate) question_category: QuestionCategory,
    pub(crate) question_score: f64,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            course_id: question.course_id,
            question_text: question.question_text,
            question_category: question.question_category,
            question_score: question.question_score,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ceiling_is_rejected() {
        let payload: QuestionCreate = serde_json::from_value(serde_json::json!({
            "courseId": "c1",
            "questionText": "Prove it",
            "questionCategory": "MATH",
            "questionScore": 0.0
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
