use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Experiment;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExperimentCreate {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(alias = "experimentText")]
    #[validate(
        length(min = 1, message = "experiment_text must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) experiment_text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExperimentUpdate {
    #[serde(alias = "experimentText")]
    #[validate(
        length(min = 1, message = "experiment_text must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) experiment_text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExperimentListQuery {
    #[serde(default)]
    #[serde(alias = "questionId")]
    pub(crate) question_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExperimentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) question_id: String,
    pub(crate) experiment_text: String,
    pub(crate) is_answer: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExperimentResponse {
    pub(crate) fn from_db(experiment: Experiment) -> Self {
        Self {
            id: experiment.id,
            user_id: experiment.user_id,
            question_id: experiment.question_id,
            experiment_text: experiment.experiment_text,
            is_answer: experiment.is_answer,
            created_at: format_primitive(experiment.created_at),
            updated_at: format_primitive(experiment.updated_at),
        }
    }
}
