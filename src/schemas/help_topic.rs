use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::HelpTopic;
use crate::db::types::HelpTopicType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct HelpTopicCreate {
    #[serde(default)]
    #[serde(alias = "courseId")]
    pub(crate) course_id: Option<String>,
    #[serde(alias = "topicTitle")]
    #[validate(
        length(min = 1, max = 255, message = "topic_title must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) topic_title: String,
    #[serde(default)]
    #[serde(alias = "topicContent")]
    pub(crate) topic_content: Option<String>,
    #[serde(default = "default_topic_type")]
    #[serde(alias = "topicType")]
    pub(crate) topic_type: HelpTopicType,
    #[serde(default)]
    #[serde(alias = "llmName")]
    pub(crate) llm_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "llmAnswer")]
    pub(crate) llm_answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "humanScore")]
    #[validate(range(min = 0.0, message = "human_score must be non-negative"))]
    pub(crate) human_score: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct HelpTopicUpdate {
    #[serde(default)]
    #[serde(alias = "topicTitle")]
    #[validate(
        length(min = 1, max = 255, message = "topic_title must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) topic_title: Option<String>,
    #[serde(default)]
    #[serde(alias = "topicContent")]
    pub(crate) topic_content: Option<String>,
    #[serde(default)]
    #[serde(alias = "topicType")]
    pub(crate) topic_type: Option<HelpTopicType>,
    #[serde(default)]
    #[serde(alias = "llmName")]
    pub(crate) llm_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "llmAnswer")]
    pub(crate) llm_answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "humanScore")]
    #[validate(range(min = 0.0, message = "human_score must be non-negative"))]
    pub(crate) human_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HelpTopicListQuery {
    #[serde(default)]
    #[serde(alias = "courseId")]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) keyword: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HelpTopicResponse {
    pub(crate) id: String,
    pub(crate) course_id: Option<String>,
    pub(crate) topic_title: String,
    pub(crate) topic_content: Option<String>,
    pub(crate) topic_type: HelpTopicType,
    pub(crate) llm_name: Option<String>,
    pub(crate) llm_answer: Option<String>,
    pub(crate) human_score: Option<f64>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl HelpTopicResponse {
    pub(crate) fn from_db(topic: HelpTopic) -> Self {
        Self {
            id: topic.id,
            course_id: topic.course_id,
            topic_title: topic.topic_title,
            topic_content: topic.topic_content,
            topic_type: topic.topic_type,
            llm_name: topic.llm_name,
            llm_answer: topic.llm_answer,
            human_score: topic.human_score,
            created_at: format_primitive(topic.created_at),
            updated_at: format_primitive(topic.updated_at),
        }
    }
}

fn default_topic_type() -> HelpTopicType {
    HelpTopicType::Normal
}
