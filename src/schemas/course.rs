use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Course;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
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
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[serde(alias = "courseCode")]
    #[validate(
        length(min = 1, max = 32, message = "course_code must be 1-32 characters"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) course_code: Option<String>,
    #[serde(default)]
    #[serde(alias = "courseName")]
    #[validate(
        length(min = 1, max = 255, message = "course_name must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) course_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "courseCategory")]
    #[validate(
        length(min = 1, max = 64, message = "course_category must not be empty"),
        custom(function = "crate::schemas::not_blank")
    )]
    pub(crate) course_category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseListQuery {
    #[serde(default)]
    pub(crate) keyword: Option<String>,
    /// Comma-separated course ids.
    #[serde(default)]
    pub(crate) ids: Option<String>,
}

impl CourseListQuery {
    pub(crate) fn id_list(&self) -> Option<Vec<String>> {
        let ids: Vec<String> = self
            .ids
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        (!ids.is_empty()).then_some(ids)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) course_code: String,
    pub(crate) course_name: String,
    pub(crate) course_category: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            course_code: course.course_code,
            course_name: course.course_name,
            course_category: course.course_category,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}
