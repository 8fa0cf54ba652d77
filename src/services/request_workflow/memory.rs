use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::store::{NewAnswer, WorkflowStore};
use crate::core::time::primitive_now_utc;
use crate::db::models::{Answer, Course, Experiment, Question, Request, RequestPayload};
use crate::db::types::{QuestionCategory, RequestStatus};
use crate::repositories::courses::normalize_code;

/// In-memory store used by the engine tests.
///
/// Clone it to open a unit of work and assign the clone back to commit.
#[derive(Debug, Clone, Default)]
pub(super) struct MemoryStore {
    pub(super) courses: HashMap<String, Course>,
    pub(super) questions: HashMap<String, Question>,
    pub(super) experiments: HashMap<String, Experiment>,
    pub(super) answers: HashMap<String, Answer>,
    pub(super) requests: HashMap<String, Request>,
    pub(super) locked_keys: Vec<String>,
    pub(super) fail_answer_insert: bool,
}

impl MemoryStore {
    pub(super) fn with_course(mut self, id: &str, code: &str) -> Self {
        let now = primitive_now_utc();
        self.courses.insert(
            id.to_string(),
            Course {
                id: id.to_string(),
                course_code: normalize_code(code),
                course_name: format!("{code} course"),
                course_category: "CS".to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    pub(super) fn with_question(mut self, id: &str, course_id: &str, max_score: f64) -> Self {
        let now = primitive_now_utc();
        self.questions.insert(
            id.to_string(),
            Question {
                id: id.to_string(),
                course_id: course_id.to_string(),
                question_text: "Explain ownership.".to_string(),
                question_category: QuestionCategory::Prog,
                question_score: max_score,
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    pub(super) fn with_experiment(mut self, id: &str, question_id: &str, author: &str) -> Self {
        let now = primitive_now_utc();
        self.experiments.insert(
            id.to_string(),
            Experiment {
                id: id.to_string(),
                user_id: author.to_string(),
                question_id: question_id.to_string(),
                experiment_text: format!("transcript of {id}"),
                is_answer: false,
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    pub(super) fn with_answer(mut self, id: &str, question_id: &str, score: f64) -> Self {
        let now = primitive_now_utc();
        self.answers.insert(
            id.to_string(),
            Answer {
                id: id.to_string(),
                question_id: question_id.to_string(),
                llm_name: "gpt-4o".to_string(),
                answer_text: "Ownership moves values.".to_string(),
                comment: None,
                score,
                score_update_count: 1,
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    pub(super) fn status_of(&self, request_id: &str) -> Option<RequestStatus> {
        self.requests.get(request_id).map(|request| request.status)
    }
}

fn injected_failure() -> sqlx::Error {
    sqlx::Error::Protocol("injected failure".to_string())
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn lock_key(&mut self, key: &str) -> Result<(), sqlx::Error> {
        self.locked_keys.push(key.to_string());
        Ok(())
    }

    async fn find_course_by_code(&mut self, code: &str) -> Result<Option<Course>, sqlx::Error> {
        let code = normalize_code(code);
        Ok(self.courses.values().find(|course| course.course_code == code).cloned())
    }

    async fn find_course_by_name(&mut self, name: &str) -> Result<Option<Course>, sqlx::Error> {
        let name = name.trim();
        Ok(self.courses.values().find(|course| course.course_name == name).cloned())
    }

    async fn create_course(
        &mut self,
        code: &str,
        name: &str,
        category: &str,
    ) -> Result<Course, sqlx::Error> {
        let now = primitive_now_utc();
        let course = Course {
            id: Uuid::new_v4().to_string(),
            course_code: normalize_code(code),
            course_name: name.to_string(),
            course_category: category.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.courses.insert(course.id.clone(), course.clone());
        Ok(course)
    }

    async fn find_question(&mut self, question_id: &str) -> Result<Option<Question>, sqlx::Error> {
        Ok(self.questions.get(question_id).cloned())
    }

    async fn lock_experiment(
        &mut self,
        experiment_id: &str,
    ) -> Result<Option<Experiment>, sqlx::Error> {
        Ok(self.experiments.get(experiment_id).cloned())
    }

    async fn set_experiment_is_answer(
        &mut self,
        experiment_id: &str,
        is_answer: bool,
    ) -> Result<(), sqlx::Error> {
        let experiment = self.experiments.get_mut(experiment_id).ok_or(sqlx::Error::RowNotFound)?;
        experiment.is_answer = is_answer;
        experiment.updated_at = primitive_now_utc();
        Ok(())
    }

    async fn lock_answer(&mut self, answer_id: &str) -> Result<Option<Answer>, sqlx::Error> {
        Ok(self.answers.get(answer_id).cloned())
    }

    async fn create_answer(&mut self, answer: NewAnswer<'_>) -> Result<Answer, sqlx::Error> {
        if self.fail_answer_insert {
            return Err(injected_failure());
        }
        let now = primitive_now_utc();
        let answer = Answer {
            id: Uuid::new_v4().to_string(),
            question_id: answer.question_id.to_string(),
            llm_name: answer.llm_name.to_string(),
            answer_text: answer.answer_text.to_string(),
            comment: answer.comment.map(str::to_string),
            score: answer.score,
            score_update_count: 1,
            created_at: now,
            updated_at: now,
        };
        self.answers.insert(answer.id.clone(), answer.clone());
        Ok(answer)
    }

    async fn set_answer_score(
        &mut self,
        answer_id: &str,
        score: f64,
        score_update_count: i32,
    ) -> Result<Answer, sqlx::Error> {
        let answer = self.answers.get_mut(answer_id).ok_or(sqlx::Error::RowNotFound)?;
        answer.score = score;
        answer.score_update_count = score_update_count;
        answer.updated_at = primitive_now_utc();
        Ok(answer.clone())
    }

    async fn lock_request(&mut self, request_id: &str) -> Result<Option<Request>, sqlx::Error> {
        Ok(self.requests.get(request_id).cloned())
    }

    async fn experiment_has_request(&mut self, experiment_id: &str) -> Result<bool, sqlx::Error> {
        Ok(self.requests.values().any(|request| {
            matches!(
                &request.payload,
                RequestPayload::AddExperiment { experiment_id: id, .. } if id == experiment_id
            )
        }))
    }

    async fn has_active_score_request(
        &mut self,
        requester_id: &str,
        answer_id: &str,
    ) -> Result<bool, sqlx::Error> {
        Ok(self.requests.values().any(|request| {
            request.requester_id == requester_id
                && request.status != RequestStatus::Rejected
                && matches!(
                    &request.payload,
                    RequestPayload::UpdateScore { answer_id: id, .. } if id == answer_id
                )
        }))
    }

    async fn insert_request(
        &mut self,
        requester_id: &str,
        explanation: Option<&str>,
        payload: &RequestPayload,
    ) -> Result<Request, sqlx::Error> {
        let now = primitive_now_utc();
        let request = Request {
            id: Uuid::new_v4().to_string(),
            requester_id: requester_id.to_string(),
            status: RequestStatus::Pending,
            explanation: explanation.map(str::to_string),
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
            payload: payload.clone(),
        };
        self.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    async fn finish_review(
        &mut self,
        request_id: &str,
        status: RequestStatus,
        reviewed_by: &str,
    ) -> Result<Option<Request>, sqlx::Error> {
        let Some(request) = self.requests.get_mut(request_id) else {
            return Ok(None);
        };
        if request.status != RequestStatus::Pending {
            return Ok(None);
        }
        let now = primitive_now_utc();
        request.status = status;
        request.reviewed_by = Some(reviewed_by.to_string());
        request.reviewed_at = Some(now);
        request.updated_at = now;
        Ok(Some(request.clone()))
    }

    async fn set_explanation(
        &mut self,
        request_id: &str,
        explanation: Option<&str>,
    ) -> Result<Option<Request>, sqlx::Error> {
        let Some(request) = self.requests.get_mut(request_id) else {
            return Ok(None);
        };
        if request.status != RequestStatus::Pending {
            return Ok(None);
        }
        request.explanation = explanation.map(str::to_string);
        request.updated_at = primitive_now_utc();
        Ok(Some(request.clone()))
    }
}
