use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Answer, Course, Experiment, Question, Request, RequestPayload};
use crate::db::types::RequestStatus;
use crate::repositories;

pub(crate) struct NewAnswer<'a> {
    pub(crate) question_id: &'a str,
    pub(crate) llm_name: &'a str,
    pub(crate) answer_text: &'a str,
    pub(crate) comment: Option<&'a str>,
    pub(crate) score: f64,
}

/// Persistence operations the approval engine relies on.
///
/// One store value is one unit of work: every call made through it commits or
/// rolls back together. `lock_*` reads hold the row until that unit ends.
#[async_trait]
pub(crate) trait WorkflowStore: Send {
    /// Serialises concurrent submissions that race on the same business key.
    async fn lock_key(&mut self, key: &str) -> Result<(), sqlx::Error>;

    async fn find_course_by_code(&mut self, code: &str) -> Result<Option<Course>, sqlx::Error>;
    async fn find_course_by_name(&mut self, name: &str) -> Result<Option<Course>, sqlx::Error>;
    async fn create_course(
        &mut self,
        code: &str,
        name: &str,
        category: &str,
    ) -> Result<Course, sqlx::Error>;

    async fn find_question(&mut self, question_id: &str) -> Result<Option<Question>, sqlx::Error>;

    async fn lock_experiment(
        &mut self,
        experiment_id: &str,
    ) -> Result<Option<Experiment>, sqlx::Error>;
    async fn set_experiment_is_answer(
        &mut self,
        experiment_id: &str,
        is_answer: bool,
    ) -> Result<(), sqlx::Error>;

    async fn lock_answer(&mut self, answer_id: &str) -> Result<Option<Answer>, sqlx::Error>;
    async fn create_answer(&mut self, answer: NewAnswer<'_>) -> Result<Answer, sqlx::Error>;
    async fn set_answer_score(
        &mut self,
        answer_id: &str,
        score: f64,
        score_update_count: i32,
    ) -> Result<Answer, sqlx::Error>;

    async fn lock_request(&mut self, request_id: &str) -> Result<Option<Request>, sqlx::Error>;
    async fn experiment_has_request(&mut self, experiment_id: &str) -> Result<bool, sqlx::Error>;
    async fn has_active_score_request(
        &mut self,
        requester_id: &str,
        answer_id: &str,
    ) -> Result<bool, sqlx::Error>;
    async fn insert_request(
        &mut self,
        requester_id: &str,
        explanation: Option<&str>,
        payload: &RequestPayload,
    ) -> Result<Request, sqlx::Error>;
    /// Moves a PENDING request to `status`; `None` if it is no longer PENDING.
    async fn finish_review(
        &mut self,
        request_id: &str,
        status: RequestStatus,
        reviewed_by: &str,
    ) -> Result<Option<Request>, sqlx::Error>;
    async fn set_explanation(
        &mut self,
        request_id: &str,
        explanation: Option<&str>,
    ) -> Result<Option<Request>, sqlx::Error>;
}

/// Postgres-backed store running every call inside one transaction.
///
/// Dropping it without [`PgWorkflowStore::commit`] rolls the transaction back.
pub(crate) struct PgWorkflowStore {
    tx: Transaction<'static, Postgres>,
}

impl PgWorkflowStore {
    pub(crate) async fn begin(pool: &PgPool) -> Result<Self, sqlx::Error> {
        Ok(Self { tx: pool.begin().await? })
    }

    pub(crate) async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn lock_key(&mut self, key: &str) -> Result<(), sqlx::Error> {
        repositories::requests::advisory_xact_lock(&mut *self.tx, key).await
    }

    async fn find_course_by_code(&mut self, code: &str) -> Result<Option<Course>, sqlx::Error> {
        repositories::courses::find_by_code(&mut *self.tx, code).await
    }

    async fn find_course_by_name(&mut self, name: &str) -> Result<Option<Course>, sqlx::Error> {
        repositories::courses::find_by_name(&mut *self.tx, name).await
    }

    async fn create_course(
        &mut self,
        code: &str,
        name: &str,
        category: &str,
    ) -> Result<Course, sqlx::Error> {
        repositories::courses::create(
            &mut *self.tx,
            repositories::courses::CreateCourse {
                id: &Uuid::new_v4().to_string(),
                course_code: code,
                course_name: name,
                course_category: category,
                created_at: primitive_now_utc(),
            },
        )
        .await
    }

    async fn find_question(&mut self, question_id: &str) -> Result<Option<Question>, sqlx::Error> {
        repositories::questions::find_by_id(&mut *self.tx, question_id).await
    }

    async fn lock_experiment(
        &mut self,
        experiment_id: &str,
    ) -> Result<Option<Experiment>, sqlx::Error> {
        repositories::experiments::find_for_update(&mut *self.tx, experiment_id).await
    }

    async fn set_experiment_is_answer(
        &mut self,
        experiment_id: &str,
        is_answer: bool,
    ) -> Result<(), sqlx::Error> {
        repositories::experiments::set_is_answer(
            &mut *self.tx,
            experiment_id,
            is_answer,
            primitive_now_utc(),
        )
        .await
    }

    async fn lock_answer(&mut self, answer_id: &str) -> Result<Option<Answer>, sqlx::Error> {
        repositories::answers::find_for_update(&mut *self.tx, answer_id).await
    }

    async fn create_answer(&mut self, answer: NewAnswer<'_>) -> Result<Answer, sqlx::Error> {
        repositories::answers::create(
            &mut *self.tx,
            repositories::answers::CreateAnswer {
                id: &Uuid::new_v4().to_string(),
                question_id: answer.question_id,
                llm_name: answer.llm_name,
                answer_text: answer.answer_text,
                comment: answer.comment,
                score: answer.score,
                created_at: primitive_now_utc(),
            },
        )
        .await
    }

    async fn set_answer_score(
        &mut self,
        answer_id: &str,
        score: f64,
        score_update_count: i32,
    ) -> Result<Answer, sqlx::Error> {
        repositories::answers::set_score(
            &mut *self.tx,
            answer_id,
            score,
            score_update_count,
            primitive_now_utc(),
        )
        .await
    }

    async fn lock_request(&mut self, request_id: &str) -> Result<Option<Request>, sqlx::Error> {
        repositories::requests::find_for_update(&mut *self.tx, request_id).await
    }

    async fn experiment_has_request(&mut self, experiment_id: &str) -> Result<bool, sqlx::Error> {
        repositories::requests::experiment_has_request(&mut *self.tx, experiment_id).await
    }

    async fn has_active_score_request(
        &mut self,
        requester_id: &str,
        answer_id: &str,
    ) -> Result<bool, sqlx::Error> {
        repositories::requests::has_active_score_request(&mut *self.tx, requester_id, answer_id)
            .await
    }

    async fn insert_request(
        &mut self,
        requester_id: &str,
        explanation: Option<&str>,
        payload: &RequestPayload,
    ) -> Result<Request, sqlx::Error> {
        repositories::requests::insert(
            &mut *self.tx,
            repositories::requests::CreateRequest {
                id: &Uuid::new_v4().to_string(),
                requester_id,
                explanation,
                payload,
                created_at: primitive_now_utc(),
            },
        )
        .await
    }

    async fn finish_review(
        &mut self,
        request_id: &str,
        status: RequestStatus,
        reviewed_by: &str,
    ) -> Result<Option<Request>, sqlx::Error> {
        repositories::requests::finish_review(
            &mut *self.tx,
            request_id,
            status,
            reviewed_by,
            primitive_now_utc(),
        )
        .await
    }

    async fn set_explanation(
        &mut self,
        request_id: &str,
        explanation: Option<&str>,
    ) -> Result<Option<Request>, sqlx::Error> {
        repositories::requests::set_explanation(
            &mut *self.tx,
            request_id,
            explanation,
            primitive_now_utc(),
        )
        .await
    }
}
