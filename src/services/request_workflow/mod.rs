//! Submission and review of teacher change requests.
//!
//! Every entry point takes a [`WorkflowStore`] that represents a single unit of work. Callers
//! commit it only when the entry point returns `Ok`; an `Err` means nothing may be persisted.

mod error;
#[cfg(test)]
mod memory;
mod store;
#[cfg(test)]
mod tests;

pub(crate) use error::{ErrorKind, WorkflowError};
pub(crate) use store::{NewAnswer, PgWorkflowStore, WorkflowStore};

use crate::core::metrics;
use crate::db::is_unique_violation_on;
use crate::db::models::{Answer, Course, Request, RequestPayload};
use crate::db::types::{RequestStatus, UserRole};
use crate::repositories::courses::{self, normalize_code};
use crate::services::scoring::{running_mean, score_in_range};

/// Identity of the caller, passed explicitly into every operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Actor<'a> {
    pub(crate) id: &'a str,
    pub(crate) role: UserRole,
}

impl Actor<'_> {
    fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Entity produced or changed by an approval.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApprovalEffect {
    CourseCreated(Course),
    AnswerCreated(Answer),
    ScoreUpdated(Answer),
}

impl ApprovalEffect {
    /// Response code and message reported for this approval.
    fn code_and_message(&self) -> (&'static str, &'static str) {
        match self {
            Self::CourseCreated(_) => ("COURSE_ADDED", "Request approved; course created"),
            Self::AnswerCreated(_) => ("ANSWER_ADDED", "Request approved; answer created"),
            Self::ScoreUpdated(_) => ("SCORE_UPDATED", "Request approved; score updated"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ReviewOutcome {
    pub(crate) request: Request,
    pub(crate) code: &'static str,
    pub(crate) message: &'static str,
    pub(crate) effect: Option<ApprovalEffect>,
}

/// Validates a requested status change without touching storage.
///
/// Checks run in a fixed order: permission, then the current status, then the target value.
/// The requester is only refused up front when they explicitly ask for APPROVED or REJECTED,
/// so a requester sending garbage still learns about a closed request first.
pub(crate) fn check_transition(
    request: &Request,
    actor: Actor<'_>,
    raw_status: &str,
) -> Result<RequestStatus, WorkflowError> {
    let target = RequestStatus::parse(raw_status);

    if !actor.is_admin() {
        if actor.id != request.requester_id {
            return Err(WorkflowError::NoPermission);
        }
        if matches!(target, Some(RequestStatus::Approved | RequestStatus::Rejected)) {
            return Err(WorkflowError::NoPermission);
        }
    }

    if request.status != RequestStatus::Pending {
        return Err(WorkflowError::RequestNotPending);
    }

    match target {
        Some(RequestStatus::Pending) => Err(WorkflowError::RequestAlreadyPending),
        Some(status) => Ok(status),
        None => Err(WorkflowError::InvalidRequestStatus(raw_status.trim().to_string())),
    }
}

/// Validates a new request against current data and stores it as PENDING.
pub(crate) async fn submit<S: WorkflowStore>(
    store: &mut S,
    requester_id: &str,
    explanation: Option<&str>,
    payload: RequestPayload,
) -> Result<Request, WorkflowError> {
    let payload = match payload {
        RequestPayload::AddCourse { course_code, course_name, course_category } => {
            let course_code = normalize_code(&course_code);
            store.lock_key(&format!("course_code:{course_code}")).await?;
            if store.find_course_by_code(&course_code).await?.is_some() {
                return Err(WorkflowError::CourseCodeExists(course_code));
            }
            let course_name = course_name.trim().to_string();
            if store.find_course_by_name(&course_name).await?.is_some() {
                return Err(WorkflowError::CourseNameExists(course_name));
            }
            RequestPayload::AddCourse {
                course_code,
                course_name,
                course_category: course_category.trim().to_string(),
            }
        }
        RequestPayload::AddExperiment { experiment_id, llm_name, comment, score } => {
            store.lock_key(&format!("experiment:{experiment_id}")).await?;
            let experiment = store
                .lock_experiment(&experiment_id)
                .await?
                .ok_or(WorkflowError::ExperimentNotFound)?;
            if experiment.is_answer {
                return Err(WorkflowError::ExperimentAlreadyAnswer);
            }
            if store.experiment_has_request(&experiment_id).await? {
                return Err(WorkflowError::ExperimentAlreadyRequested);
            }
            let question = store
                .find_question(&experiment.question_id)
                .await?
                .ok_or(WorkflowError::QuestionNotFound)?;
            if !score_in_range(score, question.question_score) {
                return Err(WorkflowError::InvalidScore { max: question.question_score });
            }
            RequestPayload::AddExperiment { experiment_id, llm_name, comment, score }
        }
        RequestPayload::UpdateScore { answer_id, new_score } => {
            store.lock_key(&format!("score:{requester_id}:{answer_id}")).await?;
            let answer =
                store.lock_answer(&answer_id).await?.ok_or(WorkflowError::AnswerNotFound)?;
            if store.has_active_score_request(requester_id, &answer_id).await? {
                return Err(WorkflowError::RequestAlreadySubmitted);
            }
            let question = store
                .find_question(&answer.question_id)
                .await?
                .ok_or(WorkflowError::QuestionNotFound)?;
            if !score_in_range(new_score, question.question_score) {
                return Err(WorkflowError::InvalidScore { max: question.question_score });
            }
            RequestPayload::UpdateScore { answer_id, new_score }
        }
    };

    let request = store.insert_request(requester_id, explanation, &payload).await?;
    metrics::record_submission(request.kind());
    tracing::info!(
        request_id = %request.id,
        actor_id = %requester_id,
        kind = request.kind().as_str(),
        "Request submitted"
    );
    Ok(request)
}

/// Moves a PENDING request to a terminal status, running the approval effect for APPROVED.
pub(crate) async fn review<S: WorkflowStore>(
    store: &mut S,
    request_id: &str,
    actor: Actor<'_>,
    raw_status: &str,
) -> Result<ReviewOutcome, WorkflowError> {
    let request = store.lock_request(request_id).await?.ok_or(WorkflowError::RequestNotFound)?;
    let target = check_transition(&request, actor, raw_status)?;

    let ((code, message), effect) = match target {
        RequestStatus::Approved => {
            let effect = apply_approval(store, &request.payload).await?;
            (effect.code_and_message(), Some(effect))
        }
        RequestStatus::Rejected => (("REQUEST_REJECTED", "Request rejected"), None),
        RequestStatus::Revoked => (("REQUEST_REVOKED", "Request revoked"), None),
        RequestStatus::Pending => return Err(WorkflowError::RequestAlreadyPending),
    };

    let request = store
        .finish_review(request_id, target, actor.id)
        .await?
        .ok_or(WorkflowError::RequestNotPending)?;

    metrics::record_review(request.kind(), target);
    tracing::info!(
        request_id = %request.id,
        actor_id = %actor.id,
        kind = request.kind().as_str(),
        status = target.as_str(),
        "Request reviewed"
    );

    Ok(ReviewOutcome { request, code, message, effect })
}

async fn apply_approval<S: WorkflowStore>(
    store: &mut S,
    payload: &RequestPayload,
) -> Result<ApprovalEffect, WorkflowError> {
    match payload {
        RequestPayload::AddCourse { course_code, course_name, course_category } => {
            if store.find_course_by_code(course_code).await?.is_some() {
                return Err(WorkflowError::CourseAlreadyExists(course_code.clone()));
            }
            if store.find_course_by_name(course_name).await?.is_some() {
                return Err(WorkflowError::CourseNameExists(course_name.clone()));
            }
            let course = store
                .create_course(course_code, course_name, course_category)
                .await
                .map_err(|err| {
                    if is_unique_violation_on(&err, courses::CODE_CONSTRAINT) {
                        WorkflowError::CourseAlreadyExists(course_code.clone())
                    } else if is_unique_violation_on(&err, courses::NAME_CONSTRAINT) {
                        WorkflowError::CourseNameExists(course_name.clone())
                    } else {
                        WorkflowError::CourseNotAdded(err)
                    }
                })?;
            Ok(ApprovalEffect::CourseCreated(course))
        }
        RequestPayload::AddExperiment { experiment_id, llm_name, comment, score } => {
            let experiment = store
                .lock_experiment(experiment_id)
                .await?
                .ok_or(WorkflowError::ExperimentNotFound)?;
            if experiment.is_answer {
                return Err(WorkflowError::ExperimentAlreadyAnswer);
            }
            store
                .set_experiment_is_answer(experiment_id, true)
                .await
                .map_err(WorkflowError::AnswerNotAdded)?;
            let answer = store
                .create_answer(NewAnswer {
                    question_id: &experiment.question_id,
                    llm_name,
                    answer_text: &experiment.experiment_text,
                    comment: comment.as_deref(),
                    score: *score,
                })
                .await
                .map_err(WorkflowError::AnswerNotAdded)?;
            Ok(ApprovalEffect::AnswerCreated(answer))
        }
        RequestPayload::UpdateScore { answer_id, new_score } => {
            let answer =
                store.lock_answer(answer_id).await?.ok_or(WorkflowError::AnswerNotFound)?;
            let answer = apply_score(store, answer, *new_score).await?;
            Ok(ApprovalEffect::ScoreUpdated(answer))
        }
    }
}

/// Folds `proposed` into a locked answer's running mean after checking it against the
/// question ceiling. Shared by approvals and the direct admin score endpoint.
async fn apply_score<S: WorkflowStore>(
    store: &mut S,
    answer: Answer,
    proposed: f64,
) -> Result<Answer, WorkflowError> {
    let question =
        store.find_question(&answer.question_id).await?.ok_or(WorkflowError::QuestionNotFound)?;
    if !score_in_range(proposed, question.question_score) {
        return Err(WorkflowError::InvalidScore { max: question.question_score });
    }

    let (score, count) = running_mean(answer.score, answer.score_update_count, proposed);
    Ok(store.set_answer_score(&answer.id, score, count).await?)
}

/// Direct score update on an answer, outside the request workflow.
pub(crate) async fn update_answer_score<S: WorkflowStore>(
    store: &mut S,
    answer_id: &str,
    proposed: f64,
) -> Result<Answer, WorkflowError> {
    let answer = store.lock_answer(answer_id).await?.ok_or(WorkflowError::AnswerNotFound)?;
    apply_score(store, answer, proposed).await
}

/// Replaces the free-text explanation. Only the requester may do it, and only while PENDING.
pub(crate) async fn update_explanation<S: WorkflowStore>(
    store: &mut S,
    request_id: &str,
    actor: Actor<'_>,
    explanation: Option<&str>,
) -> Result<Request, WorkflowError> {
    let request = store.lock_request(request_id).await?.ok_or(WorkflowError::RequestNotFound)?;
    if request.requester_id != actor.id {
        return Err(WorkflowError::NoPermission);
    }
    if request.status != RequestStatus::Pending {
        return Err(WorkflowError::RequestNotPending);
    }

    store.set_explanation(request_id, explanation).await?.ok_or(WorkflowError::RequestNotPending)
}
