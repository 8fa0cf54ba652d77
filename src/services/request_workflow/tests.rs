use super::memory::MemoryStore;
use super::*;
use crate::db::types::RequestKind;

const ADMIN: Actor<'static> = Actor { id: "admin-1", role: UserRole::Admin };
const TEACHER: Actor<'static> = Actor { id: "teacher-1", role: UserRole::Teacher };
const OTHER_TEACHER: Actor<'static> = Actor { id: "teacher-2", role: UserRole::Teacher };

fn fixture() -> MemoryStore {
    MemoryStore::default()
        .with_course("course-1", "RS100")
        .with_question("question-1", "course-1", 100.0)
        .with_experiment("experiment-1", "question-1", TEACHER.id)
        .with_answer("answer-1", "question-1", 80.0)
}

/// Runs `submit` on a copy of the store and keeps the copy only on success.
async fn submit_unit(
    store: &mut MemoryStore,
    requester: Actor<'_>,
    payload: RequestPayload,
) -> Result<Request, WorkflowError> {
    let mut work = store.clone();
    let result = submit(&mut work, requester.id, Some("please"), payload).await;
    if result.is_ok() {
        *store = work;
    }
    result
}

async fn review_unit(
    store: &mut MemoryStore,
    request_id: &str,
    actor: Actor<'_>,
    status: &str,
) -> Result<ReviewOutcome, WorkflowError> {
    let mut work = store.clone();
    let result = review(&mut work, request_id, actor, status).await;
    if result.is_ok() {
        *store = work;
    }
    result
}

fn add_course(code: &str) -> RequestPayload {
    RequestPayload::AddCourse {
        course_code: code.to_string(),
        course_name: "Systems Programming".to_string(),
        course_category: "CS".to_string(),
    }
}

fn add_experiment(experiment_id: &str, score: f64) -> RequestPayload {
    RequestPayload::AddExperiment {
        experiment_id: experiment_id.to_string(),
        llm_name: "claude".to_string(),
        comment: Some("solid".to_string()),
        score,
    }
}

fn update_score(answer_id: &str, new_score: f64) -> RequestPayload {
    RequestPayload::UpdateScore { answer_id: answer_id.to_string(), new_score }
}

#[tokio::test]
async fn add_course_round_trip_normalizes_code() {
    let mut store = fixture();

    let request = submit_unit(&mut store, TEACHER, add_course("cs101")).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.kind(), RequestKind::AddCourse);
    assert!(store.locked_keys.contains(&"course_code:CS101".to_string()));

    let outcome = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap();
    assert_eq!(outcome.code, "COURSE_ADDED");
    assert_eq!(outcome.message, "Request approved; course created");
    assert_eq!(outcome.request.status, RequestStatus::Approved);
    assert_eq!(outcome.request.reviewed_by.as_deref(), Some(ADMIN.id));
    assert!(outcome.request.reviewed_at.is_some());

    let Some(ApprovalEffect::CourseCreated(course)) = outcome.effect else {
        panic!("expected a created course");
    };
    assert_eq!(course.course_code, "CS101");
    let stored = store.find_course_by_code("cs101").await.unwrap().expect("course persisted");
    assert_eq!(stored.id, course.id);
}

#[tokio::test]
async fn add_course_rejects_existing_code_in_any_case() {
    let mut store = fixture();
    let err = submit_unit(&mut store, TEACHER, add_course("rs100")).await.unwrap_err();
    assert_eq!(err.code(), "COURSE_CODE_EXISTS");
    assert!(store.requests.is_empty());
}

#[tokio::test]
async fn add_course_approval_rechecks_uniqueness() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, add_course("db200")).await.unwrap();

    store = store.with_course("course-2", "DB200");

    let err = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "COURSE_ALREADY_EXIST");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(store.status_of(&request.id), Some(RequestStatus::Pending));
}

#[tokio::test]
async fn add_course_refuses_taken_name_at_submission() {
    let mut store = fixture();
    let payload = RequestPayload::AddCourse {
        course_code: "cs999".to_string(),
        course_name: "  RS100 course ".to_string(),
        course_category: "CS".to_string(),
    };

    let err = submit_unit(&mut store, TEACHER, payload).await.unwrap_err();
    assert_eq!(err.code(), "COURSE_NAME_EXISTS");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(store.requests.is_empty());
}

#[tokio::test]
async fn name_taken_after_submission_is_not_reported_as_code_clash() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, add_course("cs999")).await.unwrap();

    store = store.with_course("course-2", "CS100");
    store.courses.get_mut("course-2").unwrap().course_name = "Systems Programming".to_string();

    let err = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "COURSE_NAME_EXISTS");
    assert!(err.to_string().contains("Systems Programming"), "{err}");
    assert_eq!(store.status_of(&request.id), Some(RequestStatus::Pending));
    assert!(store.find_course_by_code("CS999").await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_reject_reports_not_pending() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, add_course("os300")).await.unwrap();

    let outcome = review_unit(&mut store, &request.id, ADMIN, "REJECTED").await.unwrap();
    assert_eq!(outcome.code, "REQUEST_REJECTED");
    assert_eq!(outcome.message, "Request rejected");
    assert!(outcome.effect.is_none());

    for _ in 0..3 {
        let err = review_unit(&mut store, &request.id, ADMIN, "REJECTED").await.unwrap_err();
        assert_eq!(err.code(), "REQUEST_NOT_PENDING");
        assert_eq!(store.status_of(&request.id), Some(RequestStatus::Rejected));
    }
    assert!(store.find_course_by_code("OS300").await.unwrap().is_none());
}

#[tokio::test]
async fn requester_can_only_revoke() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, add_course("ml400")).await.unwrap();

    let err = review_unit(&mut store, &request.id, TEACHER, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "NO_PERMISSION");
    let err = review_unit(&mut store, &request.id, TEACHER, "rejected").await.unwrap_err();
    assert_eq!(err.code(), "NO_PERMISSION");
    assert_eq!(store.status_of(&request.id), Some(RequestStatus::Pending));

    let outcome = review_unit(&mut store, &request.id, TEACHER, "REVOKED").await.unwrap();
    assert_eq!(outcome.code, "REQUEST_REVOKED");
    assert_eq!(outcome.message, "Request revoked");
    assert_eq!(outcome.request.status, RequestStatus::Revoked);

    let err = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "REQUEST_NOT_PENDING");
    assert!(store.find_course_by_code("ML400").await.unwrap().is_none());
}

#[tokio::test]
async fn strangers_cannot_touch_a_request() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, add_course("ai500")).await.unwrap();

    let err = review_unit(&mut store, &request.id, OTHER_TEACHER, "REVOKED").await.unwrap_err();
    assert_eq!(err.code(), "NO_PERMISSION");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let student = Actor { id: "student-1", role: UserRole::Student };
    let err = review_unit(&mut store, &request.id, student, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "NO_PERMISSION");
}

#[tokio::test]
async fn review_guards_run_in_order() {
    let mut store = fixture();

    let err = review_unit(&mut store, "missing", ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "REQUEST_NOT_FOUND");

    let request = submit_unit(&mut store, TEACHER, add_course("pl600")).await.unwrap();

    let err = review_unit(&mut store, &request.id, ADMIN, "pending").await.unwrap_err();
    assert_eq!(err.code(), "REQUEST_ALREADY_PENDING");

    let err = review_unit(&mut store, &request.id, ADMIN, "DONE").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_REQUEST_STATUS");
    assert_eq!(err.kind(), ErrorKind::Validation);

    // The requester sending an unknown value is not a permission problem.
    let err = review_unit(&mut store, &request.id, TEACHER, "DONE").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_REQUEST_STATUS");

    review_unit(&mut store, &request.id, ADMIN, "REVOKED").await.unwrap();
    let err = review_unit(&mut store, &request.id, ADMIN, "PENDING").await.unwrap_err();
    assert_eq!(err.code(), "REQUEST_NOT_PENDING");
}

#[tokio::test]
async fn add_experiment_promotes_into_answer() {
    let mut store = fixture();
    let request =
        submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 72.5)).await.unwrap();
    assert!(store.locked_keys.contains(&"experiment:experiment-1".to_string()));

    let outcome = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap();
    assert_eq!(outcome.code, "ANSWER_ADDED");
    let Some(ApprovalEffect::AnswerCreated(answer)) = outcome.effect else {
        panic!("expected a created answer");
    };
    assert_eq!(answer.question_id, "question-1");
    assert_eq!(answer.answer_text, "transcript of experiment-1");
    assert_eq!(answer.llm_name, "claude");
    assert_eq!(answer.comment.as_deref(), Some("solid"));
    assert_eq!(answer.score, 72.5);
    assert_eq!(answer.score_update_count, 1);
    assert!(store.experiments["experiment-1"].is_answer);
}

#[tokio::test]
async fn promoted_experiment_is_refused_before_and_after() {
    let mut store = fixture().with_experiment("experiment-2", "question-1", TEACHER.id);
    store.experiments.get_mut("experiment-2").unwrap().is_answer = true;

    let err = submit_unit(&mut store, TEACHER, add_experiment("experiment-2", 10.0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "EXPERIMENT_ALREADY_ANSWER");

    let request =
        submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 10.0)).await.unwrap();
    review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap();

    let err = submit_unit(&mut store, OTHER_TEACHER, add_experiment("experiment-1", 10.0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "EXPERIMENT_ALREADY_ANSWER");
}

#[tokio::test]
async fn rejected_experiment_request_still_blocks_resubmission() {
    let mut store = fixture();
    let request =
        submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 50.0)).await.unwrap();

    let err = submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 60.0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "EXPERIMENT_ALREADY_REQUESTED");

    review_unit(&mut store, &request.id, ADMIN, "REJECTED").await.unwrap();

    let err = submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 60.0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "EXPERIMENT_ALREADY_REQUESTED");

    // Removing the old request is what lifts the lock.
    store.requests.remove(&request.id);
    submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 60.0)).await.unwrap();
}

#[tokio::test]
async fn add_experiment_validates_references_and_score() {
    let mut store = fixture();

    let err =
        submit_unit(&mut store, TEACHER, add_experiment("missing", 10.0)).await.unwrap_err();
    assert_eq!(err.code(), "EXPERIMENT_NOT_FOUND");

    let err = submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 100.5))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidScore { max } if max == 100.0));
    assert!(store.requests.is_empty());
}

#[tokio::test]
async fn approval_of_deleted_experiment_leaves_request_pending() {
    let mut store = fixture();
    let request =
        submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 40.0)).await.unwrap();
    store.experiments.remove("experiment-1");

    let err = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "EXPERIMENT_NOT_FOUND");
    assert_eq!(store.status_of(&request.id), Some(RequestStatus::Pending));
}

#[tokio::test]
async fn failed_answer_insert_rolls_back_the_promotion() {
    let mut store = fixture();
    let request =
        submit_unit(&mut store, TEACHER, add_experiment("experiment-1", 40.0)).await.unwrap();
    let answers_before = store.answers.len();
    store.fail_answer_insert = true;

    let err = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "ANSWER_NOT_ADDED");
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(!store.experiments["experiment-1"].is_answer);
    assert_eq!(store.answers.len(), answers_before);
    assert_eq!(store.status_of(&request.id), Some(RequestStatus::Pending));

    store.fail_answer_insert = false;
    let outcome = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap();
    assert_eq!(outcome.code, "ANSWER_ADDED");
}

#[tokio::test]
async fn approved_score_updates_follow_running_mean() {
    let mut store = fixture();

    let first = submit_unit(&mut store, TEACHER, update_score("answer-1", 90.0)).await.unwrap();
    let outcome = review_unit(&mut store, &first.id, ADMIN, "APPROVED").await.unwrap();
    assert_eq!(outcome.code, "SCORE_UPDATED");
    assert_eq!(outcome.message, "Request approved; score updated");
    let Some(ApprovalEffect::ScoreUpdated(answer)) = outcome.effect else {
        panic!("expected an updated answer");
    };
    assert_eq!((answer.score, answer.score_update_count), (85.0, 2));

    let second =
        submit_unit(&mut store, OTHER_TEACHER, update_score("answer-1", 70.0)).await.unwrap();
    review_unit(&mut store, &second.id, ADMIN, "APPROVED").await.unwrap();

    let answer = &store.answers["answer-1"];
    assert_eq!((answer.score, answer.score_update_count), (80.0, 3));
}

#[tokio::test]
async fn out_of_range_score_approval_leaves_request_pending() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, update_score("answer-1", 95.0)).await.unwrap();

    // Ceiling lowered after submission; approval re-validates against current data.
    store.questions.get_mut("question-1").unwrap().question_score = 90.0;

    let err = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_SCORE");
    assert!(err.to_string().contains("(90)"), "{err}");
    assert_eq!(store.status_of(&request.id), Some(RequestStatus::Pending));
    assert_eq!(store.answers["answer-1"].score, 80.0);
}

#[tokio::test]
async fn score_above_ceiling_is_refused_at_submission() {
    let mut store = fixture();
    let err = submit_unit(&mut store, TEACHER, update_score("answer-1", 150.0)).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_SCORE");
    assert!(err.to_string().contains("(100)"), "{err}");
    assert!(store.requests.is_empty());
}

#[tokio::test]
async fn approving_stored_out_of_range_score_fails() {
    let mut store = fixture();
    let request = store
        .insert_request(TEACHER.id, None, &update_score("answer-1", 150.0))
        .await
        .unwrap();

    let err = review_unit(&mut store, &request.id, ADMIN, "APPROVED").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_SCORE");
    assert_eq!(store.status_of(&request.id), Some(RequestStatus::Pending));
    assert_eq!(store.answers["answer-1"].score_update_count, 1);
}

#[tokio::test]
async fn one_open_score_request_per_requester_and_answer() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, update_score("answer-1", 60.0)).await.unwrap();
    assert!(store.locked_keys.contains(&"score:teacher-1:answer-1".to_string()));

    let err = submit_unit(&mut store, TEACHER, update_score("answer-1", 61.0)).await.unwrap_err();
    assert_eq!(err.code(), "REQUEST_ALREADY_SUBMITTED");

    // A different requester is independent.
    submit_unit(&mut store, OTHER_TEACHER, update_score("answer-1", 61.0)).await.unwrap();

    // Approved or revoked requests still count; only a rejection frees the slot.
    review_unit(&mut store, &request.id, TEACHER, "REVOKED").await.unwrap();
    let err = submit_unit(&mut store, TEACHER, update_score("answer-1", 62.0)).await.unwrap_err();
    assert_eq!(err.code(), "REQUEST_ALREADY_SUBMITTED");

    store.requests.get_mut(&request.id).unwrap().status = RequestStatus::Rejected;
    submit_unit(&mut store, TEACHER, update_score("answer-1", 62.0)).await.unwrap();
}

#[tokio::test]
async fn update_score_requires_existing_answer() {
    let mut store = fixture();
    let err = submit_unit(&mut store, TEACHER, update_score("missing", 10.0)).await.unwrap_err();
    assert_eq!(err.code(), "ANSWER_NOT_FOUND");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn direct_score_update_uses_the_same_rule() {
    let mut store = fixture();
    let answer = update_answer_score(&mut store, "answer-1", 90.0).await.unwrap();
    assert_eq!((answer.score, answer.score_update_count), (85.0, 2));

    let err = update_answer_score(&mut store, "answer-1", -1.0).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_SCORE");
}

#[tokio::test]
async fn explanation_is_editable_by_requester_while_pending() {
    let mut store = fixture();
    let request = submit_unit(&mut store, TEACHER, add_course("se700")).await.unwrap();

    let err = update_explanation(&mut store, &request.id, ADMIN, Some("admin note"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NO_PERMISSION");

    let updated =
        update_explanation(&mut store, &request.id, TEACHER, Some("new rationale")).await.unwrap();
    assert_eq!(updated.explanation.as_deref(), Some("new rationale"));

    review_unit(&mut store, &request.id, ADMIN, "REJECTED").await.unwrap();
    let err =
        update_explanation(&mut store, &request.id, TEACHER, None).await.unwrap_err();
    assert_eq!(err.code(), "REQUEST_NOT_PENDING");
}

#[test]
fn check_transition_is_pure() {
    let now = crate::core::time::primitive_now_utc();
    let request = Request {
        id: "req-1".to_string(),
        requester_id: TEACHER.id.to_string(),
        status: RequestStatus::Pending,
        explanation: None,
        reviewed_by: None,
        reviewed_at: None,
        created_at: now,
        updated_at: now,
        payload: add_course("X1"),
    };

    assert_eq!(check_transition(&request, ADMIN, "approved").unwrap(), RequestStatus::Approved);
    assert_eq!(check_transition(&request, TEACHER, "REVOKED").unwrap(), RequestStatus::Revoked);
    assert!(matches!(
        check_transition(&request, OTHER_TEACHER, "REVOKED"),
        Err(WorkflowError::NoPermission)
    ));

    let closed = Request { status: RequestStatus::Approved, ..request };
    assert!(matches!(
        check_transition(&closed, TEACHER, "REVOKED"),
        Err(WorkflowError::RequestNotPending)
    ));
    assert!(matches!(
        check_transition(&closed, TEACHER, "APPROVED"),
        Err(WorkflowError::NoPermission)
    ));
}
