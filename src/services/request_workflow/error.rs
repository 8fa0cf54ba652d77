use thiserror::Error;

/// Coarse classification of workflow failures; the HTTP layer maps it to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Forbidden,
    State,
    Internal,
}

#[derive(Debug, Error)]
pub(crate) enum WorkflowError {
    #[error("Request not found.")]
    RequestNotFound,
    #[error("You don't have permission to change this request.")]
    NoPermission,
    #[error("Request status is not PENDING.")]
    RequestNotPending,
    #[error("Request is already PENDING.")]
    RequestAlreadyPending,
    #[error("Invalid request status: {0}.")]
    InvalidRequestStatus(String),

    #[error("Course code {0} already exists.")]
    CourseCodeExists(String),
    #[error("Course {0} already exists.")]
    CourseAlreadyExists(String),
    #[error("Course name {0} already exists.")]
    CourseNameExists(String),
    #[error("Course not added.")]
    CourseNotAdded(#[source] sqlx::Error),

    #[error("Experiment not found.")]
    ExperimentNotFound,
    #[error("Experiment is already an answer.")]
    ExperimentAlreadyAnswer,
    #[error("Experiment is already requested.")]
    ExperimentAlreadyRequested,
    #[error("Answer not added.")]
    AnswerNotAdded(#[source] sqlx::Error),

    #[error("Answer not found.")]
    AnswerNotFound,
    #[error("Question not found.")]
    QuestionNotFound,
    #[error(
        "You have already submitted a score update request for this answer. \
         Every user can only submit one score update request for each answer."
    )]
    RequestAlreadySubmitted,
    #[error("Invalid score. Score should be between 0 and question max score ({max}).")]
    InvalidScore { max: f64 },

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl WorkflowError {
    /// Stable machine-readable code returned to clients.
    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::RequestNotFound => "REQUEST_NOT_FOUND",
            Self::NoPermission => "NO_PERMISSION",
            Self::RequestNotPending => "REQUEST_NOT_PENDING",
            Self::RequestAlreadyPending => "REQUEST_ALREADY_PENDING",
            Self::InvalidRequestStatus(_) => "INVALID_REQUEST_STATUS",
            Self::CourseCodeExists(_) => "COURSE_CODE_EXISTS",
            Self::CourseAlreadyExists(_) => "COURSE_ALREADY_EXIST",
            Self::CourseNameExists(_) => "COURSE_NAME_EXISTS",
            Self::CourseNotAdded(_) => "COURSE_NOT_ADDED",
            Self::ExperimentNotFound => "EXPERIMENT_NOT_FOUND",
            Self::ExperimentAlreadyAnswer => "EXPERIMENT_ALREADY_ANSWER",
            Self::ExperimentAlreadyRequested => "EXPERIMENT_ALREADY_REQUESTED",
            Self::AnswerNotAdded(_) => "ANSWER_NOT_ADDED",
            Self::AnswerNotFound => "ANSWER_NOT_FOUND",
            Self::QuestionNotFound => "QUESTION_NOT_FOUND",
            Self::RequestAlreadySubmitted => "REQUEST_ALREADY_SUBMITTED",
            Self::InvalidScore { .. } => "INVALID_SCORE",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestNotFound
            | Self::ExperimentNotFound
            | Self::AnswerNotFound
            | Self::QuestionNotFound => ErrorKind::NotFound,
            Self::NoPermission => ErrorKind::Forbidden,
            Self::RequestNotPending | Self::RequestAlreadyPending => ErrorKind::State,
            Self::InvalidRequestStatus(_) | Self::InvalidScore { .. } => ErrorKind::Validation,
            Self::CourseCodeExists(_)
            | Self::CourseAlreadyExists(_)
            | Self::CourseNameExists(_)
            | Self::ExperimentAlreadyAnswer
            | Self::ExperimentAlreadyRequested
            | Self::RequestAlreadySubmitted => ErrorKind::Conflict,
            Self::CourseNotAdded(_) | Self::AnswerNotAdded(_) | Self::Store(_) => {
                ErrorKind::Internal
            }
        }
    }
}
