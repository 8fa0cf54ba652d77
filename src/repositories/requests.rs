use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Request, RequestPayload, RequestRow};
use crate::db::types::{RequestKind, RequestStatus};

const COLUMNS: &str = "\
    id, requester_id, kind, status, explanation, course_code, course_name, course_category, \
    experiment_id, llm_name, comment, score, answer_id, new_score, reviewed_by, reviewed_at, \
    created_at, updated_at";

pub(crate) struct CreateRequest<'a> {
    pub(crate) id: &'a str,
    pub(crate) requester_id: &'a str,
    pub(crate) explanation: Option<&'a str>,
    pub(crate) payload: &'a RequestPayload,
    pub(crate) created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct RequestFilter {
    pub(crate) requester_id: Option<String>,
    pub(crate) kind: Option<RequestKind>,
    pub(crate) status: Option<RequestStatus>,
    pub(crate) newest_first: bool,
}

fn convert(row: Option<RequestRow>) -> Result<Option<Request>, sqlx::Error> {
    row.map(Request::try_from).transpose()
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateRequest<'_>,
) -> Result<Request, sqlx::Error> {
    let query = format!(
        "INSERT INTO requests (
            id, requester_id, kind, status, explanation, course_code, course_name,
            course_category, experiment_id, llm_name, comment, score, answer_id, new_score,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$15)
         RETURNING {COLUMNS}",
    );
    let mut sql = sqlx::query_as::<_, RequestRow>(&query)
        .bind(params.id)
        .bind(params.requester_id)
        .bind(params.payload.kind())
        .bind(RequestStatus::Pending)
        .bind(params.explanation);

    sql = match params.payload {
        RequestPayload::AddCourse { course_code, course_name, course_category } => sql
            .bind(Some(course_code.as_str()))
            .bind(Some(course_name.as_str()))
            .bind(Some(course_category.as_str()))
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<f64>)
            .bind(None::<&str>)
            .bind(None::<f64>),
        RequestPayload::AddExperiment { experiment_id, llm_name, comment, score } => sql
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(Some(experiment_id.as_str()))
            .bind(Some(llm_name.as_str()))
            .bind(comment.as_deref())
            .bind(Some(*score))
            .bind(None::<&str>)
            .bind(None::<f64>),
        RequestPayload::UpdateScore { answer_id, new_score } => sql
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(None::<f64>)
            .bind(Some(answer_id.as_str()))
            .bind(Some(*new_score)),
    };

    let row = sql.bind(params.created_at).fetch_one(executor).await?;
    Request::try_from(row)
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    request_id: &str,
) -> Result<Option<Request>, sqlx::Error> {
    let row =
        sqlx::query_as::<_, RequestRow>(&format!("SELECT {COLUMNS} FROM requests WHERE id = $1"))
            .bind(request_id)
            .fetch_optional(pool)
            .await?;
    convert(row)
}

pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    request_id: &str,
) -> Result<Option<Request>, sqlx::Error> {
    let row = sqlx::query_as::<_, RequestRow>(&format!(
        "SELECT {COLUMNS} FROM requests WHERE id = $1 FOR UPDATE"
    ))
    .bind(request_id)
    .fetch_optional(executor)
    .await?;
    convert(row)
}

/// Any ADD_EXPERIMENT request for the experiment counts, whatever its status.
pub(crate) async fn experiment_has_request(
    executor: impl sqlx::PgExecutor<'_>,
    experiment_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM requests WHERE kind = $1 AND experiment_id = $2
         )",
    )
    .bind(RequestKind::AddExperiment)
    .bind(experiment_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn has_active_score_request(
    executor: impl sqlx::PgExecutor<'_>,
    requester_id: &str,
    answer_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM requests
            WHERE kind = $1 AND requester_id = $2 AND answer_id = $3 AND status <> $4
         )",
    )
    .bind(RequestKind::UpdateScore)
    .bind(requester_id)
    .bind(answer_id)
    .bind(RequestStatus::Rejected)
    .fetch_one(executor)
    .await
}

/// Leaves a PENDING request; `None` when it was not PENDING any more.
pub(crate) async fn finish_review(
    executor: impl sqlx::PgExecutor<'_>,
    request_id: &str,
    status: RequestStatus,
    reviewed_by: &str,
    reviewed_at: time::PrimitiveDateTime,
) -> Result<Option<Request>, sqlx::Error> {
    let row = sqlx::query_as::<_, RequestRow>(&format!(
        "UPDATE requests
         SET status = $1, reviewed_by = $2, reviewed_at = $3, updated_at = $3
         WHERE id = $4 AND status = $5
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(reviewed_by)
    .bind(reviewed_at)
    .bind(request_id)
    .bind(RequestStatus::Pending)
    .fetch_optional(executor)
    .await?;
    convert(row)
}

pub(crate) async fn set_explanation(
    executor: impl sqlx::PgExecutor<'_>,
    request_id: &str,
    explanation: Option<&str>,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Request>, sqlx::Error> {
    let row = sqlx::query_as::<_, RequestRow>(&format!(
        "UPDATE requests SET explanation = $1, updated_at = $2
         WHERE id = $3 AND status = $4
         RETURNING {COLUMNS}",
    ))
    .bind(explanation)
    .bind(updated_at)
    .bind(request_id)
    .bind(RequestStatus::Pending)
    .fetch_optional(executor)
    .await?;
    convert(row)
}

pub(crate) async fn delete(pool: &PgPool, request_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM requests WHERE id = $1").bind(request_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Serialises submissions that contend for the same business key until commit.
pub(crate) async fn advisory_xact_lock(
    executor: impl sqlx::PgExecutor<'_>,
    key: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))").bind(key).execute(executor).await?;
    Ok(())
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a RequestFilter) {
    builder.push(" WHERE TRUE");

    if let Some(requester_id) = filter.requester_id.as_ref() {
        builder.push(" AND requester_id = ");
        builder.push_bind(requester_id);
    }
    if let Some(kind) = filter.kind {
        builder.push(" AND kind = ");
        builder.push_bind(kind);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &RequestFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Request>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM requests"));
    push_filters(&mut builder, filter);
    builder.push(if filter.newest_first {
        " ORDER BY created_at DESC, id DESC"
    } else {
        " ORDER BY created_at ASC, id ASC"
    });
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows = builder.build_query_as::<RequestRow>().fetch_all(pool).await?;
    rows.into_iter().map(Request::try_from).collect()
}

pub(crate) async fn count(pool: &PgPool, filter: &RequestFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM requests");
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
