use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Experiment;

const COLUMNS: &str =
    "id, user_id, question_id, experiment_text, is_answer, created_at, updated_at";

pub(crate) struct CreateExperiment<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) experiment_text: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateExperiment<'_>,
) -> Result<Experiment, sqlx::Error> {
    sqlx::query_as::<_, Experiment>(&format!(
        "INSERT INTO experiments (
            id, user_id, question_id, experiment_text, is_answer, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,FALSE,$5,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.question_id)
    .bind(params.experiment_text)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    experiment_id: &str,
) -> Result<Option<Experiment>, sqlx::Error> {
    sqlx::query_as::<_, Experiment>(&format!("SELECT {COLUMNS} FROM experiments WHERE id = $1"))
        .bind(experiment_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    experiment_id: &str,
) -> Result<Option<Experiment>, sqlx::Error> {
    sqlx::query_as::<_, Experiment>(&format!(
        "SELECT {COLUMNS} FROM experiments WHERE id = $1 FOR UPDATE"
    ))
    .bind(experiment_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn set_is_answer(
    executor: impl sqlx::PgExecutor<'_>,
    experiment_id: &str,
    is_answer: bool,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE experiments SET is_answer = $1, updated_at = $2 WHERE id = $3")
        .bind(is_answer)
        .bind(updated_at)
        .bind(experiment_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Promoted experiments are frozen; returns `None` when the row is missing or promoted.
pub(crate) async fn update_text(
    pool: &PgPool,
    experiment_id: &str,
    experiment_text: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Experiment>, sqlx::Error> {
    sqlx::query_as::<_, Experiment>(&format!(
        "UPDATE experiments SET experiment_text = $1, updated_at = $2
         WHERE id = $3 AND is_answer = FALSE
         RETURNING {COLUMNS}",
    ))
    .bind(experiment_text)
    .bind(updated_at)
    .bind(experiment_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, experiment_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM experiments WHERE id = $1")
        .bind(experiment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    user_id: &'a str,
    question_id: Option<&'a str>,
) {
    builder.push(" WHERE user_id = ");
    builder.push_bind(user_id);
    if let Some(question_id) = question_id {
        builder.push(" AND question_id = ");
        builder.push_bind(question_id);
    }
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
    question_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Experiment>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM experiments"));
    push_filters(&mut builder, user_id, question_id);
    builder.push(" ORDER BY created_at DESC, id LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    builder.build_query_as::<Experiment>().fetch_all(pool).await
}

pub(crate) async fn count_by_user(
    pool: &PgPool,
    user_id: &str,
    question_id: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM experiments");
    push_filters(&mut builder, user_id, question_id);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
