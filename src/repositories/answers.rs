use sqlx::PgPool;

use crate::db::models::Answer;

const COLUMNS: &str = "id, question_id, llm_name, answer_text, comment, score, \
                       score_update_count, created_at, updated_at";

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) llm_name: &'a str,
    pub(crate) answer_text: &'a str,
    pub(crate) comment: Option<&'a str>,
    pub(crate) score: f64,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateAnswer {
    pub(crate) llm_name: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// New answers start with `score_update_count = 1`: the initial score counts as one sample.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "INSERT INTO answers (
            id, question_id, llm_name, answer_text, comment, score, score_update_count,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,1,$7,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.llm_name)
    .bind(params.answer_text)
    .bind(params.comment)
    .bind(params.score)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!("SELECT {COLUMNS} FROM answers WHERE id = $1"))
        .bind(answer_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!("SELECT {COLUMNS} FROM answers WHERE id = $1 FOR UPDATE"))
        .bind(answer_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn set_score(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
    score: f64,
    score_update_count: i32,
    updated_at: time::PrimitiveDateTime,
) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "UPDATE answers SET score = $1, score_update_count = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(score)
    .bind(score_update_count)
    .bind(updated_at)
    .bind(answer_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    answer_id: &str,
    params: UpdateAnswer,
) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "UPDATE answers SET
            llm_name = COALESCE($1, llm_name),
            answer_text = COALESCE($2, answer_text),
            comment = COALESCE($3, comment),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.llm_name)
    .bind(params.answer_text)
    .bind(params.comment)
    .bind(params.updated_at)
    .bind(answer_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, answer_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM answers WHERE id = $1").bind(answer_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_by_question(
    pool: &PgPool,
    question_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers WHERE question_id = $1
         ORDER BY score DESC, created_at
         LIMIT $2 OFFSET $3"
    ))
    .bind(question_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_question(pool: &PgPool, question_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE question_id = $1")
        .bind(question_id)
        .fetch_one(pool)
        .await
}
