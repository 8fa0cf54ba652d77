use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Question;
use crate::db::types::QuestionCategory;

const COLUMNS: &str = "id, course_id, question_text, question_category, question_score, \
                       created_at, updated_at";

const JOINED_COLUMNS: &str = "q.id, q.course_id, q.question_text, q.question_category, \
                              q.question_score, q.created_at, q.updated_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) question_text: &'a str,
    pub(crate) question_category: QuestionCategory,
    pub(crate) question_score: f64,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateQuestion {
    pub(crate) question_text: Option<String>,
    pub(crate) question_category: Option<QuestionCategory>,
    pub(crate) question_score: Option<f64>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct QuestionFilter {
    pub(crate) course_id: Option<String>,
    pub(crate) keyword: Option<String>,
    pub(crate) course_name_or_code: Option<String>,
    pub(crate) course_category: Option<String>,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, course_id, question_text, question_category, question_score,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.question_text)
    .bind(params.question_category)
    .bind(params.question_score)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(question_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    question_id: &str,
    params: UpdateQuestion,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            question_text = COALESCE($1, question_text),
            question_category = COALESCE($2, question_category),
            question_score = COALESCE($3, question_score),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.question_text)
    .bind(params.question_category)
    .bind(params.question_score)
    .bind(params.updated_at)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, question_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM questions WHERE id = $1").bind(question_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a QuestionFilter) {
    builder.push(" WHERE TRUE");

    if let Some(course_id) = filter.course_id.as_ref() {
        builder.push(" AND q.course_id = ");
        builder.push_bind(course_id);
    }
    if let Some(keyword) = filter.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        builder.push(" AND q.question_text ILIKE ");
        builder.push_bind(format!("%{keyword}%"));
    }
    if let Some(term) =
        filter.course_name_or_code.as_deref().map(str::trim).filter(|k| !k.is_empty())
    {
        let pattern = format!("%{term}%");
        builder.push(" AND (c.course_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR c.course_code ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(category) = filter.course_category.as_ref() {
        builder.push(" AND c.course_category = ");
        builder.push_bind(category);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &QuestionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {JOINED_COLUMNS} FROM questions q JOIN courses c ON c.id = q.course_id"
    ));
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY q.created_at DESC, q.id LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    builder.build_query_as::<Question>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &QuestionFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM questions q JOIN courses c ON c.id = q.course_id",
    );
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
