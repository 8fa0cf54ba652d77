use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::HelpTopic;
use crate::db::types::HelpTopicType;

const COLUMNS: &str = "id, course_id, topic_title, topic_content, topic_type, llm_name, \
                       llm_answer, human_score, created_at, updated_at";

pub(crate) struct CreateHelpTopic<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) topic_title: &'a str,
    pub(crate) topic_content: Option<&'a str>,
    pub(crate) topic_type: HelpTopicType,
    pub(crate) llm_name: Option<&'a str>,
    pub(crate) llm_answer: Option<&'a str>,
    pub(crate) human_score: Option<f64>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateHelpTopic {
    pub(crate) topic_title: Option<String>,
    pub(crate) topic_content: Option<String>,
    pub(crate) topic_type: Option<HelpTopicType>,
    pub(crate) llm_name: Option<String>,
    pub(crate) llm_answer: Option<String>,
    pub(crate) human_score: Option<f64>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct HelpTopicFilter {
    pub(crate) course_id: Option<String>,
    pub(crate) keyword: Option<String>,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateHelpTopic<'_>,
) -> Result<HelpTopic, sqlx::Error> {
    sqlx::query_as::<_, HelpTopic>(&format!(
        "INSERT INTO help_topics (
            id, course_id, topic_title, topic_content, topic_type, llm_name, llm_answer,
            human_score, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.topic_title)
    .bind(params.topic_content)
    .bind(params.topic_type)
    .bind(params.llm_name)
    .bind(params.llm_answer)
    .bind(params.human_score)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    topic_id: &str,
) -> Result<Option<HelpTopic>, sqlx::Error> {
    sqlx::query_as::<_, HelpTopic>(&format!("SELECT {COLUMNS} FROM help_topics WHERE id = $1"))
        .bind(topic_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    topic_id: &str,
    params: UpdateHelpTopic,
) -> Result<Option<HelpTopic>, sqlx::Error> {
    sqlx::query_as::<_, HelpTopic>(&format!(
        "UPDATE help_topics SET
            topic_title = COALESCE($1, topic_title),
            topic_content = COALESCE($2, topic_content),
            topic_type = COALESCE($3, topic_type),
            llm_name = COALESCE($4, llm_name),
            llm_answer = COALESCE($5, llm_answer),
            human_score = COALESCE($6, human_score),
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.topic_title)
    .bind(params.topic_content)
    .bind(params.topic_type)
    .bind(params.llm_name)
    .bind(params.llm_answer)
    .bind(params.human_score)
    .bind(params.updated_at)
    .bind(topic_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, topic_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM help_topics WHERE id = $1").bind(topic_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a HelpTopicFilter) {
    builder.push(" WHERE TRUE");

    if let Some(course_id) = filter.course_id.as_ref() {
        builder.push(" AND course_id = ");
        builder.push_bind(course_id);
    }
    if let Some(keyword) = filter.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        builder.push(" AND topic_title ILIKE ");
        builder.push_bind(format!("%{keyword}%"));
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &HelpTopicFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<HelpTopic>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM help_topics"));
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    builder.build_query_as::<HelpTopic>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &HelpTopicFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM help_topics");
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
