use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Course;

const COLUMNS: &str = "id, course_code, course_name, course_category, created_at, updated_at";

/// Course codes are stored trimmed and upper-cased; lookups normalise the same way.
pub(crate) fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_code: &'a str,
    pub(crate) course_name: &'a str,
    pub(crate) course_category: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateCourse {
    pub(crate) course_code: Option<String>,
    pub(crate) course_name: Option<String>,
    pub(crate) course_category: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct CourseFilter {
    pub(crate) keyword: Option<String>,
    pub(crate) ids: Option<Vec<String>>,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateCourse<'_>,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, course_code, course_name, course_category, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(normalize_code(params.course_code))
    .bind(params.course_name.trim())
    .bind(params.course_category.trim())
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_code(
    executor: impl sqlx::PgExecutor<'_>,
    course_code: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE course_code = $1"))
        .bind(normalize_code(course_code))
        .fetch_optional(executor)
        .await
}

pub(crate) const CODE_CONSTRAINT: &str = "uq_courses_course_code";
pub(crate) const NAME_CONSTRAINT: &str = "uq_courses_course_name";

pub(crate) async fn find_by_name(
    executor: impl sqlx::PgExecutor<'_>,
    course_name: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE course_name = $1"))
        .bind(course_name.trim())
        .fetch_optional(executor)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    course_id: &str,
    params: UpdateCourse,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            course_code = COALESCE($1, course_code),
            course_name = COALESCE($2, course_name),
            course_category = COALESCE($3, course_category),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.course_code.as_deref().map(normalize_code))
    .bind(params.course_name.as_deref().map(str::trim))
    .bind(params.course_category.as_deref().map(str::trim))
    .bind(params.updated_at)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, course_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM courses WHERE id = $1").bind(course_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn has_questions(pool: &PgPool, course_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM questions WHERE course_id = $1)")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a CourseFilter) {
    builder.push(" WHERE TRUE");

    if let Some(keyword) = filter.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        let pattern = format!("%{keyword}%");
        builder.push(" AND (course_code ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR course_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(ids) = filter.ids.as_ref() {
        builder.push(" AND id = ANY(");
        builder.push_bind(ids.as_slice());
        builder.push(")");
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &CourseFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM courses"));
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY course_code LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    builder.build_query_as::<Course>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &CourseFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses");
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
