use sqlx::PgPool;

pub(crate) async fn revoke(
    pool: &PgPool,
    token_digest: &str,
    user_id: &str,
    expires_at: time::PrimitiveDateTime,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO token_blocklist (token_digest, user_id, expires_at, created_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (token_digest) DO NOTHING",
    )
    .bind(token_digest)
    .bind(user_id)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;

    // Expired entries can never match a token that still verifies.
    sqlx::query("DELETE FROM token_blocklist WHERE expires_at < $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn is_revoked(pool: &PgPool, token_digest: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM token_blocklist WHERE token_digest = $1)",
    )
    .bind(token_digest)
    .fetch_one(pool)
    .await
}
