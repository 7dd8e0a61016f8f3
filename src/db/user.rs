use sqlx::postgres::PgQueryResult;
use uuid::Uuid;

use crate::{models::User, PGPool};

pub async fn create(user: &User, pool: &PGPool) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, username, email, pwd_hash, refresh_token, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.pwd_hash)
    .bind(&user.refresh_token)
    .bind(user.created_at)
    .execute(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_by_username(username: &str, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn exists(username: &str, email: Option<&str>, pool: &PGPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM users WHERE lower(username) = lower($1)
                OR ($2::text IS NOT NULL AND lower(email) = lower($2))
        )",
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await
}

/// Returns the subset of `ids` that belong to existing users.
pub async fn existing_ids(ids: &[Uuid], pool: &PGPool) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub async fn get_many(ids: &[Uuid], pool: &PGPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

// /users?q=
pub async fn search(prefix: Option<&str>, limit: i64, pool: &PGPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users
        WHERE $1::text IS NULL OR username ILIKE $1 || '%'
        ORDER BY username
        LIMIT $2",
    )
    .bind(prefix.map(escape_like))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn set_refresh_token(id: Uuid, token: Option<&str>, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
        .bind(token)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub(crate) fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
