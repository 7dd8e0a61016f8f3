use uuid::Uuid;

use crate::{models::Comment, PGPool};

pub async fn create(event_id: Uuid, user_id: Uuid, content: &str, pool: &PGPool) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "WITH inserted AS (
            INSERT INTO comments (id, event_id, user_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        )
        SELECT c.id, c.event_id, c.user_id, u.username, c.content, c.created_at
        FROM inserted c JOIN users u ON u.id = c.user_id",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn for_event(event_id: Uuid, pool: &PGPool) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT c.id, c.event_id, c.user_id, u.username, c.content, c.created_at
        FROM comments c JOIN users u ON u.id = c.user_id
        WHERE c.event_id = $1
        ORDER BY c.created_at ASC",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT c.id, c.event_id, c.user_id, u.username, c.content, c.created_at
        FROM comments c JOIN users u ON u.id = c.user_id
        WHERE c.id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn delete(id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
