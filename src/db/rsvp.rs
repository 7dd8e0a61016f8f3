use uuid::Uuid;

use crate::{
    models::{Attendee, Rsvp, RsvpStatus},
    PGPool,
};

pub async fn upsert(event_id: Uuid, user_id: Uuid, status: RsvpStatus, pool: &PGPool) -> Result<Rsvp, sqlx::Error> {
    sqlx::query_as::<_, Rsvp>(
        "INSERT INTO rsvps (id, event_id, user_id, status)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (event_id, user_id)
        DO UPDATE SET status = EXCLUDED.status, updated_at = now()
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(user_id)
    .bind(status)
    .fetch_one(pool)
    .await
}

pub async fn delete(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM rsvps WHERE event_id = $1 AND user_id = $2")
        .bind(event_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn status_of(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<Option<RsvpStatus>, sqlx::Error> {
    sqlx::query_scalar::<_, RsvpStatus>(
        "SELECT status FROM rsvps WHERE event_id = $1 AND user_id = $2",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn counts(event_id: Uuid, pool: &PGPool) -> Result<Vec<(RsvpStatus, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (RsvpStatus, i64)>(
        "SELECT status, COUNT(*) FROM rsvps WHERE event_id = $1 GROUP BY status",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

/// Per-event status counts for a batch of events.
pub async fn counts_for(event_ids: &[Uuid], pool: &PGPool) -> Result<Vec<(Uuid, RsvpStatus, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, RsvpStatus, i64)>(
        "SELECT event_id, status, COUNT(*) FROM rsvps
        WHERE event_id = ANY($1)
        GROUP BY event_id, status",
    )
    .bind(event_ids)
    .fetch_all(pool)
    .await
}

pub async fn attendees(event_id: Uuid, pool: &PGPool) -> Result<Vec<Attendee>, sqlx::Error> {
    sqlx::query_as::<_, Attendee>(
        "SELECT r.user_id, u.username, r.status, r.updated_at
        FROM rsvps r JOIN users u ON u.id = r.user_id
        WHERE r.event_id = $1
        ORDER BY r.status, u.username",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

// /users/me/rsvps
pub async fn of_user(user_id: Uuid, pool: &PGPool) -> Result<Vec<Rsvp>, sqlx::Error> {
    sqlx::query_as::<_, Rsvp>(
        "SELECT r.* FROM rsvps r JOIN events e ON e.id = r.event_id
        WHERE r.user_id = $1
        ORDER BY e.starts_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
