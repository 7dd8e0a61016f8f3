use chrono::{DateTime, Utc};
use sqlx::{postgres::PgQueryResult, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{dto, models::Event, PGPool};

use super::user::escape_like;

/// Events a viewer may see: public ones, their own, and private ones they are invited to.
const VISIBLE_TO: &str = "(e.is_public OR e.user_id = $1 OR EXISTS (
    SELECT 1 FROM invitations i WHERE i.event_id = e.id AND i.invited_user_id = $1))";

pub struct FeedFilter<'a> {
    pub viewer: Uuid,
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
    pub location: Option<&'a str>,
    pub creator: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn create(event: &Event, pool: &PGPool) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        "INSERT INTO events (id, user_id, title, description, location, latitude, longitude,
            starts_at, ends_at, is_public, image_url, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(event.id)
    .bind(event.user_id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.location)
    .bind(event.latitude)
    .bind(event.longitude)
    .bind(event.starts_at)
    .bind(event.ends_at)
    .bind(event.is_public)
    .bind(&event.image_url)
    .bind(event.created_at)
    .bind(event.updated_at)
    .execute(pool)
    .await
}

// /events/id
pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn feed(filter: &FeedFilter<'_>, pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    let sql = format!(
        "SELECT e.* FROM events e
        WHERE {VISIBLE_TO}
            AND e.starts_at >= $2
            AND ($3::timestamptz IS NULL OR e.starts_at < $3)
            AND ($4::text IS NULL OR e.location ILIKE '%' || $4 || '%')
            AND ($5::uuid IS NULL OR e.user_id = $5)
        ORDER BY e.starts_at ASC, e.id
        LIMIT $6 OFFSET $7"
    );
    sqlx::query_as::<_, Event>(&sql)
        .bind(filter.viewer)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.location.map(escape_like))
        .bind(filter.creator)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await
}

// /users/{id}/events
pub async fn owned_by(owner: Uuid, viewer: Uuid, pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    let sql = format!(
        "SELECT e.* FROM events e
        WHERE {VISIBLE_TO} AND e.user_id = $2
        ORDER BY e.starts_at DESC"
    );
    sqlx::query_as::<_, Event>(&sql)
        .bind(viewer)
        .bind(owner)
        .fetch_all(pool)
        .await
}

pub async fn is_invited(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM invitations WHERE event_id = $1 AND invited_user_id = $2)",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn set_fields(id: Uuid, fields: &dto::UpdateEventDto, pool: &PGPool) -> Result<u64, sqlx::Error> {
    if fields.is_empty() {
        return Ok(0);
    }
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE events SET ");
    let mut separated = query_builder.separated(", ");
    separated.push("updated_at = now()");
    if let Some(v) = &fields.title {
        separated.push("title = ").push_bind_unseparated(v.trim().to_string());
    }
    if let Some(v) = &fields.description {
        separated.push("description = ").push_bind_unseparated(v.clone());
    }
    if let Some(v) = &fields.location {
        separated.push("location = ").push_bind_unseparated(dto::non_blank(Some(v.as_str())));
    }
    if let Some(v) = fields.latitude {
        separated.push("latitude = ").push_bind_unseparated(v);
    }
    if let Some(v) = fields.longitude {
        separated.push("longitude = ").push_bind_unseparated(v);
    }
    if let Some(v) = fields.starts_at {
        separated.push("starts_at = ").push_bind_unseparated(v);
    }
    if let Some(v) = fields.ends_at {
        separated.push("ends_at = ").push_bind_unseparated(v);
    }
    if let Some(v) = fields.is_public {
        separated.push("is_public = ").push_bind_unseparated(v);
    }
    if let Some(v) = &fields.image_url {
        separated.push("image_url = ").push_bind_unseparated(dto::non_blank(Some(v.as_str())));
    }
    query_builder.push(" WHERE id = ").push_bind(id);

    let res = query_builder.build().execute(pool).await?;
    Ok(res.rows_affected())
}

pub async fn delete(id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
