use uuid::Uuid;

use crate::{
    models::{Invitation, InvitationStatus, RsvpStatus},
    PGPool,
};

/// Inserts one pending invitation per invitee; invitees that already have one are skipped.
pub async fn create_many(
    event_id: Uuid,
    invited_by: Uuid,
    invitees: &[Uuid],
    pool: &PGPool,
) -> Result<Vec<Invitation>, sqlx::Error> {
    let ids: Vec<Uuid> = invitees.iter().map(|_| Uuid::new_v4()).collect();
    sqlx::query_as::<_, Invitation>(
        "INSERT INTO invitations (id, event_id, invited_user_id, invited_by, status)
        SELECT t.id, $1, t.invited_user_id, $2, 'pending'::invitation_status
        FROM UNNEST($3::uuid[], $4::uuid[]) AS t(id, invited_user_id)
        ON CONFLICT (event_id, invited_user_id) DO NOTHING
        RETURNING *",
    )
    .bind(event_id)
    .bind(invited_by)
    .bind(&ids)
    .bind(invitees)
    .fetch_all(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Invitation, sqlx::Error> {
    sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn for_event(event_id: Uuid, pool: &PGPool) -> Result<Vec<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations WHERE event_id = $1 ORDER BY created_at",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

// /users/me/invitations
pub async fn for_user(user_id: Uuid, pool: &PGPool) -> Result<Vec<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations WHERE invited_user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Moves a pending invitation to `status`. Accepting also records a `going` RSVP
/// in the same transaction. Returns `None` when the invitation was no longer pending.
pub async fn respond(
    invitation: &Invitation,
    status: InvitationStatus,
    pool: &PGPool,
) -> Result<Option<Invitation>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let updated = sqlx::query_as::<_, Invitation>(
        "UPDATE invitations SET status = $1
        WHERE id = $2 AND status = 'pending'
        RETURNING *",
    )
    .bind(status)
    .bind(invitation.id)
    .fetch_optional(&mut *tx)
    .await?;

    if updated.is_some() && status == InvitationStatus::Accepted {
        sqlx::query(
            "INSERT INTO rsvps (id, event_id, user_id, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, user_id)
            DO UPDATE SET status = EXCLUDED.status, updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(invitation.event_id)
        .bind(invitation.invited_user_id)
        .bind(RsvpStatus::Going)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(updated)
}
