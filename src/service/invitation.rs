use futures::future::join_all;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    db,
    dto::InviteDto,
    errors::AppError,
    models::{Invitation, InvitationStatus},
    PGPool,
};

use super::{
    access::{self, EventAccess},
    auth::UserAuthData,
    email::Mailer,
};

const MAX_INVITEES: usize = 50;

fn dedup_invitees(user_ids: &[Uuid], inviter: Uuid) -> Result<Vec<Uuid>, AppError> {
    let mut invitees: Vec<Uuid> = Vec::with_capacity(user_ids.len());
    for id in user_ids {
        if *id == inviter {
            return Err(AppError::bad_request("you cannot invite yourself"));
        }
        if !invitees.contains(id) {
            invitees.push(*id);
        }
    }
    if invitees.is_empty() || invitees.len() > MAX_INVITEES {
        return Err(AppError::bad_request("invite between 1 and 50 users"));
    }
    Ok(invitees)
}

/// Invites users to an event and emails those with an address.
/// Users that were already invited are skipped.
pub async fn invite(
    event_id: Uuid,
    dto: InviteDto,
    inviter: &UserAuthData,
    mailer: &Mailer,
    pool: &PGPool,
) -> Result<Vec<Invitation>, AppError> {
    let event = access::require(event_id, inviter.user_id, EventAccess::INVITE, pool).await?;
    let invitees = dedup_invitees(&dto.user_ids, inviter.user_id)?;
    let known = db::user::existing_ids(&invitees, pool).await?;
    if known.len() != invitees.len() {
        return Err(AppError::NotFound);
    }

    let created = db::invitations::create_many(event_id, inviter.user_id, &invitees, pool).await?;
    info!(
        "user '{}' invited {} users to event {}",
        inviter.username,
        created.len(),
        event_id
    );

    let recipients: Vec<Uuid> = created.iter().map(|i| i.invited_user_id).collect();
    match db::user::get_many(&recipients, pool).await {
        Ok(users) => {
            let sends = users.iter().filter_map(|user| {
                let address = user.email.as_deref()?;
                let email = mailer.invitation(address, &inviter.username, &event);
                Some(async move {
                    if let Err(err) = mailer.send(&email).await {
                        warn!("invitation email to user {} failed: {}", user.id, err);
                    }
                })
            });
            join_all(sends).await;
        }
        Err(err) => warn!("could not load invitees for emailing: {}", err),
    }
    Ok(created)
}

pub async fn for_event(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<Vec<Invitation>, AppError> {
    access::require(event_id, user_id, EventAccess::INVITE, pool).await?;
    Ok(db::invitations::for_event(event_id, pool).await?)
}

pub async fn respond(invitation_id: Uuid, accept: bool, user_id: Uuid, pool: &PGPool) -> Result<Invitation, AppError> {
    let invitation = db::invitations::get_by_id(invitation_id, pool).await?;
    if invitation.invited_user_id != user_id {
        return Err(AppError::NotFound);
    }
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::Conflict("invitation already answered".to_string()));
    }
    let status = if accept {
        InvitationStatus::Accepted
    } else {
        InvitationStatus::Declined
    };
    db::invitations::respond(&invitation, status, pool)
        .await?
        .ok_or_else(|| AppError::Conflict("invitation already answered".to_string()))
}
