use bitflags::bitflags;
use serde::Serialize;
use uuid::Uuid;

use crate::{db, errors::AppError, models::Event, PGPool};

bitflags! {
    /// What a user may do with an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct EventAccess: u8 {
        const VIEW = 1;
        const EDIT = 1 << 1;
        const DELETE = 1 << 2;
        const RSVP = 1 << 3;
        const COMMENT = 1 << 4;
        const INVITE = 1 << 5;

        const PARTICIPANT = Self::VIEW.bits() | Self::RSVP.bits() | Self::COMMENT.bits();
        const OWNER = Self::PARTICIPANT.bits()
            | Self::EDIT.bits()
            | Self::DELETE.bits()
            | Self::INVITE.bits();
    }
}

impl EventAccess {
    pub fn resolve(event: &Event, user_id: Uuid, invited: bool) -> Self {
        if event.user_id == user_id {
            EventAccess::OWNER
        } else if event.is_public || invited {
            EventAccess::PARTICIPANT
        } else {
            EventAccess::empty()
        }
    }
}

/// Loads an event and the caller's rights on it.
/// Events the caller cannot see are reported as missing.
pub async fn load(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<(Event, EventAccess), AppError> {
    let event = db::event::get_by_id(event_id, pool).await?;
    let invited = if event.user_id != user_id && !event.is_public {
        db::event::is_invited(event_id, user_id, pool).await?
    } else {
        false
    };
    let access = EventAccess::resolve(&event, user_id, invited);
    if !access.contains(EventAccess::VIEW) {
        return Err(AppError::NotFound);
    }
    Ok((event, access))
}

/// Like [`load`], but fails with `Forbidden` unless `required` is granted.
pub async fn require(
    event_id: Uuid,
    user_id: Uuid,
    required: EventAccess,
    pool: &PGPool,
) -> Result<Event, AppError> {
    let (event, access) = load(event_id, user_id, pool).await?;
    if access.contains(required) {
        Ok(event)
    } else {
        Err(AppError::Forbidden)
    }
}
