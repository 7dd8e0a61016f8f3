use log::info;
use uuid::Uuid;
use validator::Validate;

use crate::{db, dto::NewCommentDto, errors::AppError, models::Comment, PGPool};

use super::access::{self, EventAccess};

pub async fn add(event_id: Uuid, dto: NewCommentDto, user_id: Uuid, pool: &PGPool) -> Result<Comment, AppError> {
    dto.validate()?;
    access::require(event_id, user_id, EventAccess::COMMENT, pool).await?;
    Ok(db::comment::create(event_id, user_id, dto.content.trim(), pool).await?)
}

pub async fn list(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<Vec<Comment>, AppError> {
    access::load(event_id, user_id, pool).await?;
    Ok(db::comment::for_event(event_id, pool).await?)
}

/// Authors may delete their comments; event owners may delete any comment on their event.
pub async fn delete(event_id: Uuid, comment_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<u64, AppError> {
    let (event, _) = access::load(event_id, user_id, pool).await?;
    let comment = db::comment::get_by_id(comment_id, pool).await?;
    if comment.event_id != event_id {
        return Err(AppError::NotFound);
    }
    if comment.user_id != user_id && event.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    let rows = db::comment::delete(comment_id, pool).await?;
    info!("comment {} on event {} deleted by {}", comment_id, event_id, user_id);
    Ok(rows)
}
