use chrono::Utc;
use log::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db,
    dto::{NewUserDto, PublicUser, UserSearchQuery},
    errors::AppError,
    models::{Event, Invitation, Rsvp, User},
    PGPool,
};

use super::crypto;

const DEFAULT_SEARCH_LIMIT: i64 = 20;
const MAX_SEARCH_LIMIT: i64 = 50;

pub async fn create(dto: NewUserDto, pool: &PGPool) -> Result<User, AppError> {
    dto.validate()?;
    let NewUserDto { username, email, pwd, .. } = dto;
    let email = email.map(|e| e.trim().to_lowercase());
    if db::user::exists(&username, email.as_deref(), pool).await? {
        return Err(AppError::Conflict("username or email already taken".to_string()));
    }
    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        pwd_hash: crypto::hash_password(&pwd),
        refresh_token: None,
        created_at: Utc::now(),
    };
    db::user::create(&user, pool).await?;
    info!("registered user '{}' ({})", user.username, user.id);
    Ok(user)
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<User, AppError> {
    Ok(db::user::get_by_id(id, pool).await?)
}

/// Another user's profile, without contact details.
pub async fn public_profile(id: Uuid, pool: &PGPool) -> Result<PublicUser, AppError> {
    Ok(db::user::get_by_id(id, pool).await?.into())
}

pub async fn search(query: &UserSearchQuery, pool: &PGPool) -> Result<Vec<PublicUser>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let prefix = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let users = db::user::search(prefix, limit, pool).await?;
    Ok(users.into_iter().map(PublicUser::from).collect())
}

pub async fn events_of(owner: Uuid, viewer: Uuid, pool: &PGPool) -> Result<Vec<Event>, AppError> {
    db::user::get_by_id(owner, pool).await?;
    Ok(db::event::owned_by(owner, viewer, pool).await?)
}

pub async fn rsvps_of(user_id: Uuid, pool: &PGPool) -> Result<Vec<Rsvp>, AppError> {
    Ok(db::rsvp::of_user(user_id, pool).await?)
}

pub async fn invitations_of(user_id: Uuid, pool: &PGPool) -> Result<Vec<Invitation>, AppError> {
    Ok(db::invitations::for_user(user_id, pool).await?)
}
