use chrono::Utc;
use futures::future::join_all;
use log::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{self, event::FeedFilter},
    dto::{non_blank, EventView, FeedItem, FeedQuery, NewEventDto, UpdateEventDto},
    errors::AppError,
    models::Event,
    PGPool,
};

use super::{
    access::{self, EventAccess},
    auth::UserAuthData,
    rsvp,
    weather::{SmhiClient, WeatherSnapshot},
};

pub async fn create(user_auth_data: &UserAuthData, dto: NewEventDto, pool: &PGPool) -> Result<Event, AppError> {
    dto.validate()?;
    let now = Utc::now();
    let event = Event {
        id: Uuid::new_v4(),
        user_id: user_auth_data.user_id,
        title: dto.title.trim().to_string(),
        description: dto.description,
        location: non_blank(dto.location.as_deref()),
        latitude: dto.latitude,
        longitude: dto.longitude,
        starts_at: dto.starts_at,
        ends_at: dto.ends_at,
        is_public: dto.is_public,
        image_url: non_blank(dto.image_url.as_deref()),
        created_at: now,
        updated_at: now,
    };
    db::event::create(&event, pool).await?;
    info!("user '{}' created event {}", user_auth_data.username, event.id);
    Ok(event)
}

pub async fn get(id: Uuid, user_id: Uuid, weather: &SmhiClient, pool: &PGPool) -> Result<EventView, AppError> {
    let (event, access) = access::load(id, user_id, pool).await?;
    let (rsvp_counts, my_rsvp, weather) = futures::join!(
        rsvp::counts_or_default(id, pool),
        db::rsvp::status_of(id, user_id, pool),
        weather.for_event_or_none(&event),
    );
    Ok(EventView {
        event,
        rsvp_counts,
        my_rsvp: my_rsvp?,
        access,
        weather,
    })
}

pub async fn feed(query: &FeedQuery, user_id: Uuid, weather: &SmhiClient, pool: &PGPool) -> Result<Vec<FeedItem>, AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if to < from {
            return Err(AppError::bad_request("'to' must not be before 'from'"));
        }
    }
    let filter = FeedFilter {
        viewer: user_id,
        from: query.from.unwrap_or_else(Utc::now),
        to: query.to,
        location: query.location(),
        creator: query.creator,
        limit: query.limit(),
        offset: query.offset(),
    };
    let events = db::event::feed(&filter, pool).await?;
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    let (counts, forecasts) = futures::join!(
        rsvp::counts_for_or_default(&ids, pool),
        join_all(events.iter().map(|e| weather.for_event_or_none(e))),
    );
    Ok(events
        .into_iter()
        .zip(forecasts)
        .map(|(event, weather)| FeedItem {
            rsvp_counts: counts.get(&event.id).copied().unwrap_or_default(),
            event,
            weather,
        })
        .collect())
}

pub async fn update(id: Uuid, event_fields: UpdateEventDto, user_auth_data: &UserAuthData, pool: &PGPool) -> Result<Event, AppError> {
    let current = access::require(id, user_auth_data.user_id, EventAccess::EDIT, pool).await?;
    event_fields.merged(&current).validate()?;
    if db::event::set_fields(id, &event_fields, pool).await? > 0 {
        info!("user '{}' updated event {}", user_auth_data.username, id);
    }
    Ok(db::event::get_by_id(id, pool).await?)
}

pub async fn delete(id: Uuid, user_auth_data: &UserAuthData, pool: &PGPool) -> Result<u64, AppError> {
    access::require(id, user_auth_data.user_id, EventAccess::DELETE, pool).await?;
    let rows = db::event::delete(id, pool).await?;
    info!("user '{}' deleted event {}", user_auth_data.username, id);
    Ok(rows)
}

/// Forecast for the event's start, failing loudly unlike the feed.
pub async fn weather(id: Uuid, user_id: Uuid, weather: &SmhiClient, pool: &PGPool) -> Result<Option<WeatherSnapshot>, AppError> {
    let (event, _) = access::load(id, user_id, pool).await?;
    weather.for_event(&event).await
}
