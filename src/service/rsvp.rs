use std::collections::HashMap;

use log::warn;
use uuid::Uuid;

use crate::{
    db,
    dto::{AttendeesView, RsvpCounts},
    errors::AppError,
    models::{Rsvp, RsvpStatus},
    PGPool,
};

use super::access::{self, EventAccess};

pub async fn set(event_id: Uuid, user_id: Uuid, status: RsvpStatus, pool: &PGPool) -> Result<Rsvp, AppError> {
    access::require(event_id, user_id, EventAccess::RSVP, pool).await?;
    Ok(db::rsvp::upsert(event_id, user_id, status, pool).await?)
}

pub async fn remove(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<u64, AppError> {
    access::load(event_id, user_id, pool).await?;
    match db::rsvp::delete(event_id, user_id, pool).await? {
        0 => Err(AppError::NotFound),
        n => Ok(n),
    }
}

pub async fn attendees(event_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<AttendeesView, AppError> {
    access::load(event_id, user_id, pool).await?;
    let attendees = db::rsvp::attendees(event_id, pool).await?;
    let mut counts = RsvpCounts::default();
    for attendee in &attendees {
        match attendee.status {
            RsvpStatus::Going => counts.going += 1,
            RsvpStatus::Maybe => counts.maybe += 1,
            RsvpStatus::NotGoing => counts.not_going += 1,
        }
    }
    Ok(AttendeesView { counts, attendees })
}

/// Counts for one event; a failing query is logged and reads as zero.
pub async fn counts_or_default(event_id: Uuid, pool: &PGPool) -> RsvpCounts {
    match db::rsvp::counts(event_id, pool).await {
        Ok(rows) => RsvpCounts::from_rows(&rows),
        Err(err) => {
            warn!("rsvp counts for event {} unavailable: {}", event_id, err);
            RsvpCounts::default()
        }
    }
}

/// Counts for many events at once, same fallback as [`counts_or_default`].
pub async fn counts_for_or_default(event_ids: &[Uuid], pool: &PGPool) -> HashMap<Uuid, RsvpCounts> {
    match db::rsvp::counts_for(event_ids, pool).await {
        Ok(rows) => group_counts(rows),
        Err(err) => {
            warn!("rsvp counts for {} events unavailable: {}", event_ids.len(), err);
            HashMap::new()
        }
    }
}

fn group_counts(rows: Vec<(Uuid, RsvpStatus, i64)>) -> HashMap<Uuid, RsvpCounts> {
    let mut grouped: HashMap<Uuid, Vec<(RsvpStatus, i64)>> = HashMap::new();
    for (event_id, status, n) in rows {
        grouped.entry(event_id).or_default().push((status, n));
    }
    grouped
        .into_iter()
        .map(|(event_id, rows)| (event_id, RsvpCounts::from_rows(&rows)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_counts_per_event() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let grouped = group_counts(vec![
            (a, RsvpStatus::Going, 3),
            (b, RsvpStatus::Maybe, 2),
            (a, RsvpStatus::NotGoing, 1),
        ]);
        assert_eq!(grouped[&a], RsvpCounts { going: 3, maybe: 0, not_going: 1 });
        assert_eq!(grouped[&b], RsvpCounts { going: 0, maybe: 2, not_going: 0 });
        assert_eq!(grouped.get(&Uuid::new_v4()), None);
    }
}
