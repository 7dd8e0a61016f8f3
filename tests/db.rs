//! Service-level checks against a real database.
//! `sqlx::test` creates a fresh database per test from `DATABASE_URL` and applies `migrations/`.

use budevent::{
    config::EmailConfig,
    db,
    dto::{InviteDto, NewEventDto, NewUserDto, UpdateEventDto},
    errors::AppError,
    models::{Event, RsvpStatus, User},
    service::{self, auth::UserAuthData, email::Mailer},
    PGPool,
};
use chrono::{Duration, Utc};
use reqwest::Client;

async fn register(name: &str, pool: &PGPool) -> User {
    service::user::create(
        NewUserDto {
            username: name.into(),
            email: None,
            pwd: "hunter22!".into(),
            pwd_confirm: "hunter22!".into(),
        },
        pool,
    )
    .await
    .unwrap()
}

fn auth(user: &User) -> UserAuthData {
    UserAuthData {
        user_id: user.id,
        username: user.username.clone(),
    }
}

fn new_event(is_public: bool) -> NewEventDto {
    NewEventDto {
        title: "Kräftskiva".into(),
        description: "Bring a hat".into(),
        location: Some("Skansen".into()),
        latitude: None,
        longitude: None,
        starts_at: Utc::now() + Duration::days(3),
        ends_at: None,
        is_public,
        image_url: Some("https://img.example/party.png".into()),
    }
}

async fn create_event(owner: &User, is_public: bool, pool: &PGPool) -> Event {
    service::event::create(&auth(owner), new_event(is_public), pool)
        .await
        .unwrap()
}

fn mailer() -> Mailer {
    Mailer::new(
        Client::new(),
        EmailConfig {
            api_key: None,
            base_url: "http://127.0.0.1:1".into(),
            from: "BudEvent <noreply@budevent.app>".into(),
            app_base_url: "http://localhost:3000".into(),
        },
    )
}

#[sqlx::test(migrations = "./migrations")]
async fn private_event_is_hidden_from_strangers(pool: PGPool) {
    let owner = register("owner", &pool).await;
    let stranger = register("stranger", &pool).await;
    let event = create_event(&owner, false, &pool).await;

    let err = service::access::load(event.id, stranger.id, &pool).await.unwrap_err();
    assert_eq!(err, AppError::NotFound);
    assert!(service::access::load(event.id, owner.id, &pool).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn only_the_owner_may_edit_or_delete(pool: PGPool) {
    let owner = register("owner", &pool).await;
    let guest = register("guest", &pool).await;
    let event = create_event(&owner, true, &pool).await;

    let rename = UpdateEventDto {
        title: Some("Hijacked".into()),
        ..Default::default()
    };
    let err = service::event::update(event.id, rename, &auth(&guest), &pool).await.unwrap_err();
    assert_eq!(err, AppError::Forbidden);
    let err = service::event::delete(event.id, &auth(&guest), &pool).await.unwrap_err();
    assert_eq!(err, AppError::Forbidden);

    assert_eq!(db::event::get_by_id(event.id, &pool).await.unwrap().title, "Kräftskiva");
    assert_eq!(service::event::delete(event.id, &auth(&owner), &pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn blank_optional_text_clears_the_column(pool: PGPool) {
    let owner = register("owner", &pool).await;
    let event = create_event(&owner, true, &pool).await;

    let blanked = UpdateEventDto {
        location: Some("   ".into()),
        image_url: Some(String::new()),
        ..Default::default()
    };
    let updated = service::event::update(event.id, blanked, &auth(&owner), &pool).await.unwrap();
    assert_eq!(updated.location, None);
    assert_eq!(updated.image_url, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn reinvites_are_skipped(pool: PGPool) {
    let owner = register("owner", &pool).await;
    let guest = register("guest", &pool).await;
    let event = create_event(&owner, false, &pool).await;
    let mailer = mailer();

    let invite = || InviteDto { user_ids: vec![guest.id] };
    let first = service::invitation::invite(event.id, invite(), &auth(&owner), &mailer, &pool)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    let second = service::invitation::invite(event.id, invite(), &auth(&owner), &mailer, &pool)
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(db::invitations::for_event(event.id, &pool).await.unwrap().len(), 1);

    // an invitation makes the private event visible
    assert!(service::access::load(event.id, guest.id, &pool).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn accepting_sets_rsvp_and_second_answer_conflicts(pool: PGPool) {
    let owner = register("owner", &pool).await;
    let guest = register("guest", &pool).await;
    let event = create_event(&owner, false, &pool).await;
    let invitation = service::invitation::invite(
        event.id,
        InviteDto { user_ids: vec![guest.id] },
        &auth(&owner),
        &mailer(),
        &pool,
    )
    .await
    .unwrap()
    .remove(0);

    let err = service::invitation::respond(invitation.id, true, owner.id, &pool).await.unwrap_err();
    assert_eq!(err, AppError::NotFound);

    service::invitation::respond(invitation.id, true, guest.id, &pool).await.unwrap();
    assert_eq!(
        db::rsvp::status_of(event.id, guest.id, &pool).await.unwrap(),
        Some(RsvpStatus::Going)
    );

    let err = service::invitation::respond(invitation.id, false, guest.id, &pool).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn one_rsvp_per_user_and_event(pool: PGPool) {
    let owner = register("owner", &pool).await;
    let guest = register("guest", &pool).await;
    let event = create_event(&owner, true, &pool).await;

    let first = service::rsvp::set(event.id, guest.id, RsvpStatus::Maybe, &pool).await.unwrap();
    let second = service::rsvp::set(event.id, guest.id, RsvpStatus::Going, &pool).await.unwrap();
    assert_eq!(first.id, second.id);

    let view = service::rsvp::attendees(event.id, owner.id, &pool).await.unwrap();
    assert_eq!(view.attendees.len(), 1);
    assert_eq!(view.attendees[0].status, RsvpStatus::Going);
    assert_eq!(view.counts.going, 1);
    assert_eq!(view.counts.maybe, 0);
}
