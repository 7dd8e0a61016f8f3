use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{
   dto::{FeedQuery, InviteDto, NewCommentDto, NewEventDto, RsvpDto, UpdateEventDto},
   service::{self, auth::UserAuthData},
   Integrations, PGPool,
};

#[get("")]
pub async fn feed(
   query: web::Query<FeedQuery>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
   integrations: web::Data<Integrations>,
) -> impl Responder {
   let conn: &PGPool = pool_state.get_ref();
   match service::event::feed(&query, user.user_id, &integrations.weather, conn).await {
      Ok(items) => HttpResponse::Ok().json(items),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[post("")]
pub async fn create(user: UserAuthData, new_event_dto: web::Json<NewEventDto>, pool_state: web::Data<PGPool>) -> impl Responder {
   let conn: &PGPool = pool_state.get_ref();
   match service::event::create(&user, new_event_dto.into_inner(), conn).await {
      Ok(event) => HttpResponse::Created().json(event),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[get("/{id}")]
pub async fn get_by_id(
   id: web::Path<Uuid>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
   integrations: web::Data<Integrations>,
) -> impl Responder {
   let conn: &PGPool = pool_state.get_ref();
   match service::event::get(id.into_inner(), user.user_id, &integrations.weather, conn).await {
      Ok(view) => HttpResponse::Ok().json(view),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[put("/{id}")]
pub async fn update(
   id: web::Path<Uuid>,
   update_event_dto: web::Json<UpdateEventDto>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::event::update(id.into_inner(), update_event_dto.into_inner(), &user, conn).await {
      Ok(event) => HttpResponse::Ok().json(event),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[delete("/{id}")]
pub async fn remove(id: web::Path<Uuid>, user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::event::delete(id.into_inner(), &user, conn).await {
      Ok(_) => HttpResponse::NoContent().finish(),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[get("/{id}/weather")]
pub async fn weather(
   id: web::Path<Uuid>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
   integrations: web::Data<Integrations>,
) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::event::weather(id.into_inner(), user.user_id, &integrations.weather, conn).await {
      Ok(Some(weather)) => HttpResponse::Ok().json(weather),
      Ok(None) => HttpResponse::NoContent().finish(),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[put("/{id}/rsvp")]
pub async fn set_rsvp(
   event_id: web::Path<Uuid>,
   dto: web::Json<RsvpDto>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::rsvp::set(event_id.into_inner(), user.user_id, dto.status, conn).await {
      Ok(rsvp) => HttpResponse::Ok().json(rsvp),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[delete("/{id}/rsvp")]
pub async fn remove_rsvp(event_id: web::Path<Uuid>, user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::rsvp::remove(event_id.into_inner(), user.user_id, conn).await {
      Ok(_) => HttpResponse::NoContent().finish(),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[get("/{id}/rsvps")]
pub async fn attendees(event_id: web::Path<Uuid>, user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::rsvp::attendees(event_id.into_inner(), user.user_id, conn).await {
      Ok(view) => HttpResponse::Ok().json(view),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[post("/{id}/invitations")]
pub async fn create_invitations(
   event_id: web::Path<Uuid>,
   dto: web::Json<InviteDto>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
   integrations: web::Data<Integrations>,
) -> impl Responder {
   let conn = pool_state.get_ref();
   let res = service::invitation::invite(
      event_id.into_inner(),
      dto.into_inner(),
      &user,
      &integrations.mailer,
      conn,
   )
   .await;
   match res {
      Ok(invitations) => HttpResponse::Created().json(invitations),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[get("/{id}/invitations")]
pub async fn list_invitations(event_id: web::Path<Uuid>, user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::invitation::for_event(event_id.into_inner(), user.user_id, conn).await {
      Ok(invitations) => HttpResponse::Ok().json(invitations),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[get("/{id}/comments")]
pub async fn list_comments(event_id: web::Path<Uuid>, user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::comment::list(event_id.into_inner(), user.user_id, conn).await {
      Ok(comments) => HttpResponse::Ok().json(comments),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[post("/{id}/comments")]
pub async fn add_comment(
   event_id: web::Path<Uuid>,
   dto: web::Json<NewCommentDto>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::comment::add(event_id.into_inner(), dto.into_inner(), user.user_id, conn).await {
      Ok(comment) => HttpResponse::Created().json(comment),
      Err(err) => HttpResponse::from_error(err),
   }
}

#[delete("/{id}/comments/{comment_id}")]
pub async fn delete_comment(path: web::Path<(Uuid, Uuid)>, user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
   let conn = pool_state.get_ref();
   let (event_id, comment_id) = path.into_inner();
   match service::comment::delete(event_id, comment_id, user.user_id, conn).await {
      Ok(_) => HttpResponse::NoContent().finish(),
      Err(err) => HttpResponse::from_error(err),
   }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(feed)
      .service(create)
      .service(get_by_id)
      .service(update)
      .service(remove)
      .service(weather)
      .service(set_rsvp)
      .service(remove_rsvp)
      .service(attendees)
      .service(create_invitations)
      .service(list_invitations)
      .service(list_comments)
      .service(add_comment)
      .service(delete_comment);
}
