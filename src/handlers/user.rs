use actix_web::{get, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{dto::UserSearchQuery, service::{self, auth::UserAuthData}, PGPool};

#[get("/me")]
pub async fn me(user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::get_by_id(user.user_id, conn).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("/me/rsvps")]
pub async fn my_rsvps(user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::rsvps_of(user.user_id, conn).await {
        Ok(rsvps) => HttpResponse::Ok().json(rsvps),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("/me/invitations")]
pub async fn my_invitations(user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::invitations_of(user.user_id, conn).await {
        Ok(invitations) => HttpResponse::Ok().json(invitations),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("")]
pub async fn search(query: web::Query<UserSearchQuery>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::search(&query, conn).await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("/{id}")]
pub async fn get_by_id(id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::public_profile(id.into_inner(), conn).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("/{id}/events")]
pub async fn events_of(id: web::Path<Uuid>, user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::events_of(id.into_inner(), user.user_id, conn).await {
        Ok(events) => HttpResponse::Ok().json(events),
        Err(err) => HttpResponse::from_error(err),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // `/me...` before `/{id}`
    cfg.service(me)
        .service(my_rsvps)
        .service(my_invitations)
        .service(search)
        .service(get_by_id)
        .service(events_of);
}
