pub mod auth;
pub mod chat;
pub mod event;
pub mod invitation;
pub mod user;

use actix_web::{get, web, HttpResponse, Responder};

use crate::{config::JwtConfig, service::auth::AuthMiddleware};

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Mounts every route. Expects `PGPool`, `JwtConfig` and `Integrations` as app data.
pub fn config(cfg: &mut web::ServiceConfig, jwt: &JwtConfig) {
    cfg.service(health)
        .service(web::scope("/auth").configure(|cfg| auth::init_routes(cfg, jwt)))
        .service(
            web::scope("/users")
                .wrap(AuthMiddleware::new(jwt.clone()))
                .configure(user::init_routes),
        )
        .service(
            web::scope("/events")
                .wrap(AuthMiddleware::new(jwt.clone()))
                .configure(event::init_routes),
        )
        .service(
            web::scope("/invitations")
                .wrap(AuthMiddleware::new(jwt.clone()))
                .configure(invitation::init_routes),
        )
        .service(
            web::scope("/chat")
                .wrap(AuthMiddleware::new(jwt.clone()))
                .configure(chat::init_routes),
        );
}
