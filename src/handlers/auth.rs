use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};

use crate::{
    config::JwtConfig,
    dto::{LoginUserRequest, NewUserDto, RefreshRequest},
    service::{
        self,
        auth::{AuthMiddleware, UserAuthData},
    },
    PGPool,
};

pub async fn register(dto: web::Json<NewUserDto>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::create(dto.into_inner(), conn).await {
        Ok(user) => HttpResponse::Created().json(user),
        Err(err) => {
            warn!("registration failed: {}", err);
            HttpResponse::from_error(err)
        }
    }
}

pub async fn login(
    req: web::Json<LoginUserRequest>,
    pool_state: web::Data<PGPool>,
    jwt: web::Data<JwtConfig>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    let username = req.username.clone();
    match service::auth::jwt::login(conn, jwt.get_ref(), req.into_inner()).await {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(err) => {
            info!("login failed for '{}': {}", username, err);
            HttpResponse::from_error(err)
        }
    }
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    pool_state: web::Data<PGPool>,
    jwt: web::Data<JwtConfig>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::auth::jwt::refresh(conn, jwt.get_ref(), &req.refresh_token).await {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(err) => HttpResponse::from_error(err),
    }
}

pub async fn logout(user: UserAuthData, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::auth::jwt::logout(conn, user.user_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => HttpResponse::from_error(err),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig, jwt: &JwtConfig) {
    cfg.route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/refresh", web::post().to(refresh))
        .service(
            web::resource("/logout")
                .route(web::post().to(logout))
                .wrap(AuthMiddleware::new(jwt.clone())),
        );
}
