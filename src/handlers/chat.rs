use actix_web::{post, web, HttpResponse, Responder};
use log::info;

use crate::{dto::ChatRequest, service::auth::UserAuthData, Integrations};

#[post("")]
pub async fn chat(user: UserAuthData, req: web::Json<ChatRequest>, integrations: web::Data<Integrations>) -> impl Responder {
   info!("chat request from '{}' ({} messages)", user.username, req.messages.len());
   match integrations.chat.complete(req.into_inner()).await {
      Ok(reply) => HttpResponse::Ok().json(reply),
      Err(err) => HttpResponse::from_error(err),
   }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(chat);
}
