use actix_web::{post, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{dto::RespondInvitationDto, service::{self, auth::UserAuthData}, PGPool};

#[post("/{id}/respond")]
pub async fn respond(
   invitation_id: web::Path<Uuid>,
   dto: web::Json<RespondInvitationDto>,
   user: UserAuthData,
   pool_state: web::Data<PGPool>,
) -> impl Responder {
   let conn = pool_state.get_ref();
   match service::invitation::respond(invitation_id.into_inner(), dto.accept, user.user_id, conn).await {
      Ok(invitation) => HttpResponse::Ok().json(invitation),
      Err(err) => HttpResponse::from_error(err),
   }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
   cfg.service(respond);
}
