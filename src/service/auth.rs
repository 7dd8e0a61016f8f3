use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use log::debug;

use crate::{config::JwtConfig, errors::AppError};

use self::jwt::TokenType;

#[derive(Debug, Clone)]
pub struct UserAuthData {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl FromRequest for UserAuthData {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserAuthData>()
                .cloned()
                .ok_or(AppError::Unauthorized),
        )
    }
}

/// Rejects requests without a valid `Authorization: Bearer <access token>` header
/// and attaches [`UserAuthData`] to the ones that have it.
pub struct AuthMiddleware {
    pub jwt: Rc<JwtConfig>,
}

impl AuthMiddleware {
    pub fn new(jwt: JwtConfig) -> Self {
        Self { jwt: Rc::new(jwt) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt: self.jwt.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt: Rc<JwtConfig>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = jwt::parse_request(&req, "Bearer ")
            .and_then(|token| jwt::decode_claims(&self.jwt, &TokenType::Access, &token));
        match claims {
            Ok(claims) => {
                req.extensions_mut().insert(UserAuthData {
                    user_id: claims.user_id,
                    username: claims.username,
                });
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(err) => {
                debug!("rejected {} {}: {}", req.method(), req.path(), err);
                Box::pin(async move { Err(err.into()) })
            }
        }
    }
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::Utc;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use log::info;

    use crate::{
        config::JwtConfig,
        db,
        dto::{Claims, LoginUserRequest, TokenPair},
        errors::AppError,
        models::User,
        service::crypto,
        PGPool,
    };

    pub enum TokenType {
        Refresh,
        Access,
    }

    fn secret<'a>(cfg: &'a JwtConfig, token_type: &TokenType) -> &'a str {
        match token_type {
            TokenType::Refresh => &cfg.refresh_secret,
            TokenType::Access => &cfg.access_secret,
        }
    }

    fn ttl(cfg: &JwtConfig, token_type: &TokenType) -> i64 {
        match token_type {
            TokenType::Refresh => cfg.refresh_ttl,
            TokenType::Access => cfg.access_ttl,
        }
    }

    pub fn decode_claims(cfg: &JwtConfig, token_type: &TokenType, token: &str) -> Result<Claims, AppError> {
        let decoding_key = DecodingKey::from_secret(secret(cfg, token_type).as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn create(cfg: &JwtConfig, token_type: &TokenType, user_id: &uuid::Uuid, username: &str) -> Result<String, AppError> {
        let exp_timestamp = (Utc::now().timestamp() + ttl(cfg, token_type)).max(0) as usize;
        let header = Header::new(Algorithm::HS256);
        let claims = Claims::new(user_id, username, exp_timestamp);
        let key = EncodingKey::from_secret(secret(cfg, token_type).as_bytes());
        Ok(encode(&header, &claims, &key)?)
    }

    /// Issues a fresh access/refresh pair and stores the refresh token on the user.
    async fn issue_pair(cfg: &JwtConfig, user: &User, pool: &PGPool) -> Result<TokenPair, AppError> {
        let access_token = create(cfg, &TokenType::Access, &user.id, &user.username)?;
        let refresh_token = create(cfg, &TokenType::Refresh, &user.id, &user.username)?;
        db::user::set_refresh_token(user.id, Some(&refresh_token), pool).await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: cfg.access_ttl,
        })
    }

    pub async fn login(pool: &PGPool, cfg: &JwtConfig, req: LoginUserRequest) -> Result<TokenPair, AppError> {
        let user = db::user::get_by_username(req.username.trim(), pool)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !crypto::verify_password(&req.pwd, &user.pwd_hash) {
            return Err(AppError::Unauthorized);
        }
        info!("user '{}' logged in", user.username);
        issue_pair(cfg, &user, pool).await
    }

    /// Exchanges a refresh token for a new pair. The presented token must be the
    /// one last issued to the user, so each refresh token works once.
    pub async fn refresh(pool: &PGPool, cfg: &JwtConfig, token: &str) -> Result<TokenPair, AppError> {
        let claims = decode_claims(cfg, &TokenType::Refresh, token)?;
        let user = match db::user::get_by_id(claims.user_id, pool).await {
            Ok(user) => user,
            Err(sqlx::Error::RowNotFound) => return Err(AppError::Unauthorized),
            Err(err) => return Err(err.into()),
        };
        if user.refresh_token.as_deref() != Some(token) {
            return Err(AppError::Unauthorized);
        }
        issue_pair(cfg, &user, pool).await
    }

    pub async fn logout(pool: &PGPool, user_id: uuid::Uuid) -> Result<(), AppError> {
        db::user::set_refresh_token(user_id, None, pool).await?;
        Ok(())
    }

    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Result<String, AppError> {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(prefix))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use uuid::Uuid;

        fn cfg() -> JwtConfig {
            JwtConfig {
                access_secret: "access-secret".into(),
                refresh_secret: "refresh-secret".into(),
                access_ttl: 60,
                refresh_ttl: 600,
            }
        }

        #[test]
        fn access_token_carries_identity() {
            let id = Uuid::new_v4();
            let token = create(&cfg(), &TokenType::Access, &id, "budfan").unwrap();
            let claims = decode_claims(&cfg(), &TokenType::Access, &token).unwrap();
            assert_eq!(claims.user_id, id);
            assert_eq!(claims.username, "budfan");
        }

        #[test]
        fn refresh_token_is_not_an_access_token() {
            let token = create(&cfg(), &TokenType::Refresh, &Uuid::new_v4(), "budfan").unwrap();
            assert_eq!(
                decode_claims(&cfg(), &TokenType::Access, &token).unwrap_err(),
                AppError::Unauthorized
            );
        }

        #[test]
        fn expired_token_is_rejected() {
            let mut expired = cfg();
            expired.access_ttl = -3600;
            let token = create(&expired, &TokenType::Access, &Uuid::new_v4(), "budfan").unwrap();
            assert_eq!(
                decode_claims(&cfg(), &TokenType::Access, &token).unwrap_err(),
                AppError::Unauthorized
            );
        }

        #[test]
        fn tokens_minted_together_differ() {
            let id = Uuid::new_v4();
            let first = create(&cfg(), &TokenType::Refresh, &id, "budfan").unwrap();
            let second = create(&cfg(), &TokenType::Refresh, &id, "budfan").unwrap();
            assert_ne!(first, second);
            let first = decode_claims(&cfg(), &TokenType::Refresh, &first).unwrap();
            let second = decode_claims(&cfg(), &TokenType::Refresh, &second).unwrap();
            assert_ne!(first.jti, second.jti);
        }

        #[test]
        fn garbage_is_rejected() {
            assert_eq!(
                decode_claims(&cfg(), &TokenType::Access, "not.a.jwt").unwrap_err(),
                AppError::Unauthorized
            );
        }
    }
}
