use actix_web::{web, App, HttpServer};
use log::{error, info, warn};

use budevent::{config::Config, db, handlers, service::log::{init_logger, LoggerMiddleware}, Integrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logger();
    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let pool = db::init_db_pool(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| {
            error!("failed to connect to postgresql: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e)
        })?;
    db::run_migrations(&pool).await.map_err(|e| {
        error!("migrations failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    let integrations = Integrations::from_config(&config).map_err(|e| {
        error!("failed to build http client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;
    if !integrations.mailer.is_enabled() {
        warn!("RESEND_API_KEY not set, invitation emails will only be logged");
    }
    if config.chat.api_key.is_none() {
        warn!("OPENAI_API_KEY not set, /chat will answer 503");
    }

    let pool_data = web::Data::new(pool);
    let jwt_data = web::Data::new(config.jwt.clone());
    let integrations_data = web::Data::new(integrations);
    let jwt = config.jwt.clone();

    info!("listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(jwt_data.clone())
            .app_data(integrations_data.clone())
            .wrap(LoggerMiddleware)
            .configure(|cfg| handlers::config(cfg, &jwt))
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
