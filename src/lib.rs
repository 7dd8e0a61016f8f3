pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

use std::time::Duration;

use sqlx::{postgres::Postgres, Pool};

use crate::{
    config::Config,
    service::{chat::ChatClient, email::Mailer, weather::SmhiClient},
};

pub type PGPool = Pool<Postgres>;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Clients for the hosted APIs, shared as app data.
#[derive(Clone)]
pub struct Integrations {
    pub weather: SmhiClient,
    pub mailer: Mailer,
    pub chat: ChatClient,
}

impl Integrations {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("budevent/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            weather: SmhiClient::new(client.clone(), config.smhi_base_url.clone()),
            mailer: Mailer::new(client.clone(), config.email.clone()),
            chat: ChatClient::new(client, config.chat.clone()),
        })
    }
}
