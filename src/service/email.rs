//! Transactional email through the Resend API.

use html_escape::{encode_double_quoted_attribute, encode_text};
use log::{info, warn};
use reqwest::Client;
use serde::Serialize;

use crate::{config::EmailConfig, errors::AppError, models::Event};

#[derive(Debug, Serialize, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    config: EmailConfig,
}

impl Mailer {
    pub fn new(client: Client, config: EmailConfig) -> Self {
        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn invitation(&self, to: &str, inviter: &str, event: &Event) -> OutgoingEmail {
        let link = format!(
            "{}/events/{}",
            self.config.app_base_url.trim_end_matches('/'),
            event.id
        );
        let location = event
            .location
            .as_deref()
            .map(|l| format!("<p><strong>Where:</strong> {}</p>", encode_text(l)))
            .unwrap_or_default();
        let html = format!(
            "<h2>You're invited to {title}</h2>\
            <p>{inviter} invited you to an event on BudEvent.</p>\
            <p><strong>When:</strong> {when} UTC</p>\
            {location}\
            <p><a href=\"{link}\">View the event and RSVP</a></p>",
            title = encode_text(&event.title),
            inviter = encode_text(inviter),
            link = encode_double_quoted_attribute(&link),
            when = event.starts_at.format("%Y-%m-%d %H:%M"),
        );
        OutgoingEmail {
            from: self.config.from.clone(),
            to: vec![to.to_string()],
            subject: format!("You're invited: {}", event.title),
            html,
        }
    }

    /// Sends `email`. Without an API key this only logs.
    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let Some(api_key) = &self.config.api_key else {
            info!("email disabled, not sending '{}' to {:?}", email.subject, email.to);
            return Ok(());
        };
        let url = format!("{}/emails", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("resend rejected email to {:?}: {} {}", email.to, status, body);
            return Err(AppError::Upstream(format!("email provider returned {}", status)));
        }
        info!("sent '{}' to {:?}", email.subject, email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn mailer(api_key: Option<&str>) -> Mailer {
        Mailer::new(
            Client::new(),
            EmailConfig {
                api_key: api_key.map(str::to_string),
                base_url: "http://127.0.0.1:9".into(),
                from: "BudEvent <noreply@budevent.app>".into(),
                app_base_url: "https://budevent.app/".into(),
            },
        )
    }

    fn event() -> Event {
        let starts = Utc.with_ymd_and_hms(2024, 7, 6, 18, 30, 0).unwrap();
        Event {
            id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            title: "Crayfish <party>".into(),
            description: String::new(),
            location: Some("Skansen".into()),
            latitude: None,
            longitude: None,
            starts_at: starts,
            ends_at: None,
            is_public: false,
            image_url: None,
            created_at: starts,
            updated_at: starts,
        }
    }

    #[test]
    fn invitation_mentions_event_and_link() {
        let email = mailer(None).invitation("guest@example.com", "anna", &event());
        assert_eq!(email.to, vec!["guest@example.com".to_string()]);
        assert_eq!(email.subject, "You're invited: Crayfish <party>");
        assert!(email.html.contains("Crayfish &lt;party&gt;"));
        assert!(email.html.contains("2024-07-06 18:30"));
        assert!(email.html.contains("Skansen"));
        assert!(email
            .html
            .contains("https://budevent.app/events/00000000-0000-0000-0000-000000000000"));
    }

    #[actix_rt::test]
    async fn disabled_mailer_does_not_send() {
        let mailer = mailer(None);
        assert!(!mailer.is_enabled());
        let email = mailer.invitation("guest@example.com", "anna", &event());
        assert_eq!(mailer.send(&email).await, Ok(()));
    }

    #[test]
    fn escapes_markup() {
        let mut event = event();
        event.location = Some("<script>alert(1)</script> & co".into());
        let email = mailer(None).invitation("guest@example.com", "<b>anna</b>", &event);
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
        assert!(email.html.contains("&lt;b&gt;anna&lt;/b&gt;"));
    }

    #[test]
    fn link_is_escaped_as_attribute() {
        let mut mailer = mailer(None);
        mailer.config.app_base_url = "https://budevent.app/\"><script>".into();
        let email = mailer.invitation("guest@example.com", "anna", &event());
        assert!(!email.html.contains("\"><script>"));
        assert!(email.html.contains("href=\"https://budevent.app/&quot;"));
    }
}
