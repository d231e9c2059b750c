use crate::config::AppSettings;
use crate::models::{
    GameMatch, MailAddress, MailContent, MailPersonalization, MailSendRequest,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use url::Url;

pub const EMAIL_SUBJECT: &str = "[GameSaleBot] Match Found";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Mail API error: {status} - {body}")]
    Api { status: StatusCode, body: String },
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Delivers the matches found in a run
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, matches: &[GameMatch]) -> Result<(), NotifyError>;
}

/// One "title\nlink" block per match, separated by blank lines
pub fn compose_body(matches: &[GameMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("{}\n{}", m.post.title, m.post.link()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug)]
pub struct EmailNotifier {
    client: Client,
    mail_api_url: Url,
    api_key: String,
    sender: String,
    receiver: String,
}

impl EmailNotifier {
    pub fn new(settings: &AppSettings) -> Result<Self, NotifyError> {
        let mail_api_url = Url::parse(&settings.mail_api_url)?;
        Ok(Self {
            client: Client::new(),
            mail_api_url,
            api_key: settings.mail_api_key.clone(),
            sender: settings.email_sender.clone(),
            receiver: settings.email_receiver.clone(),
        })
    }

    fn build_request(&self, matches: &[GameMatch]) -> MailSendRequest {
        MailSendRequest {
            personalizations: vec![MailPersonalization {
                to: vec![MailAddress {
                    email: self.receiver.clone(),
                }],
            }],
            from: MailAddress {
                email: self.sender.clone(),
            },
            subject: EMAIL_SUBJECT.to_string(),
            content: vec![MailContent {
                content_type: "text/plain".to_string(),
                value: compose_body(matches),
            }],
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    #[instrument(skip(self, matches), fields(count = matches.len(), to = %self.receiver))]
    async fn notify(&self, matches: &[GameMatch]) -> Result<(), NotifyError> {
        let payload = self.build_request(matches);
        debug!("Sending email via: {}", self.mail_api_url);

        let response = self
            .client
            .post(self.mail_api_url.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(NotifyError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
            error!("Mail API error: {} - {}", status, body);
            return Err(NotifyError::Api { status, body });
        }

        info!("Email sent successfully.");
        Ok(())
    }
}
