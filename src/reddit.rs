use crate::config::AppSettings;
use crate::models::{RedditListing, RedditPost, RedditTokenResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use url::Url;

#[derive(Error, Debug)]
pub enum RedditError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {body}")]
    Api { status: StatusCode, body: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("Failed to deserialize response: {0}")]
    Deserialization(reqwest::Error),
}

/// Where candidate posts come from
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Newest posts first, as the platform lists them
    async fn fetch_new(&self) -> Result<Vec<RedditPost>, RedditError>;
}

/// `Url::join` replaces the last segment unless the base path ends in '/'
fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Debug)]
pub struct RedditApiClient {
    client: Client,
    auth_url: Url,
    api_url: Url,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    subreddit: String,
    post_limit: u32,
}

impl RedditApiClient {
    pub fn new(settings: &AppSettings) -> Result<Self, RedditError> {
        let auth_url = parse_base_url(&settings.reddit_auth_url)?;
        let api_url = parse_base_url(&settings.reddit_api_url)?;
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            auth_url,
            api_url,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            subreddit: settings.subreddit.clone(),
            post_limit: settings.post_limit,
        })
    }

    /// Script-app password grant; one token per run is enough
    #[instrument(skip(self), fields(username = %self.username))]
    pub async fn access_token(&self) -> Result<String, RedditError> {
        let token_url = self.auth_url.join("api/v1/access_token")?;
        debug!("Requesting access token from: {}", token_url);

        let form = [
            ("grant_type", "password"),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .client
            .post(token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(RedditError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
            error!("Reddit token error: {} - {}", status, body);
            return Err(RedditError::Api { status, body });
        }

        let token = response
            .json::<RedditTokenResponse>()
            .await
            .map_err(RedditError::Deserialization)?;

        if let Some(err) = token.error {
            return Err(RedditError::Auth(err));
        }
        token
            .access_token
            .ok_or_else(|| RedditError::Auth("response carried no access_token".to_string()))
    }

    #[instrument(skip(self, token), fields(subreddit = %self.subreddit, limit = self.post_limit))]
    pub async fn get_new_posts(&self, token: &str) -> Result<Vec<RedditPost>, RedditError> {
        let listing_url = self.api_url.join(&format!("r/{}/new", self.subreddit))?;
        debug!("Fetching listing: {}", listing_url);

        let response = self
            .client
            .get(listing_url)
            .bearer_auth(token)
            .query(&[("limit", self.post_limit.to_string())])
            .send()
            .await
            .map_err(RedditError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
            error!("Reddit listing error: {} - {}", status, body);
            return Err(RedditError::Api { status, body });
        }

        let listing = response
            .json::<RedditListing>()
            .await
            .map_err(RedditError::Deserialization)?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter(|child| child.kind == "t3")
            .map(|child| child.data)
            .collect())
    }
}

#[async_trait]
impl PostSource for RedditApiClient {
    async fn fetch_new(&self) -> Result<Vec<RedditPost>, RedditError> {
        let token = self.access_token().await?;
        let posts = self.get_new_posts(&token).await?;
        info!("Fetched {} posts from r/{}", posts.len(), self.subreddit);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_keeps_path_prefix() {
        let url = parse_base_url("https://proxy.example/reddit").unwrap();
        assert_eq!(
            url.join("r/GameSale/new").unwrap().as_str(),
            "https://proxy.example/reddit/r/GameSale/new"
        );

        let url = parse_base_url("https://oauth.reddit.com").unwrap();
        assert_eq!(
            url.join("r/GameSale/new").unwrap().as_str(),
            "https://oauth.reddit.com/r/GameSale/new"
        );
    }
}
