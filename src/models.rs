use serde::{Deserialize, Serialize};

/// Anything the deduplicator can filter: it only needs the platform ID
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RedditPost {
    pub id: String, // base36 post ID, e.g. "abc123"
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub permalink: String, // relative, e.g. "/r/GameSale/comments/abc123/..."
}

impl RedditPost {
    /// The linked URL, or the comments page when the post carries none
    pub fn link(&self) -> String {
        if self.url.is_empty() {
            format!("https://www.reddit.com{}", self.permalink)
        } else {
            self.url.clone()
        }
    }
}

impl Identified for RedditPost {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing {
    pub data: RedditListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData {
    pub children: Vec<RedditListingChild>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild {
    pub kind: String, // "t3" for links
    pub data: RedditPost,
}

/// Reddit answers a rejected password grant with 200 and an `error` field
#[derive(Debug, Clone, Deserialize)]
pub struct RedditTokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
}

/// A post whose title mentions one of the watched games
#[derive(Debug, Clone, PartialEq)]
pub struct GameMatch {
    pub game: String,
    pub post: RedditPost,
}

impl Identified for GameMatch {
    fn id(&self) -> &str {
        &self.post.id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MailAddress {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailPersonalization {
    pub to: Vec<MailAddress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailContent {
    #[serde(rename = "type")]
    pub content_type: String, // always "text/plain"
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailSendRequest {
    pub personalizations: Vec<MailPersonalization>,
    pub from: MailAddress,
    pub subject: String,
    pub content: Vec<MailContent>,
}
