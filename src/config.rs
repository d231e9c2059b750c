use clap::Parser;
use std::fmt::Debug;

#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "A Reddit bot that emails you when watched games go on sale"
)]
pub struct AppSettings {
    /// Reddit application client ID
    #[arg(long, env = "GAMESALEBOT_CLIENT_ID")]
    pub client_id: String,

    /// Reddit application client secret
    #[arg(long, env = "GAMESALEBOT_CLIENT_SECRET")]
    pub client_secret: String,

    /// Reddit account username used for the password grant
    #[arg(long, env = "GAMESALEBOT_USERNAME")]
    pub username: String,

    /// Reddit account password used for the password grant
    #[arg(long, env = "GAMESALEBOT_PASSWORD")]
    pub password: String,

    /// User agent sent with every Reddit request
    #[arg(long, env = "GAMESALEBOT_USER_AGENT", default_value = "GameSaleBot v1.0")]
    pub user_agent: String,

    /// Reddit OAuth token endpoint base URL
    #[arg(
        long,
        env = "GAMESALEBOT_REDDIT_AUTH_URL",
        default_value = "https://www.reddit.com"
    )]
    pub reddit_auth_url: String,

    /// Reddit OAuth API base URL
    #[arg(
        long,
        env = "GAMESALEBOT_REDDIT_API_URL",
        default_value = "https://oauth.reddit.com"
    )]
    pub reddit_api_url: String,

    /// Subreddit to watch (without r/)
    #[arg(long, env = "GAMESALEBOT_SUBREDDIT", default_value = "GameSale")]
    pub subreddit: String,

    /// Comma-separated list of game names to look for in post titles
    #[arg(
        long,
        env = "GAMESALEBOT_GAMES",
        value_delimiter = ',',
        default_value = "elden ring,god of war,witcher 3"
    )]
    pub games: Vec<String>,

    /// How many of the newest posts to fetch per run (1-100)
    #[arg(long, env = "GAMESALEBOT_POST_LIMIT", default_value_t = 25, value_parser = validate_post_limit)]
    pub post_limit: u32,

    /// Path of the JSON file holding already-notified post IDs
    #[arg(long, env = "GAMESALEBOT_SEEN_FILE", default_value = "seen_posts.json")]
    pub seen_file: String,

    /// Maximum number of post IDs kept in the seen file (0 disables the cap)
    #[arg(long, env = "GAMESALEBOT_MAX_POSTS_TRACKED", default_value_t = 25)]
    pub max_posts_tracked: usize,

    /// Number of days after which the seen file is emptied
    #[arg(long, env = "GAMESALEBOT_FLUSH_INTERVAL_DAYS", default_value_t = 2)]
    pub flush_interval_days: u32,

    /// Address the notification email is sent from
    #[arg(long, env = "GAMESALEBOT_EMAIL_SENDER")]
    pub email_sender: String,

    /// Address the notification email is sent to
    #[arg(long, env = "GAMESALEBOT_EMAIL_RECEIVER")]
    pub email_receiver: String,

    /// HTTP mail API endpoint that accepts the outgoing message
    #[arg(
        long,
        env = "GAMESALEBOT_MAIL_API_URL",
        default_value = "https://api.sendgrid.com/v3/mail/send"
    )]
    pub mail_api_url: String,

    /// Mail API bearer key
    #[arg(long, env = "GAMESALEBOT_MAIL_API_KEY", hide_env_values = true)]
    pub mail_api_key: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GAMESALEBOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: "GameSaleBot v1.0".to_string(),
            reddit_auth_url: "https://www.reddit.com".to_string(),
            reddit_api_url: "https://oauth.reddit.com".to_string(),
            subreddit: "GameSale".to_string(),
            games: vec![
                "elden ring".to_string(),
                "god of war".to_string(),
                "witcher 3".to_string(),
            ],
            post_limit: 25,
            seen_file: "seen_posts.json".to_string(),
            max_posts_tracked: 25,
            flush_interval_days: 2,
            email_sender: String::new(),
            email_receiver: String::new(),
            mail_api_url: "https://api.sendgrid.com/v3/mail/send".to_string(),
            mail_api_key: String::new(),
            log_level: "info".to_string(),
        }
    }
}

/// Reddit listings accept at most 100 items per page
fn validate_post_limit(value: &str) -> Result<u32, String> {
    const MIN_POST_LIMIT: u32 = 1;
    const MAX_POST_LIMIT: u32 = 100;

    let limit: u32 = value
        .parse()
        .map_err(|_| format!("post_limit must be a positive integer, got '{value}'"))?;

    if limit < MIN_POST_LIMIT {
        Err(format!(
            "post_limit must be at least {MIN_POST_LIMIT}, got {limit}"
        ))
    } else if limit > MAX_POST_LIMIT {
        Err(format!(
            "post_limit must be at most {MAX_POST_LIMIT}, got {limit}"
        ))
    } else {
        Ok(limit)
    }
}

/// Drop blank entries left over from stray commas in the games list
fn normalize_games(games: Vec<String>) -> Vec<String> {
    games
        .into_iter()
        .map(|game| game.trim().to_string())
        .filter(|game| !game.is_empty())
        .collect()
}

pub fn load_config() -> anyhow::Result<AppSettings> {
    // Local runs may keep credentials in a .env file; CI injects them directly
    dotenvy::dotenv().ok();

    let mut app_settings = AppSettings::parse();

    app_settings.games = normalize_games(app_settings.games);
    if app_settings.games.is_empty() {
        anyhow::bail!("at least one game must be configured in GAMESALEBOT_GAMES");
    }

    Ok(app_settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_post_limit_valid_values() {
        assert_eq!(validate_post_limit("1"), Ok(1));
        assert_eq!(validate_post_limit("25"), Ok(25));
        assert_eq!(validate_post_limit("100"), Ok(100));
    }

    #[test]
    fn test_validate_post_limit_invalid_values() {
        let err = validate_post_limit("0").unwrap_err();
        assert!(err.contains("must be at least 1"));

        let err = validate_post_limit("101").unwrap_err();
        assert!(err.contains("must be at most 100"));

        let err = validate_post_limit("many").unwrap_err();
        assert!(err.contains("must be a positive integer"));
    }

    #[test]
    fn test_normalize_games_drops_blanks() {
        let games = vec![
            " elden ring ".to_string(),
            "".to_string(),
            "   ".to_string(),
            "witcher 3".to_string(),
        ];
        assert_eq!(normalize_games(games), vec!["elden ring", "witcher 3"]);
    }
}
