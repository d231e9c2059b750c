use crate::models::{GameMatch, RedditPost};
use tracing::debug;

/// Case-insensitive title search for the watched games
#[derive(Debug, Clone)]
pub struct GameMatcher {
    games: Vec<String>,
}

impl GameMatcher {
    pub fn new<I, S>(games: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let games = games
            .into_iter()
            .map(|game| game.as_ref().trim().to_lowercase())
            .filter(|game| !game.is_empty())
            .collect();
        Self { games }
    }

    pub fn games(&self) -> &[String] {
        &self.games
    }

    /// First watched game (in configured order) mentioned in the title
    pub fn matching_game(&self, title: &str) -> Option<&str> {
        let title = title.to_lowercase();
        self.games
            .iter()
            .find(|game| title.contains(game.as_str()))
            .map(String::as_str)
    }

    pub fn select(&self, posts: Vec<RedditPost>) -> Vec<GameMatch> {
        posts
            .into_iter()
            .filter_map(|post| {
                let game = self.matching_game(&post.title)?.to_string();
                debug!("Post {} matches '{}'", post.id, game);
                Some(GameMatch { game, post })
            })
            .collect()
    }
}
