use crate::config::AppSettings;
use crate::matcher::GameMatcher;
use crate::models::Identified;
use crate::notifier::Notifier;
use crate::reddit::PostSource;
use crate::seen::{filter, flush_if_stale, record, retain_latest, SeenStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// What a single run did, for the final log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub unseen: usize,
    pub matched: usize,
    pub tracked: usize,
}

pub struct GameSaleBot {
    source: Arc<dyn PostSource>,
    notifier: Arc<dyn Notifier>,
    store: SeenStore,
    matcher: GameMatcher,
    config: Arc<AppSettings>,
}

impl GameSaleBot {
    pub fn new(
        source: Arc<dyn PostSource>,
        notifier: Arc<dyn Notifier>,
        config: Arc<AppSettings>,
    ) -> Self {
        Self {
            source,
            notifier,
            store: SeenStore::new(&config.seen_file),
            matcher: GameMatcher::new(&config.games),
            config,
        }
    }

    /// Load, fetch, dedup, match, notify, record, save.
    ///
    /// The seen file is only written after the notifier succeeded, so a failed
    /// delivery leaves the matches unseen for the next scheduled run.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        info!(
            "Checking r/{} for: {:?}",
            self.config.subreddit,
            self.matcher.games()
        );

        let seen = self.store.load();
        let flush_interval = Duration::days(i64::from(self.config.flush_interval_days));
        let seen = flush_if_stale(seen, now, flush_interval);
        if !seen.is_empty() {
            debug!("{} posts already seen", seen.len());
        }

        let posts = self
            .source
            .fetch_new()
            .await
            .with_context(|| format!("Failed to fetch posts from r/{}", self.config.subreddit))?;
        let fetched = posts.len();

        let unseen = filter(posts, &seen);
        let unseen_count = unseen.len();

        let matches = self.matcher.select(unseen);
        if matches.is_empty() {
            info!("No new matches among {} unseen posts", unseen_count);
        } else {
            for m in &matches {
                info!("Match for '{}': {} ({})", m.game, m.post.title, m.post.id);
            }
            self.notifier
                .notify(&matches)
                .await
                .with_context(|| format!("Failed to send notification for {} matches", matches.len()))?;
        }

        let seen = record(seen, matches.iter().map(|m| m.id().to_string()));
        let seen = retain_latest(seen, self.config.max_posts_tracked);

        self.store.save(&seen).with_context(|| {
            format!(
                "Failed to save seen posts to {}",
                self.store.path().display()
            )
        })?;

        Ok(RunSummary {
            fetched,
            unseen: unseen_count,
            matched: matches.len(),
            tracked: seen.len(),
        })
    }
}
