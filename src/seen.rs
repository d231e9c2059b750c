use crate::models::Identified;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub type PostId = String;

#[derive(Error, Debug)]
pub enum SeenStoreError {
    #[error("Failed to write seen posts to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize seen posts: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Post IDs that have already been notified.
///
/// Equality is set equality over the IDs plus the flush timestamp; the
/// recording order is only kept so `retain_latest` can evict the oldest IDs.
#[derive(Debug, Clone)]
pub struct SeenSet {
    members: HashSet<PostId>,
    /// Oldest first, no duplicates
    order: Vec<PostId>,
    last_flushed: DateTime<Utc>,
}

impl SeenSet {
    pub fn new(last_flushed: DateTime<Utc>) -> Self {
        Self {
            members: HashSet::new(),
            order: Vec::new(),
            last_flushed,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// IDs in the order they were recorded, oldest first
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn last_flushed(&self) -> DateTime<Utc> {
        self.last_flushed
    }

    fn insert(&mut self, id: PostId) {
        if self.members.insert(id.clone()) {
            self.order.push(id);
        }
    }
}

impl PartialEq for SeenSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members && self.last_flushed == other.last_flushed
    }
}

impl Eq for SeenSet {}

/// Candidates whose ID is not in `seen`, in their original order.
pub fn filter<P, I>(candidates: I, seen: &SeenSet) -> Vec<P>
where
    P: Identified,
    I: IntoIterator<Item = P>,
{
    candidates
        .into_iter()
        .filter(|candidate| !seen.contains(candidate.id()))
        .collect()
}

/// `seen` with `ids` added. IDs already present keep their original position.
pub fn record<I, S>(mut seen: SeenSet, ids: I) -> SeenSet
where
    I: IntoIterator<Item = S>,
    S: Into<PostId>,
{
    for id in ids {
        seen.insert(id.into());
    }
    seen
}

/// Empties the set once more than `interval` has passed since the last flush.
pub fn flush_if_stale(seen: SeenSet, now: DateTime<Utc>, interval: Duration) -> SeenSet {
    if now - seen.last_flushed > interval {
        info!(
            "Flushing {} seen posts (last flushed {})",
            seen.len(),
            seen.last_flushed()
        );
        SeenSet::new(now)
    } else {
        seen
    }
}

/// Keeps only the `max` most recently recorded IDs. `max == 0` keeps everything.
pub fn retain_latest(mut seen: SeenSet, max: usize) -> SeenSet {
    if max == 0 || seen.order.len() <= max {
        return seen;
    }

    let evicted: Vec<PostId> = seen.order.drain(..seen.order.len() - max).collect();
    debug!("Evicting {} oldest seen posts", evicted.len());
    for id in &evicted {
        seen.members.remove(id);
    }
    seen
}

#[derive(Debug, Serialize)]
struct SeenDocument {
    last_flushed: DateTime<Utc>,
    ids: Vec<PostId>,
}

/// What may be found on disk. The timestamp is kept raw so that a value we
/// cannot parse costs only the flush time, never the IDs.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSeen {
    Bare(Vec<PostId>),
    Document {
        last_flushed: Option<serde_json::Value>,
        ids: Vec<PostId>,
    },
}

/// RFC 3339, or a zone-less "2024-05-01 12:00:00.123456" taken as UTC
fn parse_last_flushed(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// The JSON file the workflow runner restores before and caches after a run.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or corrupt file is a cold start.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> SeenSet {
        let now = Utc::now();

        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No seen posts file, starting empty");
                return SeenSet::new(now);
            }
            Err(e) => {
                warn!("Could not read seen posts file, starting empty: {}", e);
                return SeenSet::new(now);
            }
        };

        match serde_json::from_str::<StoredSeen>(&data) {
            Ok(StoredSeen::Document { last_flushed, ids }) => {
                let raw = last_flushed.as_ref().and_then(|v| v.as_str());
                let last_flushed = match raw.and_then(parse_last_flushed) {
                    Some(ts) => ts,
                    None => {
                        warn!("Unreadable last_flushed {:?}, keeping IDs and using now", raw);
                        now
                    }
                };
                let seen = record(SeenSet::new(last_flushed), ids);
                debug!("Loaded {} seen posts", seen.len());
                seen
            }
            Ok(StoredSeen::Bare(ids)) => {
                let seen = record(SeenSet::new(now), ids);
                debug!("Loaded {} seen posts from bare array", seen.len());
                seen
            }
            Err(e) => {
                warn!("Seen posts file is corrupt, starting empty: {}", e);
                SeenSet::new(now)
            }
        }
    }

    /// Overwrites the file. A failure here means duplicate emails next run.
    #[instrument(skip(self, seen), fields(path = %self.path.display(), count = seen.len()))]
    pub fn save(&self, seen: &SeenSet) -> Result<(), SeenStoreError> {
        let doc = SeenDocument {
            last_flushed: seen.last_flushed(),
            ids: seen.ids().map(String::from).collect(),
        };
        let data = serde_json::to_string(&doc)?;

        std::fs::write(&self.path, data).map_err(|source| SeenStoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved {} seen posts", seen.len());
        Ok(())
    }
}
