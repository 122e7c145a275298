// Feed retrieval.
//
// A feed is either a published-sheet URL or a local CSV file. Both feeds are
// fetched concurrently at startup; a feed that cannot be fetched is logged
// and treated as empty so the rest of the report still works.
use crate::error::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Url(String),
    File(PathBuf),
}

impl FeedSource {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            FeedSource::Url(s.to_string())
        } else {
            FeedSource::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Url(url) => write!(f, "{}", url),
            FeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub async fn fetch_text(source: &FeedSource) -> Result<String> {
    match source {
        FeedSource::Url(url) => {
            let response = reqwest::get(url.as_str()).await?.error_for_status()?;
            Ok(response.text().await?)
        }
        FeedSource::File(path) => Ok(tokio::fs::read_to_string(path).await?),
    }
}

/// Fetch a feed, degrading to empty text on failure.
pub async fn fetch_or_empty(name: &str, source: Option<&FeedSource>) -> String {
    let Some(source) = source else {
        info!(feed = name, "no source configured, using empty feed");
        return String::new();
    };
    match fetch_text(source).await {
        Ok(text) => {
            info!(feed = name, %source, bytes = text.len(), "feed fetched");
            text
        }
        Err(e) => {
            warn!(feed = name, %source, error = %e, "feed fetch failed, continuing with empty data");
            String::new()
        }
    }
}

/// Raw text of both feeds.
#[derive(Debug, Default, Clone)]
pub struct FeedTexts {
    pub activity: String,
    pub mapping: String,
}

pub async fn fetch_feeds(activity: Option<&FeedSource>, mapping: Option<&FeedSource>) -> FeedTexts {
    let (activity, mapping) = tokio::join!(
        fetch_or_empty("activity", activity),
        fetch_or_empty("mapping", mapping)
    );
    FeedTexts { activity, mapping }
}
