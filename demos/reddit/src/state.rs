//! Application state, actions and the reducer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Headline.
    pub title: String,
    /// Submitter, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Post {
    /// Post with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
        }
    }
}

/// Fetch status and contents of one subreddit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostsState {
    /// A request is in flight.
    pub is_fetching: bool,
    /// The user asked for a refresh since the last response.
    pub did_invalidate: bool,
    /// Posts from the last response.
    pub items: Vec<Post>,
    /// Receive time of the last response, in Unix milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

/// Global state of the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// Subreddit currently shown.
    pub selected_reddit: String,
    /// Everything fetched so far, keyed by subreddit.
    pub posts_by_reddit: BTreeMap<String, PostsState>,
}

impl AppState {
    /// Empty state showing `reddit`.
    pub fn new(reddit: impl Into<String>) -> Self {
        Self {
            selected_reddit: reddit.into(),
            posts_by_reddit: BTreeMap::new(),
        }
    }

    /// Entry of the selected subreddit.
    pub fn selected_posts(&self) -> Option<&PostsState> {
        self.posts_by_reddit.get(&self.selected_reddit)
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        let entries: Vec<String> = self
            .posts_by_reddit
            .iter()
            .map(|(reddit, posts)| {
                let flag = match (posts.is_fetching, posts.did_invalidate) {
                    (true, _) => "fetching",
                    (false, true) => "stale",
                    (false, false) => "ready",
                };
                format!("{reddit}:{flag}:{}", posts.items.len())
            })
            .collect();
        format!("selected={} [{}]", self.selected_reddit, entries.join(" "))
    }
}

/// Everything that changes [`AppState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show another subreddit.
    SelectReddit(String),
    /// Mark a subreddit's posts as stale.
    InvalidateReddit(String),
    /// A fetch started.
    RequestPosts(String),
    /// A fetch completed.
    ReceivePosts {
        /// Subreddit fetched.
        reddit: String,
        /// Posts received.
        posts: Vec<Post>,
        /// Receive time in Unix milliseconds.
        received_at: i64,
    },
}

impl Action {
    /// Completed fetch stamped with the current time.
    pub fn receive_posts(reddit: impl Into<String>, posts: Vec<Post>) -> Self {
        Self::ReceivePosts {
            reddit: reddit.into(),
            posts,
            received_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Apply `action` to `state`.
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::SelectReddit(reddit) => next.selected_reddit = reddit.clone(),
        Action::InvalidateReddit(reddit) => {
            next.posts_by_reddit.entry(reddit.clone()).or_default().did_invalidate = true;
        }
        Action::RequestPosts(reddit) => {
            let posts = next.posts_by_reddit.entry(reddit.clone()).or_default();
            posts.is_fetching = true;
            posts.did_invalidate = false;
        }
        Action::ReceivePosts {
            reddit,
            posts,
            received_at,
        } => {
            let entry = next.posts_by_reddit.entry(reddit.clone()).or_default();
            entry.is_fetching = false;
            entry.did_invalidate = false;
            entry.items = posts.clone();
            entry.last_updated = Some(*received_at);
        }
    }
    next
}
