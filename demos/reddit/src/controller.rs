//! The browser's controller methods.
//!
//! `initialize` loads the selected subreddit. Selecting a different
//! subreddit or refreshing goes through `fetchPostsIfNeeded`, which only
//! skips the fetch while one is already in flight for a fresh entry.

use std::collections::BTreeMap;
use std::sync::Arc;

use ambit_core::{
    args, json, Args, Controller, ControllerMethods, MethodResult, Value, Yielder,
};

use crate::config::DemoConfig;
use crate::selectors::selectors;
use crate::source::PostsSource;
use crate::state::{Action, PostsState};
use crate::store::AppStore;
use crate::views::Layout;

/// Whether `reddit`'s entry calls for a new fetch.
pub fn should_fetch(posts: Option<&PostsState>) -> bool {
    match posts {
        None => true,
        Some(posts) => !posts.is_fetching || posts.did_invalidate,
    }
}

async fn initialize(y: Yielder<AppStore>, _args: Args) -> MethodResult {
    let reddit: String = y.props().await?.get_as("selectedReddit")?;
    y.call("fetchPostsIfNeeded", args![reddit]).await
}

async fn on_select_reddit(y: Yielder<AppStore>, args: Args) -> MethodResult {
    let next: String = args.get(0)?;
    let selected: String = y.props().await?.get_as("selectedReddit")?;

    y.dispatch(Action::SelectReddit(next.clone())).await?;
    if next != selected {
        y.call("fetchPostsIfNeeded", args![next]).await?;
    }
    Ok(Value::Null)
}

async fn on_refresh(y: Yielder<AppStore>, _args: Args) -> MethodResult {
    let selected: String = y.props().await?.get_as("selectedReddit")?;

    y.dispatch(Action::InvalidateReddit(selected.clone())).await?;
    y.call("fetchPostsIfNeeded", args![selected]).await
}

async fn fetch_posts_if_needed(y: Yielder<AppStore>, args: Args) -> MethodResult {
    let reddit: String = args.get(0)?;
    let posts_by_reddit: BTreeMap<String, PostsState> =
        y.props().await?.get_as("postsByReddit")?;

    if should_fetch(posts_by_reddit.get(&reddit)) {
        y.call("fetchPosts", args![reddit]).await
    } else {
        Ok(Value::Null)
    }
}

async fn fetch_posts(source: Arc<dyn PostsSource>, y: Yielder<AppStore>, args: Args) -> MethodResult {
    let reddit: String = args.get(0)?;

    y.dispatch(Action::RequestPosts(reddit.clone())).await?;
    let posts = y
        .wait({
            let reddit = reddit.clone();
            async move { source.fetch(&reddit).await }
        })
        .await?;
    let count = posts.len();
    y.dispatch(Action::receive_posts(reddit, posts)).await?;

    Ok(json!(count))
}

/// Method set of the browser, fetching through `source`.
pub fn methods(source: Arc<dyn PostsSource>) -> ControllerMethods<AppStore> {
    ControllerMethods::new()
        .with("initialize", initialize)
        .with("onSelectReddit", on_select_reddit)
        .with("onRefresh", on_refresh)
        .with("fetchPostsIfNeeded", fetch_posts_if_needed)
        .with("fetchPosts", move |y, args| fetch_posts(source.clone(), y, args))
}

/// Controller wrapping [`Layout`] with the browser's selectors and methods.
pub fn reddit_controller(config: &DemoConfig, source: Arc<dyn PostsSource>) -> Controller<AppStore, Layout> {
    Controller::new(Layout::new(config.reddits.clone()), methods(source), [selectors()])
        .with_config(config.controller.clone())
}
