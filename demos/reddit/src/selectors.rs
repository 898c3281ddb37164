//! Selectors over [`AppState`].

use ambit_core::{PropType, Selector, SelectorBundle};

use crate::state::AppState;

/// Every field the browser's views read.
pub fn selectors() -> SelectorBundle<AppState> {
    SelectorBundle::new()
        .with(
            "selectedReddit",
            Selector::new(PropType::string().required(), |s: &AppState| {
                s.selected_reddit.clone()
            }),
        )
        .with(
            "postsByReddit",
            Selector::new(PropType::object().required(), |s: &AppState| {
                s.posts_by_reddit.clone()
            }),
        )
        .with(
            "posts",
            Selector::new(PropType::array().required(), |s: &AppState| {
                s.selected_posts()
                    .map(|posts| posts.items.clone())
                    .unwrap_or_default()
            }),
        )
        .with(
            "isFetching",
            Selector::new(PropType::bool().required(), |s: &AppState| {
                s.selected_posts().map_or(true, |posts| posts.is_fetching)
            }),
        )
        .with(
            "lastUpdated",
            Selector::new(PropType::number(), |s: &AppState| {
                s.selected_posts().and_then(|posts| posts.last_updated)
            }),
        )
}
