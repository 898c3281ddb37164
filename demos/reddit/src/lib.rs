//! # Reddit Browser
//!
//! Text-mode subreddit browser built on `ambit-core`. The `Layout` view never
//! fetches anything; the controller's methods load posts when the browser
//! starts, when another subreddit is picked and when the user refreshes.

#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod errors;
pub mod selectors;
pub mod source;
pub mod state;
pub mod store;
pub mod views;

pub use config::{DemoConfig, SourceConfig, SourceKind};
pub use controller::{methods, reddit_controller, should_fetch};
pub use errors::DemoError;
pub use source::{FixtureSource, HttpSource, PostsSource};
pub use state::{reduce, Action, AppState, Post, PostsState};
pub use store::AppStore;
pub use views::{Layout, Picker, Posts};
