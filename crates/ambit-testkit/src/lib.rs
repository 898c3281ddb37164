//! Ambit Testing Infrastructure
//!
//! Shared fixtures for controller tests:
//!
//! - [`RecordingStore`]: reducer-backed store that records every action
//! - [`deferred`] and [`Deferreds`]: awaitables resolved by hand, for
//!   controlling the interleaving of concurrent invocations
//! - [`RecordingInterpreter`]: live interpreter that logs command names
//! - [`init_tracing`], [`settle`] and [`prop_map`] helpers
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! ambit-testkit = { path = "../ambit-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod deferred;
pub mod interpreter;
pub mod store;

pub use deferred::{deferred, Deferreds, Pending, Resolver};
pub use interpreter::RecordingInterpreter;
pub use store::RecordingStore;

use ambit_core::PropMap;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Let spawned tasks on a current-thread runtime run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Convert a JSON object into a [`PropMap`]; anything else yields an empty map.
pub fn prop_map(value: Value) -> PropMap {
    match value {
        Value::Object(fields) => fields.into_iter().collect(),
        _ => PropMap::new(),
    }
}
