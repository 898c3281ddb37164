//! End-to-end runs of the browser against fixture sources.

use std::sync::Arc;
use std::time::Duration;

use ambit_core::{ControllerInstance, MethodError, PropMap, Store};
use ambit_reddit::{
    reddit_controller, AppState, AppStore, DemoConfig, DemoError, Layout, Picker, Post, PostsSource,
};
use ambit_testkit::Deferreds;
use async_trait::async_trait;
use parking_lot::Mutex;

fn mount(
    config: &DemoConfig,
    source: Arc<dyn PostsSource>,
) -> ControllerInstance<AppStore, Layout> {
    ambit_testkit::init_tracing();
    let store = AppStore::new(AppState::new(config.initial.clone()));
    reddit_controller(config, source)
        .mount(store, PropMap::new())
        .unwrap()
}

async fn mount_loaded(source: Arc<dyn PostsSource>) -> ControllerInstance<AppStore, Layout> {
    let mut instance = mount(&DemoConfig::default(), source);
    instance.take_initialization().unwrap().await.unwrap();
    instance
}

struct Offline;

#[async_trait]
impl PostsSource for Offline {
    async fn fetch(&self, reddit: &str) -> Result<Vec<Post>, DemoError> {
        Err(DemoError::Fetch {
            reddit: reddit.to_string(),
            message: "network unreachable".to_string(),
        })
    }
}

/// Source whose responses are released by the test.
///
/// Each fetch logs the store summary it observed when it started.
struct Gated {
    store: Arc<AppStore>,
    responses: Deferreds<Vec<Post>>,
    log: Mutex<Vec<String>>,
}

impl Gated {
    fn new(store: &Arc<AppStore>, responses: &Deferreds<Vec<Post>>) -> Arc<Self> {
        Arc::new(Self {
            store: store.clone(),
            responses: responses.clone(),
            log: Mutex::new(Vec::new()),
        })
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl PostsSource for Gated {
    async fn fetch(&self, reddit: &str) -> Result<Vec<Post>, DemoError> {
        let seen = self.store.state().summary();
        self.log.lock().push(format!("fetch {reddit} ({seen})"));
        let response = self.responses.take();
        Ok(response.await?)
    }
}

#[tokio::test]
async fn initialize_loads_the_selected_reddit() {
    let source = Arc::new(ambit_reddit::FixtureSource::new(Duration::ZERO));
    let instance = mount_loaded(source.clone()).await;

    assert_eq!(source.fetch_count(), 1);
    let screen = instance.render().unwrap();
    assert!(screen.starts_with("# reactjs\n[reactjs] | frontend"), "{screen}");
    assert!(screen.contains("[Refresh]"), "{screen}");
    assert!(screen.contains("  - React 19 is out"), "{screen}");
}

#[tokio::test]
async fn shows_loading_until_the_first_response() {
    let source = Arc::new(ambit_reddit::FixtureSource::new(Duration::from_millis(30)));
    let mut instance = mount(&DemoConfig::default(), source.clone());

    let screen = instance.render().unwrap();
    assert!(screen.contains("Loading..."), "{screen}");
    assert!(!screen.contains("[Refresh]"), "{screen}");

    instance.take_initialization().unwrap().await.unwrap();
    let screen = instance.render().unwrap();
    assert!(screen.contains("Last updated at"), "{screen}");
    assert!(screen.contains("  - Server components in practice"), "{screen}");
}

#[tokio::test]
async fn picking_another_reddit_fetches_it_once() {
    let source = Arc::new(ambit_reddit::FixtureSource::new(Duration::ZERO));
    let instance = mount_loaded(source.clone()).await;

    Picker::change(&instance.context(), "frontend").unwrap().await.unwrap();
    assert_eq!(source.fetch_count(), 2);
    let screen = instance.render().unwrap();
    assert!(screen.starts_with("# frontend\nreactjs | [frontend]"), "{screen}");
    assert!(screen.contains("  - A tour of view transitions"), "{screen}");

    Picker::change(&instance.context(), "frontend").unwrap().await.unwrap();
    assert_eq!(source.fetch_count(), 2);

    // Returning to a loaded reddit refetches since nothing is in flight.
    Picker::change(&instance.context(), "reactjs").unwrap().await.unwrap();
    assert_eq!(source.fetch_count(), 3);
}

#[tokio::test]
async fn refresh_refetches_the_selected_reddit() {
    let source = Arc::new(ambit_reddit::FixtureSource::new(Duration::ZERO));
    let instance = mount_loaded(source.clone()).await;

    Layout::refresh(&instance.context()).unwrap().await.unwrap();

    assert_eq!(source.fetch_count(), 2);
    let posts = instance.props().selected()["posts"].as_array().unwrap().len();
    assert_eq!(posts, 3);
}

#[tokio::test]
async fn unknown_reddit_renders_empty() {
    let config = DemoConfig {
        initial: "rust".to_string(),
        reddits: vec!["rust".to_string()],
        ..DemoConfig::default()
    };
    let source = Arc::new(ambit_reddit::FixtureSource::new(Duration::ZERO));
    let mut instance = mount(&config, source);
    instance.take_initialization().unwrap().await.unwrap();

    let screen = instance.render().unwrap();
    assert!(screen.starts_with("# rust\n[rust]"), "{screen}");
    assert!(screen.ends_with("Empty."), "{screen}");
}

#[tokio::test]
async fn failed_fetch_rejects_initialize_and_keeps_loading() {
    let mut instance = mount(&DemoConfig::default(), Arc::new(Offline));

    let error = instance.take_initialization().unwrap().await.unwrap_err();
    assert!(matches!(error, MethodError::Failed(_)), "{error:?}");
    assert!(error.to_string().contains("network unreachable"));

    let screen = instance.render().unwrap();
    assert!(screen.contains("Loading..."), "{screen}");
}

#[tokio::test]
async fn unmount_leaves_nothing_running() {
    let source = Arc::new(ambit_reddit::FixtureSource::new(Duration::ZERO));
    let instance = mount_loaded(source.clone()).await;

    assert!(instance.unmount().is_none());
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn initialize_requests_before_the_fetch_resolves() {
    ambit_testkit::init_tracing();
    let config = DemoConfig::default();
    let store = AppStore::new(AppState::new(config.initial.clone()));
    let responses = Deferreds::new();
    let respond = responses.defer();
    let source = Gated::new(&store, &responses);

    let mut instance = reddit_controller(&config, source.clone())
        .mount(store.clone(), PropMap::new())
        .unwrap();

    assert_eq!(
        source.log(),
        ["fetch reactjs (selected=reactjs [reactjs:fetching:0])"]
    );
    let initialization = instance.take_initialization().unwrap();
    assert!(!initialization.is_finished());
    assert!(instance.render().unwrap().contains("Loading..."));

    respond.resolve(vec![Post::titled("Hooks")]);
    assert_eq!(initialization.await.unwrap(), serde_json::json!(1));
    assert_eq!(store.state().summary(), "selected=reactjs [reactjs:ready:1]");
    assert!(instance.render().unwrap().contains("  - Hooks"));
}

#[tokio::test]
async fn overlapping_selections_fetch_concurrently() {
    ambit_testkit::init_tracing();
    let config = DemoConfig::default();
    let store = AppStore::new(AppState::new(config.initial.clone()));
    let responses = Deferreds::new();
    let initial = responses.defer();
    let first = responses.defer();
    let second = responses.defer();
    let source = Gated::new(&store, &responses);

    let mut instance = reddit_controller(&config, source.clone())
        .mount(store.clone(), PropMap::new())
        .unwrap();
    let initialization = instance.take_initialization().unwrap();

    let pick_a = Picker::change(&instance.context(), "a").unwrap();
    let pick_b = Picker::change(&instance.context(), "b").unwrap();

    assert_eq!(
        source.log(),
        [
            "fetch reactjs (selected=reactjs [reactjs:fetching:0])",
            "fetch a (selected=a [a:fetching:0 reactjs:fetching:0])",
            "fetch b (selected=b [a:fetching:0 b:fetching:0 reactjs:fetching:0])",
        ]
    );
    assert!(!pick_a.is_finished());
    assert!(!pick_b.is_finished());

    // Responses land out of order; each fills its own entry.
    second.resolve(vec![Post::titled("B1"), Post::titled("B2")]);
    pick_b.await.unwrap();
    first.resolve(vec![Post::titled("A1")]);
    pick_a.await.unwrap();
    initial.resolve(Vec::new());
    initialization.await.unwrap();

    assert_eq!(
        store.state().summary(),
        "selected=b [a:ready:1 b:ready:2 reactjs:ready:0]"
    );
    let screen = instance.render().unwrap();
    assert!(screen.contains("  - B1\n  - B2"), "{screen}");
}
