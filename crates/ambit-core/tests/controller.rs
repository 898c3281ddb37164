//! Controller mounting, ambient context and lifecycle.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ambit_core::{
    args, json, Args, Context, ContractError, Controller, ControllerConfig, ControllerError,
    ControllerMethods, Engine, MethodError, MethodResult, PropKind, PropMap, PropType, PropTypes,
    Selector, SelectorBundle, Store, Value, View, ViewError, Yielder,
};
use ambit_testkit::{init_tracing, prop_map, settle, Deferreds, RecordingInterpreter, RecordingStore};

#[derive(Debug, Clone, Default)]
struct Library {
    shelf: String,
    books: Vec<String>,
    loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Select(String),
    Request,
    Loaded(Vec<String>),
    Touch,
}

type LibraryStore = RecordingStore<Library, Action>;

fn reduce(state: &Library, action: &Action) -> Library {
    let mut next = state.clone();
    match action {
        Action::Select(shelf) => next.shelf = shelf.clone(),
        Action::Request => next.loading = true,
        Action::Loaded(books) => {
            next.loading = false;
            next.books = books.clone();
        }
        Action::Touch => {}
    }
    next
}

fn library_store(shelf: &str) -> Arc<LibraryStore> {
    RecordingStore::new(
        Library {
            shelf: shelf.into(),
            ..Default::default()
        },
        reduce,
    )
}

fn selectors() -> SelectorBundle<Library> {
    SelectorBundle::new()
        .with(
            "shelf",
            Selector::try_new(PropType::string().required(), |s: &Library| {
                if s.shelf == "forbidden" {
                    Err("shelf is off limits")
                } else {
                    Ok(s.shelf.clone())
                }
            }),
        )
        .with(
            "books",
            Selector::new(PropType::array_of(PropKind::String).required(), |s: &Library| {
                s.books.clone()
            }),
        )
        .with(
            "loading",
            Selector::new(PropType::bool().required(), |s: &Library| s.loading),
        )
}

// ============================================================================
// Views
// ============================================================================

struct Shell;

impl View for Shell {
    type Output = String;

    fn name(&self) -> &str {
        "Shell"
    }

    fn prop_types(&self) -> PropTypes {
        PropTypes::new().with("title", PropType::string().required())
    }

    fn render(&self, props: &PropMap, cx: &Context) -> Result<String, ViewError> {
        let title = props["title"].as_str().unwrap_or_default();
        let body = cx.render(&Panel, &PropMap::new())?;
        Ok(format!("{title}: {body}"))
    }
}

/// Intermediate view that forwards nothing.
struct Panel;

impl View for Panel {
    type Output = String;

    fn render(&self, _props: &PropMap, cx: &Context) -> Result<String, ViewError> {
        cx.render(&Shelf, &PropMap::new())
    }
}

struct Shelf;

impl View for Shelf {
    type Output = String;

    fn context_types(&self) -> PropTypes {
        PropTypes::new()
            .with("shelf", PropType::string().required())
            .with("books", PropType::array_of(PropKind::String).required())
            .with("select", PropType::func().required())
    }

    fn render(&self, _props: &PropMap, cx: &Context) -> Result<String, ViewError> {
        let shelf: String = cx.value_as("shelf")?;
        let books: Vec<String> = cx.value_as("books")?;
        cx.method("select")?;
        Ok(format!("{shelf} [{}]", books.join(", ")))
    }
}

struct Needy;

impl View for Needy {
    type Output = ();

    fn name(&self) -> &str {
        "Needy"
    }

    fn context_types(&self) -> PropTypes {
        PropTypes::new().with("author", PropType::string().required())
    }

    fn render(&self, _props: &PropMap, _cx: &Context) -> Result<(), ViewError> {
        Ok(())
    }
}

// ============================================================================
// Methods
// ============================================================================

async fn select(y: Yielder<LibraryStore>, args: Args) -> MethodResult {
    let shelf: String = args.get(0)?;
    y.dispatch(Action::Select(shelf)).await?;
    Ok(Value::Null)
}

async fn describe(y: Yielder<LibraryStore>, _args: Args) -> MethodResult {
    let shelf = y.call("current", Args::new()).await?;
    Ok(json!(format!("on {}", shelf.as_str().unwrap_or_default())))
}

async fn current(y: Yielder<LibraryStore>, _args: Args) -> MethodResult {
    let props = y.props().await?;
    Ok(props.get("shelf").cloned().unwrap_or(Value::Null))
}

fn base_methods() -> ControllerMethods<LibraryStore> {
    ControllerMethods::new()
        .with("select", select)
        .with("describe", describe)
        .with("current", current)
}

fn own_props() -> PropMap {
    prop_map(json!({ "title": "Library" }))
}

// ============================================================================
// Contracts and context
// ============================================================================

#[test]
fn declared_contracts_follow_selectors_and_methods() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);

    let props = controller.prop_types();
    assert_eq!(
        props.names().collect::<Vec<_>>(),
        ["shelf", "books", "loading", "title"]
    );

    let context = controller.context_types();
    assert_eq!(context.get("select"), Some(&PropType::func().required()));
    assert_eq!(context.get("books"), Some(&PropType::array_of(PropKind::String).required()));
    assert!(!context.contains("title"));
}

#[test]
fn mounting_requires_a_runtime() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);

    let result = controller.mount(library_store("fiction"), own_props());
    assert!(matches!(result, Err(ControllerError::NoRuntime)));
}

#[tokio::test]
async fn failing_initial_selection_aborts_mount() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);

    let result = controller.mount(library_store("forbidden"), own_props());
    match result {
        Err(ControllerError::Selector(error)) => assert_eq!(error.name(), "shelf"),
        other => panic!("unexpected mount result: {other:?}"),
    }
}

#[tokio::test]
async fn context_is_exactly_selectors_and_methods() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let cx = instance.context();
    let mut fields = cx.fields();
    fields.sort_unstable();
    assert_eq!(
        fields,
        ["books", "current", "describe", "loading", "select", "shelf"]
    );
    assert!(!cx.contains("title"));
}

#[tokio::test]
async fn methods_shadow_selectors_of_the_same_name() {
    let bundle = SelectorBundle::new().with(
        "select",
        Selector::new(PropType::string(), |_: &Library| "a value"),
    );
    let controller = Controller::new(Shell, base_methods(), [selectors(), bundle]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let cx = instance.context();
    assert!(cx.value("select").is_none());
    assert!(cx.method("select").is_ok());
    assert_eq!(cx.fields().iter().filter(|f| **f == "select").count(), 1);
}

#[tokio::test]
async fn method_identity_is_stable_across_renders() {
    let store = library_store("fiction");
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(store.clone(), own_props()).unwrap();

    let before = instance.context().method("select").unwrap().clone();
    instance.render().unwrap();
    store.dispatch(Action::Select("poetry".into()));
    instance.render().unwrap();
    let after = instance.context().method("select").unwrap().clone();

    assert!(before.ptr_eq(&after));
    assert!(before.ptr_eq(instance.method("select").unwrap()));
}

#[tokio::test]
async fn own_props_reach_the_root_and_context_reaches_nested_views() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let store = library_store("fiction");
    store.dispatch(Action::Loaded(vec!["Dune".into(), "Emma".into()]));
    let instance = controller.mount(store, own_props()).unwrap();

    assert_eq!(instance.render().unwrap(), "Library: fiction [Dune, Emma]");
}

#[tokio::test]
async fn root_contract_is_checked_against_own_props() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(library_store("fiction"), PropMap::new()).unwrap();

    let error = instance.render().unwrap_err();
    assert!(matches!(
        error,
        ViewError::Contract(ContractError::Missing { ref field, .. }) if field == "title"
    ));
}

#[tokio::test]
async fn descendants_asking_for_unprovided_fields_fail() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let error = instance.context().render(&Needy, &PropMap::new()).unwrap_err();
    assert_eq!(
        error.to_string(),
        "`Needy` requires `author`, which is not provided"
    );
}

// ============================================================================
// Store notifications
// ============================================================================

#[tokio::test]
async fn store_changes_refresh_props_and_bump_revision() {
    init_tracing();
    let store = library_store("fiction");
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(store.clone(), own_props()).unwrap();
    let changes = instance.changes();

    store.dispatch(Action::Select("poetry".into()));
    assert_eq!(instance.props().get("shelf"), Some(&json!("poetry")));
    assert_eq!(*changes.borrow(), 1);
    assert_eq!(instance.context().revision(), 1);

    store.dispatch(Action::Touch);
    assert_eq!(*changes.borrow(), 1);
}

#[tokio::test]
async fn unchanged_output_bumps_revision_when_not_skipped() {
    let store = library_store("fiction");
    let controller = Controller::new(Shell, base_methods(), [selectors()]).with_config(
        ControllerConfig {
            skip_unchanged: false,
            ..ControllerConfig::default()
        },
    );
    let instance = controller.mount(store.clone(), own_props()).unwrap();

    store.dispatch(Action::Touch);
    assert_eq!(*instance.changes().borrow(), 1);
}

#[tokio::test]
async fn failing_refresh_keeps_previous_props() {
    init_tracing();
    let store = library_store("fiction");
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(store.clone(), own_props()).unwrap();

    store.dispatch(Action::Select("forbidden".into()));

    assert_eq!(instance.props().get("shelf"), Some(&json!("fiction")));
    assert!(instance.refresh().is_err());
    assert_eq!(*instance.changes().borrow(), 0);
}

#[tokio::test]
async fn bound_methods_dispatch_through_the_store() {
    let store = library_store("fiction");
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(store.clone(), own_props()).unwrap();

    let cx = instance.context();
    cx.method("select").unwrap().spawn(args!["poetry"]).await.unwrap();

    assert_eq!(store.actions(), vec![Action::Select("poetry".into())]);
    assert_eq!(instance.context().value("shelf"), Some(&json!("poetry")));
}

// ============================================================================
// Delegation
// ============================================================================

#[tokio::test]
async fn methods_delegate_by_name() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let described = instance.method("describe").unwrap().invoke(Args::new()).await;
    assert_eq!(described.unwrap(), json!("on fiction"));
}

#[tokio::test]
async fn delegating_to_an_unknown_method_fails() {
    let methods = base_methods().with("broken", |y: Yielder<LibraryStore>, _args: Args| async move {
        y.call("missing", Args::new()).await
    });
    let controller = Controller::new(Shell, methods, [selectors()]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let error = instance.method("broken").unwrap().invoke(Args::new()).await.unwrap_err();
    assert!(matches!(error, MethodError::UnknownMethod(name) if name == "missing"));
}

#[tokio::test]
async fn delegation_outlives_the_instance() {
    let gate = Deferreds::<()>::new();
    let methods = base_methods().with("later", {
        let gate = gate.clone();
        move |y: Yielder<LibraryStore>, _args: Args| {
            let opened = gate.take();
            async move {
                y.wait(opened).await?;
                y.call("current", Args::new()).await
            }
        }
    });
    let controller = Controller::new(Shell, methods, [selectors()]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let open = gate.defer();
    let invocation = instance.method("later").unwrap().spawn(Args::new());
    drop(instance);
    open.resolve(());

    assert_eq!(invocation.await.unwrap(), json!("fiction"));
}

#[tokio::test]
async fn deinitialize_can_delegate_after_suspending() {
    let methods = base_methods()
        .with("cleanup", |_y: Yielder<LibraryStore>, _args: Args| async move {
            Ok(json!("cleaned"))
        })
        .with("deinitialize", |y: Yielder<LibraryStore>, _args: Args| async move {
            y.value(tokio::task::yield_now()).await?;
            y.call("cleanup", Args::new()).await
        });
    let controller = Controller::new(Shell, methods, [selectors()]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let deinitialization = instance.unmount().unwrap();
    assert_eq!(deinitialization.await.unwrap(), json!("cleaned"));
}

#[tokio::test]
async fn methods_started_after_teardown_report_unmounted() {
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let describe = instance.method("describe").unwrap().clone();
    drop(instance);

    let error = describe.invoke(Args::new()).await.unwrap_err();
    assert!(matches!(error, MethodError::Unmounted(name) if name == "current"));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn initialize_runs_once_without_blocking_mount() {
    let runs = Arc::new(AtomicUsize::new(0));
    let gate = Deferreds::<()>::new();
    let open = gate.defer();
    let methods = base_methods().with("initialize", {
        let runs = runs.clone();
        let gate = gate.clone();
        move |y: Yielder<LibraryStore>, _args: Args| {
            runs.fetch_add(1, Ordering::SeqCst);
            let opened = gate.take();
            async move {
                y.wait(opened).await?;
                Ok(json!("ready"))
            }
        }
    });
    let controller = Controller::new(Shell, methods, [selectors()]);
    let mut instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    let initialization = instance.take_initialization().unwrap();
    assert!(!initialization.is_finished());
    assert!(instance.render().is_ok());

    open.resolve(());
    assert_eq!(initialization.await.unwrap(), json!("ready"));

    instance.render().unwrap();
    instance.refresh().unwrap();
    assert!(instance.take_initialization().is_none());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn initialize_dispatches_request_before_fetch_resolves() {
    let fetches = Deferreds::<Vec<String>>::new();
    let methods = base_methods().with("initialize", {
        let fetches = fetches.clone();
        move |y: Yielder<LibraryStore>, _args: Args| {
            let fetched = fetches.take();
            async move {
                y.dispatch(Action::Request).await?;
                let books = y.wait(fetched).await?;
                y.dispatch(Action::Loaded(books)).await?;
                Ok(Value::Null)
            }
        }
    });
    let store = library_store("fiction");
    let respond = fetches.defer();
    let controller = Controller::new(Shell, methods, [selectors()]);
    let mut instance = controller.mount(store.clone(), own_props()).unwrap();

    assert_eq!(store.actions(), vec![Action::Request]);
    assert_eq!(instance.props().get("loading"), Some(&json!(true)));

    respond.resolve(vec!["Dune".into()]);
    instance.take_initialization().unwrap().await.unwrap();

    assert_eq!(
        store.actions(),
        vec![Action::Request, Action::Loaded(vec!["Dune".into()])]
    );
    assert_eq!(instance.props().get("loading"), Some(&json!(false)));
}

fn counting_deinitialize(runs: &Arc<AtomicUsize>) -> ControllerMethods<LibraryStore> {
    let runs = runs.clone();
    base_methods().with("deinitialize", move |_y: Yielder<LibraryStore>, _args: Args| {
        runs.fetch_add(1, Ordering::SeqCst);
        async { Ok(Value::Null) }
    })
}

#[tokio::test]
async fn deinitialize_runs_once_on_unmount() {
    let runs = Arc::new(AtomicUsize::new(0));
    let store = library_store("fiction");
    let controller = Controller::new(Shell, counting_deinitialize(&runs), [selectors()]);
    let instance = controller.mount(store.clone(), own_props()).unwrap();
    assert_eq!(store.listener_count(), 1);

    let deinitialization = instance.unmount().unwrap();
    deinitialization.await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn dropping_an_instance_deinitializes_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let store = library_store("fiction");
    let controller = Controller::new(Shell, counting_deinitialize(&runs), [selectors()]);

    drop(controller.mount(store.clone(), own_props()).unwrap());
    settle().await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn unmounted_getters_keep_the_last_snapshot() {
    let store = library_store("fiction");
    let controller = Controller::new(Shell, base_methods(), [selectors()]);
    let instance = controller.mount(store.clone(), own_props()).unwrap();
    let getter = instance.props_getter();

    drop(instance.unmount());
    store.dispatch(Action::Select("poetry".into()));

    assert_eq!(getter.get().get("shelf"), Some(&json!("fiction")));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn concurrent_invocations_interleave_by_resolution_order() {
    let fetches = Deferreds::<Vec<String>>::new();
    let methods = base_methods().with("load", {
        let fetches = fetches.clone();
        move |y: Yielder<LibraryStore>, args: Args| {
            let fetched = fetches.take();
            async move {
                let shelf: String = args.get(0)?;
                y.dispatch(Action::Select(shelf)).await?;
                let books = y.wait(fetched).await?;
                y.dispatch(Action::Loaded(books)).await?;
                Ok(Value::Null)
            }
        }
    });
    let store = library_store("fiction");
    let controller = Controller::new(Shell, methods, [selectors()]);
    let instance = controller.mount(store.clone(), own_props()).unwrap();

    let first = fetches.defer();
    let second = fetches.defer();
    let load = instance.method("load").unwrap();
    let a = load.spawn(args!["poetry"]);
    let b = load.spawn(args!["history"]);

    second.resolve(vec!["Herodotus".into()]);
    b.await.unwrap();
    first.resolve(vec!["Odes".into()]);
    a.await.unwrap();

    assert_eq!(
        store.actions(),
        vec![
            Action::Select("poetry".into()),
            Action::Select("history".into()),
            Action::Loaded(vec!["Herodotus".into()]),
            Action::Loaded(vec!["Odes".into()]),
        ]
    );
    // The slower response lands last even though its shelf is no longer selected.
    assert_eq!(instance.props().get("shelf"), Some(&json!("history")));
    assert_eq!(instance.props().get("books"), Some(&json!(["Odes"])));
}

#[tokio::test]
async fn controller_accepts_a_custom_engine() {
    let recorder = RecordingInterpreter::new();
    let controller = Controller::new(Shell, base_methods(), [selectors()])
        .with_engine(Engine::new(recorder.clone()));
    let instance = controller.mount(library_store("fiction"), own_props()).unwrap();

    instance.method("describe").unwrap().invoke(Args::new()).await.unwrap();

    assert_eq!(recorder.commands(), vec!["await", "get_props"]);
}
