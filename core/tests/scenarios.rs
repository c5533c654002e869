//! End-to-end store scenarios through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bystate_core::{
    Action, DynamicModuleConfig, Module, ModuleRegistry, Read, Registration, StateProvider, Store,
    StoreConfig, StoreError,
};
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn bump(field: &'static str) -> impl Fn(&mut Value, &Action) {
    move |state: &mut Value, _: &Action| {
        let n = state[field].as_i64().unwrap_or(0);
        state[field] = json!(n + 1);
    }
}

fn cart() -> Module {
    Module::namespaced("cart")
        .state(json!({"items": []}))
        .action("add", |slice, action| {
            if let (Some(items), Some(item)) = (slice["items"].as_array_mut(), action.get("item")) {
                items.push(item.clone());
            }
        })
        .action("clear", |slice, _| slice["items"] = json!([]))
        .getter("count", |slice, _| json!(slice["items"].as_array().map_or(0, Vec::len)))
        .getter("summary", |slice, getters| {
            let owner = getters.get("owner").unwrap_or(Value::Null);
            json!({"owner": owner, "items": slice["items"].clone()})
        })
}

fn shop() -> Store {
    Store::builder()
        .state(json!({"count": 0, "owner": "ada"}))
        .action("increment", bump("count"))
        .getter("owner", |state, _| state["owner"].clone())
        .module(cart())
        .build()
        .unwrap()
}

#[test]
fn root_counter() {
    init_tracing();
    let store = Store::builder()
        .state(json!({"count": 0}))
        .action("increment", bump("count"))
        .build()
        .unwrap();

    store.dispatch(Action::new("increment")).unwrap();
    store.dispatch(Action::new("increment")).unwrap();
    assert_eq!(*store.state(), json!({"count": 2}));
}

#[test]
fn cart_module_with_cross_namespace_getter() {
    init_tracing();
    let store = shop();
    store
        .dispatch(Action::new("cart/add").with("item", "apple"))
        .unwrap();
    store
        .dispatch(Action::new("cart/add").with("item", "pear"))
        .unwrap();

    let view = store.getter_view().unwrap();
    let cart = view.namespace("cart").unwrap();
    assert_eq!(cart.get("count"), Some(json!(2)));
    assert_eq!(
        cart.get("summary"),
        Some(json!({"owner": "ada", "items": ["apple", "pear"]}))
    );
    assert_eq!(store.state()["count"], json!(0));

    store.dispatch(Action::new("cart/clear")).unwrap();
    assert_eq!(cart.get("count"), Some(json!(0)));
}

#[test]
fn unchanged_state_keeps_getter_results() {
    init_tracing();
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let store = Store::builder()
        .state(json!({"count": 0}))
        .action("increment", bump("count"))
        .getter("expensive", move |state, _| {
            seen.set(seen.get() + 1);
            state["count"].clone()
        })
        .build()
        .unwrap();
    let view = store.getter_view().unwrap();

    view.get("expensive");
    view.get("expensive");
    store.dispatch(Action::new("nobody/listens")).unwrap();
    view.get("expensive");
    assert_eq!(calls.get(), 1);

    store.dispatch(Action::new("increment")).unwrap();
    assert_eq!(view.get("expensive"), Some(json!(1)));
    assert_eq!(calls.get(), 2);
}

#[test]
fn registering_twice_is_a_no_op() {
    init_tracing();
    let store = shop();
    let counter = || {
        Module::namespaced("counter")
            .state(json!({"n": 0}))
            .action("increment", bump("n"))
    };

    assert_eq!(
        store.register_module(counter(), DynamicModuleConfig::new()),
        Registration::Registered
    );
    store.dispatch(Action::new("counter/increment")).unwrap();
    let state = store.state();

    assert_eq!(
        store.register_module(counter(), DynamicModuleConfig::new()),
        Registration::NamespaceExists
    );
    assert!(Rc::ptr_eq(&state, &store.state()));
    assert_eq!(store.state()["counter"], json!({"n": 1}));
}

#[test]
fn dispatch_before_registration_is_harmless() {
    init_tracing();
    let store = shop();
    let before = store.state();
    store.dispatch(Action::new("todo/add").with("text", "x")).unwrap();
    assert!(Rc::ptr_eq(&before, &store.state()));

    store.register_module(
        Module::namespaced("todo")
            .state(json!({"items": []}))
            .action("add", |slice, action| {
                if let (Some(items), Some(text)) =
                    (slice["items"].as_array_mut(), action.get("text"))
                {
                    items.push(text.clone());
                }
            }),
        DynamicModuleConfig::new().with("source", "lazy"),
    );
    store.dispatch(Action::new("todo/add").with("text", "x")).unwrap();
    assert_eq!(store.state()["todo"], json!({"items": ["x"]}));
    assert_eq!(
        store.registry().config("todo").unwrap().extra.get("source"),
        Some(&json!("lazy"))
    );
}

#[test]
fn destroyed_views_stay_revoked() {
    init_tracing();
    let store = shop();
    let view = store.getter_view().unwrap();
    let cart = view.namespace("cart").unwrap();

    store.destroy_getters();
    assert!(matches!(view.read("owner"), Read::Revoked));
    assert!(matches!(cart.read("count"), Read::Revoked));
    assert!(store.getter_view().is_none());
}

#[test]
fn empty_type_is_rejected() {
    init_tracing();
    let store = shop();
    let notified = Rc::new(Cell::new(false));
    let flag = Rc::clone(&notified);
    let _sub = store.subscribe(move || flag.set(true));

    let err = store.dispatch(Action::new("")).unwrap_err();
    assert!(matches!(err, StoreError::InvalidAction));
    assert!(!notified.get());

    let err = Action::from_value(json!({"type": 5})).unwrap_err();
    assert!(err.is_data());
}

#[test]
fn provider_tracks_registrations_and_dispatches() {
    init_tracing();
    let store = shop();
    let provider = StateProvider::mount(&store);
    let renders = Rc::new(RefCell::new(Vec::new()));

    let context = provider.context();
    context
        .dispatch
        .dispatch(Action::new("cart/add").with("item", "fig"))
        .unwrap();
    renders.borrow_mut().push(provider.version());

    store.register_module(
        Module::namespaced("user").state(json!({"name": "ada"})),
        DynamicModuleConfig::new(),
    );
    renders.borrow_mut().push(provider.version());

    let latest = provider.context();
    assert_eq!(*renders.borrow(), vec![1, 2]);
    assert_eq!(latest.state["user"], json!({"name": "ada"}));
    assert_eq!(latest.getters.unwrap().get_path("cart/count"), Some(json!(1)));

    drop(provider);
    assert!(store.getter_view().is_none());
}

#[test]
fn config_file_drives_store() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.yaml");
    std::fs::write(&path, "trace_actions: true\nreport_unhandled: true\n").unwrap();
    let config = StoreConfig::load(&path).unwrap();

    let missed = Rc::new(Cell::new(0));
    let counter = Rc::clone(&missed);
    let store = Store::builder()
        .config(config)
        .on_unhandled(move |_| counter.set(counter.get() + 1))
        .module(cart())
        .build()
        .unwrap();

    store.dispatch(Action::new("cart/add").with("item", 1)).unwrap();
    store.dispatch(Action::new("cart/missing")).unwrap();
    assert_eq!(missed.get(), 1);
}

#[test]
fn shared_registry_is_visible_across_stores() {
    init_tracing();
    let registry = ModuleRegistry::new();
    let first = Store::builder().registry(registry.clone()).build().unwrap();
    let _second = Store::builder().registry(registry.clone()).build().unwrap();

    first.register_module(Module::namespaced("flags"), DynamicModuleConfig::new());
    assert!(registry.is_loaded("flags"));
    assert_eq!(registry.namespaces(), vec!["flags"]);
}
