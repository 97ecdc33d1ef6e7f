//! End-to-end scenarios: a dispatcher wired to the in-memory environment,
//! with modules activating off live presence state.

use std::sync::Arc;
use trellis::{DispatchOptions, Dispatcher, Options, Settings};
use trellis_env_memory::MemoryEnv;
use trellis_types::node::{InitRule, ModuleNode};
use trellis_types::test_utils::Probe;

fn sync_settings() -> Settings {
    Settings::with_patch(serde_json::json!({"dispatch": {"await_ready": false}})).unwrap()
}

fn app_with_env(id: &str) -> (Arc<Dispatcher>, Arc<MemoryEnv>) {
    let env = Arc::new(MemoryEnv::new());
    let app = Dispatcher::new(
        id,
        Options {
            settings: sync_settings(),
            oracle: Some(Arc::clone(&env) as Arc<dyn trellis_types::PresenceOracle>),
            ..Options::default()
        },
    )
    .unwrap();
    (app, env)
}

#[test]
fn presence_gates_a_rule_free_top_level_module() {
    let (app, env) = app_with_env("e2e-presence");
    let probe = Probe::new();
    app.set_module("cart", ModuleNode::new().action("_greet", probe.action()))
        .unwrap();

    env.insert("#module-cart");
    app.dispatch(DispatchOptions::default()).unwrap();
    assert_eq!(probe.count(), 1);

    env.remove("#module-cart");
    app.dispatch(DispatchOptions::default()).unwrap();
    assert_eq!(probe.count(), 1);
}

#[test]
fn selector_rule_with_flag_budget_fires_exactly_once() {
    let (app, env) = app_with_env("e2e-budget");
    let probe = Probe::new();
    app.set_module(
        "widget",
        ModuleNode::new()
            .with_init("x")
            .with_budget(true)
            .action("_bind", probe.action()),
    )
    .unwrap();

    env.insert("#module-x");
    app.dispatch(DispatchOptions::default()).unwrap(); // pass 1: present, budget allows
    app.dispatch(DispatchOptions::default()).unwrap(); // pass 2: present, budget exhausted
    env.remove("#module-x");
    app.dispatch(DispatchOptions::default()).unwrap(); // pass 3: absent anyway
    assert_eq!(probe.count(), 1);
}

#[test]
fn targeted_dispatch_does_not_touch_present_siblings() {
    let (app, env) = app_with_env("e2e-target");
    let probe_a = Probe::new();
    let probe_b = Probe::new();
    app.set_module("a", ModuleNode::new().action("_x", probe_a.action()))
        .unwrap();
    app.set_module("b", ModuleNode::new().action("_x", probe_b.action()))
        .unwrap();
    env.insert("#module-a");
    env.insert("#module-b");

    app.dispatch(DispatchOptions {
        module_id: Some("b".to_owned()),
        ..DispatchOptions::default()
    })
    .unwrap();
    assert_eq!(probe_a.count(), 0);
    assert_eq!(probe_b.count(), 1);

    app.dispatch(DispatchOptions::default()).unwrap();
    assert_eq!(probe_a.count(), 1);
    assert_eq!(probe_b.count(), 2);
}

#[test]
fn payload_reaches_predicates_and_actions() {
    let (app, _env) = app_with_env("e2e-payload");
    let probe = Probe::new();
    app.set_module(
        "report",
        ModuleNode::new()
            .with_init(InitRule::predicate(|payload| {
                payload.and_then(|p| p.get("live")).and_then(|v| v.as_bool()) == Some(true)
            }))
            .action("_render", probe.action()),
    )
    .unwrap();

    app.dispatch(DispatchOptions {
        data: Some(serde_json::json!({"live": false})),
        ..DispatchOptions::default()
    })
    .unwrap();
    assert_eq!(probe.count(), 0);

    app.dispatch(DispatchOptions {
        data: Some(serde_json::json!({"live": true})),
        ..DispatchOptions::default()
    })
    .unwrap();
    assert_eq!(probe.count(), 1);
}

#[test]
fn activation_records_point_back_to_the_owning_app() {
    let (app, env) = app_with_env("e2e-records");
    app.set_module(
        "layout",
        ModuleNode::new().module("_header", ModuleNode::new()),
    )
    .unwrap();
    env.insert("#module-layout");
    app.dispatch(DispatchOptions::default()).unwrap();

    let (module_ctx, header_ctx) = app
        .with_module("layout", |node| {
            let header = match node.entries.get("_header") {
                Some(trellis_types::NodeValue::Module(m)) => m.ctx().cloned(),
                _ => None,
            };
            (node.ctx().cloned(), header)
        })
        .unwrap();

    let module_ctx = module_ctx.unwrap();
    assert_eq!(module_ctx.app.as_str(), "e2e-records");
    assert_eq!(module_ctx.module.as_str(), "layout");
    assert_eq!(module_ctx.parent, None);

    let header_ctx = header_ctx.unwrap();
    assert_eq!(header_ctx.module.as_str(), "layout");
    assert_eq!(header_ctx.parent.as_ref().unwrap().as_str(), "layout");

    // The recorded app id resolves through the process registry.
    let found = Dispatcher::app(module_ctx.app.as_str()).unwrap();
    assert_eq!(found.id().as_str(), "e2e-records");
}

#[test]
fn deep_hierarchies_follow_the_marker_convention_all_the_way_down() {
    let (app, env) = app_with_env("e2e-deep");
    let probe = Probe::new();
    let skipped = Probe::new();
    app.set_module(
        "shell",
        ModuleNode::new()
            .module(
                "_menu",
                ModuleNode::new()
                    .module("_items", ModuleNode::new().action("_bind", probe.action()))
                    .module("ignored", ModuleNode::new().action("_bind", skipped.action()))
                    .action("__internal", skipped.action()),
            )
            .data("version", serde_json::json!("1.2.0")),
    )
    .unwrap();
    env.insert("#module-shell");

    app.dispatch(DispatchOptions::default()).unwrap();
    assert_eq!(probe.hits(), ["shell:shell/_menu/_items"]);
    assert_eq!(skipped.count(), 0);
}
