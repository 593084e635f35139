//! Dependency resolution tests for PluginHost::load_plugin
//!
//! These tests validate that:
//! - Dependencies load before their dependants, in declaration order
//! - Cycles, missing artifacts, duplicate names and malformed artifacts fail
//!   cleanly without leaving partial state behind

#[macro_use]
mod common;

use common::{Behaviour, Harness, count, position};
use hearth_core::plugins::{ErrorKind, HookKind, InvalidPlugin, PluginHostError, StaticLoader};
use hearth_plugin_api::{PluginDescriptor, PluginDirectory, PluginRegistrar, PluginState};

fixture!(Alpha, register_alpha, Some(PluginDescriptor::new("a", "1.0.0")));
fixture!(
    Beta,
    register_beta,
    Some(PluginDescriptor::new("b", "1.0.0").with_dependencies(["a"]))
);
fixture!(
    CycleA,
    register_cycle_a,
    Some(PluginDescriptor::new("ca", "1.0.0").with_dependencies(["cb"]))
);
fixture!(
    CycleB,
    register_cycle_b,
    Some(PluginDescriptor::new("cb", "1.0.0").with_dependencies(["ca"]))
);
fixture!(DupOne, register_dup_one, Some(PluginDescriptor::new("same", "1.0.0")));
fixture!(DupTwo, register_dup_two, Some(PluginDescriptor::new("same", "2.0.0")));
fixture!(Anonymous, register_anonymous, None);
fixture!(
    Fragile,
    register_fragile,
    Some(PluginDescriptor::new("fragile", "1.0.0").with_dependencies(["a"])),
    Behaviour {
        fail_load: true,
        ..Behaviour::NONE
    }
);
fixture!(SiblingOne, register_s1, Some(PluginDescriptor::new("s1", "1.0.0")));
fixture!(SiblingTwo, register_s2, Some(PluginDescriptor::new("s2", "1.0.0")));
fixture!(
    Hub,
    register_hub,
    Some(PluginDescriptor::new("hub", "1.0.0").with_dependencies(["s2", "s1"]))
);
fixture!(
    Greeter,
    register_greeter,
    Some(PluginDescriptor::new("greeter-bot", "0.3.0"))
);
fixture!(
    Fan,
    register_fan,
    Some(PluginDescriptor::new("fan", "1.0.0").with_dependencies(["Greeter"]))
);
fixture!(
    Pinger,
    register_pinger,
    Some(PluginDescriptor::new("pinger", "1.0.0")),
    Behaviour {
        commands: &["ping", "uptime"],
        ..Behaviour::NONE
    }
);
fixture!(
    Ponger,
    register_ponger,
    Some(PluginDescriptor::new("ponger", "1.0.0")),
    Behaviour {
        commands: &["ping"],
        ..Behaviour::NONE
    }
);

fn register_two_types(registrar: &mut PluginRegistrar) {
    registrar.register::<Alpha>();
    registrar.register::<Beta>();
}

fn loader() -> StaticLoader {
    StaticLoader::new()
        .with_artifact("alpha", register_alpha)
        .with_artifact("beta", register_beta)
        .with_artifact("cycle_a", register_cycle_a)
        .with_artifact("cycle_b", register_cycle_b)
        .with_artifact("dup_one", register_dup_one)
        .with_artifact("dup_two", register_dup_two)
        .with_artifact("anonymous", register_anonymous)
        .with_artifact("fragile", register_fragile)
        .with_artifact("s1", register_s1)
        .with_artifact("s2", register_s2)
        .with_artifact("hub", register_hub)
        .with_artifact("greeter", register_greeter)
        .with_artifact("fan", register_fan)
        .with_artifact("pinger", register_pinger)
        .with_artifact("ponger", register_ponger)
        .with_artifact("two_types", register_two_types)
}

#[tokio::test]
async fn dependency_is_loaded_and_linked_both_ways() {
    let mut h = Harness::new(loader());
    h.write_artifact("a", "alpha");
    h.write_artifact("b", "beta");

    let b = h.host.load_plugin("b").await.unwrap();
    let deps: Vec<&str> = b.dependencies().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(deps, vec!["a"]);
    assert_eq!(b.state(), PluginState::Loaded);

    let a = h.host.get_plugin("a").unwrap();
    assert_eq!(a.state(), PluginState::Loaded);
    assert_eq!(h.host.dependants_of("a"), ["b"]);
    assert!(position("a", "load").unwrap() < position("b", "load").unwrap());
}

#[tokio::test]
async fn loading_twice_is_a_no_op() {
    let mut h = Harness::new(loader());
    h.write_artifact("a", "alpha");

    h.host.load_plugin("a").await.unwrap();
    let again = h.host.load_plugin("a").await.unwrap();

    assert_eq!(again.name(), "a");
    assert_eq!(count("a", "load"), 1);
    assert_eq!(h.host.plugin_count(), 1);
    assert_eq!(h.loader.live_contexts(), 1);
}

#[tokio::test]
async fn siblings_load_in_declaration_order() {
    let mut h = Harness::new(loader());
    h.write_artifact("s1", "s1");
    h.write_artifact("s2", "s2");
    h.write_artifact("hub", "hub");

    let hub = h.host.load_plugin("hub").await.unwrap();
    let deps: Vec<&str> = hub.dependencies().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(deps, vec!["s2", "s1"]);

    let s2 = position("s2", "load").unwrap();
    let s1 = position("s1", "load").unwrap();
    let hub = position("hub", "load").unwrap();
    assert!(s2 < s1 && s1 < hub);
}

#[tokio::test]
async fn cycle_fails_and_registers_nothing() {
    let mut h = Harness::new(loader());
    h.write_artifact("ca", "cycle_a");
    h.write_artifact("cb", "cycle_b");

    let err = h.host.load_plugin("ca").await.unwrap_err();

    match &err {
        PluginHostError::CircularDependency { name, chain } => {
            assert_eq!(name, "ca");
            assert_eq!(chain, &["ca", "cb", "ca"]);
        }
        other => panic!("expected circular dependency, got {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::CircularDependency);
    assert!(h.host.get_plugin("ca").is_none());
    assert!(h.host.get_plugin("cb").is_none());
    assert_eq!(count("ca", "load"), 0);
    assert_eq!(count("cb", "load"), 0);
    assert_eq!(h.loader.live_contexts(), 0);
}

#[tokio::test]
async fn duplicate_name_keeps_first_plugin_untouched() {
    let mut h = Harness::new(loader());
    h.write_artifact("first", "dup_one");
    h.write_artifact("second", "dup_two");

    h.host.load_plugin("first").await.unwrap();
    h.host.enable("same").await.unwrap();

    let err = h.host.load_plugin("second").await.unwrap_err();

    assert!(matches!(&err, PluginHostError::DuplicateName { name } if name == "same"));
    let same = h.host.get_plugin("same").unwrap();
    assert_eq!(same.version(), "1.0.0");
    assert_eq!(same.state(), PluginState::Enabled);
    assert_eq!(same.requested_name(), "first");
    assert_eq!(count("same", "load"), 1);
    assert_eq!(h.loader.live_contexts(), 1);
}

#[tokio::test]
async fn missing_artifact_is_not_found() {
    let mut h = Harness::new(loader());

    let err = h.host.load_plugin("ghost").await.unwrap_err();

    assert!(matches!(&err, PluginHostError::NotFound { name, .. } if name == "ghost"));
    assert_eq!(h.loader.live_contexts(), 0);
}

#[tokio::test]
async fn malformed_artifacts_are_invalid() {
    let mut h = Harness::new(loader());
    h.write_artifact("mystery", "no_such_key");
    h.write_artifact("double", "two_types");
    h.write_artifact("anon", "anonymous");

    let err = h.host.load_plugin("mystery").await.unwrap_err();
    assert!(matches!(
        err,
        PluginHostError::Invalid {
            reason: InvalidPlugin::UnknownArtifact(_),
            ..
        }
    ));

    let err = h.host.load_plugin("double").await.unwrap_err();
    assert!(matches!(
        err,
        PluginHostError::Invalid {
            reason: InvalidPlugin::MultiplePluginTypes { count: 2, .. },
            ..
        }
    ));

    let err = h.host.load_plugin("anon").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(matches!(
        err,
        PluginHostError::Invalid {
            reason: InvalidPlugin::MissingDescriptor { .. },
            ..
        }
    ));

    assert_eq!(h.host.plugin_count(), 0);
    assert_eq!(h.loader.live_contexts(), 0);
}

#[tokio::test]
async fn failed_load_hook_discards_the_instance() {
    let mut h = Harness::new(loader());
    h.write_artifact("a", "alpha");
    h.write_artifact("fragile", "fragile");

    let err = h.host.load_plugin("fragile").await.unwrap_err();

    assert!(matches!(
        &err,
        PluginHostError::Hook { name, hook: HookKind::Load, .. } if name == "fragile"
    ));
    assert!(h.host.get_plugin("fragile").is_none());
    assert_eq!(count("Fragile", "drop"), 1);

    // The dependency loaded fine and stays
    assert!(h.host.get_plugin("a").is_some());
    assert!(h.host.dependants_of("a").is_empty());
    assert_eq!(h.loader.live_contexts(), 1);
}

#[tokio::test]
async fn resolved_name_comes_from_descriptor() {
    let mut h = Harness::new(loader());
    h.write_artifact("Greeter", "greeter");

    let greeter = h.host.load_plugin("Greeter").await.unwrap();
    assert_eq!(greeter.name(), "greeter-bot");
    assert_eq!(greeter.requested_name(), "Greeter");
    assert!(greeter.data_dir().ends_with("greeter-bot"));
    assert!(h.data_dir("greeter-bot").is_dir());

    // Requesting the same artifact again returns the live instance
    let again = h.host.load_plugin("Greeter").await.unwrap();
    assert_eq!(again.name(), "greeter-bot");
    assert_eq!(h.host.plugin_count(), 1);
    assert_eq!(count("greeter-bot", "load"), 1);
    assert_eq!(h.loader.live_contexts(), 1);
}

#[tokio::test]
async fn dependency_named_by_file_stem_resolves_once() {
    let mut h = Harness::new(loader());
    h.write_artifact("Greeter", "greeter");
    h.write_artifact("fan", "fan");

    let fan = h.host.load_plugin("fan").await.unwrap();
    let deps: Vec<&str> = fan.dependencies().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(deps, vec!["greeter-bot"]);
    assert_eq!(h.host.dependants_of("greeter-bot"), ["fan"]);

    let greeter = h.host.load_plugin("Greeter").await.unwrap();
    assert_eq!(greeter.name(), "greeter-bot");
    assert_eq!(count("greeter-bot", "load"), 1);
}

#[tokio::test]
async fn lookup_by_type() {
    let mut h = Harness::new(loader());
    h.write_artifact("a", "alpha");
    h.write_artifact("b", "beta");
    h.host.load_plugin("b").await.unwrap();

    assert_eq!(h.host.get_plugin_by_type::<Alpha>().unwrap().name(), "a");
    assert_eq!(h.host.get_plugin_by_type::<Beta>().unwrap().name(), "b");
    assert!(h.host.get_plugin_by_type::<Hub>().is_none());
}

#[tokio::test]
async fn command_collisions_do_not_block_loading() {
    let mut h = Harness::new(loader());
    h.write_artifact("pinger", "pinger");
    h.write_artifact("ponger", "ponger");

    h.host.load_plugin("pinger").await.unwrap();
    h.host.load_plugin("ponger").await.unwrap();

    assert_eq!(h.host.plugin_count(), 2);
    assert_eq!(
        h.host.registry().commands().owners("ping"),
        vec!["pinger", "ponger"]
    );
    let info = h.host.plugin_info("pinger").unwrap();
    assert_eq!(info.commands, vec!["ping", "uptime"]);
}

#[tokio::test]
async fn plugins_see_each_other_through_their_context() {
    let mut h = Harness::new(loader());
    h.write_artifact("a", "alpha");
    h.write_artifact("b", "beta");
    h.host.load_plugin("b").await.unwrap();
    h.host.enable("a").await.unwrap();

    let summaries = h.host.registry().view();
    let names: Vec<String> = summaries.plugins().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(summaries.is_enabled("a"));
    assert!(!summaries.is_enabled("b"));
}
