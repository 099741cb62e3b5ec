//! Sync and build events delivered through the server.

mod test_utils;

use std::path::Path;
use std::sync::Arc;
use strata_core_plugins::TracingPlugin;
use strata_resources::prelude::*;
use strata_system::server::Server;
use test_utils::{MemoryLoader, TestModule, color, leaf};

const CARDS: &str = "/libs/cards.aar";
const WIDGETS: &str = "/libs/widgets.aar";

fn server(loader: &Arc<MemoryLoader>) -> Server {
    let mut server = Server::new();
    server
        .add_plugins(TracingPlugin::default())
        .add_plugins(ResourcesPlugin::new(Arc::clone(loader) as Arc<dyn LibraryLoader>));
    server.finish();
    server
}

fn context(server: &Server) -> ResourceContext {
    server
        .get_global::<ResourceContext>()
        .cloned()
        .unwrap()
}

#[test]
fn sync_applies_new_libraries() {
    let loader = MemoryLoader::new();
    loader.add_library(CARDS, vec![color("accent", "#FF0000")]);
    loader.add_library(WIDGETS, vec![color("badge", "#00FF00")]);
    let mut server = server(&loader);

    let context = context(&server);
    let resources = leaf(context.graph(), "app/res", vec![]);
    let module = Arc::new(TestModule::new("app", resources).with_libraries(vec![Library::new(CARDS)]));
    let app = context.create_app(Arc::clone(&module) as Arc<dyn ModuleHandle>);
    assert!(!app.items(ResourceType::Color).contains("badge"));

    module.set_libraries(vec![Library::new(CARDS), Library::new(WIDGETS)]);
    server.tick::<SyncSucceeded>();

    assert_eq!(app.libraries().len(), 2);
    assert!(app.items(ResourceType::Color).contains("badge"));
}

#[test]
fn build_finished_picks_up_extracted_libraries() {
    let loader = MemoryLoader::new();
    let mut server = server(&loader);

    let context = context(&server);
    let resources = leaf(context.graph(), "app/res", vec![]);
    let module = Arc::new(TestModule::new("app", resources).with_libraries(vec![Library::new(CARDS)]));
    let app = context.create_app(Arc::clone(&module) as Arc<dyn ModuleHandle>);
    // Not extracted yet, so nothing is composed.
    assert!(app.libraries().is_empty());

    loader.add_library(CARDS, vec![color("accent", "#FF0000")]);
    server.tick::<BuildFinished>();

    assert_eq!(app.libraries().len(), 1);
    assert_eq!(
        app.libraries()[0].res_dir(),
        Path::new(CARDS).join("res").as_path()
    );
}

#[test]
fn unrelated_ticks_leave_apps_alone() {
    struct Unrelated;

    let loader = MemoryLoader::new();
    loader.add_library(CARDS, vec![]);
    let mut server = server(&loader);

    let context = context(&server);
    let resources = leaf(context.graph(), "app/res", vec![]);
    let module = Arc::new(TestModule::new("app", resources));
    let app = context.create_app(Arc::clone(&module) as Arc<dyn ModuleHandle>);

    module.set_libraries(vec![Library::new(CARDS)]);
    server.tick::<Unrelated>();

    assert!(app.libraries().is_empty());
}

#[test]
fn cleanup_disposes_live_apps() {
    let loader = MemoryLoader::new();
    let mut server = server(&loader);

    let context = context(&server);
    let resources = leaf(context.graph(), "app/res", vec![]);
    let app = context.create_app(Arc::new(TestModule::new("app", resources)));
    let id = app.id();

    server.cleanup();

    assert!(app.is_disposed());
    assert!(!context.graph().contains(id));
    assert!(context.graph().contains(resources));
    assert!(context.apps().is_empty());
}
