//! Merge precedence, invalidation and generation behaviour of composites.

mod test_utils;

use proptest::prelude::*;
use std::sync::Arc;
use strata_resources::prelude::*;
use test_utils::{color, id, leaf, string, values};

#[test]
fn project_wins_over_library() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![string("title", "Library")]);
    let project = leaf(&graph, "project", vec![string("title", "Project")]);
    let app = graph.add_composite("app", &[lib, project]);

    assert_eq!(values(&graph.items(app, ResourceType::String), "title"), vec!["Project"]);
}

#[test]
fn ids_survive_duplication_but_strings_do_not() {
    let graph = ResourceGraph::new();
    let a = leaf(&graph, "a", vec![id("header"), string("name", "a")]);
    let b = leaf(&graph, "b", vec![id("header"), string("name", "b")]);
    let merged = graph.add_composite("merged", &[a, b]);

    assert_eq!(graph.items(merged, ResourceType::Id).get("header").len(), 2);
    assert_eq!(graph.items(merged, ResourceType::String).get("name").len(), 1);
}

#[test]
fn libraries_then_project_end_to_end() {
    let graph = ResourceGraph::new();
    let lib_a = leaf(&graph, "LibA", vec![color("foo", "#FF0000")]);
    let lib_b = leaf(&graph, "LibB", vec![color("foo", "#00FF00")]);
    let project = leaf(&graph, "Project", vec![color("bar", "#0000FF")]);
    let app = graph.add_composite("app", &[lib_a, lib_b, project]);

    let colors = graph.items(app, ResourceType::Color);
    assert_eq!(values(&colors, "foo"), vec!["#00FF00"]);
    assert_eq!(values(&colors, "bar"), vec!["#0000FF"]);
    assert_eq!(colors.len(), 2);
}

#[test]
fn differing_qualifiers_are_all_kept() {
    let graph = ResourceGraph::new();
    let lib = leaf(
        &graph,
        "lib",
        vec![
            string("hello", "Hello"),
            string("hello", "Bonjour").with_qualifiers("fr"),
        ],
    );
    let project = leaf(&graph, "project", vec![string("hello", "Hi")]);
    let app = graph.add_composite("app", &[lib, project]);

    let strings = graph.items(app, ResourceType::String);
    let hello = strings.get("hello");
    assert_eq!(hello.len(), 2);
    assert_eq!(hello[0].text_value(), Some("Hi"));
    assert_eq!(hello[1].qualifiers(), "fr");
}

#[test]
fn first_library_can_fill_in_for_a_middle_one() {
    // Scanning is last to first, so a same-qualifier name only the first and
    // middle libraries declare resolves to the middle one.
    let graph = ResourceGraph::new();
    let first = leaf(&graph, "first", vec![color("tint", "first"), color("only_first", "1")]);
    let middle = leaf(&graph, "middle", vec![color("tint", "middle")]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[first, middle, project]);

    let colors = graph.items(app, ResourceType::Color);
    assert_eq!(values(&colors, "tint"), vec!["middle"]);
    assert_eq!(values(&colors, "only_first"), vec!["1"]);
}

#[test]
fn nested_composites_merge_through() {
    let graph = ResourceGraph::new();
    let module_a = leaf(&graph, "module_a", vec![string("shared", "a")]);
    let module_b = leaf(&graph, "module_b", vec![string("shared", "b")]);
    let modules = graph.add_composite("modules", &[module_a, module_b]);
    let lib = leaf(&graph, "lib", vec![string("shared", "lib"), string("lib_only", "x")]);
    let app = graph.add_composite("app", &[lib, modules]);

    let strings = graph.items(app, ResourceType::String);
    assert_eq!(values(&strings, "shared"), vec!["b"]);
    assert_eq!(values(&strings, "lib_only"), vec!["x"]);
}

#[test]
fn rereads_are_served_from_cache() {
    let graph = ResourceGraph::new();
    let a = leaf(&graph, "a", vec![color("x", "1")]);
    let b = leaf(&graph, "b", vec![color("y", "2")]);
    let merged = graph.add_composite("merged", &[a, b]);

    let first = graph.items(merged, ResourceType::Color);
    let generation = graph.generation(merged);
    let second = graph.items(merged, ResourceType::Color);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(graph.generation(merged), generation);
}

#[test]
fn absent_type_is_empty_not_missing() {
    let graph = ResourceGraph::new();
    let a = leaf(&graph, "a", vec![color("x", "1")]);
    let b = leaf(&graph, "b", vec![]);
    let merged = graph.add_composite("merged", &[a, b]);
    assert!(graph.items(merged, ResourceType::Layout).is_empty());
}

#[test]
fn pushed_change_is_visible_before_any_poll() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![color("accent", "old")]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[lib, project]);
    let _ = graph.items(app, ResourceType::Color);
    let before = graph.generation(app);

    graph.update_leaf(lib, &[ResourceType::Color], |map| {
        map.remove(ResourceType::Color, "accent");
        map.insert(color("accent", "new"));
    });

    assert_eq!(graph.generation(app), before + 1);
    assert_eq!(values(&graph.items(app, ResourceType::Color), "accent"), vec!["new"]);
}

#[test]
fn polled_change_matches_pushed_change() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![color("accent", "old")]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[lib, project]);
    let _ = graph.items(app, ResourceType::Color);
    let before = graph.generation(app);

    // No push: the composite must notice through its poll.
    graph.replace_leaf_items(lib, ResourceMap::from_items([color("accent", "new")]));

    assert_eq!(graph.generation(app), before + 1);
    assert_eq!(values(&graph.items(app, ResourceType::Color), "accent"), vec!["new"]);
}

#[test]
fn typed_invalidation_keeps_other_tables() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![color("accent", "1"), string("title", "t")]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[lib, project]);
    let strings = graph.items(app, ResourceType::String);
    let _ = graph.items(app, ResourceType::Color);

    graph.update_leaf(lib, &[ResourceType::Color], |map| {
        map.insert(color("extra", "2"));
    });

    assert!(Arc::ptr_eq(&strings, &graph.items(app, ResourceType::String)));
    assert!(graph.items(app, ResourceType::Color).contains("extra"));
}

#[test]
fn typed_push_after_silent_change_refreshes_everything() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![string("s", "old")]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[lib, project]);
    assert_eq!(values(&graph.items(app, ResourceType::String), "s"), vec!["old"]);

    graph.replace_leaf_items(lib, ResourceMap::from_items([string("s", "new")]));
    graph.update_leaf(lib, &[ResourceType::Color], |map| map.insert(color("c", "1")));

    assert_eq!(values(&graph.items(lib, ResourceType::String), "s"), vec!["new"]);
    assert_eq!(values(&graph.items(app, ResourceType::String), "s"), vec!["new"]);
    assert!(graph.items(app, ResourceType::Color).contains("c"));
}

#[test]
fn relayed_push_after_silent_change_refreshes_everything() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![string("s", "old")]);
    let other = leaf(&graph, "other", vec![]);
    let inner = graph.add_composite("inner", &[lib, other]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[inner, project]);
    let _ = graph.items(app, ResourceType::String);

    graph.replace_leaf_items(lib, ResourceMap::from_items([string("s", "new")]));
    graph.update_leaf(lib, &[ResourceType::Color], |map| map.insert(color("c", "1")));

    assert_eq!(values(&graph.items(app, ResourceType::String), "s"), vec!["new"]);
}

#[test]
fn explicit_notify_after_silent_change_refreshes_everything() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![string("s", "old")]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[lib, project]);
    let _ = graph.items(app, ResourceType::String);

    graph.replace_leaf_items(lib, ResourceMap::from_items([string("s", "new")]));
    graph.notify_changed(lib, &[ResourceType::Color]);

    assert_eq!(values(&graph.items(app, ResourceType::String), "s"), vec!["new"]);
}

#[test]
fn shared_leaf_notifies_every_parent() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![color("accent", "1")]);
    let one = leaf(&graph, "one", vec![]);
    let two = leaf(&graph, "two", vec![]);
    let app_one = graph.add_composite("app_one", &[lib, one]);
    let app_two = graph.add_composite("app_two", &[lib, two]);
    let g1 = graph.generation(app_one);
    let g2 = graph.generation(app_two);

    graph.update_leaf(lib, &[], |map| map.insert(color("more", "2")));

    assert!(graph.generation(app_one) > g1);
    assert!(graph.generation(app_two) > g2);
    assert!(graph.items(app_two, ResourceType::Color).contains("more"));
}

#[test]
fn dispose_keeps_shared_children() {
    let graph = ResourceGraph::new();
    let lib = leaf(&graph, "lib", vec![]);
    let project = leaf(&graph, "project", vec![]);
    let app = graph.add_composite("app", &[lib, project]);

    graph.remove(app);

    assert!(!graph.contains(app));
    assert!(graph.contains(lib));
    assert!(graph.parents(lib).is_empty());
}

#[test]
#[should_panic(expected = "cyclic composition")]
fn cycles_are_rejected() {
    let graph = ResourceGraph::new();
    let base = leaf(&graph, "base", vec![]);
    let inner = graph.add_composite("inner", &[base]);
    let outer = graph.add_composite("outer", &[inner]);
    graph.set_children(inner, &[base, outer]);
}

#[test]
#[should_panic(expected = "listed twice")]
fn duplicate_children_are_rejected() {
    let graph = ResourceGraph::new();
    let base = leaf(&graph, "base", vec![]);
    graph.add_composite("app", &[base, base]);
}

#[test]
#[should_panic(expected = "is not a child of")]
fn invalidation_from_a_stranger_is_rejected() {
    let graph = ResourceGraph::new();
    let a = leaf(&graph, "a", vec![]);
    let stranger = leaf(&graph, "stranger", vec![]);
    let app = graph.add_composite("app", &[a]);
    graph.invalidate_cache(app, stranger, &[]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

const TYPES: [ResourceType; 2] = [ResourceType::Color, ResourceType::String];

#[derive(Debug, Clone)]
enum Mutation {
    /// Edits through `update_leaf`, pushing only the edited type.
    Set { child: usize, ty: usize, name: u8, value: u8 },
    /// Silent edit; parents find out by polling or a later push.
    Remove { child: usize, ty: usize, name: u8 },
    /// Explicit push for a subset of types (empty means all).
    Push { child: usize, types: Vec<usize> },
    /// Observe the composite.
    Read,
}

fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (0..3usize, 0..2usize, 0..4u8, any::<u8>()).prop_map(|(child, ty, name, value)| {
            Mutation::Set {
                child,
                ty,
                name,
                value,
            }
        }),
        (0..3usize, 0..2usize, 0..4u8)
            .prop_map(|(child, ty, name)| Mutation::Remove { child, ty, name }),
        (0..3usize, prop::collection::vec(0..2usize, 0..3))
            .prop_map(|(child, types)| Mutation::Push { child, types }),
        Just(Mutation::Read),
    ]
}

fn item(ty: ResourceType, name: u8, value: u8) -> ResourceItem {
    ResourceItem::text(ty, format!("r{name}"), value.to_string())
}

/// Merges `children` from scratch through a throwaway composite.
fn rebuilt(graph: &ResourceGraph, children: &[RepositoryId], ty: ResourceType) -> ResourceTable {
    let fresh = graph.add_composite("fresh", children);
    let table = (*graph.items(fresh, ty)).clone();
    graph.remove(fresh);
    table
}

proptest! {
    #[test]
    fn cached_view_matches_a_fresh_merge(
        mutations in prop::collection::vec(mutation(), 1..32),
    ) {
        let graph = ResourceGraph::new();
        let children: Vec<RepositoryId> =
            (0..3).map(|i| leaf(&graph, &format!("child{i}"), vec![])).collect();
        let app = graph.add_composite("app", &children);

        let mut generation = graph.generation(app);
        let mut snapshots: Vec<Arc<ResourceTable>> =
            TYPES.iter().map(|ty| graph.items(app, *ty)).collect();
        for step in mutations.into_iter().chain([Mutation::Read]) {
            match step {
                Mutation::Set { child, ty, name, value } => {
                    let ty = TYPES[ty];
                    graph.update_leaf(children[child], &[ty], |map| {
                        map.remove(ty, &format!("r{name}"));
                        map.insert(item(ty, name, value));
                    });
                }
                Mutation::Remove { child, ty, name } => {
                    let mut map = (*graph.all_items(children[child])).clone();
                    map.remove(TYPES[ty], &format!("r{name}"));
                    graph.replace_leaf_items(children[child], map);
                }
                Mutation::Push { child, types } => {
                    let types: Vec<ResourceType> = types.into_iter().map(|t| TYPES[t]).collect();
                    graph.notify_changed(children[child], &types);
                }
                Mutation::Read => {
                    let next = graph.generation(app);
                    prop_assert!(next >= generation);
                    for (ty, snapshot) in TYPES.iter().zip(snapshots.iter_mut()) {
                        let table = graph.items(app, *ty);
                        prop_assert_eq!(&*table, &rebuilt(&graph, &children, *ty));
                        if *table != **snapshot {
                            prop_assert!(next > generation);
                        }
                        *snapshot = table;
                    }
                    generation = next;
                }
            }
        }
    }
}
