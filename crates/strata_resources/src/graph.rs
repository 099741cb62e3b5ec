//! Repository graph.
//!
//! Every repository lives in a [`ResourceGraph`] arena and is addressed by a
//! [`RepositoryId`]. A repository is either a *leaf*, which owns the items it
//! declares, or a *composite*, which merges an ordered list of children.
//! Children keep back-references to their parents so that a change can be
//! pushed upwards eagerly; parents also poll child generations lazily.
//!
//! # Merge rule
//!
//! Children are scanned last to first. An item is dropped when an item with
//! the same name and identical qualifiers was already taken, unless the type
//! is [`ResourceType::Id`]. The last child therefore wins same-qualifier
//! collisions; earlier children only contribute names or qualifiers nobody
//! after them declared.
//!
//! # Locking
//!
//! Each composite guards its state with its own mutex and never holds it
//! while calling into another repository. Cached tables are tagged with an
//! epoch; a table computed while an invalidation landed is returned to its
//! caller but not cached.
//!
//! ```
//! use strata_resources::graph::ResourceGraph;
//! use strata_resources::model::{ResourceItem, ResourceMap, ResourceType};
//!
//! let graph = ResourceGraph::new();
//! let lib = graph.add_leaf(
//!     "lib",
//!     ResourceMap::from_items([ResourceItem::text(ResourceType::Color, "accent", "#FF0000")]),
//! );
//! let app = graph.add_leaf(
//!     "app",
//!     ResourceMap::from_items([ResourceItem::text(ResourceType::Color, "accent", "#00FF00")]),
//! );
//! let merged = graph.add_composite("merged", &[lib, app]);
//!
//! let colors = graph.items(merged, ResourceType::Color);
//! assert_eq!(colors.get("accent")[0].text_value(), Some("#00FF00"));
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::{HashMap, HashSet};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::model::{ResourceItem, ResourceMap, ResourceTable, ResourceType};

/// Handle to a repository in a [`ResourceGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryId(u64);

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repo#{}", self.0)
    }
}

struct Node {
    name: String,
    parents: Mutex<Vec<RepositoryId>>,
    kind: NodeKind,
}

enum NodeKind {
    Leaf(Leaf),
    Composite(Mutex<Composite>),
}

struct Leaf {
    items: RwLock<ResourceMap>,
    generation: AtomicU64,
}

#[derive(Default)]
struct Composite {
    children: Vec<RepositoryId>,
    /// Child generations as of the last observed change, parallel to `children`.
    child_generations: Vec<u64>,
    generation: u64,
    tables: HashMap<ResourceType, Arc<ResourceTable>>,
    merged: Option<Arc<ResourceMap>>,
    /// Bumped with every invalidation; guards cache publication.
    epoch: u64,
}

enum Change<'a> {
    /// The child list was replaced.
    Structure {
        children: Vec<RepositoryId>,
        generations: Vec<u64>,
    },
    /// Child generations sampled by a poll.
    Poll { generations: Vec<u64> },
    /// A child moved from generation `before` to `after` by changing
    /// resources of `types` (empty means all).
    Push {
        child: usize,
        before: u64,
        after: u64,
        types: &'a [ResourceType],
    },
}

/// Generation step a repository took while applying one change.
#[derive(Clone, Copy)]
struct Step {
    before: u64,
    after: u64,
}

impl Composite {
    /// Single decision point for both invalidation paths. Returns the
    /// generation step and the types actually cleared (empty means all) when
    /// the change was applied.
    fn apply_change<'a>(&mut self, change: Change<'a>) -> Option<(Step, &'a [ResourceType])> {
        let types: &[ResourceType] = match change {
            Change::Structure {
                children,
                generations,
            } => {
                self.children = children;
                self.child_generations = generations;
                &[]
            }
            Change::Poll { generations } => {
                if generations == self.child_generations {
                    return None;
                }
                self.child_generations = generations;
                &[]
            }
            Change::Push {
                child,
                before,
                after,
                types,
            } => {
                let observed = self.child_generations[child];
                self.child_generations[child] = observed.max(after);
                // The child also moved without telling us; scope is unknown.
                if observed == before { types } else { &[] }
            }
        };

        if types.is_empty() {
            self.tables.clear();
        } else {
            for ty in types {
                self.tables.remove(ty);
            }
        }
        self.merged = None;
        let before = self.generation;
        self.generation += 1;
        self.epoch += 1;
        Some((
            Step {
                before,
                after: self.generation,
            },
            types,
        ))
    }
}

/// Arena of leaf and composite repositories.
pub struct ResourceGraph {
    nodes: RwLock<HashMap<RepositoryId, Arc<Node>>>,
    next_id: AtomicU64,
}

impl Default for ResourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGraph")
            .field("repositories", &self.len())
            .finish()
    }
}

impl ResourceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a leaf repository owning `items`.
    pub fn add_leaf(&self, name: impl Into<String>, items: ResourceMap) -> RepositoryId {
        self.insert_node(
            name.into(),
            NodeKind::Leaf(Leaf {
                items: RwLock::new(items),
                generation: AtomicU64::new(0),
            }),
        )
    }

    /// Adds a composite repository over `children`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`set_children`](Self::set_children).
    pub fn add_composite(&self, name: impl Into<String>, children: &[RepositoryId]) -> RepositoryId {
        let id = self.insert_node(
            name.into(),
            NodeKind::Composite(Mutex::new(Composite::default())),
        );
        self.set_children(id, children);
        id
    }

    fn insert_node(&self, name: String, kind: NodeKind) -> RepositoryId {
        let id = RepositoryId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let node = Node {
            name,
            parents: Mutex::new(Vec::new()),
            kind,
        };
        self.nodes.write().insert(id, Arc::new(node));
        id
    }

    fn try_node(&self, id: RepositoryId) -> Option<Arc<Node>> {
        self.nodes.read().get(&id).cloned()
    }

    fn node(&self, id: RepositoryId) -> Arc<Node> {
        match self.try_node(id) {
            Some(node) => node,
            None => panic!("unknown repository {id}"),
        }
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: RepositoryId) -> bool {
        self.nodes.read().contains_key(&id)
    }

    /// Number of registered repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Returns true if no repository is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Name the repository was registered with.
    #[must_use]
    pub fn display_name(&self, id: RepositoryId) -> String {
        self.node(id).name.clone()
    }

    /// Returns true if `id` is a composite repository.
    #[must_use]
    pub fn is_composite(&self, id: RepositoryId) -> bool {
        matches!(self.node(id).kind, NodeKind::Composite(_))
    }

    /// Children in registration order; empty for leaves.
    #[must_use]
    pub fn children(&self, id: RepositoryId) -> Vec<RepositoryId> {
        match &self.node(id).kind {
            NodeKind::Leaf(_) => Vec::new(),
            NodeKind::Composite(state) => state.lock().children.clone(),
        }
    }

    /// Composites `id` is currently registered with.
    #[must_use]
    pub fn parents(&self, id: RepositoryId) -> Vec<RepositoryId> {
        self.node(id).parents.lock().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Structure
    // ─────────────────────────────────────────────────────────────────────────

    /// Replaces the child list of a composite.
    ///
    /// Deregisters from the previous children, registers with the new ones,
    /// drops every cache and bumps the generation. Parents are notified.
    ///
    /// # Panics
    ///
    /// - If `id` is a leaf
    /// - If a child is unknown or listed twice
    /// - If the new children would make `id` its own descendant
    pub fn set_children(&self, id: RepositoryId, children: &[RepositoryId]) {
        let node = self.node(id);
        let NodeKind::Composite(state) = &node.kind else {
            panic!(
                "repository '{}' is a leaf and cannot have children",
                node.name
            );
        };

        let mut unique = HashSet::with_capacity(children.len());
        for child in children {
            assert!(self.contains(*child), "unknown child repository {child}");
            assert!(
                unique.insert(*child),
                "repository '{}' listed twice as a child of '{}'",
                self.display_name(*child),
                node.name
            );
        }
        self.assert_acyclic(id, children);

        let previous = state.lock().children.clone();
        for child in previous {
            if let Some(child) = self.try_node(child) {
                child.parents.lock().retain(|p| *p != id);
            }
        }
        for child in children {
            let child = self.node(*child);
            let mut parents = child.parents.lock();
            if !parents.contains(&id) {
                parents.push(id);
            }
        }

        let generations = children.iter().map(|c| self.generation(*c)).collect();
        let step = state.lock().apply_change(Change::Structure {
            children: children.to_vec(),
            generations,
        });
        tracing::debug!(repository = %node.name, children = children.len(), "children replaced");

        if let Some((step, _)) = step {
            self.invalidate_parents(id, step, &[]);
        }
    }

    fn assert_acyclic(&self, id: RepositoryId, children: &[RepositoryId]) {
        let mut pending = children.to_vec();
        let mut seen = HashSet::new();
        while let Some(next) = pending.pop() {
            assert!(
                next != id,
                "cyclic composition: repository '{}' would become its own descendant",
                self.display_name(id)
            );
            if seen.insert(next) {
                pending.extend(self.children(next));
            }
        }
    }

    /// Removes a repository from the graph.
    ///
    /// A composite deregisters from its children and releases its caches.
    /// Children are shared and stay registered.
    ///
    /// # Panics
    ///
    /// If `id` is still a child of another composite.
    pub fn remove(&self, id: RepositoryId) {
        let node = self.node(id);
        let parents = node.parents.lock().len();
        assert!(
            parents == 0,
            "repository '{}' is still a child of {} composite(s)",
            node.name,
            parents
        );

        if let NodeKind::Composite(state) = &node.kind {
            let children = {
                let mut state = state.lock();
                state.child_generations.clear();
                state.tables.clear();
                state.merged = None;
                state.epoch += 1;
                core::mem::take(&mut state.children)
            };
            for child in children {
                if let Some(child) = self.try_node(child) {
                    child.parents.lock().retain(|p| *p != id);
                }
            }
        }
        self.nodes.write().remove(&id);
        tracing::debug!(repository = %node.name, "repository removed");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Current generation.
    ///
    /// For a composite, child generations are polled first; any drift since
    /// the last observed change bumps the composite's own counter by one.
    #[must_use]
    pub fn generation(&self, id: RepositoryId) -> u64 {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Leaf(leaf) => leaf.generation.load(Ordering::Acquire),
            NodeKind::Composite(state) => {
                let children = state.lock().children.clone();
                let sampled: Vec<u64> = children.iter().map(|c| self.generation(*c)).collect();

                let mut state = state.lock();
                // Structure moved underneath the poll; its own change already counted.
                if state.children == children {
                    state.apply_change(Change::Poll {
                        generations: sampled,
                    });
                }
                state.generation
            }
        }
    }

    /// Merged items of one type. Absent types yield an empty table.
    #[must_use]
    pub fn items(&self, id: RepositoryId, ty: ResourceType) -> Arc<ResourceTable> {
        let node = self.node(id);
        let state = match &node.kind {
            NodeKind::Leaf(leaf) => {
                return leaf.items.read().get(ty).cloned().unwrap_or_default();
            }
            NodeKind::Composite(state) => state,
        };

        let _ = self.generation(id);
        let (children, epoch) = {
            let state = state.lock();
            if let Some(table) = state.tables.get(&ty) {
                return Arc::clone(table);
            }
            (state.children.clone(), state.epoch)
        };

        let table = match children.as_slice() {
            [] => Arc::default(),
            [only] => self.items(*only, ty),
            _ => Arc::new(merge(
                ty,
                children.iter().rev().map(|child| self.items(*child, ty)),
            )),
        };

        let mut state = state.lock();
        if state.epoch == epoch {
            state.tables.insert(ty, Arc::clone(&table));
        }
        table
    }

    /// Merged items of every type.
    #[must_use]
    pub fn all_items(&self, id: RepositoryId) -> Arc<ResourceMap> {
        let node = self.node(id);
        let state = match &node.kind {
            NodeKind::Leaf(leaf) => return Arc::new(leaf.items.read().clone()),
            NodeKind::Composite(state) => state,
        };

        let _ = self.generation(id);
        let epoch = {
            let state = state.lock();
            if let Some(merged) = &state.merged {
                return Arc::clone(merged);
            }
            state.epoch
        };

        let mut map = ResourceMap::new();
        for ty in ResourceType::ALL {
            map.set_shared_table(ty, self.items(id, ty));
        }
        let map = Arc::new(map);

        let mut state = state.lock();
        if state.epoch == epoch {
            state.merged = Some(Arc::clone(&map));
        }
        map
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Changes
    // ─────────────────────────────────────────────────────────────────────────

    /// Tells `parent` that `child` changed resources of `types` (empty means
    /// all). Clears only those cached tables, bumps the generation and
    /// propagates to the parent's own parents.
    ///
    /// # Panics
    ///
    /// - If `parent` is a leaf
    /// - If `child` is not one of its children
    pub fn invalidate_cache(&self, parent: RepositoryId, child: RepositoryId, types: &[ResourceType]) {
        let current = self.generation(child);
        let step = Step {
            before: current,
            after: current,
        };
        if !self.push_invalidation(parent, child, step, types) {
            panic!(
                "repository '{}' is not a child of '{}'",
                self.display_name(child),
                self.display_name(parent)
            );
        }
    }

    /// Returns false when `child` is not (or no longer) a child of `parent`.
    fn push_invalidation(
        &self,
        parent: RepositoryId,
        child: RepositoryId,
        step: Step,
        types: &[ResourceType],
    ) -> bool {
        let node = self.node(parent);
        let NodeKind::Composite(state) = &node.kind else {
            panic!("repository '{}' is a leaf and has no caches", node.name);
        };

        let applied = {
            let mut state = state.lock();
            match state.children.iter().position(|c| *c == child) {
                Some(index) => state.apply_change(Change::Push {
                    child: index,
                    before: step.before,
                    after: step.after,
                    types,
                }),
                None => return false,
            }
        };
        if let Some((own, cleared)) = applied {
            tracing::trace!(repository = %node.name, types = ?cleared, "cache invalidated");
            self.invalidate_parents(parent, own, cleared);
        }
        true
    }

    fn invalidate_parents(&self, id: RepositoryId, step: Step, types: &[ResourceType]) {
        for parent in self.parents(id) {
            // A parent may have dropped us between the snapshot and the push.
            self.push_invalidation(parent, id, step, types);
        }
    }

    /// Mutates a leaf's items, bumps its generation and pushes an
    /// invalidation for `types` to every parent.
    ///
    /// # Panics
    ///
    /// If `id` is a composite.
    pub fn update_leaf<R>(
        &self,
        id: RepositoryId,
        types: &[ResourceType],
        mutate: impl FnOnce(&mut ResourceMap) -> R,
    ) -> R {
        let (result, step) = self.with_leaf(id, mutate);
        self.invalidate_parents(id, step, types);
        result
    }

    /// Replaces a leaf's items and bumps its generation without notifying
    /// parents. Parents notice on their next poll, or immediately after
    /// [`notify_changed`](Self::notify_changed).
    ///
    /// # Panics
    ///
    /// If `id` is a composite.
    pub fn replace_leaf_items(&self, id: RepositoryId, items: ResourceMap) {
        let _ = self.with_leaf(id, |map| *map = items);
    }

    /// Pushes an invalidation for `types` from `id` to every parent.
    ///
    /// A parent that has not yet observed the current generation of `id`
    /// drops every table, since it cannot know what else changed.
    pub fn notify_changed(&self, id: RepositoryId, types: &[ResourceType]) {
        let current = self.generation(id);
        let step = Step {
            before: current,
            after: current,
        };
        self.invalidate_parents(id, step, types);
    }

    fn with_leaf<R>(
        &self,
        id: RepositoryId,
        mutate: impl FnOnce(&mut ResourceMap) -> R,
    ) -> (R, Step) {
        let node = self.node(id);
        let NodeKind::Leaf(leaf) = &node.kind else {
            panic!(
                "repository '{}' is a composite; only leaves own items",
                node.name
            );
        };
        let mut items = leaf.items.write();
        let result = mutate(&mut items);
        let before = leaf.generation.fetch_add(1, Ordering::AcqRel);
        (
            result,
            Step {
                before,
                after: before + 1,
            },
        )
    }
}

/// Merges per-child tables given in reverse registration order.
fn merge(ty: ResourceType, tables: impl Iterator<Item = Arc<ResourceTable>>) -> ResourceTable {
    let mut merged = ResourceTable::new();
    for table in tables {
        for (_, items) in table.iter() {
            for item in items {
                if ty == ResourceType::Id || !has_same_qualifiers(&merged, item) {
                    merged.push(Arc::clone(item));
                }
            }
        }
    }
    merged
}

fn has_same_qualifiers(table: &ResourceTable, item: &ResourceItem) -> bool {
    table
        .get(item.name())
        .iter()
        .any(|existing| existing.qualifiers() == item.qualifiers())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(name: &str, value: &str) -> ResourceItem {
        ResourceItem::text(ResourceType::Color, name, value)
    }

    fn leaf(graph: &ResourceGraph, name: &str, items: Vec<ResourceItem>) -> RepositoryId {
        graph.add_leaf(name, ResourceMap::from_items(items))
    }

    #[test]
    fn children_and_parents_are_registered() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let b = leaf(&graph, "b", vec![]);
        let merged = graph.add_composite("merged", &[a, b]);

        assert_eq!(graph.children(merged), vec![a, b]);
        assert_eq!(graph.parents(a), vec![merged]);

        graph.set_children(merged, &[b]);
        assert!(graph.parents(a).is_empty());
        assert_eq!(graph.parents(b), vec![merged]);
    }

    #[test]
    fn single_child_is_a_passthrough() {
        let graph = ResourceGraph::new();
        let only = leaf(&graph, "only", vec![color("a", "#000")]);
        let merged = graph.add_composite("merged", &[only]);

        let direct = graph.items(only, ResourceType::Color);
        let through = graph.items(merged, ResourceType::Color);
        assert!(Arc::ptr_eq(&direct, &through));
    }

    #[test]
    fn absent_type_is_empty() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![color("a", "#000")]);
        let b = leaf(&graph, "b", vec![]);
        let merged = graph.add_composite("merged", &[a, b]);
        assert!(graph.items(merged, ResourceType::Layout).is_empty());
        assert!(graph.items(a, ResourceType::Layout).is_empty());
    }

    #[test]
    fn repeated_reads_hit_the_cache() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![color("a", "#000")]);
        let b = leaf(&graph, "b", vec![color("b", "#fff")]);
        let merged = graph.add_composite("merged", &[a, b]);

        let first = graph.items(merged, ResourceType::Color);
        let generation = graph.generation(merged);
        let second = graph.items(merged, ResourceType::Color);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(graph.generation(merged), generation);
    }

    #[test]
    fn eager_push_clears_only_named_types() {
        let graph = ResourceGraph::new();
        let a = leaf(
            &graph,
            "a",
            vec![color("a", "#000"), ResourceItem::text(ResourceType::String, "s", "x")],
        );
        let b = leaf(&graph, "b", vec![color("b", "#fff")]);
        let merged = graph.add_composite("merged", &[a, b]);

        let strings = graph.items(merged, ResourceType::String);
        let colors = graph.items(merged, ResourceType::Color);
        let before = graph.generation(merged);

        graph.update_leaf(a, &[ResourceType::Color], |map| map.insert(color("c", "#123")));

        assert_eq!(graph.generation(merged), before + 1);
        assert!(Arc::ptr_eq(&strings, &graph.items(merged, ResourceType::String)));
        let fresh = graph.items(merged, ResourceType::Color);
        assert!(!Arc::ptr_eq(&colors, &fresh));
        assert!(fresh.contains("c"));
    }

    #[test]
    fn lazy_poll_detects_silent_changes() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![color("a", "#000")]);
        let b = leaf(&graph, "b", vec![]);
        let merged = graph.add_composite("merged", &[a, b]);
        let _ = graph.items(merged, ResourceType::Color);
        let before = graph.generation(merged);

        graph.replace_leaf_items(a, ResourceMap::from_items([color("z", "#999")]));

        assert_eq!(graph.generation(merged), before + 1);
        let colors = graph.items(merged, ResourceType::Color);
        assert!(colors.contains("z"));
        assert!(!colors.contains("a"));
    }

    #[test]
    fn push_then_poll_counts_once() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let b = leaf(&graph, "b", vec![]);
        let merged = graph.add_composite("merged", &[a, b]);
        let before = graph.generation(merged);

        graph.update_leaf(a, &[], |map| map.insert(color("x", "#1")));
        assert_eq!(graph.generation(merged), before + 1);
        assert_eq!(graph.generation(merged), before + 1);
    }

    #[test]
    fn changes_propagate_through_nested_composites() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let b = leaf(&graph, "b", vec![]);
        let inner = graph.add_composite("inner", &[a, b]);
        let c = leaf(&graph, "c", vec![]);
        let outer = graph.add_composite("outer", &[inner, c]);
        let _ = graph.items(outer, ResourceType::Color);
        let before = graph.generation(outer);

        graph.update_leaf(a, &[ResourceType::Color], |map| map.insert(color("deep", "#1")));

        assert!(graph.generation(outer) > before);
        assert!(graph.items(outer, ResourceType::Color).contains("deep"));
    }

    #[test]
    fn remove_deregisters_from_children() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let merged = graph.add_composite("merged", &[a]);
        graph.remove(merged);

        assert!(!graph.contains(merged));
        assert!(graph.parents(a).is_empty());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    #[should_panic(expected = "still a child")]
    fn removing_a_registered_child_panics() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let _merged = graph.add_composite("merged", &[a]);
        graph.remove(a);
    }

    #[test]
    #[should_panic(expected = "listed twice")]
    fn duplicate_child_panics() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let _ = graph.add_composite("merged", &[a, a]);
    }

    #[test]
    #[should_panic(expected = "cyclic composition")]
    fn cycle_panics() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let inner = graph.add_composite("inner", &[a]);
        let outer = graph.add_composite("outer", &[inner]);
        graph.set_children(inner, &[a, outer]);
    }

    #[test]
    #[should_panic(expected = "is not a child of")]
    fn invalidation_from_stranger_panics() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let stranger = leaf(&graph, "stranger", vec![]);
        let merged = graph.add_composite("merged", &[a]);
        graph.invalidate_cache(merged, stranger, &[]);
    }

    #[test]
    #[should_panic(expected = "cannot have children")]
    fn leaves_cannot_have_children() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![]);
        let b = leaf(&graph, "b", vec![]);
        graph.set_children(a, &[b]);
    }

    #[test]
    fn all_items_collects_every_type() {
        let graph = ResourceGraph::new();
        let a = leaf(&graph, "a", vec![color("a", "#000")]);
        let b = leaf(&graph, "b", vec![ResourceItem::new(ResourceType::Id, "button")]);
        let merged = graph.add_composite("merged", &[a, b]);

        let all = graph.all_items(merged);
        assert_eq!(all.types(), vec![ResourceType::Color, ResourceType::Id]);
        assert!(Arc::ptr_eq(&all, &graph.all_items(merged)));
    }
}
