//! The content repository: an arena-indexed tree of containers.
//!
//! This is the minimal container collaborator the mirror subsystems run
//! against. Nodes hold explicit parent references and a tagged kind; the
//! child map and insertion order of a container live in a shared
//! `TreeState` arena so that an attached mirror can alias its master's
//! structure without copying it. Mutations dispatch explicit lifecycle
//! hooks (`Added`/`Modified`/`Removed`) to the reindex/unindex cascade,
//! children before parents on removal.

use crate::core::catalog::{Catalog, CatalogRow};
use crate::core::config::{self, MirrorConfig};
use crate::core::error::MirrorkitError;
use crate::core::store::Store;
use crate::core::time;
use crate::mirror::{attach, cascade, identity, resolve};
use std::collections::{BTreeMap, HashMap};
use ulid::Ulid;

pub type NodeId = u64;
pub type TreeId = u64;
pub type RegistryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    SiteRoot,
    Plain,
    Mirror,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::SiteRoot => "site_root",
            NodeKind::Plain => "plain",
            NodeKind::Mirror => "mirror",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Bare identifier, assigned once when the node is added to a
    /// container and immutable thereafter.
    pub uid: Option<String>,
    pub title: String,
    pub language: Option<String>,
    /// Shared tree handle; `None` for leaf items. An attached mirror
    /// points at its master's handle.
    pub tree: Option<TreeId>,
    /// Shared mirror-registry handle. An attached mirror points at its
    /// master's handle; detach rebinds it to a fresh empty one.
    pub registry: Option<RegistryId>,
    /// Explicit master reference; mirrors only, null while detached.
    pub master: Option<NodeId>,
}

/// Child map plus insertion order of one container. Count is derived.
#[derive(Debug, Default, Clone)]
pub struct TreeState {
    children: BTreeMap<String, NodeId>,
    order: Vec<String>,
}

impl TreeState {
    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn insert(&mut self, name: &str, id: NodeId) {
        if self.children.insert(name.to_string(), id).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<NodeId> {
        let removed = self.children.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Child names in insertion order (the container's position index).
    pub fn names_in_order(&self) -> &[String] {
        &self.order
    }

    pub fn ids_in_order(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .filter_map(|name| self.children.get(name).copied())
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }
}

pub struct Repository {
    nodes: HashMap<NodeId, Node>,
    trees: HashMap<TreeId, TreeState>,
    registries: HashMap<RegistryId, Vec<String>>,
    by_uid: HashMap<String, NodeId>,
    next_id: u64,
    root: NodeId,
    pub catalog: Catalog,
    pub config: MirrorConfig,
}

impl Repository {
    /// Open a site against a state root: loads `mirror.toml` (defaults if
    /// absent), opens the catalog database, and creates the site root
    /// node. The site root carries no bare identifier and is never
    /// indexed.
    pub fn open(store: &Store) -> Result<Self, MirrorkitError> {
        let config = config::load_config(&store.root)?;
        let catalog = Catalog::open(&store.root, &config.catalog_db)?;
        let mut repo = Self {
            nodes: HashMap::new(),
            trees: HashMap::new(),
            registries: HashMap::new(),
            by_uid: HashMap::new(),
            next_id: 1,
            root: 0,
            catalog,
            config,
        };
        let tree = repo.alloc_tree();
        let root_id = repo.alloc_id();
        repo.nodes.insert(
            root_id,
            Node {
                id: root_id,
                name: String::new(),
                kind: NodeKind::SiteRoot,
                parent: None,
                uid: None,
                title: String::new(),
                language: None,
                tree: Some(tree),
                registry: None,
                master: None,
            },
        );
        repo.root = root_id;
        Ok(repo)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn alloc_tree(&mut self) -> TreeId {
        let id = self.alloc_id();
        self.trees.insert(id, TreeState::default());
        id
    }

    pub fn alloc_registry(&mut self) -> RegistryId {
        let id = self.alloc_id();
        self.registries.insert(id, Vec::new());
        id
    }

    pub fn free_tree(&mut self, id: TreeId) {
        self.trees.remove(&id);
    }

    pub fn free_registry(&mut self, id: RegistryId) {
        self.registries.remove(&id);
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, MirrorkitError> {
        self.nodes
            .get(&id)
            .ok_or_else(|| MirrorkitError::NotFound(format!("no such node: {}", id)))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, MirrorkitError> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| MirrorkitError::NotFound(format!("no such node: {}", id)))
    }

    pub fn tree(&self, id: TreeId) -> Result<&TreeState, MirrorkitError> {
        self.trees
            .get(&id)
            .ok_or_else(|| MirrorkitError::NotFound(format!("no such tree state: {}", id)))
    }

    pub fn tree_mut(&mut self, id: TreeId) -> Result<&mut TreeState, MirrorkitError> {
        self.trees
            .get_mut(&id)
            .ok_or_else(|| MirrorkitError::NotFound(format!("no such tree state: {}", id)))
    }

    pub fn registry(&self, id: RegistryId) -> Result<&Vec<String>, MirrorkitError> {
        self.registries
            .get(&id)
            .ok_or_else(|| MirrorkitError::NotFound(format!("no such registry: {}", id)))
    }

    pub fn registry_mut(&mut self, id: RegistryId) -> Result<&mut Vec<String>, MirrorkitError> {
        self.registries
            .get_mut(&id)
            .ok_or_else(|| MirrorkitError::NotFound(format!("no such registry: {}", id)))
    }

    pub fn node_by_uid(&self, uid: &str) -> Option<NodeId> {
        self.by_uid.get(uid).copied()
    }

    /// Path of a node in its physical tree, e.g. `/folder/item`. The site
    /// root is `/`.
    pub fn physical_path(&self, id: NodeId) -> Result<String, MirrorkitError> {
        if id == self.root {
            return Ok("/".to_string());
        }
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let node = self.node(current)?;
            if node.kind == NodeKind::SiteRoot {
                break;
            }
            segments.push(node.name.clone());
            current = node.parent.ok_or_else(|| {
                MirrorkitError::LocationError(format!(
                    "node '{}' is not located in the site tree",
                    node.name
                ))
            })?;
        }
        segments.reverse();
        Ok(format!("/{}", segments.join("/")))
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, MirrorkitError> {
        let node = self.node(id)?;
        match node.tree {
            Some(tree) => Ok(self.tree(tree)?.ids_in_order()),
            None => Ok(Vec::new()),
        }
    }

    pub fn child_by_name(&self, id: NodeId, name: &str) -> Result<Option<NodeId>, MirrorkitError> {
        let node = self.node(id)?;
        match node.tree {
            Some(tree) => Ok(self.tree(tree)?.child(name)),
            None => Ok(None),
        }
    }

    // ----- creation -----

    pub fn add_folder(
        &mut self,
        parent: NodeId,
        name: &str,
        title: &str,
        language: Option<&str>,
    ) -> Result<NodeId, MirrorkitError> {
        let tree = self.alloc_tree();
        let id = self.alloc_detached(name, NodeKind::Plain, title, language, Some(tree));
        self.attach_to_parent(parent, id)?;
        Ok(id)
    }

    pub fn add_item(
        &mut self,
        parent: NodeId,
        name: &str,
        title: &str,
    ) -> Result<NodeId, MirrorkitError> {
        let id = self.alloc_detached(name, NodeKind::Plain, title, None, None);
        self.attach_to_parent(parent, id)?;
        Ok(id)
    }

    /// Create a mirror container. When `master` is given, attachment runs
    /// mid-construction, before the mirror has a bare identifier; the
    /// registry append is skipped there and retried by the post-add hook.
    pub fn add_mirror(
        &mut self,
        parent: NodeId,
        name: &str,
        title: &str,
        language: Option<&str>,
        master: Option<NodeId>,
    ) -> Result<NodeId, MirrorkitError> {
        let tree = self.alloc_tree();
        let id = self.alloc_detached(name, NodeKind::Mirror, title, language, Some(tree));
        if master.is_some() {
            attach::set_master(self, id, master)?;
        }
        self.attach_to_parent(parent, id)?;
        Ok(id)
    }

    fn alloc_detached(
        &mut self,
        name: &str,
        kind: NodeKind,
        title: &str,
        language: Option<&str>,
        tree: Option<TreeId>,
    ) -> NodeId {
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.to_string(),
                kind,
                parent: None,
                uid: None,
                title: title.to_string(),
                language: language.map(|l| l.to_string()),
                tree,
                registry: None,
                master: None,
            },
        );
        id
    }

    /// Link a constructed node into a container: validates the name,
    /// assigns the bare identifier, indexes the physical row, then fires
    /// the post-mutation hooks (mirror registry retry, then the `Added`
    /// cascade).
    fn attach_to_parent(&mut self, parent: NodeId, id: NodeId) -> Result<(), MirrorkitError> {
        let name = self.node(id)?.name.clone();
        if name.is_empty() || name.contains('/') {
            return Err(MirrorkitError::ValidationError(format!(
                "invalid child name: '{}'",
                name
            )));
        }
        let parent_tree = self.node(parent)?.tree.ok_or_else(|| {
            MirrorkitError::ValidationError("parent is not a container".to_string())
        })?;
        if self.tree(parent_tree)?.child(&name).is_some() {
            return Err(MirrorkitError::ValidationError(format!(
                "duplicate child name: '{}'",
                name
            )));
        }

        let uid = Ulid::new().to_string();
        {
            let node = self.node_mut(id)?;
            node.parent = Some(parent);
            node.uid = Some(uid.clone());
        }
        self.by_uid.insert(uid, id);
        self.tree_mut(parent_tree)?.insert(&name, id);

        self.index_physical(id)?;
        attach::register_after_add(self, id)?;
        cascade::notify(self, id, cascade::LifecycleEvent::Added)?;
        Ok(())
    }

    // ----- modification -----

    pub fn set_title(&mut self, id: NodeId, title: &str) -> Result<(), MirrorkitError> {
        self.node_mut(id)?.title = title.to_string();
        self.index_physical(id)?;
        cascade::notify(self, id, cascade::LifecycleEvent::Modified)?;
        Ok(())
    }

    pub fn set_language(
        &mut self,
        id: NodeId,
        language: Option<&str>,
    ) -> Result<(), MirrorkitError> {
        self.node_mut(id)?.language = language.map(|l| l.to_string());
        self.index_physical(id)?;
        cascade::notify(self, id, cascade::LifecycleEvent::Modified)?;
        Ok(())
    }

    /// Link or unlink a mirror's master. Re-attachment always runs a full
    /// detach+attach cycle; see the attach/detach manager.
    pub fn set_master(
        &mut self,
        mirror: NodeId,
        master: Option<NodeId>,
    ) -> Result<(), MirrorkitError> {
        attach::set_master(self, mirror, master)
    }

    // ----- removal -----

    /// Remove a node and its physical subtree. Removal notifications run
    /// children before parents; every node's mirror copies are unindexed
    /// by the cascade and its physical row is dropped afterwards.
    pub fn remove(&mut self, id: NodeId) -> Result<(), MirrorkitError> {
        if id == self.root {
            return Err(MirrorkitError::ValidationError(
                "cannot remove the site root".to_string(),
            ));
        }
        let subtree = self.collect_subtree_postorder(id)?;
        for &n in &subtree {
            attach::guard_removal(self, n)?;
        }

        for &n in &subtree {
            cascade::notify(self, n, cascade::LifecycleEvent::Removed)?;
            if let Some(uid) = self.node(n)?.uid.clone() {
                // Mirror copies are gone via the cascade; the physical row
                // may already be among them.
                self.catalog.unindex(&uid)?;
            }
        }

        let node = self.node(id)?;
        let name = node.name.clone();
        let parent = node.parent.ok_or_else(|| {
            MirrorkitError::ValidationError("node is not linked into a container".to_string())
        })?;
        let parent_tree = self.node(parent)?.tree.ok_or_else(|| {
            MirrorkitError::ConsistencyError("parent container lost its tree state".to_string())
        })?;
        self.tree_mut(parent_tree)?.remove(&name);

        for n in subtree {
            if let Some(node) = self.nodes.remove(&n) {
                if let Some(uid) = node.uid {
                    self.by_uid.remove(&uid);
                }
                if let Some(tree) = node.tree {
                    self.trees.remove(&tree);
                }
                if let Some(registry) = node.registry {
                    self.registries.remove(&registry);
                }
            }
        }
        Ok(())
    }

    /// Physical subtree, children before parents. Mirror trees are
    /// aliases, not physical ownership, so the walk does not descend into
    /// them.
    fn collect_subtree_postorder(&self, id: NodeId) -> Result<Vec<NodeId>, MirrorkitError> {
        let mut out = Vec::new();
        self.collect_postorder_into(id, &mut out)?;
        Ok(out)
    }

    fn collect_postorder_into(
        &self,
        id: NodeId,
        out: &mut Vec<NodeId>,
    ) -> Result<(), MirrorkitError> {
        let node = self.node(id)?;
        if node.kind != NodeKind::Mirror {
            if let Some(tree) = node.tree {
                for child in self.tree(tree)?.ids_in_order() {
                    self.collect_postorder_into(child, out)?;
                }
            }
        }
        out.push(id);
        Ok(())
    }

    // ----- indexing -----

    /// Refresh the node's row at its directly-addressed location. The
    /// identity and language follow the innermost mirror on the node's
    /// own containment chain: content reached through a mirror is
    /// composite even at this row.
    pub fn index_physical(&self, id: NodeId) -> Result<(), MirrorkitError> {
        let node = self.node(id)?;
        let Some(uid) = node.uid.clone() else {
            return Ok(());
        };
        let context = resolve::enclosing_mirror(self, id)?;
        let row = CatalogRow {
            id: identity::identity(self, id, context)?,
            uid,
            path: self.physical_path(id)?,
            kind: node.kind.as_str().to_string(),
            language: if context.is_some() {
                None
            } else {
                node.language.clone()
            },
            title: node.title.clone(),
            indexed_at: time::now_epoch_z(),
        };
        self.catalog.index_row(&row)
    }

    /// Rebuild the whole catalog by traversal from the site root: every
    /// reachable node is indexed once per traversal path, composite under
    /// whichever mirror the path crossed. This is the repair path for the
    /// documented drift cases (content that predates a mirror's
    /// attachment, moved mirrors). Returns the row count.
    pub fn rebuild_catalog(&mut self) -> Result<usize, MirrorkitError> {
        self.catalog.clear()?;
        let mut count = 0;
        self.reindex_traversal(self.root, "", None, &mut count)?;
        Ok(count)
    }

    fn reindex_traversal(
        &self,
        container: NodeId,
        base: &str,
        context: Option<NodeId>,
        count: &mut usize,
    ) -> Result<(), MirrorkitError> {
        for child in self.children(container)? {
            let node = self.node(child)?;
            let Some(uid) = node.uid.clone() else {
                continue;
            };
            let path = format!("{}/{}", base, node.name);
            let row = CatalogRow {
                id: identity::identity(self, child, context)?,
                uid,
                path: path.clone(),
                kind: node.kind.as_str().to_string(),
                language: if context.is_some() {
                    None
                } else {
                    node.language.clone()
                },
                title: node.title.clone(),
                indexed_at: time::now_epoch_z(),
            };
            self.catalog.index_row(&row)?;
            *count += 1;

            if node.tree.is_none() {
                continue;
            }
            if node.kind == NodeKind::Mirror {
                // One mirror level per traversal path: content below a
                // nested mirror resolves relative to that innermost
                // mirror, on its own traversal.
                if context.is_none() && node.master.is_some() {
                    self.reindex_traversal(child, &path, Some(child), count)?;
                }
            } else {
                self.reindex_traversal(child, &path, context, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let repo = Repository::open(&store).unwrap();
        (dir, repo)
    }

    #[test]
    fn add_folder_assigns_uid_and_indexes_physical_row() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        let f = repo.add_folder(root, "docs", "Documents", None).unwrap();
        let uid = repo.node(f).unwrap().uid.clone().unwrap();
        assert!(ulid::Ulid::from_string(&uid).is_ok());
        let row = repo.catalog.lookup_unique(&uid).unwrap();
        assert_eq!(row.path, "/docs");
        assert_eq!(row.kind, "plain");
    }

    #[test]
    fn physical_paths_nest() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        let f = repo.add_folder(root, "a", "", None).unwrap();
        let g = repo.add_folder(f, "b", "", None).unwrap();
        let x = repo.add_item(g, "c", "").unwrap();
        assert_eq!(repo.physical_path(root).unwrap(), "/");
        assert_eq!(repo.physical_path(x).unwrap(), "/a/b/c");
    }

    #[test]
    fn duplicate_child_names_are_rejected() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        repo.add_folder(root, "a", "", None).unwrap();
        let err = repo.add_folder(root, "a", "", None).unwrap_err();
        assert!(matches!(err, MirrorkitError::ValidationError(_)));
    }

    #[test]
    fn tree_state_keeps_insertion_order() {
        let mut tree = TreeState::default();
        tree.insert("z", 1);
        tree.insert("a", 2);
        tree.insert("m", 3);
        assert_eq!(tree.names_in_order(), ["z", "a", "m"]);
        assert_eq!(tree.position("a"), Some(1));
        tree.remove("a");
        assert_eq!(tree.names_in_order(), ["z", "m"]);
        assert_eq!(tree.count(), 2);
    }

    #[test]
    fn remove_unindexes_subtree_children_first() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        let f = repo.add_folder(root, "a", "", None).unwrap();
        let x = repo.add_item(f, "x", "").unwrap();
        let f_uid = repo.node(f).unwrap().uid.clone().unwrap();
        let x_uid = repo.node(x).unwrap().uid.clone().unwrap();

        repo.remove(f).unwrap();
        assert!(repo.catalog.lookup(&f_uid).unwrap().is_empty());
        assert!(repo.catalog.lookup(&x_uid).unwrap().is_empty());
        assert!(repo.child_by_name(root, "a").unwrap().is_none());
        assert!(repo.node(f).is_err());
    }

    #[test]
    fn cannot_remove_site_root() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        assert!(matches!(
            repo.remove(root),
            Err(MirrorkitError::ValidationError(_))
        ));
    }
}
