//! Attach/detach manager: the only code that links a mirror to a master,
//! aliases or clears its shared state, and mutates registry membership.

use crate::core::content::{NodeId, NodeKind, Repository};
use crate::core::error::MirrorkitError;
use crate::mirror::registry;

/// Link or unlink a mirror's master.
///
/// An attached mirror is detached first, unconditionally — re-attachment
/// always runs the full detach+attach cycle, even when the target is the
/// same master, so that drifted state is re-synchronized rather than
/// papered over.
pub fn set_master(
    repo: &mut Repository,
    mirror: NodeId,
    new_master: Option<NodeId>,
) -> Result<(), MirrorkitError> {
    let node = repo.node(mirror)?;
    if node.kind != NodeKind::Mirror {
        return Err(MirrorkitError::ValidationError(format!(
            "node '{}' is not a mirror",
            node.name
        )));
    }
    if node.master.is_some() {
        detach(repo, mirror)?;
    }
    let Some(master) = new_master else {
        return Ok(());
    };
    if master == mirror {
        return Err(MirrorkitError::ValidationError(
            "a mirror cannot be its own master".to_string(),
        ));
    }

    let master_node = repo.node(master)?;
    let master_tree = master_node.tree.ok_or_else(|| {
        MirrorkitError::ValidationError(format!(
            "master '{}' is not a container",
            master_node.name
        ))
    })?;

    // Alias the master's tree/ordering state. The mirror's own tree is
    // empty at this point (fresh from construction or detach); drop it.
    let old_tree = repo.node(mirror)?.tree;
    let old_registry = repo.node(mirror)?.registry;
    {
        let node = repo.node_mut(mirror)?;
        node.master = Some(master);
        node.tree = Some(master_tree);
    }
    if let Some(tree) = old_tree {
        if tree != master_tree && repo.tree(tree)?.count() == 0 {
            repo.free_tree(tree);
        }
    }

    let shared = registry::ensure(repo, master)?;
    repo.node_mut(mirror)?.registry = Some(shared);
    if let Some(old) = old_registry {
        if old != shared && repo.registry(old)?.is_empty() {
            repo.free_registry(old);
        }
    }

    // A mirror that is still mid-construction has no uid yet; the append
    // is skipped here and retried by the post-add hook.
    if let Some(uid) = repo.node(mirror)?.uid.clone() {
        registry::append(repo, shared, &uid)?;
    }
    Ok(())
}

/// Unlink a mirror from its master: unindex everything that exists only
/// through this mirror's aliasing, clear the aliased state, and withdraw
/// from the shared registry.
pub fn detach(repo: &mut Repository, mirror: NodeId) -> Result<(), MirrorkitError> {
    let node = repo.node(mirror)?;
    let shared_registry = node.registry;
    let uid = node.uid.clone();

    if let Some(uid) = &uid {
        // The mirror's indexed root must resolve to exactly one row;
        // anything else is catalog drift the detach cannot repair.
        let root_row = repo.catalog.lookup_unique(uid)?;
        for row in repo.catalog.lookup_by_path_prefix(&root_row.path)? {
            repo.catalog.unindex(&row.id)?;
        }
    }

    let fresh_tree = repo.alloc_tree();
    repo.node_mut(mirror)?.tree = Some(fresh_tree);

    if let Some(registry) = shared_registry {
        if let Some(uid) = &uid {
            registry::remove(repo, registry, uid)?;
        }
    }
    let fresh_registry = repo.alloc_registry();
    {
        let node = repo.node_mut(mirror)?;
        node.registry = Some(fresh_registry);
        node.master = None;
    }
    Ok(())
}

/// Post-add hook: retry the registry append that `set_master` skipped
/// while the mirror had no identifier yet.
pub fn register_after_add(repo: &mut Repository, id: NodeId) -> Result<(), MirrorkitError> {
    let node = repo.node(id)?;
    if node.kind != NodeKind::Mirror {
        return Ok(());
    }
    let Some(master) = node.master else {
        return Ok(());
    };
    let Some(uid) = node.uid.clone() else {
        return Ok(());
    };
    let shared = registry::ensure(repo, master)?;
    repo.node_mut(id)?.registry = Some(shared);
    if !repo.registry(shared)?.iter().any(|entry| entry == &uid) {
        registry::append(repo, shared, &uid)?;
    }
    Ok(())
}

/// Removal guard. An attached mirror cannot be removed: structural
/// removal runs children before parents, which makes intercepting the
/// resulting unindex cascade impossible once it has started, so removal
/// is refused up front. A master with attached mirrors is refused for the
/// same reason.
pub fn guard_removal(repo: &Repository, id: NodeId) -> Result<(), MirrorkitError> {
    let node = repo.node(id)?;
    if node.kind == NodeKind::Mirror {
        if node.master.is_some() {
            return Err(MirrorkitError::InvariantViolation(format!(
                "cannot remove mirror '{}' while it is attached to a master; detach it first",
                node.name
            )));
        }
        return Ok(());
    }
    if let Some(registry) = node.registry {
        if !repo.registry(registry)?.is_empty() {
            return Err(MirrorkitError::InvariantViolation(format!(
                "cannot remove '{}' while mirrors are attached to it; detach them first",
                node.name
            )));
        }
    }
    Ok(())
}
