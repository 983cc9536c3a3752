//! Reindex/unindex cascade: keeps every parallel location of a mirrored
//! object consistent in the catalog when content mutates.
//!
//! The repository's mutation ops call `notify` with an explicit operation
//! tag; there is no event bus. The whole fan-out completes before the
//! mutating call returns. Outside mirrored trees every hook is a no-op.

use crate::core::catalog::CatalogRow;
use crate::core::content::{NodeId, NodeKind, Repository};
use crate::core::error::MirrorkitError;
use crate::core::time;
use crate::mirror::identity;
use crate::mirror::resolve::{self, MirrorInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Added,
    Modified,
    Removed,
}

pub fn notify(
    repo: &Repository,
    object: NodeId,
    event: LifecycleEvent,
) -> Result<(), MirrorkitError> {
    if !repo.config.enabled {
        return Ok(());
    }
    if repo.node(object)?.kind == NodeKind::SiteRoot {
        return Ok(());
    }
    match event {
        LifecycleEvent::Added | LifecycleEvent::Modified => reindex(repo, object),
        LifecycleEvent::Removed => unindex(repo, object),
    }
}

/// (Re)index a mutated object once per master/mirror location, each row
/// under its own composite identifier.
///
/// Locations are reached through the object's parent: each relevant
/// parent identifier is looked up in the catalog and the child is indexed
/// under the row found there. A parent that is not indexed yet is
/// skipped silently — expected transiently during bulk construction, and
/// repaired by a later pass or a catalog rebuild.
pub fn reindex(repo: &Repository, object: NodeId) -> Result<(), MirrorkitError> {
    let MirrorInfo::Mirrored {
        master, mirror_ids, ..
    } = resolve::mirror_info(repo, object)?
    else {
        return Ok(());
    };
    let node = repo.node(object)?;
    let Some(parent) = node.parent else {
        return Ok(());
    };
    let Some(master_uid) = repo.node(master)?.uid.clone() else {
        return Ok(());
    };

    // Mirrors' own identifiers don't follow the composite pattern, so a
    // mirror parent (and the master itself) maps straight onto the
    // registry; any other parent composes its own identifier per mirror.
    let parent_node = repo.node(parent)?;
    let parent_ids: Vec<String> = if parent_node.kind == NodeKind::Mirror
        || parent_node.uid.as_deref() == Some(master_uid.as_str())
    {
        std::iter::once(master_uid)
            .chain(mirror_ids.iter().cloned())
            .collect()
    } else {
        let Some(parent_uid) = parent_node.uid.clone() else {
            return Ok(());
        };
        let mut ids = vec![parent_uid.clone()];
        ids.extend(
            mirror_ids
                .iter()
                .map(|mirror_id| identity::compose(&parent_uid, mirror_id)),
        );
        ids
    };

    for parent_id in parent_ids {
        for row in repo.catalog.lookup(&parent_id)? {
            index_child_under(repo, &row, object)?;
        }
    }
    Ok(())
}

/// Index `child` under a parent's catalog row, deriving the child's
/// identity from the mirror context of that row. Rows viewed through a
/// mirror carry no language tag.
fn index_child_under(
    repo: &Repository,
    parent_row: &CatalogRow,
    child: NodeId,
) -> Result<(), MirrorkitError> {
    let context = match identity::mirror_suffix(&parent_row.id) {
        Some(mirror_uid) => repo.node_by_uid(mirror_uid),
        None if parent_row.kind == NodeKind::Mirror.as_str() => repo.node_by_uid(&parent_row.uid),
        None => None,
    };
    let node = repo.node(child)?;
    let Some(uid) = node.uid.clone() else {
        return Ok(());
    };
    let row = CatalogRow {
        id: identity::identity(repo, child, context)?,
        uid,
        path: format!("{}/{}", parent_row.path.trim_end_matches('/'), node.name),
        kind: node.kind.as_str().to_string(),
        language: if context.is_some() {
            None
        } else {
            node.language.clone()
        },
        title: node.title.clone(),
        indexed_at: time::now_epoch_z(),
    };
    repo.catalog.index_row(&row)
}

/// Drop every location's row for a removed object: the bare identifier
/// plus one composite per registered mirror. Rows already gone are
/// tolerated — removal events arrive children before parents and paths
/// may overlap.
///
/// A mirror being removed was necessarily detached first (the removal
/// guard enforces it), so it carries no registry by the time its own
/// removal event fires and the walk above reports NotMirrored: the
/// detach already did the scoped unindexing, and nothing is dropped
/// twice.
pub fn unindex(repo: &Repository, object: NodeId) -> Result<(), MirrorkitError> {
    let MirrorInfo::Mirrored { mirror_ids, .. } = resolve::mirror_info(repo, object)? else {
        return Ok(());
    };
    let Some(uid) = repo.node(object)?.uid.clone() else {
        return Ok(());
    };
    let bare = identity::bare(&uid).to_string();
    let mut ids = vec![bare.clone()];
    ids.extend(
        mirror_ids
            .iter()
            .map(|mirror_id| identity::compose(&bare, mirror_id)),
    );
    for id in ids {
        repo.catalog.unindex(&id)?;
    }
    Ok(())
}
