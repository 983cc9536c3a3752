//! Mirror-info resolution: given any content object, determine whether it
//! lives inside a mirrored tree, and if so which master and mirrors are
//! involved.

use crate::core::content::{NodeId, NodeKind, Repository};
use crate::core::error::MirrorkitError;
use crate::mirror::identity;
use crate::mirror::registry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorInfo {
    NotMirrored,
    Mirrored {
        master: NodeId,
        /// The mirror the object was reached through; `None` when the
        /// mirrored ancestor is the master itself.
        mirror: Option<NodeId>,
        /// The full registry at the point where mirroring was detected.
        mirror_ids: Vec<String>,
    },
}

impl MirrorInfo {
    pub fn is_mirrored(&self) -> bool {
        matches!(self, MirrorInfo::Mirrored { .. })
    }
}

/// Walk the object's containment chain outward (excluding the object
/// itself), stopping at the site root. The first ancestor carrying a
/// non-empty registry decides the result; nested mirrored structures
/// resolve relative to the nearest such ancestor, never an outer one.
pub fn mirror_info(repo: &Repository, object: NodeId) -> Result<MirrorInfo, MirrorkitError> {
    let mut current = repo.node(object)?.parent;
    while let Some(ancestor) = current {
        let node = repo.node(ancestor)?;
        if node.kind == NodeKind::SiteRoot {
            return Ok(MirrorInfo::NotMirrored);
        }
        let mirror_ids = registry::mirror_ids(repo, ancestor)?;
        if !mirror_ids.is_empty() {
            if node.kind == NodeKind::Mirror {
                if let Some(master) = node.master {
                    return Ok(MirrorInfo::Mirrored {
                        master,
                        mirror: Some(ancestor),
                        mirror_ids,
                    });
                }
            } else {
                return Ok(MirrorInfo::Mirrored {
                    master: ancestor,
                    mirror: None,
                    mirror_ids,
                });
            }
        }
        current = node.parent;
    }
    Ok(MirrorInfo::NotMirrored)
}

/// The innermost mirror on the object's containment chain (excluding the
/// object itself), if any. This is the context an object's own location
/// is indexed under: content reached through a mirror carries that
/// mirror's suffix even at its directly-addressed row.
pub fn enclosing_mirror(
    repo: &Repository,
    object: NodeId,
) -> Result<Option<NodeId>, MirrorkitError> {
    let mut current = repo.node(object)?.parent;
    while let Some(ancestor) = current {
        let node = repo.node(ancestor)?;
        match node.kind {
            NodeKind::SiteRoot => return Ok(None),
            NodeKind::Mirror => return Ok(Some(ancestor)),
            NodeKind::Plain => {}
        }
        current = node.parent;
    }
    Ok(None)
}

/// Mirror info for an object whose containment chain is not informative
/// (fetched by reference, mid-move, or drifted): fall back to a catalog
/// lookup by the bare identifier and derive the context from an indexed
/// location. No indexed location means not mirrored.
pub fn placeless_mirror_info(
    repo: &Repository,
    object: NodeId,
) -> Result<MirrorInfo, MirrorkitError> {
    let info = mirror_info(repo, object)?;
    if info.is_mirrored() {
        return Ok(info);
    }
    let Some(uid) = repo.node(object)?.uid.clone() else {
        return Ok(MirrorInfo::NotMirrored);
    };
    for row in repo.catalog.lookup_by_uid(&uid)? {
        let Some(mirror_uid) = identity::mirror_suffix(&row.id) else {
            continue;
        };
        let Some(mirror) = repo.node_by_uid(mirror_uid) else {
            continue;
        };
        let mirror_node = repo.node(mirror)?;
        if let Some(master) = mirror_node.master {
            return Ok(MirrorInfo::Mirrored {
                master,
                mirror: Some(mirror),
                mirror_ids: registry::mirror_ids(repo, mirror)?,
            });
        }
    }
    Ok(MirrorInfo::NotMirrored)
}
