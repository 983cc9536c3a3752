//! Tree locator: resolve "this object, as seen from mirror/master X" or
//! "…in language L" to the concrete indexed instance.

use crate::core::catalog::CatalogRow;
use crate::core::content::{NodeId, Repository};
use crate::core::error::MirrorkitError;
use crate::mirror::identity;
use crate::mirror::registry;
use crate::mirror::resolve::{self, MirrorInfo};

/// The row of `object` as indexed in the tree rooted at `target`, which
/// must be a mirror or a master (non-empty registry).
///
/// A target unrelated to the object's mirrored tree is a location error —
/// a normal outcome callers distinguish from system failure. Zero or
/// multiple catalog hits for the derived identifier is catalog drift and
/// surfaces as a consistency error.
pub fn get_object_in_tree(
    repo: &Repository,
    object: NodeId,
    target: NodeId,
) -> Result<CatalogRow, MirrorkitError> {
    let target_node = repo.node(target)?;
    let target_registry = registry::mirror_ids(repo, target)?;
    if target_registry.is_empty() {
        return Err(MirrorkitError::ValidationError(format!(
            "'{}' is neither a mirror nor a mirrored master",
            target_node.name
        )));
    }
    let target_uid = target_node.uid.clone().ok_or_else(|| {
        MirrorkitError::IdentityError(format!(
            "target '{}' carries no bare identifier",
            target_node.name
        ))
    })?;

    let MirrorInfo::Mirrored {
        master, mirror_ids, ..
    } = resolve::placeless_mirror_info(repo, object)?
    else {
        return Err(MirrorkitError::LocationError(format!(
            "node '{}' is not inside a mirrored tree",
            repo.node(object)?.name
        )));
    };
    if master != target && !mirror_ids.contains(&target_uid) {
        return Err(MirrorkitError::LocationError(format!(
            "node '{}' is not reachable from '{}'",
            repo.node(object)?.name,
            target_node.name
        )));
    }

    let context = if master == target { None } else { Some(target) };
    let id = identity::identity(repo, object, context)?;
    repo.catalog.lookup_unique(&id)
}

/// The row of `object` inside the mirror tagged with `language`, or at
/// the master location when `language` is `None`.
///
/// Zero mirrors in the requested language is a not-found error; more
/// than one is an ambiguity error, surfaced distinctly.
pub fn get_object_for_language(
    repo: &Repository,
    object: NodeId,
    language: Option<&str>,
) -> Result<CatalogRow, MirrorkitError> {
    let MirrorInfo::Mirrored { mirror_ids, .. } = resolve::placeless_mirror_info(repo, object)?
    else {
        return Err(MirrorkitError::LocationError(format!(
            "node '{}' is not inside a mirrored tree",
            repo.node(object)?.name
        )));
    };
    let bare = identity::identity(repo, object, None)?;

    let Some(language) = language else {
        return repo.catalog.lookup_unique(&bare);
    };

    let mut matching: Vec<String> = Vec::new();
    for mirror_id in &mirror_ids {
        for row in repo.catalog.lookup(mirror_id)? {
            if row.language.as_deref() == Some(language) {
                matching.push(mirror_id.clone());
            }
        }
    }
    match matching.len() {
        0 => Err(MirrorkitError::NotFound(format!(
            "no mirror tagged with language '{}'",
            language
        ))),
        1 => {
            let id = identity::compose(&bare, &matching[0]);
            repo.catalog.lookup_unique(&id)
        }
        n => Err(MirrorkitError::AmbiguityError(format!(
            "{} mirrors tagged with language '{}'",
            n, language
        ))),
    }
}
