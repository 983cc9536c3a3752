//! The mirror registry: the list of mirror identifiers attached to a
//! master, stored as shared arena state.
//!
//! Invariant: a mirror uid appears in a master's registry iff that
//! mirror's `master` reference currently points at the master. Order is
//! insertion order. Only the attach/detach manager mutates membership or
//! rebinds which registry a mirror points to.

use crate::core::content::{NodeId, RegistryId, Repository};
use crate::core::error::MirrorkitError;

/// Registry handle of `master`, creating an empty one bound to the
/// master's own node if absent. Idempotent.
///
/// The handle is always written to the master's node, never through an
/// aliased mirror field, so a mirror sharing the master's state can never
/// receive a divergent copy.
pub fn ensure(repo: &mut Repository, master: NodeId) -> Result<RegistryId, MirrorkitError> {
    if let Some(registry) = repo.node(master)?.registry {
        return Ok(registry);
    }
    let registry = repo.alloc_registry();
    repo.node_mut(master)?.registry = Some(registry);
    Ok(registry)
}

pub fn append(
    repo: &mut Repository,
    registry: RegistryId,
    uid: &str,
) -> Result<(), MirrorkitError> {
    repo.registry_mut(registry)?.push(uid.to_string());
    Ok(())
}

/// Remove a mirror uid. The caller must have verified membership; a
/// missing uid means registry drift and surfaces as a consistency error.
pub fn remove(
    repo: &mut Repository,
    registry: RegistryId,
    uid: &str,
) -> Result<(), MirrorkitError> {
    let list = repo.registry_mut(registry)?;
    match list.iter().position(|entry| entry == uid) {
        Some(pos) => {
            list.remove(pos);
            Ok(())
        }
        None => Err(MirrorkitError::ConsistencyError(format!(
            "mirror id '{}' is not in the registry",
            uid
        ))),
    }
}

/// The registry entries of a node, empty when it has none.
pub fn mirror_ids(repo: &Repository, node: NodeId) -> Result<Vec<String>, MirrorkitError> {
    match repo.node(node)?.registry {
        Some(registry) => Ok(repo.registry(registry)?.clone()),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::Repository;
    use crate::core::store::Store;

    fn open_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = Repository::open(&Store::new(dir.path())).unwrap();
        (dir, repo)
    }

    #[test]
    fn ensure_is_idempotent() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        let f = repo.add_folder(root, "f", "", None).unwrap();
        let first = ensure(&mut repo, f).unwrap();
        let second = ensure(&mut repo, f).unwrap();
        assert_eq!(first, second);
        assert!(mirror_ids(&repo, f).unwrap().is_empty());
    }

    #[test]
    fn append_and_remove_keep_insertion_order() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        let f = repo.add_folder(root, "f", "", None).unwrap();
        let registry = ensure(&mut repo, f).unwrap();
        append(&mut repo, registry, "m-one").unwrap();
        append(&mut repo, registry, "m-two").unwrap();
        assert_eq!(mirror_ids(&repo, f).unwrap(), ["m-one", "m-two"]);
        remove(&mut repo, registry, "m-one").unwrap();
        assert_eq!(mirror_ids(&repo, f).unwrap(), ["m-two"]);
    }

    #[test]
    fn removing_absent_id_is_a_consistency_error() {
        let (_dir, mut repo) = open_repo();
        let root = repo.root();
        let f = repo.add_folder(root, "f", "", None).unwrap();
        let registry = ensure(&mut repo, f).unwrap();
        let err = remove(&mut repo, registry, "ghost").unwrap_err();
        assert!(matches!(err, MirrorkitError::ConsistencyError(_)));
    }
}
