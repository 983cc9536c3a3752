//! Identity derivation for mirrored content.
//!
//! Content inside a mirror is indexed under `bare_uid@mirror_uid`; at the
//! master location it keeps its plain bare identifier. The mirror
//! container itself always keeps its own bare identifier — only content
//! *inside* it gets the suffix.

use crate::core::content::{NodeId, NodeKind, Repository};
use crate::core::error::MirrorkitError;
use regex::Regex;
use std::sync::OnceLock;

pub const SEPARATOR: char = '@';

fn composite_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ULID alphabet on both sides; the separator cannot occur in either.
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9A-HJKMNP-TV-Z]{26}(@[0-9A-HJKMNP-TV-Z]{26})?$").expect("static regex")
    })
}

/// Index identity of `object` as seen through `context`.
///
/// A non-mirror context (or none) yields the object's bare identifier.
/// A mirror context yields `bare@mirror_uid`, always composed from the
/// object's *bare* identifier so that suffixing never nests.
pub fn identity(
    repo: &Repository,
    object: NodeId,
    context: Option<NodeId>,
) -> Result<String, MirrorkitError> {
    let node = repo.node(object)?;
    let bare_uid = node.uid.clone().ok_or_else(|| {
        MirrorkitError::IdentityError(format!(
            "node '{}' carries no bare identifier",
            node.name
        ))
    })?;
    let Some(context) = context else {
        return Ok(bare_uid);
    };
    let context_node = repo.node(context)?;
    if context_node.kind != NodeKind::Mirror {
        return Ok(bare_uid);
    }
    let mirror_uid = context_node.uid.clone().ok_or_else(|| {
        MirrorkitError::IdentityError(format!(
            "mirror '{}' carries no bare identifier",
            context_node.name
        ))
    })?;
    Ok(compose(&bare_uid, &mirror_uid))
}

/// `bare@mirror`, stripping any suffix the left operand already carries.
pub fn compose(id: &str, mirror_uid: &str) -> String {
    format!("{}{}{}", bare(id), SEPARATOR, mirror_uid)
}

/// The bare identifier of a possibly-composite id.
pub fn bare(id: &str) -> &str {
    match id.split_once(SEPARATOR) {
        Some((bare, _)) => bare,
        None => id,
    }
}

/// The mirror uid of a composite id, if any.
pub fn mirror_suffix(id: &str) -> Option<&str> {
    id.split_once(SEPARATOR).map(|(_, mirror)| mirror)
}

/// Whether `id` is a well-formed bare or composite identifier.
pub fn is_well_formed(id: &str) -> bool {
    composite_pattern().is_match(id)
}
