//! The mirror subsystems: identity derivation, the mirror registry, the
//! attach/detach manager, mirror-info resolution, the reindex/unindex
//! cascade, and the tree locator.

pub mod attach;
pub mod cascade;
pub mod identity;
pub mod locate;
pub mod registry;
pub mod resolve;
