use crate::core::error::MirrorkitError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Site-level mirroring configuration, read from `<root>/mirror.toml`.
///
/// `enabled` is the explicit switch for the reindex/unindex cascade.
/// Callers that load content outside any mirroring-aware context (imports,
/// migrations) run with it off and rebuild the catalog afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MirrorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_catalog_db")]
    pub catalog_db: String,
}

fn default_enabled() -> bool {
    true
}

fn default_catalog_db() -> String {
    schemas::CATALOG_DB_NAME.to_string()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            catalog_db: default_catalog_db(),
        }
    }
}

/// Load config from `<root>/mirror.toml`. No file = default config (not an
/// error).
pub fn load_config(root: &Path) -> Result<MirrorConfig, MirrorkitError> {
    let config_path = root.join(schemas::CONFIG_NAME);
    if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(MirrorkitError::IoError)?;
        let config: MirrorConfig =
            toml::from_str(&content).map_err(|e| MirrorkitError::ValidationError(e.to_string()))?;
        return Ok(config);
    }
    Ok(MirrorConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.enabled);
        assert_eq!(config.catalog_db, schemas::CATALOG_DB_NAME);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join(schemas::CONFIG_NAME),
            "enabled = false\ncatalog_db = \"site.db\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.catalog_db, "site.db");
    }

    #[test]
    fn malformed_file_is_a_validation_error() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join(schemas::CONFIG_NAME), "enabled = maybe").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, MirrorkitError::ValidationError(_)));
    }
}
