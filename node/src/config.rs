//! Vault configuration loading.

use std::path::Path;

use anyhow::{Context, Result};
use lockbox_contracts::VaultConfig;

/// Reads a [`VaultConfig`] from a JSON file, or returns the defaults when no
/// path is given.
pub fn load_config(path: Option<&Path>) -> Result<VaultConfig> {
    let Some(path) = path else {
        tracing::debug!("no config file given, using defaults");
        return Ok(VaultConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = VaultConfig::from_json(&raw)
        .with_context(|| format!("invalid vault config in {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        admin_may_deposit = config.admin_may_deposit,
        receipt_symbol = %config.receipt_symbol,
        "config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        assert_eq!(load_config(None).unwrap(), VaultConfig::default());
    }

    #[test]
    fn reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"admin_may_deposit": false}}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert!(!config.admin_may_deposit);
    }

    #[test]
    fn error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains(&file.path().display().to_string()));
    }

    #[test]
    fn nonexistent_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }
}
