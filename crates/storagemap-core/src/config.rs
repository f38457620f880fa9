/// Base directory resolution and naming-rule loading.
///
/// Layout under the base directory:
///
/// ```text
/// <base>/config/naming_rules.json
/// <base>/registry/drives.json
/// <base>/snapshots/<ID>-<YYYY-MM-DD>.json
/// ```
use crate::error::ConfigError;
use crate::naming::NamingRules;
use directories::ProjectDirs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides the platform data directory.
pub const BASE_DIR_ENV: &str = "STORAGEMAP_BASE_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub base_dir: PathBuf,
    pub config_dir: PathBuf,
    pub registry_dir: PathBuf,
    pub snapshots_dir: PathBuf,
}

impl AppPaths {
    /// Lay the standard sub-directories out under `base`. Nothing is created.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base_dir = base.into();
        Self {
            config_dir: base_dir.join("config"),
            registry_dir: base_dir.join("registry"),
            snapshots_dir: base_dir.join("snapshots"),
            base_dir,
        }
    }

    /// `explicit` if given, else `$STORAGEMAP_BASE_DIR`, else the platform
    /// data directory.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(base) = explicit {
            return Ok(Self::under(base));
        }
        if let Some(env_base) = std::env::var_os(BASE_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::under(PathBuf::from(env_base)));
        }
        let proj_dirs =
            ProjectDirs::from("com", "storagemap", "storagemap").ok_or(ConfigError::Directories)?;
        Ok(Self::under(proj_dirs.data_dir()))
    }

    pub fn naming_rules_file(&self) -> PathBuf {
        self.config_dir.join("naming_rules.json")
    }

    pub fn registry_file(&self) -> PathBuf {
        self.registry_dir.join("drives.json")
    }
}

/// Load naming rules from `path`, falling back to the built-in pools when
/// the file does not exist. A present but broken file is an error.
pub fn load_naming_rules(path: &Path) -> Result<NamingRules, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No {}; using built-in naming rules", path.display());
            return Ok(NamingRules::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let rules: NamingRules = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    rules.validate().map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_base_dir_layout() {
        let tmp = tempdir().unwrap();
        let paths = AppPaths::resolve(Some(tmp.path())).unwrap();

        assert_eq!(paths.base_dir, tmp.path());
        assert_eq!(paths.registry_file(), tmp.path().join("registry").join("drives.json"));
        assert_eq!(
            paths.naming_rules_file(),
            tmp.path().join("config").join("naming_rules.json")
        );
        assert_eq!(paths.snapshots_dir, tmp.path().join("snapshots"));
    }

    #[test]
    fn test_missing_rules_fall_back_to_defaults() {
        let tmp = tempdir().unwrap();
        let rules = load_naming_rules(&tmp.path().join("naming_rules.json")).unwrap();
        assert_eq!(rules, NamingRules::default());
    }

    #[test]
    fn test_rules_file_is_used() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("naming_rules.json");
        std::fs::write(
            &path,
            r#"{
                "large_drive_threshold_tb": 8,
                "medium_drive_threshold_tb": 2,
                "large_names": ["Ego"],
                "medium_names": ["Hulk"],
                "small_names": ["Ant"]
            }"#,
        )
        .unwrap();

        let rules = load_naming_rules(&path).unwrap();
        assert_eq!(rules.large_drive_threshold_tb, 8.0);
        assert_eq!(rules.small_names, vec!["Ant".to_string()]);
    }

    #[test]
    fn test_broken_rules_are_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("naming_rules.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_naming_rules(&path), Err(ConfigError::Parse { .. })));

        std::fs::write(
            &path,
            r#"{"large_drive_threshold_tb": 1, "medium_drive_threshold_tb": 3,
                "large_names": [], "medium_names": [], "small_names": []}"#,
        )
        .unwrap();
        assert!(matches!(load_naming_rules(&path), Err(ConfigError::Invalid { .. })));
    }
}
