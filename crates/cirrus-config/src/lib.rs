pub mod error;
pub mod loader;

pub use error::*;
pub use loader::{AppConfig, CirrusConfig, LoggingConfig, ResilienceConfig, load_from_path, load_from_value};

use std::path::PathBuf;

/// Cirrus user-level configuration directory, created on first use.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("cirrus");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the project configuration file.
///
/// Search order:
/// 1. CIRRUS_CONFIG_PATH environment variable (direct path)
/// 2. current directory: cirrus.local.yaml, .cirrus.local.yaml,
///    cirrus.yaml, .cirrus.yaml
/// 3. ./.cirrus/ directory, same candidates
/// 4. ~/.config/cirrus/cirrus.yaml (global)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("CIRRUS_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    let candidates = [
        "cirrus.local.yaml",
        ".cirrus.local.yaml",
        "cirrus.yaml",
        ".cirrus.yaml",
    ];

    for filename in &candidates {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let cirrus_dir = current_dir.join(".cirrus");
    if cirrus_dir.is_dir() {
        for filename in &candidates {
            let path = cirrus_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("cirrus").join("cirrus.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::FileNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const MINIMAL: &str = "providers:\n  aws:\n    region: us-east-1\n";

    #[test]
    fn test_get_config_dir() {
        let result = get_config_dir();
        assert!(result.is_ok());

        let config_dir = result.unwrap();
        assert!(config_dir.ends_with("cirrus"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("cirrus.yaml"), MINIMAL).unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        assert!(result.is_ok());
        assert!(result.unwrap().ends_with("cirrus.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("cirrus.yaml"), MINIMAL).unwrap();
        fs::write(temp_dir.path().join("cirrus.local.yaml"), MINIMAL).unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();
        assert!(result.ends_with("cirrus.local.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_cirrus_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let cirrus_dir = temp_dir.path().join(".cirrus");
        fs::create_dir(&cirrus_dir).unwrap();
        fs::write(cirrus_dir.join("cirrus.yaml"), MINIMAL).unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();
        assert!(result.ends_with(".cirrus/cirrus.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, MINIMAL).unwrap();

        temp_env::with_var(
            "CIRRUS_CONFIG_PATH",
            Some(config_path.to_str().unwrap()),
            || {
                let result = find_config_file().unwrap();
                assert_eq!(result, config_path);
            },
        );
    }

    #[test]
    #[serial]
    fn test_find_config_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        assert!(matches!(result, Err(ConfigError::FileNotFound)));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_load_from_found_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("cirrus.yaml"), MINIMAL).unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let path = find_config_file().unwrap();
        let config = load_from_path(&path, None).unwrap();
        assert!(config.providers.contains_key("aws"));

        std::env::set_current_dir(original_dir).unwrap();
    }
}
