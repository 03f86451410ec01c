use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Configuration file not found. Checked:\n\
        - current directory: cirrus.yaml, cirrus.local.yaml, .cirrus.yaml, .cirrus.local.yaml\n\
        - ./.cirrus/ directory\n\
        - ~/.config/cirrus/cirrus.yaml\n\
        or set CIRRUS_CONFIG_PATH to point at a file directly"
    )]
    FileNotFound,

    #[error("Configuration file is empty or not a mapping")]
    EmptyConfig,

    #[error("Required configuration section missing: {0}")]
    MissingSection(&'static str),

    #[error("Section '{section}' is invalid: {reason}")]
    InvalidSection {
        section: &'static str,
        reason: String,
    },

    #[error("Provider '{0}' not found in configuration. Available: {1}")]
    UnknownProvider(String, String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
