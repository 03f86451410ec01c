use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Project root is not a directory: {0}")]
    InvalidRoot(String),

    #[error("Invalid exclude pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
