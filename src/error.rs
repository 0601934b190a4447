use thiserror::Error;

/// Validation failures surfaced by the lattice, the engine and the samplers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KmcError {
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    #[error("Value outside its domain: {0}")]
    Domain(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, KmcError>;
