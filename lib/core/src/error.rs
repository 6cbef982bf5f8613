use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Cannot compose an empty set of keys")]
    EmptyComposition,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Weight count mismatch: {keys} keys, {weights} weights")]
    WeightCountMismatch { keys: usize, weights: usize },

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Hash width mismatch: {left} bits vs {right} bits")]
    HashWidthMismatch { left: usize, right: usize },

    #[error("Invalid perceptual hash: {0}")]
    InvalidHash(String),

    #[error("Invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Duplicate item id in batch: {0}")]
    DuplicateItemId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
