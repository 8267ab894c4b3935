use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A grid does not have the shape declared by its pattern store.
    #[error("pattern shape {rows}x{columns} does not match the training set shape {expected_rows}x{expected_columns}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_columns: usize,
        rows: usize,
        columns: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Flattened pattern length differs from the network's neuron count.
    #[error("pattern has {actual} cells but the network has {expected} neurons")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("pattern index {index} out of range ({len} stored)")]
    PatternIndex { index: usize, len: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}
