//! Error types for sulcus.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SpectralError`].
pub type Result<T> = std::result::Result<T, SpectralError>;

/// Errors that can occur during the spectral alignment pipeline.
#[derive(Error, Debug)]
pub enum SpectralError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// An edge between two coincident vertices has zero length, so its
    /// inverse-length weight is undefined.
    #[error("degenerate zero-length edge between vertices {v0} and {v1}")]
    DegenerateEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A vertex has zero degree in the weighted graph, so the random-walk
    /// normalization is undefined.
    #[error("vertex {vertex} is isolated (zero degree)")]
    IsolatedVertex {
        /// The isolated vertex index.
        vertex: usize,
    },

    /// The eigensolver failed to converge within its iteration budget.
    ///
    /// An incomplete spectrum invalidates everything downstream, so this is
    /// fatal for the mesh being processed.
    #[error("eigensolver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// An eigenvalue is not strictly positive where inverse-sqrt scaling
    /// is required.
    #[error("invalid spectrum: eigenvalue {index} = {value} is not strictly positive")]
    InvalidSpectrum {
        /// Index of the offending eigenvalue (after null-mode removal).
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// A per-vertex field required by the requested configuration is absent.
    #[error("required field `{field}` is missing: {reason}")]
    MissingField {
        /// Name of the field (e.g. "depth").
        field: &'static str,
        /// Why the field is unavailable.
        reason: String,
    },

    /// Two point sets or matrices disagree on a dimension they must share.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The expected dimension.
        expected: usize,
        /// The dimension actually observed.
        actual: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a surface file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error writing an output record.
    #[error("failed to save {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl SpectralError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        SpectralError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
