//! Spectral pipeline algorithms.
//!
//! This module contains the numerical core of the pipeline:
//!
//! - **Adjacency**: inverse-edge-length weighted mesh graph
//! - **Spectrum**: low-rank random-walk Laplacian eigendecomposition
//! - **Embedding**: inverse-sqrt eigenvalue normalization
//! - **Flip**: eigenvector sign disambiguation against a reference
//! - **Register**: similarity-transform ICP and the alignment engine
//!
//! The stages compose left to right: a [`crate::mesh::SurfaceData`] becomes
//! a [`embedding::SpectralEmbedding`], and two embeddings become a
//! [`register::Alignment`].

pub mod adjacency;
pub mod embedding;
pub mod flip;
pub mod register;
pub mod sparse;
pub mod spectrum;
