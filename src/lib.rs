//! # Sulcus
//!
//! Spectral embedding and alignment of cortical surface meshes.
//!
//! Sulcus maps two triangulated brain surfaces (a subject and a reference)
//! into a common spectral coordinate frame, so their geometry can be
//! compared vertex-to-vertex without volumetric registration. Each mesh
//! becomes a weighted graph (inverse edge lengths), the low end of its
//! random-walk Laplacian spectrum becomes an intrinsic embedding, and the
//! subject's embedding is carried into the reference's frame by sign
//! resolution plus ICP similarity registration.
//!
//! ## Pipeline
//!
//! ```text
//! load_surface ─► SpectralEmbedding::compute ─┐
//! load_surface ─► SpectralEmbedding::compute ─┴─► align ─► records
//! ```
//!
//! ## Quick start
//!
//! ```
//! use sulcus::prelude::*;
//! use nalgebra::Point3;
//!
//! // A small synthetic surface (vertex grid with irregular height).
//! let mut coords = Vec::new();
//! let mut faces = Vec::new();
//! for j in 0..=4usize {
//!     for i in 0..=4usize {
//!         let z = 0.3 * (i as f64 * 1.3).sin() + 0.2 * (j as f64 * 0.7).cos();
//!         coords.push(Point3::new(i as f64, j as f64, z));
//!     }
//! }
//! for j in 0..4usize {
//!     for i in 0..4usize {
//!         let v00 = j * 5 + i;
//!         faces.push([v00, v00 + 1, v00 + 6]);
//!         faces.push([v00, v00 + 6, v00 + 5]);
//!     }
//! }
//! let mesh = SurfaceMesh::new(coords, faces).unwrap();
//! let data = SurfaceData {
//!     mesh,
//!     depth: Field::Missing { reason: "synthetic".into() },
//!     curvature: Field::Missing { reason: "synthetic".into() },
//!     thickness: Field::Missing { reason: "synthetic".into() },
//!     parcellation: Field::Missing { reason: "synthetic".into() },
//! };
//!
//! // Embed and self-align.
//! let embedding = SpectralEmbedding::compute(&data, 4, &SpectrumOptions::default()).unwrap();
//! let options = AlignOptions::default()
//!     .with_krot(4)
//!     .complete()
//!     .with_sulcal_weight(0.0);
//! let alignment = align(&embedding, &embedding, &options).unwrap();
//! assert!(alignment.transform.is_near_identity(1e-6));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use sulcus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::adjacency::WeightedAdjacency;
    pub use crate::algo::embedding::SpectralEmbedding;
    pub use crate::algo::flip::{apply_flips, flip_decisions};
    pub use crate::algo::register::{
        align, AlignOptions, Alignment, IcpOptions, Matching, SimilarityTransform,
    };
    pub use crate::algo::spectrum::{eigen_spectrum, Spectrum, SpectrumOptions};
    pub use crate::error::{Result, SpectralError};
    pub use crate::mesh::{Field, SurfaceData, SurfaceMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
