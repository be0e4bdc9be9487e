//! Spectral embedding of a surface mesh.
//!
//! Chains the per-mesh pipeline: weighted adjacency → random-walk Laplacian
//! spectrum → embedding normalization. Each retained eigenvector is divided
//! by the square root of its eigenvalue, which makes Euclidean distances in
//! the embedding approximate diffusion distances on the surface — raw
//! eigenvectors would weight all frequencies equally.

use nalgebra::{DMatrix, DVector, Point3};
use tracing::debug;

use crate::algo::adjacency::WeightedAdjacency;
use crate::algo::spectrum::{eigen_spectrum, Spectrum, SpectrumOptions};
use crate::error::{Result, SpectralError};
use crate::mesh::SurfaceData;

/// The spectral embedding of one surface, with everything the alignment
/// engine and the exporter need.
///
/// Computed once per mesh and treated as an immutable value afterwards:
/// sign resolution and alignment produce new values instead of mutating
/// this one, so a reference embedding can be shared across any number of
/// subject alignments.
#[derive(Debug, Clone)]
pub struct SpectralEmbedding {
    /// Vertex positions of the source mesh (used by the sign resolver).
    pub coords: Vec<Point3<f64>>,
    /// Sulcal depth per vertex, when available.
    pub depth: Option<Vec<f64>>,
    /// The weighted graph the spectrum was computed from.
    pub adjacency: WeightedAdjacency,
    /// Eigenvalues, ascending, null mode removed.
    pub eigenvalues: DVector<f64>,
    /// Eigenvectors, one column per eigenvalue.
    pub eigenvectors: DMatrix<f64>,
    /// Normalized embedding: column i is `eigenvectors[:,i] / sqrt(eigenvalues[i])`.
    pub x: DMatrix<f64>,
}

impl SpectralEmbedding {
    /// Compute the `ne`-dimensional spectral embedding of a surface.
    pub fn compute(data: &SurfaceData, ne: usize, options: &SpectrumOptions) -> Result<Self> {
        let adjacency = WeightedAdjacency::build(&data.mesh)?;
        debug!(
            vertices = adjacency.num_vertices,
            edges = adjacency.num_edges(),
            "built weighted adjacency"
        );

        let Spectrum {
            eigenvalues,
            eigenvectors,
        } = eigen_spectrum(&adjacency, ne, options)?;
        debug!(ne, "eigendecomposition converged");

        let x = normalize_embedding(&eigenvalues, &eigenvectors)?;

        Ok(Self {
            coords: data.mesh.coords().to_vec(),
            depth: data.depth.as_ref().cloned(),
            adjacency,
            eigenvalues,
            eigenvectors,
            x,
        })
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.coords.len()
    }

    /// Number of embedding dimensions.
    #[inline]
    pub fn num_dimensions(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Recompute the intrinsic (unaligned) embedding from the current
    /// eigenvectors and eigenvalues.
    ///
    /// Equal to `x` for a freshly computed embedding; after sign
    /// resolution it reflects the flipped eigenvectors.
    pub fn intrinsic(&self) -> Result<DMatrix<f64>> {
        normalize_embedding(&self.eigenvalues, &self.eigenvectors)
    }
}

/// Scale each eigenvector by the inverse square root of its eigenvalue.
///
/// Fails with [`SpectralError::InvalidSpectrum`] on a non-positive
/// eigenvalue, for which the scaling is undefined.
pub fn normalize_embedding(
    eigenvalues: &DVector<f64>,
    eigenvectors: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    assert_eq!(
        eigenvalues.len(),
        eigenvectors.ncols(),
        "one eigenvalue per eigenvector column"
    );

    let mut x = eigenvectors.clone();
    for i in 0..eigenvalues.len() {
        let lambda = eigenvalues[i];
        if lambda <= 0.0 {
            return Err(SpectralError::InvalidSpectrum {
                index: i,
                value: lambda,
            });
        }
        let scale = 1.0 / lambda.sqrt();
        x.column_mut(i).scale_mut(scale);
    }
    Ok(x)
}
