//! Weighted adjacency graph construction.
//!
//! Derives the weighted, undirected vertex graph of a triangulated surface:
//! every triangle side becomes a pair of directed edges whose weight is the
//! inverse Euclidean distance between its endpoints. Sides shared between
//! neighbouring triangles are deduplicated so each ordered vertex pair
//! appears exactly once.

use std::collections::BTreeMap;

use crate::algo::sparse::CsrMatrix;
use crate::error::{Result, SpectralError};
use crate::mesh::SurfaceMesh;

/// The weighted vertex graph of a surface.
///
/// `edges[k]` is an ordered `(row, col)` pair and `weights[k]` its inverse
/// edge length. The edge list is sorted lexicographically and deduplicated;
/// both directions of every undirected edge are present, with equal weight.
#[derive(Debug, Clone)]
pub struct WeightedAdjacency {
    /// Ordered vertex pairs, sorted by (row, col).
    pub edges: Vec<[usize; 2]>,
    /// Inverse edge length per ordered pair.
    pub weights: Vec<f64>,
    /// Number of vertices in the underlying mesh.
    pub num_vertices: usize,
}

impl WeightedAdjacency {
    /// Build the weighted adjacency graph of a mesh.
    ///
    /// For each triangle the three sides are visited in both directions in
    /// a fixed order, so duplicate ordered pairs (from triangles sharing a
    /// side) are resolved deterministically: the first occurrence in that
    /// traversal wins. A zero-length side fails with
    /// [`SpectralError::DegenerateEdge`].
    pub fn build(mesh: &SurfaceMesh) -> Result<Self> {
        let coords = mesh.coords();

        // Side order per triangle: (0,1), (0,2), (1,0), (1,2), (2,0), (2,1).
        const SIDES: [(usize, usize); 6] = [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)];

        let mut unique: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for face in mesh.faces() {
            for &(a, b) in &SIDES {
                let (v0, v1) = (face[a], face[b]);
                let length = (coords[v0] - coords[v1]).norm();
                if length == 0.0 {
                    return Err(SpectralError::DegenerateEdge { v0, v1 });
                }
                unique.entry((v0, v1)).or_insert(1.0 / length);
            }
        }

        let mut edges = Vec::with_capacity(unique.len());
        let mut weights = Vec::with_capacity(unique.len());
        for ((row, col), w) in unique {
            edges.push([row, col]);
            weights.push(w);
        }

        Ok(Self {
            edges,
            weights,
            num_vertices: mesh.num_vertices(),
        })
    }

    /// Number of ordered edge entries.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Assemble the graph as a sparse matrix.
    pub fn to_csr(&self) -> CsrMatrix {
        let triplets = self
            .edges
            .iter()
            .zip(&self.weights)
            .map(|(e, &w)| (e[0], e[1], w))
            .collect();
        CsrMatrix::from_triplets(self.num_vertices, self.num_vertices, triplets)
    }

    /// Weight of a specific ordered pair, if present.
    pub fn weight_of(&self, row: usize, col: usize) -> Option<f64> {
        self.edges
            .binary_search(&[row, col])
            .ok()
            .map(|k| self.weights[k])
    }
}
