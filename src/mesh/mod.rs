//! Core surface mesh data structures.
//!
//! This module provides the face-vertex surface representation used by the
//! spectral pipeline, along with per-vertex scalar fields and parcellation
//! labels.
//!
//! # Overview
//!
//! The primary type is [`SurfaceMesh`], a validated face-vertex triangle
//! mesh: vertex positions plus index triples. The spectral pipeline never
//! needs half-edge adjacency queries; the weighted graph it operates on is
//! derived separately (see [`crate::algo::adjacency`]).
//!
//! Per-vertex measurements (sulcal depth, curvature, cortical thickness)
//! ride alongside the geometry in [`SurfaceData`]. Each is wrapped in a
//! [`Field`] so a missing input file is an explicit, inspectable state
//! rather than an absent attribute.
//!
//! # Construction
//!
//! ```
//! use sulcus::mesh::SurfaceMesh;
//! use nalgebra::Point3;
//!
//! let coords = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = SurfaceMesh::new(coords, faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//! ```

use nalgebra::Point3;

use crate::error::{Result, SpectralError};

/// A validated triangulated surface: vertex positions and face index triples.
///
/// Invariant: every face index is a valid vertex index. The mesh is
/// immutable after construction; the pipeline derives everything else
/// (graph, spectrum, embedding) as separate values.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    coords: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    /// Build a mesh from vertex positions and triangle index triples.
    ///
    /// Fails with [`SpectralError::EmptyMesh`] if there are no faces and
    /// [`SpectralError::InvalidVertexIndex`] if any face references a
    /// vertex out of range.
    pub fn new(coords: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if faces.is_empty() {
            return Err(SpectralError::EmptyMesh);
        }
        let n = coords.len();
        for (fi, face) in faces.iter().enumerate() {
            for &v in face {
                if v >= n {
                    return Err(SpectralError::InvalidVertexIndex { face: fi, vertex: v });
                }
            }
        }
        Ok(Self { coords, faces })
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.coords.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions.
    #[inline]
    pub fn coords(&self) -> &[Point3<f64>] {
        &self.coords
    }

    /// Triangle index triples.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Return a copy of this mesh uniformly scaled about the origin.
    ///
    /// Used by tests to exercise the scale invariance of the random-walk
    /// spectrum; harmless for general use.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            coords: self.coords.iter().map(|p| Point3::from(p.coords * factor)).collect(),
            faces: self.faces.clone(),
        }
    }
}

/// A per-vertex field that may be absent.
///
/// Missing input files are field-level conditions, not pipeline failures:
/// the loader records the reason and the pipeline decides per-operation
/// whether the absence matters.
#[derive(Debug, Clone)]
pub enum Field<T> {
    /// The field was loaded.
    Present(T),
    /// The field could not be loaded.
    Missing {
        /// Why the field is unavailable (e.g. "file not found: ...").
        reason: String,
    },
}

impl<T> Field<T> {
    /// Borrow the value if present.
    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Field::Present(v) => Some(v),
            Field::Missing { .. } => None,
        }
    }

    /// True if the field was loaded.
    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    /// The value, or a [`SpectralError::MissingField`] naming the field.
    pub fn require(&self, field: &'static str) -> Result<&T> {
        match self {
            Field::Present(v) => Ok(v),
            Field::Missing { reason } => Err(SpectralError::MissingField {
                field,
                reason: reason.clone(),
            }),
        }
    }

    /// Map over the contained value, preserving a missing state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Present(v) => Field::Present(f(v)),
            Field::Missing { reason } => Field::Missing { reason },
        }
    }
}

/// A surface mesh together with its per-vertex measurements.
///
/// This is what the loader produces for one subject/hemisphere and what the
/// embedding pipeline consumes.
#[derive(Debug, Clone)]
pub struct SurfaceData {
    /// The triangulated surface.
    pub mesh: SurfaceMesh,
    /// Sulcal depth per vertex.
    pub depth: Field<Vec<f64>>,
    /// Curvature per vertex.
    pub curvature: Field<Vec<f64>>,
    /// Cortical thickness per vertex.
    pub thickness: Field<Vec<f64>>,
    /// Dense zero-based parcellation label per vertex.
    pub parcellation: Field<Vec<u32>>,
}

/// Rebase raw parcellation labels onto a dense `0..K` index range.
///
/// Negative or unknown labels must already be coerced to 0 by the caller.
/// The observed label set is sorted and each label replaced by its rank, so
/// identical inputs always produce identical output.
pub fn rebase_labels(labels: &[i64]) -> Vec<u32> {
    let mut observed: Vec<i64> = labels.to_vec();
    observed.sort_unstable();
    observed.dedup();

    labels
        .iter()
        .map(|l| observed.binary_search(l).expect("label in observed set") as u32)
        .collect()
}

/// Coerce negative raw labels to 0, then rebase to a dense range.
pub fn compact_parcellation(raw: &[i64]) -> Vec<u32> {
    let coerced: Vec<i64> = raw.iter().map(|&l| if l < 0 { 0 } else { l }).collect();
    rebase_labels(&coerced)
}
