//! Persisted output records.
//!
//! Two records are written per processed mesh: a spectral record (the
//! eigendecomposition plus aligned and intrinsic embeddings) and a mesh
//! record (geometry, graph and per-vertex fields). All floating values are
//! stored in single precision regardless of the internal compute
//! precision, matching the pipeline's historical output contract.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::algo::embedding::SpectralEmbedding;
use crate::algo::register::Alignment;
use crate::error::{Result, SpectralError};
use crate::mesh::{Field, SurfaceData};

/// A dense column-major f32 matrix, the persisted form of embedding and
/// eigenvector tensors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix32 {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Column-major values.
    pub data: Vec<f32>,
}

impl Matrix32 {
    /// Down-cast a dense f64 matrix.
    pub fn from_matrix(m: &DMatrix<f64>) -> Self {
        Self {
            rows: m.nrows(),
            cols: m.ncols(),
            data: m.iter().map(|&v| v as f32).collect(),
        }
    }
}

/// The spectral output of one mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralRecord {
    /// Eigenvalues, ascending.
    pub eig_val: Vec<f32>,
    /// Eigenvectors (post sign resolution for an aligned subject).
    pub eig_vec: Matrix32,
    /// Aligned embedding.
    pub ali_spe: Matrix32,
    /// Intrinsic (unaligned) embedding.
    pub uni_spe: Matrix32,
}

impl SpectralRecord {
    /// Record for a mesh that was not aligned (reference, or the
    /// self-alignment short-circuit): aligned and intrinsic embeddings
    /// are identical.
    pub fn from_embedding(embedding: &SpectralEmbedding) -> Self {
        let x = Matrix32::from_matrix(&embedding.x);
        Self {
            eig_val: embedding.eigenvalues.iter().map(|&v| v as f32).collect(),
            eig_vec: Matrix32::from_matrix(&embedding.eigenvectors),
            ali_spe: x.clone(),
            uni_spe: x,
        }
    }

    /// Record for an aligned subject.
    ///
    /// Eigenvalues come from the subject's embedding (sign flips do not
    /// change them); eigenvectors and both embeddings come from the
    /// alignment result.
    pub fn from_alignment(subject: &SpectralEmbedding, alignment: &Alignment) -> Self {
        Self {
            eig_val: subject.eigenvalues.iter().map(|&v| v as f32).collect(),
            eig_vec: Matrix32::from_matrix(&alignment.eigenvectors),
            ali_spe: Matrix32::from_matrix(&alignment.aligned),
            uni_spe: Matrix32::from_matrix(&alignment.intrinsic),
        }
    }
}

/// The geometry-side output of one mesh.
///
/// Missing fields persist as empty vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshRecord {
    /// Sulcal depth per vertex, or empty.
    pub depth: Vec<f32>,
    /// Curvature per vertex, or empty.
    pub curv: Vec<f32>,
    /// Cortical thickness per vertex, or empty.
    pub thick: Vec<f32>,
    /// Dense parcellation label per vertex, or empty.
    pub parc: Vec<u32>,
    /// Unique ordered graph edges.
    pub edge_index: Vec<[u32; 2]>,
    /// Inverse-edge-length weight per edge.
    pub edge_weight: Vec<f32>,
    /// Vertex positions.
    pub coords: Vec<[f32; 3]>,
    /// Triangle index triples.
    pub faces: Vec<[u32; 3]>,
}

impl MeshRecord {
    /// Assemble the mesh record from the loaded surface and its computed
    /// embedding (which carries the adjacency graph).
    pub fn new(data: &SurfaceData, embedding: &SpectralEmbedding) -> Self {
        Self {
            depth: scalar_field(&data.depth),
            curv: scalar_field(&data.curvature),
            thick: scalar_field(&data.thickness),
            parc: match &data.parcellation {
                Field::Present(p) => p.clone(),
                Field::Missing { .. } => Vec::new(),
            },
            edge_index: embedding
                .adjacency
                .edges
                .iter()
                .map(|e| [e[0] as u32, e[1] as u32])
                .collect(),
            edge_weight: embedding.adjacency.weights.iter().map(|&w| w as f32).collect(),
            coords: data
                .mesh
                .coords()
                .iter()
                .map(|p| [p.x as f32, p.y as f32, p.z as f32])
                .collect(),
            faces: data
                .mesh
                .faces()
                .iter()
                .map(|f| [f[0] as u32, f[1] as u32, f[2] as u32])
                .collect(),
        }
    }
}

fn scalar_field(field: &Field<Vec<f64>>) -> Vec<f32> {
    match field {
        Field::Present(v) => v.iter().map(|&x| x as f32).collect(),
        Field::Missing { .. } => Vec::new(),
    }
}

/// Write both records for one mesh under the output directory:
/// `<out>/spectral_data/<name>.json` and `<out>/mesh_data/<name>.json`.
pub fn save_records(
    out_dir: &Path,
    name: &str,
    spectral: &SpectralRecord,
    mesh: &MeshRecord,
) -> Result<()> {
    write_json(&record_path(out_dir, "spectral_data", name)?, spectral)?;
    write_json(&record_path(out_dir, "mesh_data", name)?, mesh)?;
    info!(name, out = %out_dir.display(), "saved spectral and mesh records");
    Ok(())
}

fn record_path(out_dir: &Path, kind: &str, name: &str) -> Result<PathBuf> {
    let dir = out_dir.join(kind);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(format!("{name}.json")))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), value).map_err(|e| SpectralError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
