//! Per-subject surface loading.
//!
//! Assembles a [`SurfaceData`] from the FreeSurfer file layout of one
//! subject and hemisphere. Geometry is required; every per-vertex field
//! loads independently into a [`Field`], so a missing sulc/thickness/curv
//! or annotation file is recorded with its reason and logged, never
//! aborting the rest of the load.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::io::freesurfer;
use crate::mesh::{compact_parcellation, Field, SurfaceData, SurfaceMesh};

/// File layout of one subject directory.
///
/// The defaults mirror the conventional FreeSurfer tree:
/// `<base>/<subject>/surf/<hemi>.white` and friends, with the annotation
/// under `label/`.
#[derive(Debug, Clone)]
pub struct SurfaceLayout {
    /// Surface geometry file name suffix (after `<hemi>.`).
    pub surface: String,
    /// Annotation file name suffix (after `<hemi>.`).
    pub annotation: String,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            surface: "white".into(),
            annotation: "labels.DKT31.manual.2.annot".into(),
        }
    }
}

impl SurfaceLayout {
    fn surf_path(&self, base: &Path, subject: &str, hemi: &str, kind: &str) -> PathBuf {
        base.join(subject).join("surf").join(format!("{hemi}.{kind}"))
    }

    fn annot_path(&self, base: &Path, subject: &str, hemi: &str) -> PathBuf {
        base.join(subject)
            .join("label")
            .join(format!("{hemi}.{}", self.annotation))
    }
}

/// Load one subject/hemisphere surface with its per-vertex fields.
pub fn load_surface(
    base: &Path,
    subject: &str,
    hemi: &str,
    layout: &SurfaceLayout,
) -> Result<SurfaceData> {
    let geometry_path = layout.surf_path(base, subject, hemi, &layout.surface);
    let (coords, faces) = freesurfer::read_geometry(&geometry_path)?;
    let mesh = SurfaceMesh::new(coords, faces)?;
    info!(
        subject,
        hemi,
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        "loaded surface geometry"
    );

    let n = mesh.num_vertices();
    let depth = load_scalar(&layout.surf_path(base, subject, hemi, "sulc"), "depth", n);
    let thickness = load_scalar(
        &layout.surf_path(base, subject, hemi, "thickness"),
        "thickness",
        n,
    );
    let curvature = load_scalar(&layout.surf_path(base, subject, hemi, "curv"), "curvature", n);

    let parcellation = match freesurfer::read_annot(layout.annot_path(base, subject, hemi), n) {
        Ok(raw) => Field::Present(compact_parcellation(&raw)),
        Err(e) => {
            let reason = e.to_string();
            warn!(subject, hemi, field = "parcellation", %reason, "field not loaded");
            Field::Missing { reason }
        }
    };

    Ok(SurfaceData {
        mesh,
        depth,
        curvature,
        thickness,
        parcellation,
    })
}

/// Load one morph-data field, degrading to [`Field::Missing`] on failure.
fn load_scalar(path: &Path, field: &'static str, num_vertices: usize) -> Field<Vec<f64>> {
    match freesurfer::read_morph_data(path) {
        Ok(values) if values.len() == num_vertices => Field::Present(values),
        Ok(values) => {
            let reason = format!(
                "expected {} values, file has {}",
                num_vertices,
                values.len()
            );
            warn!(field, %reason, "field not loaded");
            Field::Missing { reason }
        }
        Err(e) => {
            let reason = e.to_string();
            warn!(field, %reason, "field not loaded");
            Field::Missing { reason }
        }
    }
}
