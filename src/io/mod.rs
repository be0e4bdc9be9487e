//! Surface file I/O and persisted output.
//!
//! This module is the pipeline's boundary with the filesystem:
//!
//! - [`freesurfer`]: readers for the FreeSurfer binary formats
//! - [`loader`]: per-subject surface loading with field-level degradation
//! - [`record`]: the spectral/mesh output records and their persistence
//!
//! Field-level load problems are reported as [`crate::mesh::Field::Missing`]
//! values and logged at this boundary; only a missing or malformed geometry
//! file aborts a load.

pub mod freesurfer;
pub mod loader;
pub mod record;

pub use loader::{load_surface, SurfaceLayout};
pub use record::{save_records, MeshRecord, SpectralRecord};
