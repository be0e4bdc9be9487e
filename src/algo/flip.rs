//! Eigenvector sign disambiguation.
//!
//! Laplacian eigenvectors are defined only up to sign. Before registration
//! the subject's sign per dimension is chosen to match the reference by
//! comparing pole geometry: each eigenvector splits the surface into a
//! positive and a negative pole, and the weighted barycenters of those
//! poles in 3-D coordinate space should land near the reference's when the
//! signs agree.
//!
//! Weights are cubed embedding values, which concentrates the barycenter
//! on extremal (pole) vertices and suppresses the near-zero midzone.

use nalgebra::{DMatrix, Vector3};
use tracing::debug;

use crate::algo::embedding::SpectralEmbedding;

/// Decide, per embedding dimension, whether the subject's sign should flip
/// to match the reference.
///
/// Deterministic: identical inputs always produce identical decisions.
/// Dimensions are independent; each is resolved from its own column only.
pub fn flip_decisions(
    reference: &SpectralEmbedding,
    subject: &SpectralEmbedding,
    ne: usize,
) -> Vec<bool> {
    let ne = ne.min(reference.num_dimensions()).min(subject.num_dimensions());

    let ref_centered = centered_coords(reference);
    let sub_centered = centered_coords(subject);

    let mut flips = Vec::with_capacity(ne);
    for i in 0..ne {
        let (ref_pos, ref_neg) = pole_barycenters(&ref_centered, &reference.x, i);
        let (sub_pos, sub_neg) = pole_barycenters(&sub_centered, &subject.x, i);

        let flip = swapped_hypothesis_wins(ref_pos, ref_neg, sub_pos, sub_neg);
        if flip {
            debug!(dimension = i, "flipping eigenvector sign");
        }
        flips.push(flip);
    }
    flips
}

/// Return a new embedding with the flipped columns negated (both
/// eigenvectors and normalized embedding, kept consistent).
pub fn apply_flips(embedding: &SpectralEmbedding, flips: &[bool]) -> SpectralEmbedding {
    let mut flipped = embedding.clone();
    for (i, &flip) in flips.iter().enumerate() {
        if flip {
            flipped.eigenvectors.column_mut(i).neg_mut();
            flipped.x.column_mut(i).neg_mut();
        }
    }
    flipped
}

/// Mean-centered vertex positions.
fn centered_coords(embedding: &SpectralEmbedding) -> Vec<Vector3<f64>> {
    let n = embedding.coords.len();
    let mean = embedding
        .coords
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n as f64;
    embedding.coords.iter().map(|p| p.coords - mean).collect()
}

/// Weighted barycenters of the positive and negative poles of embedding
/// column `i`.
///
/// Pole weights are `x³` with the opposite-sign entries zeroed and the
/// remainder renormalized to sum to one.
fn pole_barycenters(
    centered: &[Vector3<f64>],
    x: &DMatrix<f64>,
    i: usize,
) -> (Vector3<f64>, Vector3<f64>) {
    let n = centered.len();

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    for row in 0..n {
        let w = x[(row, i)].powi(3);
        if w > 0.0 {
            pos_sum += w;
        } else {
            neg_sum += w;
        }
    }

    let mut pos = Vector3::zeros();
    let mut neg = Vector3::zeros();
    for row in 0..n {
        let w = x[(row, i)].powi(3);
        if w > 0.0 {
            pos += centered[row] * (w / pos_sum);
        } else if w < 0.0 {
            neg += centered[row] * (w / neg_sum);
        }
    }
    (pos, neg)
}

/// True when the swapped-pole hypothesis is strictly closer than the
/// matched one.
///
/// The swapped distance measures both reference poles against the
/// subject's NEGATIVE pole: `|r⁺−s⁻|² + |r⁻−s⁻|²`, not the symmetric
/// `|r⁺−s⁻|² + |r⁻−s⁺|²`. Kept exactly as the pipeline has always
/// computed it; the regression test below pins this formula.
fn swapped_hypothesis_wins(
    ref_pos: Vector3<f64>,
    ref_neg: Vector3<f64>,
    sub_pos: Vector3<f64>,
    sub_neg: Vector3<f64>,
) -> bool {
    let matched = (ref_pos - sub_pos).norm_squared() + (ref_neg - sub_neg).norm_squared();
    let swapped = (ref_pos - sub_neg).norm_squared() + (ref_neg - sub_neg).norm_squared();
    swapped < matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::spectrum::SpectrumOptions;
    use crate::mesh::{Field, SurfaceMesh, SurfaceData};
    use nalgebra::Point3;

    fn bumpy_grid_embedding(ne: usize) -> SpectralEmbedding {
        let n = 4;
        let mut coords = Vec::new();
        let mut faces = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                // Irregular height keeps the spectrum simple (no symmetry).
                let z = 0.3 * (i as f64 * 1.3).sin() + 0.2 * (j as f64 * 0.7).cos();
                coords.push(Point3::new(i as f64, j as f64, z));
            }
        }
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        let data = SurfaceData {
            mesh: SurfaceMesh::new(coords, faces).unwrap(),
            depth: Field::Missing { reason: "not loaded".into() },
            curvature: Field::Missing { reason: "not loaded".into() },
            thickness: Field::Missing { reason: "not loaded".into() },
            parcellation: Field::Missing { reason: "not loaded".into() },
        };
        SpectralEmbedding::compute(&data, ne, &SpectrumOptions::default()).unwrap()
    }

    #[test]
    fn test_identical_embeddings_need_no_flips() {
        let emb = bumpy_grid_embedding(3);
        let flips = flip_decisions(&emb, &emb, 3);
        assert_eq!(flips, vec![false, false, false]);
    }

    #[test]
    fn test_negated_column_is_detected() {
        let reference = bumpy_grid_embedding(3);
        let mut subject = reference.clone();
        subject.eigenvectors.column_mut(1).neg_mut();
        subject.x.column_mut(1).neg_mut();

        let flips = flip_decisions(&reference, &subject, 3);
        assert_eq!(flips, vec![false, true, false]);
    }

    #[test]
    fn test_decisions_are_deterministic() {
        let reference = bumpy_grid_embedding(3);
        let mut subject = reference.clone();
        subject.x.column_mut(0).neg_mut();
        subject.eigenvectors.column_mut(0).neg_mut();

        let first = flip_decisions(&reference, &subject, 3);
        let second = flip_decisions(&reference, &subject, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_flips_returns_new_value() {
        let reference = bumpy_grid_embedding(2);
        let flips = vec![true, false];
        let flipped = apply_flips(&reference, &flips);

        for row in 0..reference.num_vertices() {
            assert_eq!(flipped.x[(row, 0)], -reference.x[(row, 0)]);
            assert_eq!(flipped.x[(row, 1)], reference.x[(row, 1)]);
            assert_eq!(
                flipped.eigenvectors[(row, 0)],
                -reference.eigenvectors[(row, 0)]
            );
        }
        // The input embedding is untouched.
        assert_eq!(
            reference.x[(0, 0)],
            reference.intrinsic().unwrap()[(0, 0)]
        );
    }

    #[test]
    fn test_double_resolution_is_stable() {
        // After applying the flips once, a second resolution pass finds
        // nothing left to flip.
        let reference = bumpy_grid_embedding(3);
        let mut subject = reference.clone();
        subject.eigenvectors.column_mut(2).neg_mut();
        subject.x.column_mut(2).neg_mut();

        let flips = flip_decisions(&reference, &subject, 3);
        let resolved = apply_flips(&subject, &flips);
        let again = flip_decisions(&reference, &resolved, 3);
        assert_eq!(again, vec![false, false, false]);
    }

    #[test]
    fn swap_hypothesis_uses_negative_pole_twice() {
        // Regression pin: the swapped comparison is |r⁺−s⁻|² + |r⁻−s⁻|²,
        // so its decision reduces to whether s⁻ is closer to r⁺ than s⁺
        // is. With s⁺ exactly on r⁺ and s⁻ slightly off, a symmetric
        // formula would still flip (s⁻ near r⁺, s⁺ far from r⁻ after the
        // swap) — this one must not.
        let r_pos = Vector3::new(1.0, 0.0, 0.0);
        let r_neg = Vector3::new(-1.0, 0.0, 0.0);
        let s_pos = Vector3::new(1.0, 0.0, 0.0);
        let s_neg = Vector3::new(1.1, 0.0, 0.0);
        assert!(!swapped_hypothesis_wins(r_pos, r_neg, s_pos, s_neg));

        // A fully inverted subject still flips under either formula.
        let s_pos = Vector3::new(-1.0, 0.0, 0.0);
        let s_neg = Vector3::new(1.0, 0.0, 0.0);
        assert!(swapped_hypothesis_wins(r_pos, r_neg, s_pos, s_neg));
    }
}
