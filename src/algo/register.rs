//! Similarity registration of embedding point sets.
//!
//! Maps the subject's spectral embedding into the reference's spectral
//! frame: sign resolution, optional two-step coarse initialization, then
//! point-to-point ICP estimating a uniform-scale similarity transform.
//! Matching runs either on the complete point sets or on independent
//! random subsamples; the fitted transform is global, so in sampled mode
//! it generalizes to every vertex.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::algo::embedding::SpectralEmbedding;
use crate::algo::flip::{apply_flips, flip_decisions};
use crate::error::{Result, SpectralError};

/// A uniform-scale similarity transform in d dimensions.
///
/// Applied to row-vector points as `y = scale * x * rotation + translation`.
#[derive(Debug, Clone)]
pub struct SimilarityTransform {
    /// Uniform scale factor.
    pub scale: f64,
    /// Rotation matrix (d×d, orthogonal, det +1), applied on the right.
    pub rotation: DMatrix<f64>,
    /// Translation, added to every transformed row.
    pub translation: DVector<f64>,
}

impl SimilarityTransform {
    /// The identity transform in d dimensions.
    pub fn identity(d: usize) -> Self {
        Self {
            scale: 1.0,
            rotation: DMatrix::identity(d, d),
            translation: DVector::zeros(d),
        }
    }

    /// Dimensionality of the transform.
    #[inline]
    pub fn dim(&self) -> usize {
        self.translation.len()
    }

    /// Apply to a point set (one point per row).
    pub fn apply(&self, points: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(
            points.ncols(),
            self.dim(),
            "point set width must match transform dimension"
        );
        let mut y = (points * &self.rotation) * self.scale;
        let t = self.translation.transpose();
        for i in 0..y.nrows() {
            let mut row = y.row_mut(i);
            row += &t;
        }
        y
    }

    /// True when the transform is within `tol` of the identity in scale,
    /// rotation entries and translation norm.
    pub fn is_near_identity(&self, tol: f64) -> bool {
        let d = self.dim();
        (self.scale - 1.0).abs() <= tol
            && (&self.rotation - DMatrix::<f64>::identity(d, d)).norm() <= tol
            && self.translation.norm() <= tol
    }
}

/// Least-squares similarity transform between paired point sets
/// (Umeyama): `scale * source * rotation + translation ≈ target`, rows
/// corresponding.
///
/// The rotation comes from the SVD of the cross-covariance with the usual
/// determinant fix so reflections are never produced.
pub fn fit_similarity(source: &DMatrix<f64>, target: &DMatrix<f64>) -> SimilarityTransform {
    let n = source.nrows();
    let d = source.ncols();
    assert_eq!(target.nrows(), n, "paired point sets must have equal length");
    assert_eq!(target.ncols(), d, "paired point sets must have equal width");
    if n == 0 {
        return SimilarityTransform::identity(d);
    }

    let src_mean = column_means(source);
    let tgt_mean = column_means(target);

    let mut src_centered = source.clone();
    let mut tgt_centered = target.clone();
    let src_mean_t = src_mean.transpose();
    let tgt_mean_t = tgt_mean.transpose();
    for i in 0..n {
        let mut src_row = src_centered.row_mut(i);
        src_row -= &src_mean_t;
        let mut tgt_row = tgt_centered.row_mut(i);
        tgt_row -= &tgt_mean_t;
    }

    // Cross-covariance (unnormalized; the scale formula below matches).
    let cov = src_centered.transpose() * &tgt_centered;
    let svd = cov.svd(true, true);
    let u = svd.u.expect("u requested");
    let v_t = svd.v_t.expect("v_t requested");

    let mut u_fixed = u.clone();
    let mut trace = svd.singular_values.sum();
    if (&u * &v_t).determinant() < 0.0 {
        // Reflection case: negate the least-significant direction.
        let last = d - 1;
        for r in 0..d {
            u_fixed[(r, last)] = -u_fixed[(r, last)];
        }
        trace -= 2.0 * svd.singular_values[last];
    }
    let rotation = u_fixed * v_t;

    let src_variance = src_centered.norm_squared();
    let scale = if src_variance > 1e-12 {
        trace / src_variance
    } else {
        1.0
    };

    // y = s * xᵀ R + t  per row  =>  t = ȳ − s Rᵀ x̄.
    let translation = &tgt_mean - scale * (rotation.transpose() * &src_mean);

    SimilarityTransform {
        scale,
        rotation,
        translation,
    }
}

fn column_means(m: &DMatrix<f64>) -> DVector<f64> {
    let n = m.nrows() as f64;
    DVector::from_iterator(m.ncols(), m.column_iter().map(|c| c.sum() / n))
}

/// Options for the ICP loop.
#[derive(Debug, Clone)]
pub struct IcpOptions {
    /// Maximum iterations before the loop stops regardless of convergence.
    pub max_iterations: usize,

    /// Relative RMSE-change threshold for convergence.
    pub tolerance: f64,

    /// Whether the nearest-neighbour search runs on the rayon pool.
    pub parallel: bool,
}

impl Default for IcpOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            parallel: true,
        }
    }
}

impl IcpOptions {
    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Single-threaded nearest-neighbour search.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Result of an ICP run.
#[derive(Debug, Clone)]
pub struct IcpResult {
    /// The cumulative similarity transform from source onto target.
    pub transform: SimilarityTransform,
    /// The transformed source point set.
    pub aligned: DMatrix<f64>,
    /// Root-mean-square nearest-neighbour distance at the final iterate.
    pub rmse: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the RMSE change dropped below tolerance before the cap.
    ///
    /// `false` is a registration-quality flag, not a failure: the best
    /// transform found is still returned.
    pub converged: bool,
}

/// Point-to-point ICP with a similarity (uniform scale) transform model.
///
/// Each iteration matches every transformed source point to its nearest
/// target point and re-fits the cumulative transform from the ORIGINAL
/// source to the matched targets, so there is no composition drift.
pub fn icp(source: &DMatrix<f64>, target: &DMatrix<f64>, options: &IcpOptions) -> IcpResult {
    let d = source.ncols();
    assert_eq!(
        target.ncols(),
        d,
        "source and target point sets must share a dimension"
    );

    let mut transform = SimilarityTransform::identity(d);
    let mut prev_rmse = f64::INFINITY;
    let mut rmse = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..options.max_iterations {
        iterations = iter + 1;

        let aligned = transform.apply(source);
        let (matched, err) = nearest_neighbors(&aligned, target, options.parallel);
        rmse = err;

        if prev_rmse.is_finite()
            && (prev_rmse - rmse).abs() <= options.tolerance * prev_rmse.abs().max(1e-12)
        {
            converged = true;
            break;
        }
        prev_rmse = rmse;

        transform = fit_similarity(source, &matched);
    }

    if !converged && options.max_iterations > 0 {
        warn!(
            iterations,
            rmse, "registration reached its iteration cap without meeting tolerance"
        );
    }

    let aligned = transform.apply(source);
    IcpResult {
        transform,
        aligned,
        rmse,
        iterations,
        converged,
    }
}

/// For each row of `points`, the nearest row of `target`, plus the RMS
/// distance. Brute force; rayon-parallel over query points when enabled.
fn nearest_neighbors(
    points: &DMatrix<f64>,
    target: &DMatrix<f64>,
    parallel: bool,
) -> (DMatrix<f64>, f64) {
    let n = points.nrows();
    let d = points.ncols();

    let find = |i: usize| -> (usize, f64) {
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for j in 0..target.nrows() {
            let mut dist = 0.0;
            for c in 0..d {
                let diff = points[(i, c)] - target[(j, c)];
                dist += diff * diff;
            }
            if dist < best_dist {
                best_dist = dist;
                best = j;
            }
        }
        (best, best_dist)
    };

    let matches: Vec<(usize, f64)> = if parallel {
        (0..n).into_par_iter().map(find).collect()
    } else {
        (0..n).map(find).collect()
    };

    let mut matched = DMatrix::zeros(n, d);
    let mut total = 0.0;
    for (i, &(j, dist)) in matches.iter().enumerate() {
        matched.row_mut(i).copy_from(&target.row(j));
        total += dist;
    }
    let rmse = (total / n.max(1) as f64).sqrt();
    (matched, rmse)
}

/// How registration correspondences are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    /// Every vertex of both meshes participates.
    Complete,
    /// Independent random subsamples of at most `samples` vertices per
    /// mesh (no vertex correspondence is assumed between the two draws).
    Partial {
        /// Sample count; clamped to both vertex counts.
        samples: usize,
    },
}

/// Options for the alignment engine.
#[derive(Debug, Clone)]
pub struct AlignOptions {
    /// Number of embedding dimensions to align.
    pub krot: usize,

    /// Complete or sampled matching.
    pub matching: Matching,

    /// Weight of the sulcal-depth channel prepended to the point sets;
    /// zero disables the channel.
    pub sulcal_weight: f64,

    /// Coarse-align on the low-frequency dimensions first. Those
    /// eigenvectors are the least sign/ordering ambiguous, so they give a
    /// stable initialization.
    pub two_step: bool,

    /// Seed for partial-mode subsampling.
    pub seed: u64,

    /// ICP parameters for the main registration.
    pub icp: IcpOptions,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            krot: 5,
            matching: Matching::Partial { samples: 10_000 },
            sulcal_weight: 1.0,
            two_step: false,
            seed: 0,
            icp: IcpOptions::default(),
        }
    }
}

impl AlignOptions {
    /// Align `krot` embedding dimensions.
    pub fn with_krot(mut self, krot: usize) -> Self {
        self.krot = krot;
        self
    }

    /// Use complete matching (all vertices).
    pub fn complete(mut self) -> Self {
        self.matching = Matching::Complete;
        self
    }

    /// Use partial matching with the given sample budget.
    pub fn partial(mut self, samples: usize) -> Self {
        self.matching = Matching::Partial { samples };
        self
    }

    /// Set the sulcal-depth channel weight (zero disables).
    pub fn with_sulcal_weight(mut self, weight: f64) -> Self {
        self.sulcal_weight = weight;
        self
    }

    /// Enable two-step initialization.
    pub fn with_two_step(mut self) -> Self {
        self.two_step = true;
        self
    }

    /// Set the subsampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of aligning a subject embedding to a reference.
///
/// A pure value: the subject embedding passed to [`align`] is untouched,
/// and the caller holds both it and this result (before/after).
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Per-dimension sign flips that were applied to the subject.
    pub flips: Vec<bool>,
    /// Subject eigenvectors with the flips applied.
    pub eigenvectors: DMatrix<f64>,
    /// Subject embedding with columns `0..krot` replaced by the aligned
    /// coordinates (sulcal channel already stripped).
    pub aligned: DMatrix<f64>,
    /// Intrinsic (unaligned) embedding recomputed from the flipped
    /// eigenvectors.
    pub intrinsic: DMatrix<f64>,
    /// The fitted similarity transform in point-set space.
    pub transform: SimilarityTransform,
    /// Final nearest-neighbour RMSE of the registration.
    pub rmse: f64,
    /// ICP iterations performed.
    pub iterations: usize,
    /// Registration-quality flag from ICP.
    pub converged: bool,
}

/// Align the subject's spectral embedding to the reference's frame.
///
/// One parametrized routine covers both matching modes: the transform is
/// always fitted on the selected rows and then applied to the full
/// subject point set, which is the identity operation in complete mode.
pub fn align(
    reference: &SpectralEmbedding,
    subject: &SpectralEmbedding,
    options: &AlignOptions,
) -> Result<Alignment> {
    let krot = options.krot;
    if krot == 0 || krot > reference.num_dimensions() || krot > subject.num_dimensions() {
        return Err(SpectralError::invalid_param(
            "krot",
            krot,
            "must be between 1 and the embedding dimension of both meshes",
        ));
    }

    // Step 1: resolve eigenvector signs against the reference.
    let flips = flip_decisions(reference, subject, krot);
    let subject = apply_flips(subject, &flips);
    info!(
        flipped = flips.iter().filter(|&&f| f).count(),
        krot, "resolved eigenvector signs"
    );

    // Step 2: build the point sets (optionally depth-prefixed).
    let ref_points = build_point_set(reference, krot, options.sulcal_weight)?;
    let sub_points = build_point_set(&subject, krot, options.sulcal_weight)?;

    // Step 3: select the matching rows.
    let (mut e_sub, e_ref) = match options.matching {
        Matching::Complete => (sub_points.clone(), ref_points.clone()),
        Matching::Partial { samples } => {
            let n = samples
                .min(ref_points.nrows())
                .min(sub_points.nrows());
            let mut rng = StdRng::seed_from_u64(options.seed);
            let ref_idx = sample_indices(ref_points.nrows(), n, &mut rng);
            let sub_idx = sample_indices(sub_points.nrows(), n, &mut rng);
            debug!(samples = n, "sampled matching subsets");
            (
                select_rows(&sub_points, &sub_idx),
                select_rows(&ref_points, &ref_idx),
            )
        }
    };

    // Step 4: optional coarse initialization on the low-frequency slice.
    // The slice is point-set columns 1..4 whether or not a depth channel
    // is present.
    if options.two_step {
        let lo = 1usize;
        let hi = 4.min(e_sub.ncols());
        if hi > lo {
            let init = icp(
                &e_sub.columns(lo, hi - lo).into_owned(),
                &e_ref.columns(lo, hi - lo).into_owned(),
                &options.icp,
            );
            debug!(rmse = init.rmse, "two-step initialization");
            e_sub.columns_mut(lo, hi - lo).copy_from(&init.aligned);
        }
    }

    // Step 5: full registration.
    let best = icp(&e_sub, &e_ref, &options.icp);
    info!(
        rmse = best.rmse,
        iterations = best.iterations,
        converged = best.converged,
        "registration finished"
    );

    // Step 6: the similarity transform is global, so it generalizes from
    // the sampled rows to the full point set.
    let aligned_full = best.transform.apply(&sub_points);

    let depth_cols = if options.sulcal_weight > 0.0 { 1 } else { 0 };
    let mut aligned = subject.x.clone();
    aligned
        .columns_mut(0, krot)
        .copy_from(&aligned_full.columns(depth_cols, krot));

    let intrinsic = subject.intrinsic()?;

    Ok(Alignment {
        flips,
        eigenvectors: subject.eigenvectors,
        aligned,
        intrinsic,
        transform: best.transform,
        rmse: best.rmse,
        iterations: best.iterations,
        converged: best.converged,
    })
}

/// Build a registration point set: embedding columns `0..krot`, prefixed
/// by the weighted sulcal-depth channel when enabled.
fn build_point_set(
    embedding: &SpectralEmbedding,
    krot: usize,
    sulcal_weight: f64,
) -> Result<DMatrix<f64>> {
    let n = embedding.num_vertices();
    let with_depth = sulcal_weight > 0.0;
    let ncols = krot + usize::from(with_depth);

    let mut points = DMatrix::zeros(n, ncols);
    if with_depth {
        let depth = match &embedding.depth {
            Some(d) => d,
            None => {
                return Err(SpectralError::MissingField {
                    field: "depth",
                    reason: "sulcal weighting requires the depth field on both meshes".into(),
                })
            }
        };
        if depth.len() != n {
            return Err(SpectralError::DimensionMismatch {
                expected: n,
                actual: depth.len(),
            });
        }
        for r in 0..n {
            points[(r, 0)] = sulcal_weight * depth[r];
        }
    }

    let offset = usize::from(with_depth);
    for c in 0..krot {
        for r in 0..n {
            points[(r, offset + c)] = embedding.x[(r, c)];
        }
    }
    Ok(points)
}

/// `count` indices drawn from `0..n` by random permutation, without
/// replacement.
fn sample_indices(n: usize, count: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(rng);
    idx.truncate(count);
    idx
}

fn select_rows(m: &DMatrix<f64>, idx: &[usize]) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(idx.len(), m.ncols());
    for (row, &i) in idx.iter().enumerate() {
        out.row_mut(row).copy_from(&m.row(i));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::spectrum::SpectrumOptions;
    use crate::mesh::{Field, SurfaceData, SurfaceMesh};
    use nalgebra::{Point3, Rotation3, Vector3};
    use rand::Rng;

    fn bumpy_grid_data(n: usize) -> SurfaceData {
        let mut coords = Vec::new();
        let mut faces = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
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
        let mesh = SurfaceMesh::new(coords, faces).unwrap();
        let depth: Vec<f64> = (0..mesh.num_vertices())
            .map(|i| 0.5 * (i as f64 * 0.37).sin())
            .collect();
        SurfaceData {
            mesh,
            depth: Field::Present(depth),
            curvature: Field::Missing { reason: "not loaded".into() },
            thickness: Field::Missing { reason: "not loaded".into() },
            parcellation: Field::Missing { reason: "not loaded".into() },
        }
    }

    fn grid_embedding(ne: usize) -> SpectralEmbedding {
        SpectralEmbedding::compute(&bumpy_grid_data(4), ne, &SpectrumOptions::default()).unwrap()
    }

    fn random_cloud(n: usize, d: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        DMatrix::from_fn(n, d, |_, _| rng.gen::<f64>() * 10.0)
    }

    #[test]
    fn test_fit_similarity_recovers_known_transform() {
        let source = random_cloud(40, 3, 1);

        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.4);
        let mut r = DMatrix::zeros(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                // Row-vector convention: x * R == (Rᵀ xᵀ)ᵀ.
                r[(i, j)] = rotation.matrix()[(j, i)];
            }
        }
        let expected = SimilarityTransform {
            scale: 1.7,
            rotation: r,
            translation: DVector::from_vec(vec![0.5, -2.0, 1.0]),
        };
        let target = expected.apply(&source);

        let fitted = fit_similarity(&source, &target);
        assert!((fitted.scale - expected.scale).abs() < 1e-8);
        assert!((&fitted.rotation - &expected.rotation).norm() < 1e-8);
        assert!((&fitted.translation - &expected.translation).norm() < 1e-8);
    }

    #[test]
    fn test_fit_similarity_identity_on_identical_sets() {
        let source = random_cloud(25, 4, 2);
        let fitted = fit_similarity(&source, &source);
        assert!(fitted.is_near_identity(1e-8));
    }

    #[test]
    fn test_icp_recovers_small_translation() {
        // Grid spacing 1, translation below half the nearest-neighbour
        // distance, so initial correspondences are already exact.
        let mut source = DMatrix::zeros(36, 3);
        for k in 0..36 {
            let (i, j) = (k / 6, k % 6);
            source[(k, 0)] = i as f64;
            source[(k, 1)] = j as f64;
            source[(k, 2)] = ((i * 7 + j * 3) % 5) as f64 * 0.1;
        }
        let shift = DVector::from_vec(vec![0.2, -0.1, 0.15]);
        let expected = SimilarityTransform {
            scale: 1.0,
            rotation: DMatrix::identity(3, 3),
            translation: shift.clone(),
        };
        let target = expected.apply(&source);

        let result = icp(&source, &target, &IcpOptions::default().sequential());
        assert!(result.converged);
        assert!(result.rmse < 1e-9, "rmse = {}", result.rmse);
        assert!((&result.transform.translation - &shift).norm() < 1e-8);
        assert!((result.transform.scale - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_icp_self_is_identity() {
        let cloud = random_cloud(30, 5, 3);
        let result = icp(&cloud, &cloud, &IcpOptions::default());
        assert!(result.converged);
        assert!(result.transform.is_near_identity(1e-9));
        assert!(result.rmse < 1e-12);
    }

    #[test]
    fn test_align_self_complete_near_identity() {
        let emb = grid_embedding(5);
        let options = AlignOptions::default()
            .with_krot(5)
            .complete()
            .with_sulcal_weight(0.0);

        let alignment = align(&emb, &emb, &options).unwrap();
        assert!(alignment.converged);
        assert!(alignment.transform.is_near_identity(1e-6));
        assert!((&alignment.aligned - &emb.x).norm() < 1e-6);
        assert_eq!(alignment.flips, vec![false; 5]);
    }

    #[test]
    fn test_align_flips_negated_subject_column() {
        let reference = grid_embedding(4);
        let mut subject = reference.clone();
        subject.eigenvectors.column_mut(0).neg_mut();
        subject.x.column_mut(0).neg_mut();

        let options = AlignOptions::default()
            .with_krot(4)
            .complete()
            .with_sulcal_weight(0.0);
        let alignment = align(&reference, &subject, &options).unwrap();

        assert!(alignment.flips[0]);
        // The flipped subject matches the reference again.
        assert!((&alignment.aligned - &reference.x).norm() < 1e-6);
        // The caller's subject value is untouched.
        assert!(subject.x[(0, 0)] != reference.x[(0, 0)] || reference.x[(0, 0)] == 0.0);
    }

    #[test]
    fn test_partial_full_sample_matches_complete() {
        let emb = grid_embedding(4);

        let complete = align(
            &emb,
            &emb,
            &AlignOptions::default()
                .with_krot(4)
                .complete()
                .with_sulcal_weight(0.0),
        )
        .unwrap();

        let partial = align(
            &emb,
            &emb,
            &AlignOptions::default()
                .with_krot(4)
                .partial(10_000) // far above the vertex count: every vertex participates
                .with_sulcal_weight(0.0)
                .with_seed(42),
        )
        .unwrap();

        assert!((&complete.aligned - &partial.aligned).norm() < 1e-6);
    }

    #[test]
    fn test_sulcal_channel_is_stripped_from_result() {
        let emb = grid_embedding(4);
        let options = AlignOptions::default()
            .with_krot(4)
            .complete()
            .with_sulcal_weight(1.0);

        let alignment = align(&emb, &emb, &options).unwrap();
        assert_eq!(alignment.aligned.ncols(), emb.x.ncols());
        assert_eq!(alignment.aligned.nrows(), emb.num_vertices());
    }

    #[test]
    fn test_sulcal_weight_requires_depth() {
        let mut data = bumpy_grid_data(4);
        data.depth = Field::Missing { reason: "file not found".into() };
        let no_depth =
            SpectralEmbedding::compute(&data, 4, &SpectrumOptions::default()).unwrap();
        let with_depth = grid_embedding(4);

        let options = AlignOptions::default().with_krot(4).complete();
        let err = align(&with_depth, &no_depth, &options).unwrap_err();
        assert!(matches!(err, SpectralError::MissingField { field: "depth", .. }));
    }

    #[test]
    fn test_two_step_still_aligns_self() {
        let emb = grid_embedding(5);
        let options = AlignOptions::default()
            .with_krot(5)
            .complete()
            .with_sulcal_weight(0.0)
            .with_two_step();

        let alignment = align(&emb, &emb, &options).unwrap();
        assert!((&alignment.aligned - &emb.x).norm() < 1e-6);
    }

    #[test]
    fn test_krot_out_of_range_rejected() {
        let emb = grid_embedding(3);
        let options = AlignOptions::default().with_krot(7).complete();
        assert!(align(&emb, &emb, &options).is_err());
    }

    #[test]
    fn test_partial_sampling_is_seeded() {
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        assert_eq!(
            sample_indices(100, 10, &mut rng_a),
            sample_indices(100, 10, &mut rng_b)
        );
    }
}
