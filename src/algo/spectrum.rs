//! Low-rank spectrum of the random-walk graph Laplacian.
//!
//! Computes the smallest eigenpairs of L_rw = I − D⁻¹A for a weighted
//! adjacency graph. L_rw is similar to the symmetric normalized Laplacian
//! L_sym = I − D^{-1/2} A D^{-1/2} (L_rw = D^{-1/2} L_sym D^{1/2}), so the
//! solver runs on L_sym — whose spectrum is exactly real — and maps each
//! eigenvector u back to the random-walk eigenvector v = D^{-1/2} u.
//!
//! The smallest eigenpairs are found by shift-inverted Lanczos iteration:
//! Lanczos on (L_sym + σI)^{-1} with a small positive σ, which makes the
//! shifted system positive definite so the inner solves can use conjugate
//! gradients. The largest Ritz values of the inverted operator correspond
//! to the smallest Laplacian eigenvalues.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::algo::adjacency::WeightedAdjacency;
use crate::algo::sparse::{conjugate_gradient, CsrMatrix};
use crate::error::{Result, SpectralError};

/// Options for the spectrum solver.
#[derive(Debug, Clone)]
pub struct SpectrumOptions {
    /// Maximum Lanczos iterations before giving up.
    pub max_iterations: usize,

    /// Relative Ritz-residual tolerance for eigenpair convergence.
    pub tolerance: f64,

    /// Regularization shift σ added to the Laplacian before inversion.
    ///
    /// Must be positive: L_sym is singular (the null mode), so the
    /// unshifted system cannot be solved by CG.
    pub shift: f64,

    /// Maximum iterations for each inner CG solve.
    pub cg_max_iterations: usize,

    /// Relative residual tolerance for each inner CG solve.
    pub cg_tolerance: f64,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            tolerance: 1e-3,
            shift: 1e-4,
            cg_max_iterations: 20_000,
            cg_tolerance: 1e-10,
        }
    }
}

impl SpectrumOptions {
    /// Set the Lanczos iteration budget.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the eigenpair convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}

/// Sorted, sign-normalized eigenpairs of the random-walk Laplacian with the
/// null mode removed.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Eigenvalues, strictly ascending.
    pub eigenvalues: DVector<f64>,
    /// Eigenvectors (one column per eigenvalue), unit norm, first vertex
    /// non-negative.
    pub eigenvectors: DMatrix<f64>,
}

impl Spectrum {
    /// Number of retained eigenpairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// True if no eigenpairs were retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.len() == 0
    }
}

/// Compute the `ne` smallest non-trivial eigenpairs of the random-walk
/// Laplacian of `adjacency`.
///
/// Internally solves for `ne + 1` pairs and drops the first: the smallest
/// eigenvalue of a connected graph Laplacian is exactly zero with a
/// constant eigenvector, which carries no geometry.
pub fn eigen_spectrum(
    adjacency: &WeightedAdjacency,
    ne: usize,
    options: &SpectrumOptions,
) -> Result<Spectrum> {
    let n = adjacency.num_vertices;
    let k = ne + 1;
    if k >= n {
        return Err(SpectralError::invalid_param(
            "ne",
            ne,
            "must be at least two fewer than the vertex count",
        ));
    }
    if options.shift <= 0.0 {
        return Err(SpectralError::invalid_param(
            "shift",
            options.shift,
            "must be strictly positive",
        ));
    }

    let a = adjacency.to_csr();
    let degree = a.row_sums();
    for i in 0..n {
        if degree[i] <= 0.0 {
            return Err(SpectralError::IsolatedVertex { vertex: i });
        }
    }
    let inv_sqrt_degree = degree.map(|d| 1.0 / d.sqrt());

    let shifted = a.symmetric_normalized_laplacian(&inv_sqrt_degree, options.shift);

    let (theta, u) = lanczos_largest_of_inverse(&shifted, k, options)?;

    // Map Ritz values of (L + σI)^{-1} back to Laplacian eigenvalues and
    // symmetric eigenvectors back to random-walk eigenvectors.
    let mut pairs: Vec<(f64, DVector<f64>)> = Vec::with_capacity(k);
    for (i, &th) in theta.iter().enumerate() {
        let lambda = 1.0 / th - options.shift;
        let mut v = u.column(i).component_mul(&inv_sqrt_degree);
        let norm = v.norm();
        if norm > 0.0 {
            v /= norm;
        }
        pairs.push((lambda, v));
    }
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("real eigenvalues"));

    // Canonical initial sign: first vertex non-negative. The sign resolver
    // overrides this per-dimension during alignment.
    for (_, v) in pairs.iter_mut() {
        if v[0] < 0.0 {
            *v = -&*v;
        }
    }

    // Drop the null mode.
    let retained = &pairs[1..];
    let eigenvalues = DVector::from_iterator(ne, retained.iter().map(|(l, _)| *l));
    let mut eigenvectors = DMatrix::zeros(n, ne);
    for (i, (_, v)) in retained.iter().enumerate() {
        eigenvectors.set_column(i, v);
    }

    Ok(Spectrum {
        eigenvalues,
        eigenvectors,
    })
}

/// Lanczos iteration for the `k` largest eigenpairs of `M⁻¹`, where `M` is
/// symmetric positive definite and applied through CG solves.
///
/// Returns Ritz values (descending) and the corresponding Ritz vectors as
/// matrix columns. Uses full reorthogonalization: the basis is small (tens
/// of vectors) and orthogonality loss would otherwise duplicate converged
/// pairs.
fn lanczos_largest_of_inverse(
    m: &CsrMatrix,
    k: usize,
    options: &SpectrumOptions,
) -> Result<(Vec<f64>, DMatrix<f64>)> {
    let n = m.nrows();
    let max_steps = options.max_iterations.min(n);

    // Deterministic start vector: a fixed-seed draw keeps the whole
    // pipeline reproducible while avoiding accidental orthogonality to a
    // target eigenvector.
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut v = DVector::from_fn(n, |_, _| rng.gen::<f64>() - 0.5);
    v /= v.norm();

    let mut basis: Vec<DVector<f64>> = vec![v.clone()];
    let mut alphas: Vec<f64> = Vec::new();
    let mut betas: Vec<f64> = Vec::new();

    let mut prev_solution: Option<DVector<f64>> = None;

    for step in 0..max_steps {
        // w = M⁻¹ v, warm-started from the previous solve.
        let w = conjugate_gradient(
            m,
            &v,
            prev_solution.as_ref(),
            options.cg_max_iterations,
            options.cg_tolerance,
        )?;
        prev_solution = Some(w.clone());

        let alpha = w.dot(&v);
        alphas.push(alpha);

        let mut w = w - alpha * &v;
        if let Some(beta) = betas.last() {
            w -= *beta * &basis[basis.len() - 2];
        }
        // Full reorthogonalization, two passes.
        for _ in 0..2 {
            for q in &basis {
                let proj = w.dot(q);
                w -= proj * q;
            }
        }

        let beta = w.norm();

        if basis.len() >= k {
            let (theta, s) = tridiagonal_eigen(&alphas, &betas);
            if ritz_converged(&theta, &s, beta, k, options.tolerance) || beta < 1e-14 {
                return Ok(assemble_ritz_vectors(&basis, &theta, &s, k));
            }
        } else if beta < 1e-14 {
            // Krylov space exhausted before k pairs were available.
            return Err(SpectralError::ConvergenceFailed { iterations: step + 1 });
        }

        betas.push(beta);
        v = w / beta;
        basis.push(v.clone());
    }

    Err(SpectralError::ConvergenceFailed {
        iterations: max_steps,
    })
}

/// Dense eigendecomposition of the Lanczos tridiagonal matrix.
///
/// Returns eigenvalues (descending) with their eigenvectors as columns of
/// `s`, both reordered together.
fn tridiagonal_eigen(alphas: &[f64], betas: &[f64]) -> (Vec<f64>, DMatrix<f64>) {
    let j = alphas.len();
    let mut t = DMatrix::zeros(j, j);
    for i in 0..j {
        t[(i, i)] = alphas[i];
        if i + 1 < j {
            t[(i, i + 1)] = betas[i];
            t[(i + 1, i)] = betas[i];
        }
    }

    let eigen = t.symmetric_eigen();
    let mut order: Vec<usize> = (0..j).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .expect("real eigenvalues")
    });

    let theta: Vec<f64> = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let mut s = DMatrix::zeros(j, j);
    for (col, &i) in order.iter().enumerate() {
        s.set_column(col, &eigen.eigenvectors.column(i));
    }
    (theta, s)
}

/// Standard Lanczos residual bound: the residual of Ritz pair i is
/// `beta * |last component of s_i|`.
fn ritz_converged(theta: &[f64], s: &DMatrix<f64>, beta: f64, k: usize, tol: f64) -> bool {
    let j = s.nrows();
    (0..k).all(|i| {
        let residual = beta * s[(j - 1, i)].abs();
        residual <= tol * theta[i].abs().max(f64::MIN_POSITIVE)
    })
}

/// Lift the top-k tridiagonal eigenvectors back through the Lanczos basis.
fn assemble_ritz_vectors(
    basis: &[DVector<f64>],
    theta: &[f64],
    s: &DMatrix<f64>,
    k: usize,
) -> (Vec<f64>, DMatrix<f64>) {
    let n = basis[0].len();
    let j = s.nrows();

    let mut vectors = DMatrix::zeros(n, k);
    for i in 0..k {
        let mut y = DVector::zeros(n);
        for (row, q) in basis.iter().take(j).enumerate() {
            y += s[(row, i)] * q;
        }
        let norm = y.norm();
        if norm > 0.0 {
            y /= norm;
        }
        vectors.set_column(i, &y);
    }

    (theta[..k].to_vec(), vectors)
}
