//! Sparse matrix support for the spectrum solver.
//!
//! A lightweight CSR matrix plus a conjugate gradient solver for symmetric
//! positive definite systems. The spectrum solver uses CG as the inner
//! solve of its shift-inverted Lanczos iteration, so the matrix here only
//! needs assembly from triplets, matrix-vector products and row sums.

use nalgebra::DVector;

use crate::error::{Result, SpectralError};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// row_ptr[i] is the index in col_idx/values where row i starts;
    /// row_ptr[rows] == nnz.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        if triplets.is_empty() {
            return Self {
                rows,
                cols,
                row_ptr: vec![0; rows + 1],
                col_idx: Vec::new(),
                values: Vec::new(),
            };
        }

        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());

        let mut prev_row = usize::MAX;
        let mut prev_col = usize::MAX;

        for (row, col, val) in triplets {
            if row == prev_row && col == prev_col {
                *values.last_mut().unwrap() += val;
            } else {
                col_idx.push(col);
                values.push(val);
                for r in (prev_row.wrapping_add(1))..=row {
                    row_ptr[r] = col_idx.len() - 1;
                }
                prev_row = row;
                prev_col = col;
            }
        }

        let nnz = col_idx.len();
        for r in (prev_row + 1)..=rows {
            row_ptr[r] = nnz;
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "vector dimension mismatch");

        let mut y = DVector::zeros(self.rows);
        for i in 0..self.rows {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];

            let mut sum = 0.0;
            for k in start..end {
                sum += self.values[k] * x[self.col_idx[k]];
            }
            y[i] = sum;
        }
        y
    }

    /// Sum of each row's stored entries.
    ///
    /// For a weighted adjacency matrix this is the degree vector.
    pub fn row_sums(&self) -> DVector<f64> {
        let mut sums = DVector::zeros(self.rows);
        for i in 0..self.rows {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];
            sums[i] = self.values[start..end].iter().sum();
        }
        sums
    }

    /// Build `I - S A S + shift * I` where `S = diag(scale)`.
    ///
    /// With `scale = d^{-1/2}` this assembles the (shifted) symmetric
    /// normalized Laplacian of the adjacency matrix `A` in one pass.
    pub fn symmetric_normalized_laplacian(&self, scale: &DVector<f64>, shift: f64) -> CsrMatrix {
        assert_eq!(self.rows, self.cols, "adjacency must be square");
        assert_eq!(scale.len(), self.rows, "scale dimension mismatch");

        let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(self.nnz() + self.rows);
        for i in 0..self.rows {
            triplets.push((i, i, 1.0 + shift));
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];
            for k in start..end {
                let j = self.col_idx[k];
                triplets.push((i, j, -scale[i] * self.values[k] * scale[j]));
            }
        }
        CsrMatrix::from_triplets(self.rows, self.cols, triplets)
    }
}

/// Solve A*x = b using the conjugate gradient method.
///
/// Requires A to be symmetric positive definite. Convergence is measured
/// by the relative residual norm against `tolerance`; exhausting
/// `max_iter` fails with [`SpectralError::ConvergenceFailed`].
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "matrix must be square");

    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };

    let mut r = b - a.mul_vec(&x);

    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return Ok(x);
    }

    let mut r_norm_sq = r.dot(&r);
    if r_norm_sq.sqrt() / b_norm < tolerance {
        return Ok(x);
    }

    let mut p = r.clone();

    for _iter in 0..max_iter {
        let ap = a.mul_vec(&p);

        let p_ap = p.dot(&ap);
        if p_ap.abs() < 1e-15 {
            // Matrix is singular or nearly so; return the best iterate.
            break;
        }
        let alpha = r_norm_sq / p_ap;

        x += alpha * &p;
        r -= alpha * &ap;

        let new_r_norm_sq = r.dot(&r);
        if new_r_norm_sq.sqrt() / b_norm < tolerance {
            return Ok(x);
        }

        let beta = new_r_norm_sq / r_norm_sq;
        p = &r + beta * &p;
        r_norm_sq = new_r_norm_sq;
    }

    Err(SpectralError::ConvergenceFailed { iterations: max_iter })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_from_triplets_sums_duplicates() {
        let triplets = vec![
            (0, 0, 2.0),
            (0, 0, 2.0),
            (0, 1, 1.0),
            (1, 0, 1.0),
            (1, 1, 3.0),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        assert_eq!(a.nnz(), 4);

        let x = DVector::from_vec(vec![1.0, 0.0]);
        let y = a.mul_vec(&x);
        assert!((y[0] - 4.0).abs() < 1e-10);
        assert!((y[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_row_sums() {
        let triplets = vec![(0, 1, 2.0), (1, 0, 2.0), (1, 1, 0.5)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let sums = a.row_sums();
        assert!((sums[0] - 2.0).abs() < 1e-12);
        assert!((sums[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_normalized_laplacian_row_structure() {
        // Path graph 0 - 1 with unit weight: degrees are [1, 1], so
        // L_sym = [[1, -1], [-1, 1]] and the constant vector d^{1/2} is
        // its null mode.
        let adj = CsrMatrix::from_triplets(2, 2, vec![(0, 1, 1.0), (1, 0, 1.0)]);
        let scale = DVector::from_vec(vec![1.0, 1.0]);
        let l = adj.symmetric_normalized_laplacian(&scale, 0.0);

        let null = DVector::from_vec(vec![1.0, 1.0]);
        let y = l.mul_vec(&null);
        assert!(y.norm() < 1e-12);
    }

    #[test]
    fn test_cg_simple() {
        // [ 4  1 ] [x]   [1]
        // [ 1  3 ] [y] = [2]  =>  x = 1/11, y = 7/11
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![1.0, 2.0]);

        let x = conjugate_gradient(&a, &b, None, 100, 1e-10).unwrap();

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-8);
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-8);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-8);
    }

    #[test]
    fn test_cg_with_initial_guess() {
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![1.0, 2.0]);

        let x0 = DVector::from_vec(vec![0.1, 0.6]);
        let x = conjugate_gradient(&a, &b, Some(&x0), 100, 1e-10).unwrap();

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_cg_reports_nonconvergence() {
        // Diagonally dominant SPD system but an absurd tolerance and a
        // one-iteration budget cannot meet it.
        let triplets = vec![(0, 0, 10.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 10.0)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![1.0, -1.0]);

        let err = conjugate_gradient(&a, &b, None, 0, 1e-16).unwrap_err();
        assert!(matches!(err, SpectralError::ConvergenceFailed { iterations: 0 }));
    }
}
