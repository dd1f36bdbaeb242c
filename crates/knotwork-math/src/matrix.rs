//! Small dense matrices for interpolation and fitting systems.

use std::fmt;

use knotwork_core::{NurbsError, Result};
use nalgebra::DMatrix;

/// Pivots below this fraction of the largest entry mark the system as singular.
const PIVOT_EPSILON: f64 = 1e-14;

/// A fixed-shape, row/column addressed matrix of `f64`.
///
/// Shape is decided at construction and never changes; every operation returns
/// a new matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: DMatrix<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(NurbsError::InvalidArgument(format!(
                "matrix must have at least one row and column, got {}x{}",
                rows, cols
            )));
        }
        Ok(Self {
            data: DMatrix::zeros(rows, cols),
        })
    }

    pub fn identity(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(NurbsError::InvalidArgument(
                "identity matrix size must be positive".into(),
            ));
        }
        Ok(Self {
            data: DMatrix::identity(size, size),
        })
    }

    /// Build a matrix from equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(NurbsError::InvalidArgument(
                "matrix must have at least one row and column".into(),
            ));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(NurbsError::DimensionMismatch(format!(
                "row {} has {} entries, expected {}",
                i,
                row.len(),
                n_cols
            )));
        }
        Ok(Self {
            data: DMatrix::from_fn(n_rows, n_cols, |r, c| rows[r][c]),
        })
    }

    /// Build a matrix entry by entry.
    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> f64) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(NurbsError::InvalidArgument(format!(
                "matrix must have at least one row and column, got {}x{}",
                rows, cols
            )));
        }
        Ok(Self {
            data: DMatrix::from_fn(rows, cols, f),
        })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    /// Entry at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        (row < self.rows()).then(|| self.data.row(row).iter().copied().collect())
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows())
            .map(|r| self.data.row(r).iter().copied().collect())
            .collect()
    }

    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose(),
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            data: &self.data * factor,
        }
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, "add")?;
        Ok(Self {
            data: &self.data + &other.data,
        })
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_same_shape(other, "subtract")?;
        Ok(Self {
            data: &self.data - &other.data,
        })
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        if self.cols() != other.rows() {
            return Err(NurbsError::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows(),
                self.cols(),
                other.rows(),
                other.cols()
            )));
        }
        Ok(Self {
            data: &self.data * &other.data,
        })
    }

    /// Matrix-vector product.
    pub fn multiply_vector(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.cols() {
            return Err(NurbsError::DimensionMismatch(format!(
                "vector of length {} does not match {} columns",
                v.len(),
                self.cols()
            )));
        }
        Ok((0..self.rows())
            .map(|r| self.data.row(r).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Solve `self * X = rhs` for `X`; `rhs` may carry several right-hand sides as columns.
    pub fn solve(&self, rhs: &Self) -> Result<Self> {
        if !self.is_square() {
            return Err(NurbsError::DimensionMismatch(format!(
                "solve requires a square matrix, got {}x{}",
                self.rows(),
                self.cols()
            )));
        }
        if rhs.rows() != self.rows() {
            return Err(NurbsError::DimensionMismatch(format!(
                "right-hand side has {} rows, system has {}",
                rhs.rows(),
                self.rows()
            )));
        }
        let lu = self.data.clone().lu();
        self.check_pivots(lu.u().diagonal().iter())?;
        lu.solve(&rhs.data)
            .map(|data| Self { data })
            .ok_or_else(|| NurbsError::DegenerateGeometry("singular matrix".into()))
    }

    /// Solve `self * x = b` for a single right-hand side.
    pub fn solve_vector(&self, b: &[f64]) -> Result<Vec<f64>> {
        if b.len() != self.rows() {
            return Err(NurbsError::DimensionMismatch(format!(
                "right-hand side has {} entries, system has {}",
                b.len(),
                self.rows()
            )));
        }
        let rhs = Self::from_fn(b.len(), 1, |r, _| b[r])?;
        Ok(self.solve(&rhs)?.data.iter().copied().collect())
    }

    /// Inverse through LU decomposition with partial pivoting.
    pub fn inverse(&self) -> Result<Self> {
        let identity = Self::identity(self.rows())?;
        self.solve(&identity)
    }

    fn check_same_shape(&self, other: &Self, op: &str) -> Result<()> {
        if self.rows() != other.rows() || self.cols() != other.cols() {
            return Err(NurbsError::DimensionMismatch(format!(
                "cannot {} {}x{} and {}x{}",
                op,
                self.rows(),
                self.cols(),
                other.rows(),
                other.cols()
            )));
        }
        Ok(())
    }

    fn check_pivots<'a>(&self, pivots: impl Iterator<Item = &'a f64>) -> Result<()> {
        let scale = self.data.amax();
        if scale == 0.0 {
            return Err(NurbsError::DegenerateGeometry("singular matrix (all zeros)".into()));
        }
        for (i, p) in pivots.enumerate() {
            if p.abs() <= PIVOT_EPSILON * scale {
                return Err(NurbsError::DegenerateGeometry(format!(
                    "singular matrix (pivot {} is {:e})",
                    i, p
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.to_rows().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let entries: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            write!(f, "({})", entries.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, NurbsError::DimensionMismatch(_)));
        assert!(Matrix::from_rows(&[]).is_err());
        assert!(Matrix::zeros(0, 3).is_err());
    }

    #[test]
    fn test_multiply() {
        let a = m(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let b = m(&[&[7.0, 8.0], &[9.0, 10.0], &[11.0, 12.0]]);
        let c = a.multiply(&b).unwrap();
        assert_eq!(c.to_rows(), vec![vec![58.0, 64.0], vec![139.0, 154.0]]);

        let err = a.multiply(&a).unwrap_err();
        assert!(matches!(err, NurbsError::DimensionMismatch(_)));
    }

    #[test]
    fn test_transpose_and_add() {
        let a = m(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let t = a.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.get(2, 1), Some(6.0));

        let sum = a.add(&a.scale(2.0)).unwrap();
        assert_eq!(sum.row(1), Some(vec![12.0, 15.0, 18.0]));
        assert!(a.add(&t).is_err());
        assert_eq!(a.sub(&a).unwrap(), Matrix::zeros(2, 3).unwrap());
    }

    #[test]
    fn test_multiply_vector() {
        let a = m(&[&[1.0, 0.0, 2.0], &[0.0, 3.0, 1.0]]);
        assert_eq!(a.multiply_vector(&[1.0, 1.0, 1.0]).unwrap(), vec![3.0, 4.0]);
        assert!(a.multiply_vector(&[1.0]).is_err());
    }

    #[test]
    fn test_solve_requires_pivoting() {
        // Zero in the leading position: naive elimination would divide by zero
        let a = m(&[&[0.0, 2.0, 1.0], &[1.0, 1.0, 0.0], &[2.0, 0.0, 3.0]]);
        let x = a.solve_vector(&[5.0, 3.0, 11.0]).unwrap();
        let expected = [1.0, 2.0, 3.0];
        for (xi, ei) in x.iter().zip(expected) {
            assert_abs_diff_eq!(*xi, ei, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        let a = m(&[&[4.0, 7.0], &[2.0, 6.0]]);
        let inv = a.inverse().unwrap();
        let id = a.multiply(&inv).unwrap();
        for r in 0..2 {
            for c in 0..2 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(id.get(r, c).unwrap(), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_fails_explicitly() {
        let a = m(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(matches!(a.inverse(), Err(NurbsError::DegenerateGeometry(_))));
        assert!(matches!(
            a.solve_vector(&[1.0, 2.0]),
            Err(NurbsError::DegenerateGeometry(_))
        ));
        let zero = Matrix::zeros(2, 2).unwrap();
        assert!(zero.inverse().is_err());
    }

    #[test]
    fn test_non_square_solve_is_dimension_mismatch() {
        let a = m(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        assert!(matches!(
            a.solve_vector(&[1.0, 2.0]),
            Err(NurbsError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_display() {
        let a = m(&[&[1.0, 2.0], &[3.5, 4.0]]);
        assert_eq!(a.to_string(), "(1,2)\n(3.5,4)");
    }
}
