//! Linear system solvers.
//!
//! Dense Gaussian elimination with partial pivoting, generic over the scalar
//! so the same routine serves DC/transient (real) and AC (complex) systems.

use nalgebra::{ComplexField, DMatrix, DVector};
use num_complex::Complex;

use crate::error::{Error, Result};

/// Pivots with a magnitude below this are treated as zero.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-12;

/// Solve Ax = b by Gaussian elimination with partial pivoting.
///
/// At each column the row with the largest pivot magnitude at or below the
/// diagonal is swapped in. Fails with [`Error::SingularMatrix`] when that
/// magnitude is below `pivot_tolerance`.
pub fn solve_with_tolerance<T>(
    a: &DMatrix<T>,
    b: &DVector<T>,
    pivot_tolerance: f64,
) -> Result<DVector<T>>
where
    T: ComplexField<RealField = f64>,
{
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    let n = a.nrows();
    let mut m = a.clone();
    let mut x = b.clone();

    // Forward elimination
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_mag = m[(col, col)].clone().modulus();
        for row in col + 1..n {
            let mag = m[(row, col)].clone().modulus();
            if mag > pivot_mag {
                pivot_row = row;
                pivot_mag = mag;
            }
        }

        if pivot_mag < pivot_tolerance {
            return Err(Error::SingularMatrix { row: col });
        }
        if pivot_row != col {
            m.swap_rows(pivot_row, col);
            x.swap_rows(pivot_row, col);
        }

        let pivot = m[(col, col)].clone();
        for row in col + 1..n {
            let factor = m[(row, col)].clone() / pivot.clone();
            if factor.clone().modulus() == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor.clone() * m[(col, k)].clone();
                m[(row, k)] -= delta;
            }
            let delta = factor * x[col].clone();
            x[row] -= delta;
        }
    }

    // Back substitution
    for row in (0..n).rev() {
        let mut sum = x[row].clone();
        for k in row + 1..n {
            sum -= m[(row, k)].clone() * x[k].clone();
        }
        x[row] = sum / m[(row, row)].clone();
    }

    Ok(x)
}

/// Solve a real linear system Ax = b with the default pivot tolerance.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    solve_with_tolerance(a, b, DEFAULT_PIVOT_TOLERANCE)
}

/// Solve a complex linear system Ax = b with the default pivot tolerance.
pub fn solve_complex(
    a: &DMatrix<Complex<f64>>,
    b: &DVector<Complex<f64>>,
) -> Result<DVector<Complex<f64>>> {
    solve_with_tolerance(a, b, DEFAULT_PIVOT_TOLERANCE)
}
