//! Dense LU factorization and solve.
//!
//! Crout's method with partial pivoting and implicit row scaling, operating
//! in place on an `nalgebra` matrix. These are pure functions of their
//! arguments; the engine pre-factors linear circuits once and refactors
//! nonlinear circuits every Newton sub-iteration.

use nalgebra::{DMatrix, DVector};

/// Factor `a` in place into its LU decomposition, recording row
/// interchanges in `pivot`. Returns false when the matrix is singular
/// (a row with no nonzero entry).
///
/// The unit lower triangle and the upper triangle share `a`'s storage.
/// A zero pivot surviving row exchange is replaced by `1e-18` so that the
/// solve never divides by zero.
pub fn lu_factor(a: &mut DMatrix<f64>, pivot: &mut [usize]) -> bool {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols());
    debug_assert!(pivot.len() >= n);

    // Implicit scaling: remember the reciprocal of each row's largest entry.
    let mut scale = vec![0.0; n];
    for i in 0..n {
        let mut largest: f64 = 0.0;
        for j in 0..n {
            let x = a[(i, j)].abs();
            if x > largest {
                largest = x;
            }
        }
        if largest == 0.0 {
            return false;
        }
        scale[i] = 1.0 / largest;
    }

    for j in 0..n {
        // Upper triangular entries for this column.
        for i in 0..j {
            let mut q = a[(i, j)];
            for k in 0..i {
                q -= a[(i, k)] * a[(k, j)];
            }
            a[(i, j)] = q;
        }

        // Lower triangular entries, tracking the scaled pivot candidate.
        let mut largest = 0.0;
        let mut largest_row = j;
        for i in j..n {
            let mut q = a[(i, j)];
            for k in 0..j {
                q -= a[(i, k)] * a[(k, j)];
            }
            a[(i, j)] = q;
            let x = q.abs() * scale[i];
            if x >= largest {
                largest = x;
                largest_row = i;
            }
        }

        if j != largest_row {
            a.swap_rows(j, largest_row);
            scale.swap(j, largest_row);
        }
        pivot[j] = largest_row;

        // avoid zeros
        if a[(j, j)] == 0.0 {
            log::debug!("zero pivot in column {j}, substituting 1e-18");
            a[(j, j)] = 1e-18;
        }

        if j != n - 1 {
            let mult = 1.0 / a[(j, j)];
            for i in (j + 1)..n {
                a[(i, j)] *= mult;
            }
        }
    }

    true
}

/// Solve `A x = b` given a factorization from [`lu_factor`]. The solution
/// overwrites `b`.
pub fn lu_solve(a: &DMatrix<f64>, pivot: &[usize], b: &mut DVector<f64>) {
    let n = a.nrows();

    // Apply the row permutation, skipping leading zeros of the permuted
    // right side so forward substitution can start late.
    let mut first = 0;
    while first < n {
        let row = pivot[first];
        let swap = b[row];
        b[row] = b[first];
        b[first] = swap;
        if swap != 0.0 {
            break;
        }
        first += 1;
    }

    let start = first;
    for i in (first + 1)..n {
        let row = pivot[i];
        let mut tot = b[row];
        b[row] = b[i];
        // Forward substitution through the unit lower triangle.
        for j in start..i {
            tot -= a[(i, j)] * b[j];
        }
        b[i] = tot;
    }

    // Back substitution through the upper triangle.
    for i in (0..n).rev() {
        let mut tot = b[i];
        for j in (i + 1)..n {
            tot -= a[(i, j)] * b[j];
        }
        b[i] = tot / a[(i, i)];
    }
}
