// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Property-Based Tests (proptest) for photo-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for photo-math using proptest.
//!
//! Covers: LU solve residuals, determinant of permuted systems.

use ndarray::{Array1, Array2};
use photo_math::linalg::{lu_solve, residual, LuDecomposition};
use proptest::prelude::*;

// ── LU Solver Properties ─────────────────────────────────────────────

proptest! {
    /// For any diagonally dominant system, x = lu_solve(A, b) satisfies
    /// Ax = b within floating-point tolerance.
    #[test]
    fn lu_solve_ax_eq_b(
        n in 2usize..12,
        seed in 0u64..1000,
    ) {
        // Deterministic pseudo-random entries in [-1, 1]
        let entry = |i: usize, j: usize| -> f64 {
            ((i * 31 + j * 17 + seed as usize * 7) as f64 * 0.618_033_988_7).sin()
        };
        let mut a = Array2::zeros((n, n));
        for i in 0..n {
            let mut row_sum = 0.0;
            for j in 0..n {
                if i != j {
                    a[[i, j]] = entry(i, j);
                    row_sum += a[[i, j]].abs();
                }
            }
            a[[i, i]] = row_sum + 1.0;
        }
        let b = Array1::from_iter((0..n).map(|i| (i as f64 + 1.0).cos()));

        let x = lu_solve(&a, &b).unwrap();
        let r = residual(&a, &x, &b);
        for i in 0..n {
            prop_assert!(r[i].abs() < 1e-10, "residual[{}] = {}", i, r[i]);
        }
    }

    /// Reversing the rows of a diagonal matrix exercises pivoting and
    /// flips the determinant sign once per swap pair.
    #[test]
    fn lu_determinant_of_row_reversed_diagonal(
        diag in prop::collection::vec(0.5f64..4.0, 2..8),
    ) {
        let n = diag.len();
        let mut a = Array2::zeros((n, n));
        for i in 0..n {
            a[[n - 1 - i, i]] = diag[i];
        }
        let lu = LuDecomposition::factor(&a).unwrap();
        let product: f64 = diag.iter().product();
        let swaps = n / 2;
        let sign = if swaps % 2 == 0 { 1.0 } else { -1.0 };
        prop_assert!((lu.determinant() - sign * product).abs() < 1e-10 * product);
    }
}
