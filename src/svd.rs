/**
 * SvdReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::cmp::Ordering;
use std::time::Instant;

use nalgebra::{DMatrix, DVector, SVD};

use crate::error::{Result, SvdRecoError};
use crate::types::RatingMatrix;

/// Rank-k factorization M ~ U * diag(s) * Vt with U of shape (rows, k), s of length k and Vt of
/// shape (k, cols).
#[derive(Clone, Debug, PartialEq)]
pub struct FactorTriplet {
    pub u: DMatrix<f64>,
    pub s: DVector<f64>,
    pub vt: DMatrix<f64>,
}

impl FactorTriplet {

    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// The dense approximation U * diag(s) * Vt.
    pub fn reconstruct(&self) -> DMatrix<f64> {
        &self.u * DMatrix::from_diagonal(&self.s) * &self.vt
    }
}

/// Computes a truncated singular value decomposition. Implementations are free to return the
/// components in any order and with any sign convention.
pub trait RankReducer {
    fn reduce(&self, matrix: &RatingMatrix, rank: usize) -> Result<FactorTriplet>;
}

/// Checks that a rank `rank` factorization can be computed for a matrix of the given shape.
pub fn validate_rank(shape: (usize, usize), rank: usize) -> Result<()> {
    let (num_rows, num_cols) = shape;
    let smaller_dimension = num_rows.min(num_cols);

    if rank == 0 || rank >= smaller_dimension {
        return Err(SvdRecoError::Configuration {
            rank,
            num_rows,
            num_cols,
            max_rank: smaller_dimension.saturating_sub(1),
        });
    }

    Ok(())
}

/// Validates the rank, runs the reducer and brings its result into canonical order.
pub fn truncated_svd<R>(reducer: &R, matrix: &RatingMatrix, rank: usize) -> Result<FactorTriplet>
    where R: RankReducer + ?Sized {

    validate_rank(matrix.shape(), rank)?;

    let factors = reducer.reduce(matrix, rank)?;

    let (num_rows, num_cols) = matrix.shape();
    let expected_shapes = factors.u.shape() == (num_rows, rank)
        && factors.s.len() == rank
        && factors.vt.shape() == (rank, num_cols);

    if !expected_shapes {
        return Err(SvdRecoError::Solver(format!(
            "expected factors of shape {:?}, {} and {:?}, got {:?}, {} and {:?}",
            (num_rows, rank), rank, (rank, num_cols),
            factors.u.shape(), factors.s.len(), factors.vt.shape())));
    }

    Ok(canonicalize(factors))
}

/// Descending order on singular values, there is no total order on floats so NaNs compare equal.
fn cmp_descending(value_a: f64, value_b: f64) -> Ordering {
    value_b.partial_cmp(&value_a).unwrap_or(Ordering::Equal)
}

/// Orders the components by descending singular value. The sort is stable, so ties keep the
/// order in which the reducer returned them. Columns of U and rows of Vt are permuted the same
/// way, which leaves U * diag(s) * Vt unchanged.
pub fn canonicalize(factors: FactorTriplet) -> FactorTriplet {

    let s = &factors.s;

    let mut order: Vec<usize> = (0..s.len()).collect();
    order.sort_by(|&a, &b| cmp_descending(s[a], s[b]));

    let sorted_s = DVector::from_iterator(order.len(), order.iter().map(|&index| s[index]));

    FactorTriplet {
        u: factors.u.select_columns(order.iter()),
        s: sorted_s,
        vt: factors.vt.select_rows(order.iter()),
    }
}

/// Share of the squared singular value mass captured by each of the retained components. If
/// all singular values are zero, there is no energy to distribute and all shares are zero.
pub fn explained_energy(singular_values: &DVector<f64>) -> Vec<f64> {

    let squared: Vec<f64> = singular_values.iter().map(|value| value * value).collect();
    let total: f64 = squared.iter().sum();

    if total == 0.0 {
        return vec![0.0; squared.len()];
    }

    squared.into_iter().map(|value| value / total).collect()
}

/// Full singular value decomposition of the densified matrix, of which the `rank` strongest
/// components are kept. Memory grows with rows * cols, which is fine for datasets of the size
/// of MovieLens 100k.
///
/// Without an explicit `max_iterations`, the solver gives up after
/// `ITERATIONS_PER_DIMENSION * min(rows, cols)` iterations and reports a solver error.
pub struct DenseSvd {
    pub eps: f64,
    pub max_iterations: Option<usize>,
}

const ITERATIONS_PER_DIMENSION: usize = 30;
const MIN_ITERATIONS: usize = 100;

impl Default for DenseSvd {
    fn default() -> Self {
        DenseSvd { eps: std::f64::EPSILON, max_iterations: None }
    }
}

impl DenseSvd {

    fn iteration_limit(&self, num_rows: usize, num_cols: usize) -> usize {
        // nalgebra treats zero as no limit at all
        let derived = (ITERATIONS_PER_DIMENSION * num_rows.min(num_cols)).max(MIN_ITERATIONS);
        self.max_iterations.unwrap_or(derived).max(1)
    }
}

impl RankReducer for DenseSvd {

    fn reduce(&self, matrix: &RatingMatrix, rank: usize) -> Result<FactorTriplet> {

        let (num_rows, num_cols) = matrix.shape();

        let mut dense = DMatrix::<f64>::zeros(num_rows, num_cols);
        for (value, (row, col)) in matrix.iter() {
            dense[(row, col)] = *value;
        }

        let start = Instant::now();

        let max_iterations = self.iteration_limit(num_rows, num_cols);

        let svd = SVD::try_new_unordered(dense, true, true, self.eps, max_iterations)
            .ok_or_else(|| SvdRecoError::Solver(format!(
                "SVD did not converge within {} iterations", max_iterations)))?;

        debug!("Dense SVD of a {}x{} matrix took {}ms", num_rows, num_cols,
            start.elapsed().as_millis());

        let u = svd.u.ok_or_else(|| SvdRecoError::Solver(String::from("U was not computed")))?;
        let v_t = svd.v_t
            .ok_or_else(|| SvdRecoError::Solver(String::from("Vt was not computed")))?;
        let singular_values = svd.singular_values;

        if singular_values.len() < rank {
            return Err(SvdRecoError::Solver(format!(
                "only {} singular values available, {} requested", singular_values.len(), rank)));
        }

        // Keep the strongest components in the unordered layout nalgebra produced them in
        let mut strongest: Vec<usize> = (0..singular_values.len()).collect();
        strongest.sort_by(|&a, &b| cmp_descending(singular_values[a], singular_values[b]));
        strongest.truncate(rank);
        strongest.sort();

        let s = DVector::from_iterator(
            rank,
            strongest.iter().map(|&index| singular_values[index]),
        );

        Ok(FactorTriplet {
            u: u.select_columns(strongest.iter()),
            s,
            vt: v_t.select_rows(strongest.iter()),
        })
    }
}

#[cfg(test)]
pub mod tests {

    use std::cell::Cell;

    use nalgebra::{DMatrix, DVector};
    use sprs::CsMat;

    use super::{canonicalize, explained_energy, truncated_svd, validate_rank};
    use super::{DenseSvd, FactorTriplet, RankReducer};
    use crate::error::{Result, SvdRecoError};
    use crate::types::RatingMatrix;

    /// Returns a fixed, deliberately unsorted factorization and counts how often it was asked.
    pub struct FixedFactors {
        pub factors: FactorTriplet,
        pub invocations: Cell<usize>,
    }

    impl FixedFactors {

        pub fn new(factors: FactorTriplet) -> Self {
            FixedFactors { factors, invocations: Cell::new(0) }
        }
    }

    impl RankReducer for FixedFactors {
        fn reduce(&self, _matrix: &RatingMatrix, _rank: usize) -> Result<FactorTriplet> {
            self.invocations.set(self.invocations.get() + 1);
            Ok(self.factors.clone())
        }
    }

    /// Rank 2 factors for a 3x3 matrix, weakest component first.
    pub fn unsorted_factors() -> FactorTriplet {
        FactorTriplet {
            u: DMatrix::from_row_slice(3, 2, &[
                0.6, 0.0,
                0.0, 0.8,
                0.8, 0.6,
            ]),
            s: DVector::from_vec(vec![1.5, 4.0]),
            vt: DMatrix::from_row_slice(2, 3, &[
                1.0, 0.0, 0.0,
                0.0, 0.6, 0.8,
            ]),
        }
    }

    fn diagonal_matrix() -> RatingMatrix {
        CsMat::new((3, 3), vec![0, 1, 2, 3], vec![0, 1, 2], vec![1.0, 3.0, 2.0])
    }

    #[test]
    fn rank_must_be_smaller_than_both_dimensions() {
        assert!(validate_rank((3, 4), 1).is_ok());
        assert!(validate_rank((3, 4), 2).is_ok());

        for &rank in &[0, 3, 4, 10] {
            match validate_rank((3, 4), rank) {
                Err(SvdRecoError::Configuration { max_rank, .. }) => assert_eq!(max_rank, 2),
                other => panic!("expected a configuration error, got {:?}", other),
            }
        }

        assert!(validate_rank((0, 0), 1).is_err());
    }

    #[test]
    fn invalid_rank_never_reaches_the_reducer() {
        let reducer = FixedFactors::new(unsorted_factors());

        let result = truncated_svd(&reducer, &diagonal_matrix(), 3);

        assert!(matches!(result, Err(SvdRecoError::Configuration { .. })));
        assert_eq!(reducer.invocations.get(), 0);
    }

    #[test]
    fn factors_of_the_wrong_shape_are_rejected() {
        let reducer = FixedFactors::new(unsorted_factors());

        let result = truncated_svd(&reducer, &diagonal_matrix(), 1);

        assert!(matches!(result, Err(SvdRecoError::Solver(_))));
        assert_eq!(reducer.invocations.get(), 1);
    }

    #[test]
    fn canonical_order() {
        let reducer = FixedFactors::new(unsorted_factors());

        let factors = truncated_svd(&reducer, &diagonal_matrix(), 2).unwrap();

        assert_eq!(factors.s, DVector::from_vec(vec![4.0, 1.5]));
        assert_eq!(factors.u.column(0).iter().cloned().collect::<Vec<_>>(), vec![0.0, 0.8, 0.6]);
        assert_eq!(factors.vt.row(0).iter().cloned().collect::<Vec<_>>(), vec![0.0, 0.6, 0.8]);
    }

    #[test]
    fn canonicalization_preserves_the_approximation() {
        let factors = unsorted_factors();
        let before = factors.reconstruct();

        let canonical = canonicalize(factors);

        for window in canonical.s.as_slice().windows(2) {
            assert!(window[0] >= window[1]);
        }

        assert!((canonical.reconstruct() - before).norm() < 1e-12);
    }

    #[test]
    fn ties_keep_their_original_order() {
        let factors = FactorTriplet {
            u: DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]),
            s: DVector::from_vec(vec![2.0, 5.0, 2.0]),
            vt: DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]),
        };

        let canonical = canonicalize(factors);

        assert_eq!(canonical.s, DVector::from_vec(vec![5.0, 2.0, 2.0]));
        assert_eq!(canonical.u, DMatrix::from_row_slice(1, 3, &[2.0, 1.0, 3.0]));
        assert_eq!(canonical.vt, DMatrix::from_row_slice(3, 1, &[2.0, 1.0, 3.0]));
    }

    #[test]
    fn energy() {
        let energy = explained_energy(&DVector::from_vec(vec![4.0, 2.0, 2.0]));

        assert_eq!(energy.len(), 3);
        assert!((energy[0] - 16.0 / 24.0).abs() < 1e-12);
        assert!((energy[1] - 4.0 / 24.0).abs() < 1e-12);
        assert!(energy.iter().all(|&share| share >= 0.0));
        assert!((energy.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn energy_of_zero_singular_values() {
        let energy = explained_energy(&DVector::from_vec(vec![0.0, 0.0]));
        assert_eq!(energy, vec![0.0, 0.0]);
    }

    #[test]
    fn dense_svd_gives_up_after_the_iteration_limit() {
        let matrix = CsMat::new(
            (3, 3),
            vec![0, 3, 5, 7],
            vec![0, 1, 2, 0, 1, 0, 2],
            vec![4.0, 1.0, 2.0, 1.0, 3.0, 2.0, 5.0],
        );

        let impatient = DenseSvd { eps: std::f64::EPSILON, max_iterations: Some(1) };

        match truncated_svd(&impatient, &matrix, 2) {
            Err(SvdRecoError::Solver(message)) => assert!(message.contains("1 iterations")),
            other => panic!("expected a solver error, got {:?}", other),
        }

        assert!(truncated_svd(&DenseSvd::default(), &matrix, 2).is_ok());
    }

    #[test]
    fn dense_svd_iteration_limit() {
        assert_eq!(DenseSvd::default().iteration_limit(943, 1682), 30 * 943);
        assert_eq!(DenseSvd::default().iteration_limit(3, 3), 100);

        let zero = DenseSvd { eps: std::f64::EPSILON, max_iterations: Some(0) };
        assert_eq!(zero.iteration_limit(3, 3), 1);
    }

    #[test]
    fn dense_svd_keeps_the_strongest_components() {
        let factors = truncated_svd(&DenseSvd::default(), &diagonal_matrix(), 2).unwrap();

        assert_eq!(factors.u.shape(), (3, 2));
        assert_eq!(factors.vt.shape(), (2, 3));
        assert!((factors.s[0] - 3.0).abs() < 1e-9);
        assert!((factors.s[1] - 2.0).abs() < 1e-9);

        // The weakest component (the 1.0 at (0, 0)) is dropped, the rest is reconstructed
        let approximation = factors.reconstruct();
        assert!(approximation[(0, 0)].abs() < 1e-9);
        assert!((approximation[(1, 1)] - 3.0).abs() < 1e-9);
        assert!((approximation[(2, 2)] - 2.0).abs() < 1e-9);
        assert!(approximation[(1, 2)].abs() < 1e-9);
    }
}
