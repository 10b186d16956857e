use log::debug;
use nalgebra::SMatrix;

use crate::{
    accumulator::Accumulator,
    cfg::AprioriOpts,
    equations::{Parameter, ParameterVector, NUM_PARAMETERS},
    prelude::Error,
    solver::cholesky::cholesky_inverse,
};

/// Normal matrix
pub(crate) type NormalMatrix = SMatrix<f64, NUM_PARAMETERS, NUM_PARAMETERS>;

/// Weighted least squares solution
#[derive(Debug, Clone)]
pub(crate) struct LeastSquares {
    /// Solved increments
    pub increments: ParameterVector,
    /// Formal errors
    pub errors: ParameterVector,
    /// Post fit RMS (meters)
    pub rms_m: f64,
}

/// [NormalEquations] accumulates AᵀA and Aᵀb with compensated sums.
#[derive(Debug, Clone)]
pub(crate) struct NormalEquations {
    matrix: [[Accumulator; NUM_PARAMETERS]; NUM_PARAMETERS],
    rhs: [Accumulator; NUM_PARAMETERS],
    ssr: Accumulator,
}

impl NormalEquations {
    pub fn new() -> Self {
        Self {
            matrix: [[Accumulator::new(); NUM_PARAMETERS]; NUM_PARAMETERS],
            rhs: [Accumulator::new(); NUM_PARAMETERS],
            ssr: Accumulator::new(),
        }
    }

    /// Number of contributing observations
    pub fn len(&self) -> usize {
        self.ssr.count() as usize
    }

    /// Accumulates one weighted design row and its weighted residual
    pub fn add(&mut self, row: &ParameterVector, residual: f64) {
        for i in 0..NUM_PARAMETERS {
            if row[i] == 0.0 {
                continue;
            }
            for j in i..NUM_PARAMETERS {
                self.matrix[i][j].add(row[i] * row[j]);
            }
            self.rhs[i].add(row[i] * residual);
        }
        self.ssr.add(residual * residual);
    }

    /// Forms the regularized system: a-priori pseudo observations on the
    /// constrained slots, identity rows and columns on the suppressed slots.
    fn system(
        &self,
        apriori: &AprioriOpts,
        previous: &ParameterVector,
    ) -> (NormalMatrix, ParameterVector) {
        let mut m = NormalMatrix::from_fn(|i, j| {
            let (i, j) = if i <= j { (i, j) } else { (j, i) };
            self.matrix[i][j].value()
        });
        let mut rhs = ParameterVector::from_fn(|i, _| self.rhs[i].value());

        for param in Parameter::ALL.iter() {
            let k = param.index();
            if let Some(sigma) = param.apriori_sigma(apriori) {
                let w = 1.0 / sigma;
                m[(k, k)] += w * w;
                rhs[k] += w * previous[k];
            }
            if !param.is_active() {
                for i in 0..NUM_PARAMETERS {
                    m[(k, i)] = 0.0;
                    m[(i, k)] = 0.0;
                }
                m[(k, k)] = 1.0;
                rhs[k] = 0.0;
            }
        }

        (m, rhs)
    }

    /// Solves the regularized system. `previous` are the increments of the
    /// previous iteration, `weight_m` the per observation standard error.
    pub fn solve(
        &self,
        apriori: &AprioriOpts,
        previous: &ParameterVector,
        weight_m: f64,
    ) -> Result<LeastSquares, Error> {
        let (m, rhs) = self.system(apriori, previous);
        let inv = cholesky_inverse(&m)?;
        let increments = inv * rhs;

        let mut fitted = Accumulator::new();
        for i in 0..NUM_PARAMETERS {
            fitted.add(increments[i] * rhs[i]);
        }

        let n = self.len();
        let residual_ssr = (self.ssr.value() - fitted.value()).max(0.0);
        let rms_m = if n > 0 {
            (residual_ssr / n as f64).sqrt() * weight_m
        } else {
            0.0
        };

        let dof = n.saturating_sub(Parameter::num_active()).max(1);
        let unit_variance = residual_ssr / dof as f64;

        let errors = ParameterVector::from_fn(|i, _| {
            if Parameter::ALL[i].is_active() {
                (inv[(i, i)] * unit_variance).sqrt()
            } else {
                0.0
            }
        });

        debug!(
            "normal equations: n={} ssr={:.6E} post-fit ssr={:.6E} rms={:.6E}m",
            n,
            self.ssr.value(),
            residual_ssr,
            rms_m
        );

        Ok(LeastSquares {
            increments,
            errors,
            rms_m,
        })
    }
}
