use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use log::debug;
use nalgebra::{storage::Owned, DVector, Dyn, OMatrix, Vector3, U3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A.exp(-(x - center)² / 2σ²)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gaussian {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
}

impl Gaussian {
    pub fn eval(&self, x: f64) -> f64 {
        self.amplitude * (-(x - self.center).powi(2) / (2.0 * self.sigma.powi(2))).exp()
    }

    /// Partial derivatives with respect to amplitude, center and sigma
    fn gradient(&self, x: f64) -> Vector3<f64> {
        let dx = x - self.center;
        let e = (-dx.powi(2) / (2.0 * self.sigma.powi(2))).exp();
        Vector3::new(
            e,
            self.amplitude * e * dx / self.sigma.powi(2),
            self.amplitude * e * dx.powi(2) / self.sigma.powi(3),
        )
    }

    fn params(&self) -> Vector3<f64> {
        Vector3::new(self.amplitude, self.center, self.sigma)
    }

    fn from_params(params: &Vector3<f64>) -> Self {
        Self {
            amplitude: params[0],
            center: params[1],
            sigma: params[2],
        }
    }

    /// Levenberg-Marquardt least squares fit of a [Gaussian] to (x, y),
    /// starting from `initial`. Returns None when the problem is
    /// under determined, when the minimization does not terminate
    /// successfully or when the fitted amplitude is null.
    pub fn fit(x: &[f64], y: &[f64], initial: Gaussian) -> Option<Self> {
        if x.len() < 3 || x.len() != y.len() || initial.sigma == 0.0 {
            return None;
        }

        let problem = GaussianProblem {
            x,
            y,
            gaussian: initial,
        };

        let (problem, report) = LevenbergMarquardt::new().minimize(problem);

        if !report.termination.was_successful() {
            debug!("gaussian fit: {:?}", report.termination);
            return None;
        }

        let mut fit = problem.gaussian;
        if fit.amplitude == 0.0 || !fit.amplitude.is_finite() || !fit.center.is_finite() {
            return None;
        }

        fit.sigma = fit.sigma.abs();
        Some(fit)
    }
}

/// Residuals of a [Gaussian] with respect to sampled (x, y)
struct GaussianProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    gaussian: Gaussian,
}

impl LeastSquaresProblem<f64, Dyn, U3> for GaussianProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U3>;
    type ParameterStorage = Owned<f64, U3>;

    fn set_params(&mut self, params: &Vector3<f64>) {
        self.gaussian = Gaussian::from_params(params);
    }

    fn params(&self) -> Vector3<f64> {
        self.gaussian.params()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        if self.gaussian.sigma == 0.0 {
            return None;
        }
        Some(DVector::from_iterator(
            self.x.len(),
            self.x
                .iter()
                .zip(self.y.iter())
                .map(|(x, y)| self.gaussian.eval(*x) - y),
        ))
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U3>> {
        if self.gaussian.sigma == 0.0 {
            return None;
        }
        let mut jacobian = OMatrix::<f64, Dyn, U3>::zeros(self.x.len());
        for (i, x) in self.x.iter().enumerate() {
            jacobian.set_row(i, &self.gaussian.gradient(*x).transpose());
        }
        Some(jacobian)
    }
}
