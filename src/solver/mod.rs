//! Orbit fitting
use log::{debug, info, warn};

use crate::{
    accumulator::mean_std,
    bias::{meteo_coverage, MeteoSource, SystemDelaySource},
    cfg::Config,
    clipping::clip,
    constants::{
        PICOSECONDS_PER_SECOND, RANGE_BIAS_LARGE_M, RANGE_BIAS_WARNING_M, SPEED_OF_LIGHT_M_S,
        TIME_BIAS_LARGE_S, TIME_BIAS_WARNING_S,
    },
    ephemeris::EphemerisSource,
    equations::{design_row, Parameter},
    geometry::PassGeometry,
    normal_point::normal_points,
    observation::{Observation, ObservationFlag},
    prelude::{Error, Warning},
    solutions::{IterationRecord, OrbitFit, Residual, Step},
    station::Station,
};

mod cholesky;
mod normal;
mod selection;
mod state;

pub use state::{Correction, CorrectionState};

use normal::NormalEquations;
use selection::{select, Rejection};

/// Everything one iteration produced
#[derive(Debug, Clone)]
pub(crate) struct IterationOutput {
    /// [CorrectionState] handed to the next iteration
    pub state: CorrectionState,
    /// Rejection thresholds handed to the next iteration
    pub rejection: Rejection,
    pub record: IterationRecord,
    /// One way residuals (m), evaluated with the incoming corrections
    pub residuals_m: Vec<f64>,
    /// Satellite elevations (radians)
    pub elevations_rad: Vec<f64>,
    /// Central data had to be selected by rank
    pub degenerate: bool,
}

/// [Solver] fits orbit corrections to a pass of range observations,
/// clips the residuals and forms normal points.
pub struct Solver {
    /// Solver parametrization
    pub cfg: Config,
    /// Ranging [Station]
    station: Station,
    /// Satellite prediction
    ephemeris: Box<dyn EphemerisSource>,
    /// Meteorological data, for the refraction model
    meteo: Option<Box<dyn MeteoSource>>,
    /// System delay calibration
    delays: Option<Box<dyn SystemDelaySource>>,
    /// Setup [Warning]s
    warnings: Vec<Warning>,
}

impl Solver {
    /// Creates a new orbit fitting [Solver].
    /// ## Inputs
    /// - cfg: [Config], verified here
    /// - station: ranging [Station], mandatory
    /// - ephemeris: satellite prediction
    /// - meteo: optional [MeteoSource]. Without meteorological data
    ///   the refraction delay is not modeled.
    /// - delays: optional [SystemDelaySource], only used when the ranges
    ///   were not corrected for the system delay already.
    pub fn new(
        cfg: &Config,
        station: Option<Station>,
        ephemeris: Box<dyn EphemerisSource>,
        meteo: Option<Box<dyn MeteoSource>>,
        delays: Option<Box<dyn SystemDelaySource>>,
    ) -> Result<Self, Error> {
        let station = station.ok_or(Error::MissingStationCoordinates)?;
        let mut warnings = cfg.validate()?;
        warnings.extend(ephemeris.warnings());

        for warning in warnings.iter() {
            warn!("{}", warning);
        }

        info!(
            "station lat={:.4}° lon={:.4}° h={:.1}m",
            station.latitude_deg, station.longitude_deg, station.height_m
        );

        Ok(Self {
            cfg: cfg.clone(),
            station,
            ephemeris,
            meteo,
            delays,
            warnings,
        })
    }

    /// Records a [Warning] of the run
    fn warn(warnings: &mut Vec<Warning>, warning: Warning) {
        warn!("{}", warning);
        warnings.push(warning);
    }

    /// Two way ranges (ps), corrected for the system delay
    fn calibrated_ranges(
        &self,
        observations: &[Observation],
        warnings: &mut Vec<Warning>,
    ) -> Vec<f64> {
        if self.cfg.system_delay_applied {
            return observations.iter().map(|obs| obs.range_ps).collect();
        }
        match &self.delays {
            Some(delays) => {
                Self::warn(warnings, Warning::SystemDelayApplied);
                observations
                    .iter()
                    .map(|obs| obs.range_ps - delays.system_delay(obs.epoch()))
                    .collect()
            },
            None => {
                Self::warn(warnings, Warning::MissingSystemDelay);
                observations.iter().map(|obs| obs.range_ps).collect()
            },
        }
    }

    /// Performs one iteration, starting from `state` and `rejection`.
    pub(crate) fn iterate(
        &self,
        geometry: &PassGeometry,
        iteration: usize,
        step: Step,
        state: &CorrectionState,
        rejection: &Rejection,
    ) -> Result<IterationOutput, Error> {
        let weight_m = self.cfg.solver.observation_se_m;

        let models = (0..geometry.len())
            .map(|i| geometry.model(i, state.totals()))
            .collect::<Vec<_>>();

        let residuals_m = models
            .iter()
            .enumerate()
            .map(|(i, model)| geometry.residual(i, model))
            .collect::<Vec<_>>();

        let selection = select(&residuals_m, rejection, Parameter::num_active());

        let (state, fit_rms_m) = match step {
            Step::Final => (state.clone(), selection.tight_rms_m),
            Step::Accumulate | Step::Settle => {
                let mut normal = NormalEquations::new();
                for i in selection.inliers.iter() {
                    let tp = geometry.observations[*i].tp;
                    let row = design_row(models[*i].partials, tp, weight_m);
                    normal.add(&row, residuals_m[*i] / weight_m);
                }

                let solution =
                    normal.solve(&self.cfg.solver.apriori, state.increments(), weight_m)?;

                debug!(
                    "iteration #{} increments: {:?}",
                    iteration,
                    solution.increments.as_slice()
                );

                let state = match step {
                    Step::Accumulate => state.accumulate(solution.increments, solution.errors),
                    _ => state.with_errors(solution.errors),
                };
                (state, solution.rms_m)
            },
        };

        let record = IterationRecord {
            iteration,
            step,
            points: selection.inliers.len(),
            tight_rms_m: selection.tight_rms_m,
            medium_rms_m: selection.medium_rms_m,
            full_rms_m: selection.full_rms_m,
            fit_rms_m,
        };

        Ok(IterationOutput {
            state,
            rejection: Rejection::next(iteration, selection.medium_rms_m),
            record,
            residuals_m,
            elevations_rad: models.iter().map(|m| m.elevation_rad).collect(),
            degenerate: selection.degenerate,
        })
    }

    /// Fits the orbit corrections to the [Observation]s (in arrival order),
    /// clips the residuals and forms the normal points.
    pub fn fit(&self, observations: &[Observation]) -> Result<OrbitFit, Error> {
        let mut warnings = self.warnings.clone();

        let (indices, observations): (Vec<usize>, Vec<Observation>) = observations
            .iter()
            .enumerate()
            .filter(|(_, obs)| self.cfg.include_noise || obs.flag != ObservationFlag::Noise)
            .map(|(i, obs)| (i, *obs))
            .unzip();

        let (first, last) = match (observations.first(), observations.last()) {
            (Some(first), Some(last)) => (first.epoch(), last.epoch()),
            _ => return Err(Error::NoObservations),
        };

        info!("{} observations from {} to {}", observations.len(), first, last);

        let ranges_ps = self.calibrated_ranges(&observations, &mut warnings);

        match &self.meteo {
            Some(meteo) => {
                if !meteo_coverage(&**meteo, first, last) {
                    Self::warn(&mut warnings, Warning::PoorMeteoCoverage);
                }
            },
            None => Self::warn(&mut warnings, Warning::MissingMeteo),
        }

        let geometry = PassGeometry::new(
            &self.station,
            self.ephemeris.as_ref(),
            self.meteo.as_deref(),
            &observations,
            &ranges_ps,
            self.cfg.wavelength_um,
        )?;

        let opts = &self.cfg.solver;

        let mut state = CorrectionState::default();
        let mut rejection = Rejection::default();
        let mut step = Step::Accumulate;
        let mut records = Vec::<IterationRecord>::new();
        let mut prefit_residuals_ps = Vec::new();
        let mut converged = false;
        let mut last_output: Option<IterationOutput> = None;

        for iteration in 1..=opts.max_iterations {
            let output = self.iterate(&geometry, iteration, step, &state, &rejection)?;

            if iteration == 1 {
                prefit_residuals_ps = output
                    .residuals_m
                    .iter()
                    .map(|r| meters_to_ps(*r))
                    .collect();
            }

            if output.degenerate {
                Self::warn(&mut warnings, Warning::DegenerateSelection(iteration));
            }

            let record = output.record;
            info!(
                "iteration #{:2} ({}): n={} rms={:.4}/{:.4}/{:.4}m fit={:.6}m",
                record.iteration,
                record.step,
                record.points,
                record.tight_rms_m,
                record.medium_rms_m,
                record.full_rms_m,
                record.fit_rms_m
            );

            let previous = records.last().map(|r| r.fit_rms_m);
            records.push(record);

            state = output.state.clone();
            rejection = output.rejection;

            let done = step == Step::Final;
            step = match step {
                Step::Accumulate => {
                    let settled = previous
                        .map(|prev| (prev - record.fit_rms_m).abs() < opts.convergence_m)
                        .unwrap_or(false);
                    if iteration > opts.min_iterations && settled {
                        converged = true;
                        Step::Settle
                    } else if iteration + 2 >= opts.max_iterations {
                        Step::Settle
                    } else {
                        Step::Accumulate
                    }
                },
                Step::Settle | Step::Final => Step::Final,
            };

            last_output = Some(output);
            if done {
                break;
            }
        }

        if !converged {
            warn!("iteration limit reached before convergence");
        }

        let output = last_output.ok_or(Error::NoObservations)?;

        let residuals_ps = output
            .residuals_m
            .iter()
            .map(|r| meters_to_ps(*r))
            .collect::<Vec<_>>();

        let clipping = clip(
            self.cfg.clipping,
            &residuals_ps,
            self.cfg.pulse_width_ps,
            &mut warnings,
        );

        let residuals = observations
            .iter()
            .enumerate()
            .map(|(i, obs)| Residual {
                index: indices[i],
                mjd: obs.mjd,
                sod: obs.sod,
                range_ps: ranges_ps[i],
                residual_ps: residuals_ps[i],
                elevation_deg: output.elevations_rad[i].to_degrees(),
                accepted: clipping.accepts(residuals_ps[i]),
            })
            .collect::<Vec<_>>();

        let (_, solve_rms_ps) = mean_std(residuals_ps.iter());
        let (_, final_rms_ps) = mean_std(
            residuals
                .iter()
                .filter(|r| r.accepted)
                .map(|r| &r.residual_ps),
        );

        self.correction_warnings(&state, &mut warnings);

        info!(
            "time bias: {} s, rate: {} s/min, accel: {} s/min²",
            state.time_bias(),
            state.time_bias_rate(),
            state.time_bias_accel()
        );
        info!(
            "radial: {} m, rate: {} m/min, accel: {} m/min²",
            state.radial(),
            state.radial_rate(),
            state.radial_accel()
        );
        info!(
            "solve rms: {:.2} ps, final rms: {:.2} ps ({}/{} accepted)",
            solve_rms_ps,
            final_rms_ps,
            residuals.iter().filter(|r| r.accepted).count(),
            residuals.len()
        );

        let normal_points = normal_points(
            &residuals,
            self.cfg.normal_point_length_s(),
            self.cfg.min_normal_point_obs(),
            self.cfg.fire_rate(),
        );

        info!("{} normal points", normal_points.len());

        Ok(OrbitFit {
            iterations: records,
            converged,
            corrections: state,
            prefit_residuals_ps,
            residuals,
            solve_rms_ps,
            final_rms_ps,
            clipping,
            normal_points,
            warnings,
        })
    }

    /// Reports large corrections
    fn correction_warnings(&self, state: &CorrectionState, warnings: &mut Vec<Warning>) {
        let time_bias = state.time_bias().value;
        if time_bias.abs() > TIME_BIAS_LARGE_S {
            Self::warn(warnings, Warning::LargeTimeBias(time_bias * 1.0E3));
        } else if time_bias.abs() > TIME_BIAS_WARNING_S {
            Self::warn(warnings, Warning::TimeBias(time_bias * 1.0E3));
        }

        let radial = state.radial().value;
        if radial.abs() > RANGE_BIAS_LARGE_M {
            Self::warn(warnings, Warning::LargeRangeBias(radial));
        } else if radial.abs() > RANGE_BIAS_WARNING_M {
            Self::warn(warnings, Warning::RangeBias(radial));
        }
    }
}

/// One way meters to picoseconds
fn meters_to_ps(meters: f64) -> f64 {
    meters / SPEED_OF_LIGHT_M_S * PICOSECONDS_PER_SECOND
}

#[cfg(test)]
mod test {
    use super::{select, Rejection, Solver};
    use crate::{
        equations::Parameter,
        geometry::PassGeometry,
        prelude::{Config, Duration},
        solutions::Step,
        solver::CorrectionState,
        tests::PassBuilder,
    };

    #[test]
    fn suppressed_slots() {
        let pass = PassBuilder {
            radial_m: 0.2,
            time_bias_s: 1.0E-4,
            noise_m: 0.003,
            ..Default::default()
        }
        .build();

        let cfg = Config::default()
            .with_normal_point_length(Duration::from_seconds(30.0))
            .with_min_normal_point_obs(10);

        let solver = Solver::new(
            &cfg,
            Some(pass.station.clone()),
            Box::new(pass.prediction.clone()),
            None,
            None,
        )
        .unwrap();

        let ranges_ps = pass
            .observations
            .iter()
            .map(|obs| obs.range_ps)
            .collect::<Vec<_>>();

        let geometry = PassGeometry::new(
            &pass.station,
            &pass.prediction,
            None,
            &pass.observations,
            &ranges_ps,
            cfg.wavelength_um,
        )
        .unwrap();

        let mut state = CorrectionState::default();
        let mut rejection = Rejection::default();

        for iteration in 1..=6 {
            let output = solver
                .iterate(&geometry, iteration, Step::Accumulate, &state, &rejection)
                .unwrap();

            for param in Parameter::ALL.iter().filter(|p| !p.is_active()) {
                let k = param.index();
                assert_eq!(output.state.totals()[k], 0.0, "{} at #{}", param, iteration);
                assert_eq!(output.state.increments()[k], 0.0, "{} at #{}", param, iteration);
            }

            assert_eq!(output.residuals_m.len(), pass.observations.len());
            assert_eq!(output.record.iteration, iteration);

            // rejection thresholds follow the medium scatter
            let selection = select(&output.residuals_m, &rejection, Parameter::num_active());
            assert_eq!(
                output.rejection,
                Rejection::next(iteration, selection.medium_rms_m)
            );

            state = output.state;
            rejection = output.rejection;
        }

        assert!((state.radial().value - 0.2).abs() < 5.0E-3);

        // final step leaves the corrections untouched
        let output = solver
            .iterate(&geometry, 7, Step::Final, &state, &rejection)
            .unwrap();
        assert_eq!(output.state, state);
    }
}
