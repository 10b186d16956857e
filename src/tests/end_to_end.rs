use log::info;

use crate::{
    constants::{PICOSECONDS_PER_SECOND, SPEED_OF_LIGHT_M_S},
    prelude::{ClippingMode, Config, Duration, Solver, Warning},
    tests::{init_logger, PassBuilder},
};

/// Ranging noise (1 sigma, meters)
const NOISE_M: f64 = 0.1;

#[test]
fn pass_processing() {
    init_logger();

    // 10 Hz laser, 1000 returns over 10 minutes, 10 cm ranging noise, exact orbit
    let pass = PassBuilder {
        observations: 1000,
        noise_m: NOISE_M,
        seed: 42,
        ..Default::default()
    }
    .build();

    let cfg = Config::default()
        .with_normal_point_length(Duration::from_seconds(30.0))
        .with_min_normal_point_obs(20)
        .with_fire_rate(10.0)
        .with_clipping(ClippingMode::sigma(3.0).unwrap());

    let solver = Solver::new(
        &cfg,
        Some(pass.station.clone()),
        Box::new(pass.prediction.clone()),
        None,
        None,
    )
    .unwrap();

    let fit = solver.fit(&pass.observations).unwrap();

    for record in fit.iterations.iter() {
        info!(
            "#{} {}: n={} fit={:.4}m",
            record.iteration, record.step, record.points, record.fit_rms_m
        );
    }

    assert!(fit.converged);

    for (param, correction) in [
        ("radial", fit.corrections.radial()),
        ("time bias", fit.corrections.time_bias()),
        ("radial rate", fit.corrections.radial_rate()),
        ("time bias rate", fit.corrections.time_bias_rate()),
    ] {
        assert!(correction.error > 0.0, "{} has no formal error", param);
        assert!(
            correction.value.abs() < 3.0 * correction.error,
            "{}: {}",
            param,
            correction
        );
    }
    assert!(fit.corrections.radial().error < 0.05);

    // uniform noise never exceeds 3 sigma
    assert_eq!(fit.accepted(), fit.residuals.len());

    // 10 cm: 333.6 ps one way
    assert!(fit.final_rms_ps > 280.0 && fit.final_rms_ps < 380.0, "rms {}", fit.final_rms_ps);

    assert_eq!(fit.normal_points.len(), 20);

    let noise_ps = NOISE_M / SPEED_OF_LIGHT_M_S * PICOSECONDS_PER_SECOND;

    for np in fit.normal_points.iter() {
        assert!(np.count > 20);
        let bound = 3.0 * noise_ps / (np.count as f64).sqrt();
        assert!(np.mean_ps.abs() < bound, "np mean {} ps", np.mean_ps);

        // about 50 returns in 30 s at 10 Hz
        assert!(np.return_rate_pct > 10.0 && np.return_rate_pct < 25.0);

        let representative = fit
            .residuals
            .iter()
            .find(|r| r.mjd == np.mjd && r.sod == np.sod)
            .unwrap();

        let expected_s = representative.range_ps * 1.0E-12
            + 2.0 * (np.mean_ps - representative.residual_ps) * 1.0E-12;
        assert!((np.range_s - expected_s).abs() < 1.0E-15);
    }

    assert!(fit.warnings.contains(&Warning::MissingMeteo));
    assert!(fit.warnings.contains(&Warning::MissingSystemDelay));
    assert!(!fit.warnings.contains(&Warning::DefaultNormalPointLength(30.0)));
}

#[cfg(feature = "serde")]
#[test]
fn solution_serialization() {
    init_logger();

    let pass = PassBuilder {
        noise_m: 0.01,
        ..Default::default()
    }
    .build();

    let solver = Solver::new(
        &Config::default(),
        Some(pass.station.clone()),
        Box::new(pass.prediction.clone()),
        None,
        None,
    )
    .unwrap();

    let fit = solver.fit(&pass.observations).unwrap();
    let content = serde_json::to_string(&fit).unwrap();
    assert!(content.contains("normal_points"));
    assert!(content.contains("MissingFireRate"));
}
