use rand::{rngs::SmallRng, Rng, SeedableRng};
use rstest::*;

use crate::{
    clipping::{clip, SIGMA_CLIP_TOLERANCE_PS},
    prelude::{ClippingMode, Warning},
    tests::init_logger,
};

/// Normally distributed sample (Box-Muller)
fn gauss(rng: &mut SmallRng, sigma: f64) -> f64 {
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Exponentially distributed sample
fn exponential(rng: &mut SmallRng, mean: f64) -> f64 {
    -mean * (1.0 - rng.random::<f64>()).ln()
}

/// Single photon like residual distribution (ps): gaussian core,
/// exponential trailing tail and uniform background.
fn single_photon(seed: u64) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut residuals = Vec::with_capacity(6600);
    for _ in 0..5000 {
        residuals.push(gauss(&mut rng, 20.0));
    }
    for _ in 0..1500 {
        residuals.push(exponential(&mut rng, 60.0));
    }
    for _ in 0..100 {
        residuals.push(rng.random_range(-1000.0..1000.0));
    }
    // arrival order is irrelevant but realistic
    for i in (1..residuals.len()).rev() {
        let j = rng.random_range(0..=i);
        residuals.swap(i, j);
    }
    residuals
}

#[test]
fn sigma_clipping() {
    init_logger();

    let mut rng = SmallRng::seed_from_u64(1);
    let mut residuals = (0..2000).map(|_| gauss(&mut rng, 20.0)).collect::<Vec<_>>();
    for k in 0..20 {
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        residuals.push(sign * (500.0 + 25.0 * k as f64));
    }

    let mut warnings = Vec::new();
    let outcome = clip(
        ClippingMode::sigma(3.0).unwrap(),
        &residuals,
        None,
        &mut warnings,
    );

    let sigma = outcome.sigma.unwrap();
    assert!(sigma.iterations >= 2);
    assert!(sigma.rms_ps > 17.0 && sigma.rms_ps < 22.0, "rms {}", sigma.rms_ps);
    assert!(sigma.mean_ps.abs() < 3.0);

    let (lower, upper) = outcome.bounds_ps.unwrap();
    assert_eq!((lower, upper), sigma.bounds());

    for r in residuals.iter().filter(|r| r.abs() >= 500.0) {
        assert!(!outcome.accepts(*r), "outlier {} accepted", r);
    }

    let accepted = residuals
        .iter()
        .copied()
        .filter(|r| outcome.accepts(*r))
        .collect::<Vec<_>>();

    assert!(accepted.len() > 1950);

    // clipping the accepted residuals again barely changes anything
    let mut warnings = Vec::new();
    let again = clip(
        ClippingMode::sigma(3.0).unwrap(),
        &accepted,
        None,
        &mut warnings,
    );

    let resigma = again.sigma.unwrap();
    assert!((resigma.rms_ps - sigma.rms_ps).abs() < SIGMA_CLIP_TOLERANCE_PS);

    let kept = accepted.iter().filter(|r| again.accepts(**r)).count();
    assert!(kept as f64 >= 0.99 * accepted.len() as f64);
}

#[test]
fn fast_sigma_clipping() {
    init_logger();

    // two clusters: the first estimate already retains everything
    let residuals = (0..100)
        .map(|i| if i % 2 == 0 { -10.0 } else { 10.0 })
        .collect::<Vec<_>>();

    let mut warnings = Vec::new();
    let outcome = clip(ClippingMode::sigma(2.5).unwrap(), &residuals, None, &mut warnings);

    let sigma = outcome.sigma.unwrap();
    assert!(sigma.iterations < 5);
    assert_eq!(
        warnings,
        vec![Warning::FastSigmaClipping {
            iterations: sigma.iterations,
            factor: 2.5
        }]
    );
    assert!(residuals.iter().all(|r| outcome.accepts(*r)));
}

#[rstest]
#[case(0)]
#[case(3)]
#[case(11)]
fn lehm_clipping(#[case] seed: u64) {
    init_logger();

    let residuals = single_photon(seed);

    let mut warnings = Vec::new();
    let outcome = clip(
        ClippingMode::lehm(-100.0, 500.0).unwrap(),
        &residuals,
        None,
        &mut warnings,
    );

    let fit = outcome.lehm.unwrap();
    assert!(
        fit.lehm_ps > -30.0 && fit.lehm_ps < -12.0,
        "LEHM {} ps",
        fit.lehm_ps
    );

    if let Some(fehm) = fit.fehm_ps {
        assert!(fehm > fit.lehm_ps);
    }

    assert!(fit.attempts >= 1 && fit.attempts <= 12);
    assert!(fit.front.amplitude > 0.0);

    let (lower, upper) = outcome.bounds_ps.unwrap();
    assert!((lower - (fit.lehm_ps - 100.0)).abs() < 1.0E-9);
    assert!((upper - (fit.lehm_ps + 500.0)).abs() < 1.0E-9);

    assert!(!outcome.accepts(-1000.0));
    assert!(!outcome.accepts(1000.0));
    assert!(outcome.accepts(0.0));

    assert!(!warnings
        .iter()
        .any(|w| matches!(w, Warning::FrontFitFailure(_))));
}

#[test]
fn lehm_pulse_width() {
    init_logger();

    let mut rng = SmallRng::seed_from_u64(5);
    let residuals = (0..5000).map(|_| gauss(&mut rng, 20.0)).collect::<Vec<_>>();

    let mut warnings = Vec::new();
    let outcome = clip(
        ClippingMode::lehm(-60.0, 60.0).unwrap(),
        &residuals,
        Some(10.0),
        &mut warnings,
    );

    // the front gaussian of a 20 ps scatter is too wide for a 10 ps pulse
    let fit = outcome.lehm.unwrap();
    assert!(fit.lehm_ps > -30.0 && fit.lehm_ps < -15.0, "LEHM {} ps", fit.lehm_ps);
}

#[test]
fn lehm_fallback() {
    init_logger();

    // no spread: no front to fit
    let residuals = vec![5.0; 200];

    let mut warnings = Vec::new();
    let outcome = clip(
        ClippingMode::lehm(-50.0, 50.0).unwrap(),
        &residuals,
        None,
        &mut warnings,
    );

    assert!(outcome.lehm.is_none());
    assert_eq!(outcome.bounds_ps, Some((-50.0, 50.0)));
    assert_eq!(warnings, vec![Warning::FrontFitFailure(200)]);
    assert!(outcome.accepts(5.0));
    assert!(!outcome.accepts(50.0));
}

#[test]
fn no_clipping() {
    let residuals = vec![-1.0E6, 0.0, 1.0E6];
    let mut warnings = Vec::new();
    let outcome = clip(ClippingMode::None, &residuals, None, &mut warnings);
    assert!(outcome.bounds_ps.is_none());
    assert!(residuals.iter().all(|r| outcome.accepts(*r)));
    assert!(warnings.is_empty());
}
