use itertools::Itertools;
use log::{debug, warn};
use std::cmp::Ordering;

use crate::{
    accumulator::mean_std,
    clipping::{gaussian::Gaussian, histogram::Histogram},
    prelude::Warning,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of bins describing the peak region
const PEAK_REGION: usize = 19;

/// Maximal spread of the peak region (ps)
const PEAK_SPREAD_PS: f64 = 5.0;

/// Front window extent ahead of the peak, without pulse width (ps)
const FRONT_EXTENT_PS: f64 = 50.0;

/// Fraction of the maximum that the front window must include
const FRONT_LEVEL: f64 = 0.25;

/// Front fit attempts
const MAX_ATTEMPTS: usize = 12;

/// Tolerated amplitude mismatch with the smoothed profile
const AMPLITUDE_TOLERANCE: f64 = 0.05;

/// Tolerated front width, in pulse widths
const MAX_WIDTH_PULSES: f64 = 2.5;

/// Number of samples in the half maximum interpolation
const HALF_MAX_SAMPLES: usize = 6;

/// Leading edge analysis of the residual distribution
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LehmFit {
    /// [Gaussian] fitted to the leading edge (ps)
    pub front: Gaussian,
    /// Leading Edge Half Maximum (ps)
    pub lehm_ps: f64,
    /// Falling Edge Half Maximum (ps)
    pub fehm_ps: Option<f64>,
    /// Histogram bin width (ps)
    pub bin_ps: f64,
    /// Number of front fit attempts
    pub attempts: usize,
}

/// Front fit window, as histogram bin indices [start, end[
#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    start: usize,
    end: usize,
}

/// Verdict on one front fit attempt
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verdict {
    Accept,
    /// Amplitude inconsistent with the profile: window to try next
    Amplitude(Window),
    /// Too wide for the laser pulse: window to try next
    TooWide(Window),
}

/// Assesses a front fit and proposes the next window when it is rejected.
fn assess(
    front: &Gaussian,
    window: Window,
    peak: f64,
    pulse_width: Option<f64>,
    len: usize,
) -> Verdict {
    if (front.amplitude - peak).abs() > AMPLITUDE_TOLERANCE * peak {
        return Verdict::Amplitude(Window {
            start: window.start.saturating_sub(1),
            end: (window.end + 2).min(len),
        });
    }
    if let Some(width) = pulse_width {
        if front.sigma > MAX_WIDTH_PULSES * width {
            let start = window.start.saturating_sub(1);
            return Verdict::TooWide(Window {
                start,
                end: (window.end.saturating_sub(1)).max(start + 3).min(len),
            });
        }
    }
    Verdict::Accept
}

/// Last front fit attempt
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrontFit {
    front: Gaussian,
    verdict: Verdict,
    attempts: usize,
}

/// Fits a [Gaussian] to the leading edge, moving the window until the fit
/// is accepted or the attempts are exhausted. A fit that cannot be obtained
/// counts as a null amplitude fit, so the window widens.
fn fit_front(
    histogram: &Histogram,
    mut window: Window,
    initial: Gaussian,
    peak: f64,
    pulse_width: Option<f64>,
) -> FrontFit {
    let n = histogram.len();
    let null = Gaussian {
        amplitude: 0.0,
        ..initial
    };

    let mut front = null;
    let mut verdict = Verdict::Accept;
    let mut attempts = 0;

    while attempts < MAX_ATTEMPTS {
        attempts += 1;
        let end = window.end.min(n);
        let start = window.start.min(end);

        front = Gaussian::fit(
            &histogram.edges[start..end],
            &histogram.counts[start..end],
            initial,
        )
        .unwrap_or(null);

        debug!(
            "front fit #{} [{}, {}[: amplitude={:.1} center={:.1}ps sigma={:.1}ps",
            attempts, start, end, front.amplitude, front.center, front.sigma
        );

        verdict = assess(&front, window, peak, pulse_width, n);
        match verdict {
            Verdict::Accept => break,
            Verdict::Amplitude(next) | Verdict::TooWide(next) => window = next,
        }
    }

    FrontFit {
        front,
        verdict,
        attempts,
    }
}

/// Peak bin index: mean index of the peak region, once
/// trimmed from its trailing side down to a narrow spread.
fn peak_index(histogram: &Histogram) -> usize {
    let profile = &histogram.profile;
    let n = profile.len();

    let ranked = (0..n)
        .sorted_by(|a, b| {
            profile[*a]
                .partial_cmp(&profile[*b])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(b))
        })
        .collect::<Vec<_>>();

    // highest bins, excluding the very top one
    let mut region = ranked
        .iter()
        .rev()
        .skip(1)
        .take(PEAK_REGION)
        .copied()
        .sorted()
        .collect::<Vec<_>>();

    if region.is_empty() {
        return ranked.last().copied().unwrap_or_default();
    }

    while region.len() > 3 {
        let (_, spread) = mean_std(region.iter().map(|k| &histogram.centers[*k]));
        if spread <= PEAK_SPREAD_PS {
            break;
        }
        region.pop();
    }

    let mean = region.iter().sum::<usize>() as f64 / region.len() as f64;
    (mean as usize + 1).min(n)
}

/// Abscissa where y = level, from a least squares line through
/// the samples whose ordinate is the closest to the level.
fn half_maximum(x: &[f64], y: &[f64], level: f64) -> Option<f64> {
    let nearest = (0..y.len())
        .sorted_by(|a, b| {
            (y[*a] - level)
                .abs()
                .partial_cmp(&(y[*b] - level).abs())
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(b))
        })
        .take(HALF_MAX_SAMPLES)
        .collect::<Vec<_>>();

    if nearest.len() < 2 {
        return None;
    }

    let ordinates = nearest.iter().map(|k| y[*k]).collect::<Vec<_>>();
    let abscissas = nearest.iter().map(|k| x[*k]).collect::<Vec<_>>();

    let line = polyfit_rs::polyfit_rs::polyfit(&ordinates, &abscissas, 1).ok()?;
    let value = line[0] + line[1] * level;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Leading edge analysis of the residuals (ps).
/// Returns None when the front fit fails: caller should then use absolute bounds.
pub(crate) fn lehm_fit(
    residuals: &[f64],
    pulse_width: Option<f64>,
    warnings: &mut Vec<Warning>,
) -> Option<LehmFit> {
    let (_, rms) = mean_std(residuals);
    let histogram = match Histogram::new(residuals, rms, warnings) {
        Some(histogram) => histogram,
        None => {
            warn!("front gaussian fit failure: residuals do not span a single bin");
            warnings.push(Warning::FrontFitFailure(residuals.len()));
            return None;
        },
    };
    let n = histogram.len();
    let step = histogram.step;

    let peak_max = histogram.profile.iter().copied().fold(0.0, f64::max);
    let am = peak_index(&histogram);

    let first_above = histogram
        .profile
        .iter()
        .position(|p| *p > FRONT_LEVEL * peak_max)
        .unwrap_or(0);

    let extent = match pulse_width {
        Some(width) => 3.0 * width,
        None => FRONT_EXTENT_PS,
    };
    let al = am.saturating_sub((extent / step) as usize).min(first_above);

    let initial = Gaussian {
        amplitude: peak_max,
        center: 0.0,
        sigma: rms,
    };

    let FrontFit {
        front,
        verdict,
        attempts,
    } = fit_front(
        &histogram,
        Window { start: al, end: am },
        initial,
        peak_max,
        pulse_width,
    );

    if front.amplitude == 0.0 {
        warn!("front gaussian fit failure after {} attempts", attempts);
        warnings.push(Warning::FrontFitFailure(residuals.len()));
        return None;
    }

    match verdict {
        Verdict::Accept => {},
        Verdict::Amplitude(_) => {
            warn!("front gaussian fit - too tall/short");
            warnings.push(Warning::FrontFitAmplitude);
        },
        Verdict::TooWide(_) => {
            let width = pulse_width.unwrap_or_default();
            warn!("front gaussian fit - too wide for {} ps pulse", width);
            warnings.push(Warning::FrontFitTooWide(width));
        },
    }

    let half = front.amplitude / 2.0;

    // leading edge: fitted front, ahead of its center
    let rising = histogram
        .edges
        .iter()
        .take_while(|e| **e < front.center)
        .map(|e| (e + step / 2.0, front.eval(*e)))
        .collect::<Vec<_>>();

    let (x, y): (Vec<f64>, Vec<f64>) = rising.into_iter().unzip();
    let lehm_ps = match half_maximum(&x, &y, half) {
        Some(lehm) => lehm,
        None => {
            warn!("front gaussian fit failure: leading edge not sampled");
            warnings.push(Warning::FrontFitFailure(residuals.len()));
            return None;
        },
    };

    // falling edge: smoothed profile, after the peak
    let tail = am.min(n.saturating_sub(1))..n.saturating_sub(1);
    let fehm_ps = half_maximum(
        &histogram.centers[tail.clone()],
        &histogram.profile[tail],
        half,
    );

    debug!(
        "LEHM={:.3}ps FEHM={:?}ps (peak {:.3}ps)",
        lehm_ps, fehm_ps, front.center
    );

    Some(LehmFit {
        front,
        lehm_ps,
        fehm_ps,
        bin_ps: step,
        attempts,
    })
}
