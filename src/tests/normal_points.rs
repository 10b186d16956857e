use rstest::*;
use std::collections::HashSet;

use crate::{normal_point::normal_points, solutions::Residual, tests::MJD};

/// One residual per second, from `start` (seconds of day)
fn residuals(start: f64, count: usize) -> Vec<Residual> {
    (0..count)
        .map(|i| Residual {
            index: i,
            mjd: MJD,
            sod: start + i as f64,
            range_ps: 4.0E7,
            residual_ps: if i % 2 == 0 { 5.0 } else { -5.0 },
            elevation_deg: 60.0,
            accepted: true,
        })
        .collect()
}

#[rstest]
#[case(30.0, 29, 4)]
#[case(30.0, 30, 0)]
#[case(60.0, 59, 2)]
#[case(60.0, 30, 2)]
#[case(15.0, 14, 8)]
fn minimum_observations(#[case] length_s: f64, #[case] min_obs: usize, #[case] expected: usize) {
    // 120 residuals, aligned on 30 s bins
    let residuals = residuals(43_200.0, 120);
    let points = normal_points(&residuals, length_s, min_obs, Some(1.0));
    assert_eq!(points.len(), expected);
    for np in points.iter() {
        assert!(np.count > min_obs);
        assert_eq!(np.length.to_seconds(), length_s);
    }
}

#[test]
fn contributing_residuals() {
    let mut residuals = residuals(43_210.0, 100);
    // rejected residuals never contribute
    for (i, r) in residuals.iter_mut().enumerate() {
        if i % 7 == 0 {
            r.accepted = false;
        }
    }

    let points = normal_points(&residuals, 30.0, 5, Some(1.0));

    // bins: [43_200, 43_230[ [43_230, 43_260[ [43_260, 43_290[ [43_290, 43_320[
    assert_eq!(points.len(), 4);

    let mut union = HashSet::new();
    for np in points.iter() {
        assert_eq!(np.indices.len(), np.count);
        for index in np.indices.iter() {
            assert!(union.insert(*index), "index {} used twice", index);
            assert!(residuals[*index].accepted);
        }
        // representative epoch is one of the contributing residuals
        assert!(np.indices.iter().any(|k| residuals[*k].sod == np.sod));
    }

    let accepted = residuals
        .iter()
        .filter(|r| r.accepted)
        .map(|r| r.index)
        .collect::<HashSet<_>>();

    assert_eq!(union, accepted);

    // 20 accepted out of 20 s, then 30 s bins at 1 Hz
    assert!(points[0].return_rate_pct > 90.0);
    assert!(points.iter().all(|np| np.return_rate_pct <= 100.0));

    assert!(points.iter().all(|np| np.mean_ps.abs() <= 5.0));
    assert!(points.iter().all(|np| np.two_sigma_ps <= 10.0 + 1.0E-9));
}
