use crate::prelude::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Residual clipping policy, applied to the flattened residuals
/// before forming normal points. Policies are mutually exclusive.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClippingMode {
    /// All residuals contribute to the normal points.
    #[default]
    None,

    /// Iterative symmetric clipping at `factor` × sigma about the running mean.
    /// `factor` is limited to [2.0, 5.0].
    Sigma {
        /// Rejection factor
        factor: f64,
    },

    /// Asymmetric clipping about the Leading Edge Half Maximum of the
    /// residual distribution. Accepted residuals lie in
    /// ]LEHM + lower_ps, LEHM + upper_ps[. When the leading edge cannot be
    /// fitted, these bounds are used as absolute limits.
    Lehm {
        /// Lower bound (ps), usually negative
        lower_ps: f64,
        /// Upper bound (ps)
        upper_ps: f64,
    },
}

impl ClippingMode {
    /// Builds a [ClippingMode] from the two independent user requests.
    /// Both may not be active at the same time.
    pub fn from_options(sigma: Option<f64>, lehm: Option<(f64, f64)>) -> Result<Self, Error> {
        match (sigma, lehm) {
            (Some(_), Some(_)) => Err(Error::ClippingConflict),
            (Some(factor), None) => Self::sigma(factor),
            (None, Some((a, b))) => Self::lehm(a, b),
            (None, None) => Ok(Self::None),
        }
    }

    /// Builds [ClippingMode::Sigma], verifying the factor range.
    pub fn sigma(factor: f64) -> Result<Self, Error> {
        if !(2.0..=5.0).contains(&factor) {
            return Err(Error::InvalidClipFactor(factor));
        }
        Ok(Self::Sigma { factor })
    }

    /// Builds [ClippingMode::Lehm]. Bounds may be given in any order.
    pub fn lehm(a_ps: f64, b_ps: f64) -> Result<Self, Error> {
        if !a_ps.is_finite() || !b_ps.is_finite() || a_ps == b_ps {
            return Err(Error::InvalidLehmWindow);
        }
        Ok(Self::Lehm {
            lower_ps: a_ps.min(b_ps),
            upper_ps: a_ps.max(b_ps),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        match *self {
            Self::None => Ok(()),
            Self::Sigma { factor } => Self::sigma(factor).map(|_| ()),
            Self::Lehm { lower_ps, upper_ps } => {
                if !lower_ps.is_finite() || !upper_ps.is_finite() || lower_ps >= upper_ps {
                    Err(Error::InvalidLehmWindow)
                } else {
                    Ok(())
                }
            },
        }
    }
}

impl std::fmt::Display for ClippingMode {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::None => write!(fmt, "none"),
            Self::Sigma { factor } => write!(fmt, "sigma:{}", factor),
            Self::Lehm { lower_ps, upper_ps } => write!(fmt, "lehm:{}:{}", lower_ps, upper_ps),
        }
    }
}

impl std::str::FromStr for ClippingMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let mut items = s.split(':');
        match items.next() {
            Some("none") | Some("") => Ok(Self::None),
            Some("sigma") => {
                let factor = items
                    .next()
                    .and_then(|f| f.trim().parse::<f64>().ok())
                    .ok_or(Error::InvalidClipFactor(f64::NAN))?;
                Self::sigma(factor)
            },
            Some("lehm") => {
                let bounds = items
                    .map(|b| b.trim().parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| Error::InvalidLehmWindow)?;
                if bounds.len() != 2 {
                    return Err(Error::InvalidLehmWindow);
                }
                Self::lehm(bounds[0], bounds[1])
            },
            _ => Err(Error::InvalidLehmWindow),
        }
    }
}
