//! Delay models for forwarded events.
//!
//! Configured delays are in nanoseconds; samples are returned in the kernel's
//! delivery unit (picoseconds), hence the factor of [`DELAY_SCALE`].

use std::fmt;

use crate::rng::NodeRng;

/// Conversion from configured delay units to delivery time units.
pub const DELAY_SCALE: f64 = 1000.0;

/// Delay distribution, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayModel {
    /// No extra delay beyond the link latency.
    Constant,
    /// Exponentially distributed with mean `multiplier`.
    Exponential {
        /// Mean of the distribution, in configured units.
        multiplier: f64,
    },
    /// Uniform over `[min, max)`.
    Uniform {
        /// Lower bound, in configured units.
        min: f64,
        /// Upper bound, in configured units.
        max: f64,
    },
}

impl DelayModel {
    /// Build a model from its configured name and parameters.
    ///
    /// Unknown names fall back to [`DelayModel::Constant`].
    pub fn from_name(name: &str, multiplier: f64, min: f64, max: f64) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "constant" => DelayModel::Constant,
            "exponential" => DelayModel::Exponential { multiplier },
            "uniform" => {
                if min > max {
                    tracing::warn!(min, max, "uniform delay with min > max");
                }
                DelayModel::Uniform { min, max }
            }
            _ => {
                tracing::warn!(name, "unrecognized delay function, falling back to constant");
                DelayModel::Constant
            }
        }
    }

    /// Canonical name, as written to checkpoints.
    pub fn name(&self) -> &'static str {
        match self {
            DelayModel::Constant => "constant",
            DelayModel::Exponential { .. } => "exponential",
            DelayModel::Uniform { .. } => "uniform",
        }
    }

    /// Draw a delay in delivery units.
    ///
    /// Consumes one real from `rng` unless the model is constant.
    pub fn sample(&self, rng: &mut NodeRng) -> f64 {
        match *self {
            DelayModel::Constant => 0.0,
            DelayModel::Exponential { multiplier } => {
                // ln(0) is -inf; nudge the one unlucky draw onto the tail.
                let u = rng.next_uniform_real().max(f64::MIN_POSITIVE);
                -u.ln() * multiplier * DELAY_SCALE
            }
            DelayModel::Uniform { min, max } => {
                let u = rng.next_uniform_real();
                (min + (max - min) * u) * DELAY_SCALE
            }
        }
    }
}

impl fmt::Display for DelayModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayModel::Constant => write!(f, "constant"),
            DelayModel::Exponential { multiplier } => write!(f, "exponential({multiplier})"),
            DelayModel::Uniform { min, max } => write!(f, "uniform({min}, {max})"),
        }
    }
}
