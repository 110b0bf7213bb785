//! # Node Configuration
//!
//! The host kernel hands every component a flat, string-keyed parameter block.
//! [`Params`] models that block and [`NodeConfig::from_params`] turns it into
//! typed settings for one PHOLD node.
//!
//! ## Recognized Options
//!
//! | Key | Type | Default | Effect |
//! |-----|------|---------|--------|
//! | `i`, `j` | int | required | Grid row and column of this node |
//! | `rowCount`, `colCount` | int | required | Grid dimensions |
//! | `numRings` | int | 1 | Link slots = `(2*rings+1)^2` |
//! | `eventDensity` | float | 0.1 | Initial events per node (may be fractional) |
//! | `smallPayload` | int | 8 | Bytes in a small payload |
//! | `largePayload` | int | 1024 | Bytes in a large payload |
//! | `largeEventFraction` | float | 0.0 | Probability of drawing a large payload |
//! | `componentSize` | int | 0 | Bytes of auxiliary memory owned by the node |
//! | `movementFunction` | string | `random` | `random` or `cyclic` |
//! | `delayFunction` | string | `constant` | `constant`, `exponential` or `uniform` |
//! | `multiplier` | float | 1.0 | Exponential delay multiplier |
//! | `min`, `max` | float | 0.0, 1.0 | Uniform delay bounds |
//! | `timeToRun` | time | `1000ns` | Run duration, kept for checkpoints |
//! | `verbose` | flag | 0 | Emit `row,col:recvCount` at teardown |
//!
//! Missing or malformed values never abort construction here: they are logged
//! with `tracing::warn!` and replaced by the default. Missing position values
//! become [`UNSET_POSITION`], which [`crate::NodeIdentity::new`] rejects.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::delay::DelayModel;
use crate::error::{PholdError, PholdResult};
use crate::movement::MovementKind;
use crate::payload::PayloadConfig;
use crate::time::{SimTime, parse_time};

/// Sentinel recorded for a grid position parameter that was never supplied.
pub const UNSET_POSITION: i64 = -1;

/// Flat parameter block as supplied by the host kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    /// Create an empty parameter block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a parameter in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Raw string value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Typed lookup with a default.
    ///
    /// A value that fails to parse is reported and replaced by `default`.
    pub fn find<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Display,
    {
        match self.get(key) {
            None => default,
            Some(raw) => match raw.trim().parse() {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(
                        key,
                        value = raw,
                        "unparseable parameter, using default {}",
                        default
                    );
                    default
                }
            },
        }
    }

    /// Lookup of a parameter that has no meaningful default.
    ///
    /// An absent value is reported and replaced by `sentinel`.
    pub fn find_required<T>(&self, key: &str, sentinel: T) -> T
    where
        T: FromStr + Display + Copy,
    {
        if self.get(key).is_none() {
            tracing::warn!(key, "required parameter missing, using sentinel {}", sentinel);
            return sentinel;
        }
        self.find(key, sentinel)
    }

    /// Boolean flag lookup accepting `0`/`1`, `true`/`false`, `yes`/`no`.
    pub fn find_flag(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|raw| raw.trim().to_ascii_lowercase()) {
            None => default,
            Some(raw) => match raw.as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    tracing::warn!(key, value = %raw, "unparseable flag, using default {}", default);
                    default
                }
            },
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Typed configuration of a single PHOLD node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Grid row (`i`).
    pub row: i64,
    /// Grid column (`j`).
    pub col: i64,
    /// Number of grid rows.
    pub row_count: i64,
    /// Number of grid columns.
    pub col_count: i64,
    /// Rings of neighbors linked to this node.
    pub num_rings: u32,
    /// Initial events per node; the fractional part is spread over the grid.
    pub event_density: f64,
    /// Payload size distribution.
    pub payload: PayloadConfig,
    /// Bytes of auxiliary memory the node allocates and owns.
    pub component_size: usize,
    /// Neighbor selection policy.
    pub movement: MovementKind,
    /// Delay distribution for forwarded events.
    pub delay: DelayModel,
    /// Total simulated run time.
    pub time_to_run: SimTime,
    /// Emit a per-node summary line at teardown.
    pub verbose: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            row: UNSET_POSITION,
            col: UNSET_POSITION,
            row_count: UNSET_POSITION,
            col_count: UNSET_POSITION,
            num_rings: 1,
            event_density: 0.1,
            payload: PayloadConfig::default(),
            component_size: 0,
            movement: MovementKind::Random,
            delay: DelayModel::Constant,
            time_to_run: 1_000_000,
            verbose: false,
        }
    }
}

impl NodeConfig {
    /// Configuration for the node at `(row, col)` of a `rows x cols` grid,
    /// everything else at its default.
    pub fn at(row: i64, col: i64, row_count: i64, col_count: i64) -> Self {
        Self {
            row,
            col,
            row_count,
            col_count,
            ..Self::default()
        }
    }

    /// Read a node configuration out of a parameter block.
    pub fn from_params(params: &Params) -> Self {
        let defaults = Self::default();

        let movement_name: String = params.find("movementFunction", "random".to_string());
        let delay_name: String = params.find("delayFunction", "constant".to_string());
        let delay = DelayModel::from_name(
            &delay_name,
            params.find("multiplier", 1.0),
            params.find("min", 0.0),
            params.find("max", 1.0),
        );

        let time_to_run = match params.get("timeToRun") {
            None => defaults.time_to_run,
            Some(raw) => parse_time(raw).unwrap_or_else(|e| {
                tracing::warn!(value = raw, error = %e, "bad timeToRun, using default");
                defaults.time_to_run
            }),
        };

        let large_fraction: f64 = params.find("largeEventFraction", 0.0);
        if !(0.0..=1.0).contains(&large_fraction) {
            tracing::warn!(
                large_fraction,
                "largeEventFraction outside [0, 1], draws will saturate"
            );
        }

        Self {
            row: params.find_required("i", UNSET_POSITION),
            col: params.find_required("j", UNSET_POSITION),
            row_count: params.find_required("rowCount", UNSET_POSITION),
            col_count: params.find_required("colCount", UNSET_POSITION),
            num_rings: params.find("numRings", defaults.num_rings),
            event_density: params.find("eventDensity", defaults.event_density),
            payload: PayloadConfig {
                small_size: params.find("smallPayload", defaults.payload.small_size),
                large_size: params.find("largePayload", defaults.payload.large_size),
                large_fraction,
            },
            component_size: params.find("componentSize", defaults.component_size),
            movement: MovementKind::from_name(&movement_name),
            delay,
            time_to_run,
            verbose: params.find_flag("verbose", false),
        }
    }

    /// Number of link slots implied by the ring count.
    pub fn num_links(&self) -> PholdResult<usize> {
        num_links_for_rings(self.num_rings)
    }
}

/// Link slots for a node linked to `rings` layers of neighbors.
///
/// Fails with [`PholdError::TooManyRings`] when `(2*rings+1)^2` overflows.
pub fn num_links_for_rings(rings: u32) -> PholdResult<usize> {
    usize::try_from(rings)
        .ok()
        .and_then(|r| r.checked_mul(2))
        .and_then(|d| d.checked_add(1))
        .and_then(|side| side.checked_mul(side))
        .ok_or(PholdError::TooManyRings { rings })
}
