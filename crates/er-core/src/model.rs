//! Model variants and their parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decay::{ONE_DAY, half_life, recharge};
use crate::error::RankError;

/// Default flow fraction `f`.
pub const DEFAULT_FLOW: f64 = 0.8;

/// How much potential an event moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelKind {
    /// Constant transfer `α = f`, ignoring timing.
    Baseline,
    /// Transfer scaled by time since the sender last sent and since the
    /// sender last heard from the recipients.
    #[default]
    Reply,
}

impl ModelKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Reply => "reply",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseline" => Ok(Self::Baseline),
            "reply" => Ok(Self::Reply),
            _ => Err(RankError::Configuration(format!("unknown model type: {s}"))),
        }
    }
}

impl Serialize for ModelKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Validated model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub model: ModelKind,
    /// Recharge constant `G`.
    pub recharge: f64,
    /// Half-life constant `H`.
    pub half_life: f64,
    /// Flow fraction `f`.
    pub flow: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            model: ModelKind::Reply,
            recharge: ONE_DAY,
            half_life: ONE_DAY,
            flow: DEFAULT_FLOW,
        }
    }
}

impl Params {
    /// Checks `G > 0`, `H > 0` and `0 <= f <= 1`.
    pub fn new(model: ModelKind, recharge: f64, half_life: f64, flow: f64) -> Result<Self, RankError> {
        if !(recharge.is_finite() && recharge > 0.0) {
            return Err(RankError::Configuration(format!(
                "G must be a positive duration, got {recharge}"
            )));
        }
        if !(half_life.is_finite() && half_life > 0.0) {
            return Err(RankError::Configuration(format!(
                "H must be a positive duration, got {half_life}"
            )));
        }
        if !(0.0..=1.0).contains(&flow) {
            return Err(RankError::Configuration(format!(
                "f must be between 0 and 1, got {flow}"
            )));
        }
        Ok(Self {
            model,
            recharge,
            half_life,
            flow,
        })
    }

    /// Potential `α` for an event.
    ///
    /// `since_send` is the time since the sender last sent anything and
    /// `since_receipt` the time since the sender last received from any of the
    /// recipients; `None` means it never happened. A sender that never sent is
    /// fully recharged, and a message that answers nothing is not attenuated.
    /// Taking the half-life at an infinite gap instead would give `h = 0` and
    /// zero the potential of every first contact.
    #[expect(
        clippy::cast_precision_loss,
        reason = "time differentials are far below 2^52"
    )]
    pub fn potential(&self, since_send: Option<i64>, since_receipt: Option<i64>) -> f64 {
        match self.model {
            ModelKind::Baseline => self.flow,
            ModelKind::Reply => {
                let g = since_send.map_or(1.0, |dt| recharge(dt as f64, self.recharge));
                let h = since_receipt.map_or(1.0, |dt| half_life(dt as f64, self.half_life));
                self.flow * g * h
            }
        }
    }
}
