//! Time-decay curves used by the reply model.
//!
//! Both curves take an elapsed duration and a scale constant in the same unit
//! as event timestamps.

use std::f64::consts::PI;

/// One day in milliseconds, the default for both `G` and `H`.
pub const ONE_DAY: f64 = 86_400_000.0;

/// Recharge curve `g(Δt, G) = (tanh(10Δt / (Gπ) − π) + 1) / 2`.
///
/// Close to 0 right after a send and saturating to 1 once roughly `G` has
/// elapsed, so a burst of messages carries less potential than spaced ones.
pub fn recharge(elapsed: f64, g: f64) -> f64 {
    (((10.0 * elapsed) / (g * PI) - PI).tanh() + 1.0) / 2.0
}

/// Half-life curve `h(Δt, H) = 2^(−Δt / H)`: 1 at zero, 0.5 at `H`.
pub fn half_life(elapsed: f64, h: f64) -> f64 {
    (-elapsed / h).exp2()
}
