use std::fmt;

use crate::domain::grid2d::{CellSize2D, Field2D};

/// Which stability bound decided the step size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestepLimit {
    Diffusion,
    AdvectionX,
    AdvectionY,
    Thermal,
    Species,
    Reaction,
    /// Adaptive control is off and the configured step is used as is.
    Fixed,
}

impl fmt::Display for TimestepLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Diffusion => "momentum diffusion",
            Self::AdvectionX => "advection in x",
            Self::AdvectionY => "advection in y",
            Self::Thermal => "thermal diffusion",
            Self::Species => "species diffusion",
            Self::Reaction => "reaction positivity",
            Self::Fixed => "fixed step",
        };
        f.write_str(name)
    }
}

/// Every individual stability bound of one step, before the safety factor.
///
/// A bound that cannot bind (zero velocity, no species, nothing consumed)
/// holds `f64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestepBounds {
    pub diffusion: f64,
    pub advection_x: f64,
    pub advection_y: f64,
    pub thermal: f64,
    pub species: f64,
    pub reaction: f64,
}

impl TimestepBounds {
    pub fn new(
        cell_size: CellSize2D,
        reynolds: f64,
        prandtl: f64,
        max_lambda: Option<f64>,
        (umax, vmax): (f64, f64),
        reaction: f64,
    ) -> Self {
        let CellSize2D(dx, dy) = cell_size;
        let inv = cell_size.inverse_square_sum();
        let sentinel_div = |h: f64, speed: f64| if speed > 0.0 { h / speed } else { f64::MAX };
        let species = match max_lambda {
            Some(lambda) if lambda > 0.0 => 1.0 / (2.0 * lambda * inv),
            _ => f64::MAX,
        };
        Self {
            diffusion: reynolds / 2.0 / inv,
            advection_x: sentinel_div(dx, umax),
            advection_y: sentinel_div(dy, vmax),
            thermal: reynolds * prandtl / 2.0 / inv,
            species,
            reaction,
        }
    }

    /// Smallest bound and its origin. Ties go to the earlier bound.
    pub fn limiting(&self) -> (TimestepLimit, f64) {
        [
            (TimestepLimit::Diffusion, self.diffusion),
            (TimestepLimit::AdvectionX, self.advection_x),
            (TimestepLimit::AdvectionY, self.advection_y),
            (TimestepLimit::Thermal, self.thermal),
            (TimestepLimit::Species, self.species),
            (TimestepLimit::Reaction, self.reaction),
        ]
        .into_iter()
        .fold((TimestepLimit::Diffusion, f64::MAX), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
    }
}

/// Largest velocity magnitudes over the full U and V arrays, ghosts included.
pub fn max_velocities(u: &Field2D, v: &Field2D) -> (f64, f64) {
    (u.max_abs(), v.max_abs())
}

/// Applies the safety factor `tau` to the limiting bound.
pub fn adaptive_timestep(tau: f64, bounds: &TimestepBounds) -> (f64, TimestepLimit) {
    let (limit, bound) = bounds.limiting();
    (tau * bound, limit)
}
