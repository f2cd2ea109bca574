//! Scenario-specific inlet conditions, applied after the generic wall and
//! obstacle conditions of every step.

use crate::domain::grid2d::{Field2D, Grid2D, GridDimensions2D};
use crate::error::BoundaryError;

/// A named inlet condition selected once from the problem name.
pub trait InflowProfile: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Checks that the profile can act on a run with `species` concentrations.
    fn validate(&self, _species: usize) -> Result<(), BoundaryError> {
        Ok(())
    }

    fn apply(&self, grid: &mut Grid2D, concentrations: &mut [Field2D]) -> Result<(), BoundaryError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoInflow;

impl InflowProfile for NoInflow {
    fn name(&self) -> &'static str {
        "none"
    }

    fn apply(&self, _grid: &mut Grid2D, _concentrations: &mut [Field2D]) -> Result<(), BoundaryError> {
        Ok(())
    }
}

/// Poiseuille profile on the left wall, peaking at `peak` in the channel centre.
#[derive(Debug, Clone, Copy)]
pub struct ParabolicInflow {
    pub peak: f64,
}

impl ParabolicInflow {
    pub fn new(peak: f64) -> Self {
        Self { peak }
    }

    fn apply_velocity(&self, grid: &mut Grid2D) {
        let GridDimensions2D(_, jmax) = grid.dimensions;
        let half = (jmax / 2) as f64;
        let norm = if jmax % 2 == 1 { (half + 0.5) * (half + 0.5) } else { half * half };
        for j in 1..=jmax {
            let y = j as f64 - 0.5;
            grid.u[(0, j)] = self.peak * y * (jmax as f64 - y) / norm;
            grid.v[(0, j)] = 0.0;
        }
    }
}

impl InflowProfile for ParabolicInflow {
    fn name(&self) -> &'static str {
        "parabolic"
    }

    fn apply(&self, grid: &mut Grid2D, _concentrations: &mut [Field2D]) -> Result<(), BoundaryError> {
        self.apply_velocity(grid);
        Ok(())
    }
}

/// Parabolic inlet feeding three reactant streams at unit concentration:
/// species 0 along the lower fifth of the left wall, species 1 along the upper
/// fifth, species 3 through the top wall.
#[derive(Debug, Clone, Copy)]
pub struct MixingInflow {
    pub velocity: ParabolicInflow,
}

impl MixingInflow {
    const REQUIRED_SPECIES: usize = 4;

    pub fn new(peak: f64) -> Self {
        Self { velocity: ParabolicInflow::new(peak) }
    }
}

impl InflowProfile for MixingInflow {
    fn name(&self) -> &'static str {
        "mixing"
    }

    fn validate(&self, species: usize) -> Result<(), BoundaryError> {
        if species < Self::REQUIRED_SPECIES {
            return Err(BoundaryError::InvalidInflow {
                profile: self.name().to_string(),
                reason: format!(
                    "needs at least {} species, {} configured",
                    Self::REQUIRED_SPECIES,
                    species
                ),
            });
        }
        Ok(())
    }

    fn apply(&self, grid: &mut Grid2D, concentrations: &mut [Field2D]) -> Result<(), BoundaryError> {
        self.validate(concentrations.len())?;
        self.velocity.apply_velocity(grid);

        let GridDimensions2D(imax, jmax) = grid.dimensions;
        let band = jmax / 5;
        for j in 1..=band {
            concentrations[0][(0, j)] = 1.0;
            concentrations[1][(0, jmax - j + 1)] = 1.0;
            let i = band + j;
            if i <= imax {
                concentrations[3][(i, jmax + 1)] = 1.0;
            }
        }
        Ok(())
    }
}

/// Picks the inlet strategy for a problem name, ignoring case.
pub fn inflow_for_problem(problem: &str, peak: f64) -> Box<dyn InflowProfile> {
    match problem.trim().to_ascii_lowercase().as_str() {
        "wire" => Box::new(ParabolicInflow::new(peak)),
        "mixing" => Box::new(MixingInflow::new(peak)),
        _ => Box::new(NoInflow),
    }
}
