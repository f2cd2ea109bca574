pub mod derive;
pub mod interpolate;

use crate::domain::flags::FlagField;
use crate::domain::grid2d::{CellSize2D, Field2D, Grid2D, GridDimensions2D};
use crate::error::SolverError;
use derive::{du2dx, duvdx, duvdy, dv2dy, second_difference_x, second_difference_y};

/// Material and discretisation constants of the momentum equations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowConstants {
    pub reynolds: f64,
    /// Upwind blend of the momentum convection terms.
    pub alpha: f64,
    /// Thermal expansion coefficient of the Boussinesq buoyancy term.
    pub beta: f64,
    pub gravity: (f64, f64),
}

/// Momentum predictor: tentative velocities F and G without the pressure gradient.
///
/// Only faces between two fluid cells are predicted. On the domain edges F and
/// G equal the boundary velocity so the pressure equation sees the wall flux.
pub fn calculate_fg(grid: &mut Grid2D, flags: &FlagField, constants: &FlowConstants, dt: f64) {
    let GridDimensions2D(imax, jmax) = grid.dimensions;
    let CellSize2D(dx, dy) = grid.cell_size;
    let FlowConstants { reynolds, alpha, beta, gravity: (gx, gy) } = *constants;
    let Grid2D { u, v, f, g, temperature: t, .. } = grid;

    for i in 1..=imax {
        for j in 1..=jmax {
            if !flags.is_fluid(i, j) {
                continue;
            }
            if flags.is_fluid(i + 1, j) {
                let diffusion = (second_difference_x(u, i, j, dx) + second_difference_y(u, i, j, dy)) / reynolds;
                let convection = du2dx(u, i, j, dx, alpha) + duvdy(u, v, i, j, dy, alpha);
                let buoyancy = gx * (1.0 - beta * 0.5 * (t[(i, j)] + t[(i + 1, j)]));
                f[(i, j)] = u[(i, j)] + dt * (diffusion - convection + buoyancy);
            }
            if flags.is_fluid(i, j + 1) {
                let diffusion = (second_difference_x(v, i, j, dx) + second_difference_y(v, i, j, dy)) / reynolds;
                let convection = dv2dy(v, i, j, dy, alpha) + duvdx(u, v, i, j, dx, alpha);
                let buoyancy = gy * (1.0 - beta * 0.5 * (t[(i, j)] + t[(i, j + 1)]));
                g[(i, j)] = v[(i, j)] + dt * (diffusion - convection + buoyancy);
            }
        }
    }

    for j in 1..=jmax {
        f[(0, j)] = u[(0, j)];
        f[(imax, j)] = u[(imax, j)];
    }
    for i in 1..=imax {
        g[(i, 0)] = v[(i, 0)];
        g[(i, jmax)] = v[(i, jmax)];
    }
}

/// Right-hand side of the pressure Poisson equation: divergence of (F, G) over `dt`.
pub fn calculate_rs(grid: &mut Grid2D, flags: &FlagField, dt: f64) {
    let GridDimensions2D(imax, jmax) = grid.dimensions;
    let CellSize2D(dx, dy) = grid.cell_size;
    let Grid2D { f, g, rs, .. } = grid;

    for i in 1..=imax {
        for j in 1..=jmax {
            if flags.is_fluid(i, j) {
                rs[(i, j)] = ((f[(i, j)] - f[(i - 1, j)]) / dx + (g[(i, j)] - g[(i, j - 1)]) / dy) / dt;
            }
        }
    }
}

/// Projection: corrects F and G with the pressure gradient on faces between fluid cells.
pub fn calculate_uv(grid: &mut Grid2D, flags: &FlagField, dt: f64) {
    let GridDimensions2D(imax, jmax) = grid.dimensions;
    let CellSize2D(dx, dy) = grid.cell_size;
    let Grid2D { u, v, pressure: p, f, g, .. } = grid;

    for i in 1..=imax {
        for j in 1..=jmax {
            if !flags.is_fluid(i, j) {
                continue;
            }
            if flags.is_fluid(i + 1, j) {
                u[(i, j)] = f[(i, j)] - dt / dx * (p[(i + 1, j)] - p[(i, j)]);
            }
            if flags.is_fluid(i, j + 1) {
                v[(i, j)] = g[(i, j)] - dt / dy * (p[(i, j + 1)] - p[(i, j)]);
            }
        }
    }
}

/// Subtracts the fluid-cell mean from the whole pressure field and returns that mean.
///
/// Only meaningful when no wall fixes the pressure level. A second call
/// subtracts (numerically) zero.
pub fn normalize_pressure(pressure: &mut Field2D, flags: &FlagField) -> Result<f64, SolverError> {
    let GridDimensions2D(imax, jmax) = flags.dimensions();
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 1..=imax {
        for j in 1..=jmax {
            if flags.is_fluid(i, j) {
                sum += pressure[(i, j)];
                count += 1;
            }
        }
    }
    if count == 0 {
        return Err(SolverError::NoFluidCells("pressure normalisation"));
    }
    let mean = sum / count as f64;
    let (ni, nj) = pressure.dim();
    for i in 0..ni {
        for j in 0..nj {
            pressure[(i, j)] -= mean;
        }
    }
    Ok(mean)
}
