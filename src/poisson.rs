//! Successive over-relaxation for the pressure Poisson equation.
//!
//! One call to [`sor_sweep`] is a single relaxation pass over the grid. The
//! iteration loop, its stopping rule and the convergence report belong to the
//! caller (see `solver::Simulation`).

use crate::boundary::bc2d::{BoundaryKind, SquareBoundary};
use crate::domain::flags::{CellKind, FlagField};
use crate::domain::grid2d::{CellSize2D, Field2D, GridDimensions2D};
use crate::error::SolverError;
use crate::numerical::derive::laplacian;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SorSettings {
    /// Relaxation factor, `0 < omega < 2`.
    pub omega: f64,
    /// Residual below which the pressure counts as converged.
    pub eps: f64,
    pub itermax: usize,
}

/// Relaxes every fluid cell once, then refreshes the obstacle boundary cells
/// with the mean of their fluid neighbours.
pub fn sor_iteration(pressure: &mut Field2D, rs: &Field2D, flags: &FlagField, cell_size: CellSize2D, omega: f64) {
    let GridDimensions2D(imax, jmax) = flags.dimensions();
    let CellSize2D(dx, dy) = cell_size;
    let (dx2, dy2) = (dx * dx, dy * dy);
    let coeff = omega / (2.0 * cell_size.inverse_square_sum());
    let p = pressure;

    for i in 1..=imax {
        for j in 1..=jmax {
            if flags.is_fluid(i, j) {
                p[(i, j)] = (1.0 - omega) * p[(i, j)]
                    + coeff
                        * ((p[(i + 1, j)] + p[(i - 1, j)]) / dx2 + (p[(i, j + 1)] + p[(i, j - 1)]) / dy2
                            - rs[(i, j)]);
            }
        }
    }

    for i in 1..=imax {
        for j in 1..=jmax {
            if let CellKind::ObstacleBoundary(face) = flags.kind(i, j) {
                let fluid = face.neighbors();
                let mut sum = 0.0;
                let mut count = 0usize;
                for (is_fluid, value) in [
                    (fluid.south, p[(i, j - 1)]),
                    (fluid.north, p[(i, j + 1)]),
                    (fluid.west, p[(i - 1, j)]),
                    (fluid.east, p[(i + 1, j)]),
                ] {
                    if is_fluid {
                        sum += value;
                        count += 1;
                    }
                }
                // every boundary face has at least one fluid neighbour
                p[(i, j)] = sum / count as f64;
            }
        }
    }
}

/// Root-mean-square of `∇²p − rs` over the fluid cells.
pub fn pressure_residual(
    pressure: &Field2D,
    rs: &Field2D,
    flags: &FlagField,
    cell_size: CellSize2D,
) -> Result<f64, SolverError> {
    let GridDimensions2D(imax, jmax) = flags.dimensions();
    let p = pressure;

    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 1..=imax {
        for j in 1..=jmax {
            if flags.is_fluid(i, j) {
                let r = laplacian(p, i, j, cell_size) - rs[(i, j)];
                sum += r * r;
                count += 1;
            }
        }
    }
    if count == 0 {
        return Err(SolverError::NoFluidCells("pressure residual"));
    }
    Ok((sum / count as f64).sqrt())
}

/// Ghost-layer pressure on the domain walls.
///
/// A wall of kind [`BoundaryKind::Pressure`] reflects about its prescribed
/// value; every other wall copies the adjacent interior value.
pub fn apply_pressure_edges(
    pressure: &mut Field2D,
    kinds: &SquareBoundary<BoundaryKind>,
    values: &SquareBoundary<f64>,
    dimensions: GridDimensions2D,
) {
    let GridDimensions2D(imax, jmax) = dimensions;
    let p = pressure;
    let ghost = |kind: BoundaryKind, wall: f64, inner: f64| {
        if kind == BoundaryKind::Pressure { 2.0 * wall - inner } else { inner }
    };

    for j in 1..=jmax {
        p[(0, j)] = ghost(kinds.left(), values.left(), p[(1, j)]);
        p[(imax + 1, j)] = ghost(kinds.right(), values.right(), p[(imax, j)]);
    }
    for i in 1..=imax {
        p[(i, jmax + 1)] = ghost(kinds.top(), values.top(), p[(i, jmax)]);
        p[(i, 0)] = ghost(kinds.bottom(), values.bottom(), p[(i, 1)]);
    }
}

/// One full SOR pass: relaxation, residual, then wall ghosts. Returns the residual.
///
/// The residual reads the ghosts left by the previous pass, so the caller
/// sets them with [`apply_pressure_edges`] before the first pass.
pub fn sor_sweep(
    pressure: &mut Field2D,
    rs: &Field2D,
    flags: &FlagField,
    cell_size: CellSize2D,
    omega: f64,
    kinds: &SquareBoundary<BoundaryKind>,
    values: &SquareBoundary<f64>,
) -> Result<f64, SolverError> {
    sor_iteration(pressure, rs, flags, cell_size, omega);
    let residual = pressure_residual(pressure, rs, flags, cell_size)?;
    apply_pressure_edges(pressure, kinds, values, flags.dimensions());
    Ok(residual)
}
