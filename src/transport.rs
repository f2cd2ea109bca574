use crate::boundary::bc2d::{BoundaryKind, WallCondition};
use crate::domain::flags::{CellKind, FlagField};
use crate::domain::grid2d::{CellSize2D, Field2D, GridDimensions2D};
use crate::numerical::derive::{scalar_flux_x, scalar_flux_y, second_difference_x, second_difference_y};

/// Inputs shared by every scalar carried by the flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarTransport {
    /// Inverse diffusivity: `Re·Pr` for temperature, `1/lambda` for a species.
    pub coeff: f64,
    /// Upwind blend of the convective flux.
    pub gamma: f64,
    /// Condition imposed on obstacle cells.
    pub obstacle: WallCondition,
}

impl ScalarTransport {
    /// Species default: zero flux through obstacle walls.
    pub fn species(lambda: f64, gamma: f64) -> Self {
        Self { coeff: 1.0 / lambda, gamma, obstacle: WallCondition::neumann(0.0) }
    }
}

/// Advances a cell-centred scalar by one explicit step of convection-diffusion.
///
/// The new values are written into `scratch`, which then swaps storage with
/// `field`. Ghost cells carry over unchanged.
pub fn advance_scalar(
    field: &mut Field2D,
    scratch: &mut Field2D,
    u: &Field2D,
    v: &Field2D,
    flags: &FlagField,
    cell_size: CellSize2D,
    transport: &ScalarTransport,
    dt: f64,
) {
    let GridDimensions2D(imax, jmax) = flags.dimensions();
    let CellSize2D(dx, dy) = cell_size;
    let ScalarTransport { coeff, gamma, obstacle } = *transport;
    let x: &Field2D = field;

    let mirrored = |value: f64| match obstacle.kind {
        BoundaryKind::Dirichlet => 2.0 * obstacle.value - value,
        _ => value,
    };

    scratch.copy_from(x);
    for i in 1..=imax {
        for j in 1..=jmax {
            scratch[(i, j)] = match flags.kind(i, j) {
                CellKind::Fluid => {
                    let convection = scalar_flux_x(u, x, i, j, dx, gamma) + scalar_flux_y(v, x, i, j, dy, gamma);
                    let diffusion = (second_difference_x(x, i, j, dx) + second_difference_y(x, i, j, dy)) / coeff;
                    x[(i, j)] + dt * (diffusion - convection)
                }
                CellKind::ObstacleBoundary(face) => {
                    let fluid = face.neighbors();
                    let mut sum = 0.0;
                    let mut count = 0usize;
                    for (is_fluid, value) in [
                        (fluid.south, x[(i, j - 1)]),
                        (fluid.north, x[(i, j + 1)]),
                        (fluid.west, x[(i - 1, j)]),
                        (fluid.east, x[(i + 1, j)]),
                    ] {
                        if is_fluid {
                            sum += mirrored(value);
                            count += 1;
                        }
                    }
                    sum / count as f64
                }
                CellKind::ObstacleInterior => obstacle.value,
            };
        }
    }
    field.swap(scratch);
}
