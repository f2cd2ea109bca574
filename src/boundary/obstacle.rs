use crate::domain::flags::{CellKind, FlagField, ObstacleFace};
use crate::domain::grid2d::{GridDimensions2D, Grid2D};

/// Enforces no-slip on every obstacle cell that touches the flow.
///
/// The normal velocity on a fluid-facing edge is zeroed, the tangential
/// velocity inside the obstacle mirrors the fluid side, F/G on that edge take
/// the wall velocity and the cell pressure copies (or, at corners, averages)
/// its fluid neighbours. Interior obstacle cells are left untouched.
pub fn apply_obstacle_boundaries(grid: &mut Grid2D, flags: &FlagField) {
    let GridDimensions2D(imax, jmax) = grid.dimensions;
    let Grid2D { u, v, pressure: p, f, g, .. } = grid;

    for i in 1..=imax {
        for j in 1..=jmax {
            let face = match flags.kind(i, j) {
                CellKind::ObstacleBoundary(face) => face,
                _ => continue,
            };
            match face {
                ObstacleFace::North => {
                    v[(i, j)] = 0.0;
                    u[(i - 1, j)] = -u[(i - 1, j + 1)];
                    u[(i, j)] = -u[(i, j + 1)];
                    g[(i, j)] = v[(i, j)];
                    p[(i, j)] = p[(i, j + 1)];
                }
                ObstacleFace::South => {
                    v[(i, j - 1)] = 0.0;
                    u[(i - 1, j)] = -u[(i - 1, j - 1)];
                    u[(i, j)] = -u[(i, j - 1)];
                    g[(i, j - 1)] = v[(i, j - 1)];
                    p[(i, j)] = p[(i, j - 1)];
                }
                ObstacleFace::West => {
                    u[(i - 1, j)] = 0.0;
                    v[(i, j - 1)] = -v[(i - 1, j - 1)];
                    v[(i, j)] = -v[(i - 1, j)];
                    f[(i - 1, j)] = u[(i - 1, j)];
                    p[(i, j)] = p[(i - 1, j)];
                }
                ObstacleFace::East => {
                    u[(i, j)] = 0.0;
                    v[(i, j - 1)] = -v[(i + 1, j - 1)];
                    v[(i, j)] = -v[(i + 1, j)];
                    f[(i, j)] = u[(i, j)];
                    p[(i, j)] = p[(i + 1, j)];
                }
                ObstacleFace::NorthEast => {
                    v[(i, j)] = 0.0;
                    u[(i - 1, j)] = -u[(i - 1, j + 1)];
                    g[(i, j)] = v[(i, j)];
                    u[(i, j)] = 0.0;
                    v[(i, j - 1)] = -v[(i + 1, j - 1)];
                    f[(i, j)] = u[(i, j)];
                    p[(i, j)] = 0.5 * (p[(i, j + 1)] + p[(i + 1, j)]);
                }
                ObstacleFace::NorthWest => {
                    v[(i, j)] = 0.0;
                    u[(i, j)] = -u[(i, j + 1)];
                    g[(i, j)] = v[(i, j)];
                    u[(i - 1, j)] = 0.0;
                    v[(i, j - 1)] = -v[(i - 1, j - 1)];
                    f[(i - 1, j)] = u[(i - 1, j)];
                    p[(i, j)] = 0.5 * (p[(i, j + 1)] + p[(i - 1, j)]);
                }
                ObstacleFace::SouthEast => {
                    v[(i, j - 1)] = 0.0;
                    u[(i - 1, j)] = -u[(i - 1, j - 1)];
                    g[(i, j - 1)] = v[(i, j - 1)];
                    u[(i, j)] = 0.0;
                    v[(i, j)] = -v[(i + 1, j)];
                    f[(i, j)] = u[(i, j)];
                    p[(i, j)] = 0.5 * (p[(i, j - 1)] + p[(i + 1, j)]);
                }
                ObstacleFace::SouthWest => {
                    v[(i, j - 1)] = 0.0;
                    u[(i, j)] = -u[(i, j - 1)];
                    g[(i, j - 1)] = v[(i, j - 1)];
                    u[(i - 1, j)] = 0.0;
                    v[(i, j)] = -v[(i - 1, j)];
                    f[(i - 1, j)] = u[(i - 1, j)];
                    p[(i, j)] = 0.5 * (p[(i, j - 1)] + p[(i - 1, j)]);
                }
            }
        }
    }
}
