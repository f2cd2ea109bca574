use nalgebra::DMatrix;

use crate::domain::grid2d::{Field2D, GridDimensions2D};

/// Averages east-face velocities onto the cell centres of the interior.
///
/// Returns an `imax × jmax` matrix whose entry `(i-1, j-1)` belongs to cell `(i, j)`.
pub fn interpolate_u_to_cell_centers(u: &Field2D, dimensions: GridDimensions2D) -> DMatrix<f64> {
    let GridDimensions2D(imax, jmax) = dimensions;
    DMatrix::from_fn(imax, jmax, |r, c| 0.5 * (u[(r, c + 1)] + u[(r + 1, c + 1)]))
}

/// Averages north-face velocities onto the cell centres of the interior.
pub fn interpolate_v_to_cell_centers(v: &Field2D, dimensions: GridDimensions2D) -> DMatrix<f64> {
    let GridDimensions2D(imax, jmax) = dimensions;
    DMatrix::from_fn(imax, jmax, |r, c| 0.5 * (v[(r + 1, c)] + v[(r + 1, c + 1)]))
}

/// Velocity components at the `(imax+1) × (jmax+1)` cell corners.
///
/// Node `(i, j)` sits at `(i·dx, j·dy)`; `u` is averaged across the two faces
/// above and below it, `v` across the two faces left and right of it.
pub fn interpolate_velocity_to_nodes(
    u: &Field2D,
    v: &Field2D,
    dimensions: GridDimensions2D,
) -> (DMatrix<f64>, DMatrix<f64>) {
    let GridDimensions2D(imax, jmax) = dimensions;
    let un = DMatrix::from_fn(imax + 1, jmax + 1, |i, j| 0.5 * (u[(i, j)] + u[(i, j + 1)]));
    let vn = DMatrix::from_fn(imax + 1, jmax + 1, |i, j| 0.5 * (v[(i, j)] + v[(i + 1, j)]));
    (un, vn)
}

/// Interior block of a cell-centred field, dropping the ghost layer.
pub fn interior(field: &Field2D, dimensions: GridDimensions2D) -> DMatrix<f64> {
    let GridDimensions2D(imax, jmax) = dimensions;
    field.as_matrix().view((1, 1), (imax, jmax)).into_owned()
}
