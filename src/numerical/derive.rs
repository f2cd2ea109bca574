use crate::domain::grid2d::{CellSize2D, Field2D};

/// Central second difference along `i`:
///
/// \[
/// \frac{f_{i+1,j} - 2f_{ij} + f_{i-1,j}}{dx^2}
/// \]
///
/// # Arguments
/// - `field`: any staggered or cell-centred field with a ghost layer.
/// - `i`, `j`: the point to evaluate; both neighbours along `i` must exist.
/// - `dx`: grid spacing along `i`.
pub fn second_difference_x(field: &Field2D, i: usize, j: usize, dx: f64) -> f64 {
    (field[(i + 1, j)] - 2.0 * field[(i, j)] + field[(i - 1, j)]) / (dx * dx)
}

/// Central second difference along `j`, the counterpart of [`second_difference_x`].
pub fn second_difference_y(field: &Field2D, i: usize, j: usize, dy: f64) -> f64 {
    (field[(i, j + 1)] - 2.0 * field[(i, j)] + field[(i, j - 1)]) / (dy * dy)
}

/// Five-point Laplacian at `(i, j)`.
pub fn laplacian(field: &Field2D, i: usize, j: usize, cell_size: CellSize2D) -> f64 {
    let CellSize2D(dx, dy) = cell_size;
    second_difference_x(field, i, j, dx) + second_difference_y(field, i, j, dy)
}

/// Convective term ∂(u²)/∂x at the east face of cell `(i, j)`.
///
/// The blend factor `alpha` moves the discretisation from central differences
/// (`alpha = 0`) to pure donor-cell upwinding (`alpha = 1`).
///
/// # Arguments
/// - `u`: horizontal velocity on east faces.
/// - `i`, `j`: face index; `i - 1` and `i + 1` must be valid.
/// - `dx`: grid spacing along `i`.
/// - `alpha`: upwind blend factor in `[0, 1]`.
pub fn du2dx(u: &Field2D, i: usize, j: usize, dx: f64, alpha: f64) -> f64 {
    let east = u[(i, j)] + u[(i + 1, j)];
    let west = u[(i - 1, j)] + u[(i, j)];
    (east * east - west * west
        + alpha * (east.abs() * (u[(i, j)] - u[(i + 1, j)]) - west.abs() * (u[(i - 1, j)] - u[(i, j)])))
        / (4.0 * dx)
}

/// Convective term ∂(uv)/∂y at the east face of cell `(i, j)`.
pub fn duvdy(u: &Field2D, v: &Field2D, i: usize, j: usize, dy: f64, alpha: f64) -> f64 {
    let v_north = v[(i, j)] + v[(i + 1, j)];
    let v_south = v[(i, j - 1)] + v[(i + 1, j - 1)];
    (v_north * (u[(i, j)] + u[(i, j + 1)]) - v_south * (u[(i, j - 1)] + u[(i, j)])
        + alpha
            * (v_north.abs() * (u[(i, j)] - u[(i, j + 1)])
                - v_south.abs() * (u[(i, j - 1)] - u[(i, j)])))
        / (4.0 * dy)
}

/// Convective term ∂(uv)/∂x at the north face of cell `(i, j)`.
pub fn duvdx(u: &Field2D, v: &Field2D, i: usize, j: usize, dx: f64, alpha: f64) -> f64 {
    let u_east = u[(i, j)] + u[(i, j + 1)];
    let u_west = u[(i - 1, j)] + u[(i - 1, j + 1)];
    (u_east * (v[(i, j)] + v[(i + 1, j)]) - u_west * (v[(i - 1, j)] + v[(i, j)])
        + alpha
            * (u_east.abs() * (v[(i, j)] - v[(i + 1, j)])
                - u_west.abs() * (v[(i - 1, j)] - v[(i, j)])))
        / (4.0 * dx)
}

/// Convective term ∂(v²)/∂y at the north face of cell `(i, j)`.
pub fn dv2dy(v: &Field2D, i: usize, j: usize, dy: f64, alpha: f64) -> f64 {
    let north = v[(i, j)] + v[(i, j + 1)];
    let south = v[(i, j - 1)] + v[(i, j)];
    (north * north - south * south
        + alpha * (north.abs() * (v[(i, j)] - v[(i, j + 1)]) - south.abs() * (v[(i, j - 1)] - v[(i, j)])))
        / (4.0 * dy)
}

/// Convective flux divergence ∂(uX)/∂x of a cell-centred scalar `x` at `(i, j)`.
///
/// Uses the face velocities directly, blended by `gamma` between central
/// (`0`) and donor-cell (`1`) interpolation of the scalar onto the faces.
pub fn scalar_flux_x(u: &Field2D, x: &Field2D, i: usize, j: usize, dx: f64, gamma: f64) -> f64 {
    let east = u[(i, j)];
    let west = u[(i - 1, j)];
    (east * (x[(i, j)] + x[(i + 1, j)]) - west * (x[(i - 1, j)] + x[(i, j)])
        + gamma * (east.abs() * (x[(i, j)] - x[(i + 1, j)]) - west.abs() * (x[(i - 1, j)] - x[(i, j)])))
        / (2.0 * dx)
}

/// Convective flux divergence ∂(vX)/∂y, the counterpart of [`scalar_flux_x`].
pub fn scalar_flux_y(v: &Field2D, x: &Field2D, i: usize, j: usize, dy: f64, gamma: f64) -> f64 {
    let north = v[(i, j)];
    let south = v[(i, j - 1)];
    (north * (x[(i, j)] + x[(i, j + 1)]) - south * (x[(i, j - 1)] + x[(i, j)])
        + gamma * (north.abs() * (x[(i, j)] - x[(i, j + 1)]) - south.abs() * (x[(i, j - 1)] - x[(i, j)])))
        / (2.0 * dy)
}
