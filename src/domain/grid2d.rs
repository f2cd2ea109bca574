use std::ops::{Index, IndexMut};

use nalgebra::DMatrix;
use crate::error::GridError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions2D(pub usize, pub usize); // imax, jmax (interior cells)

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize2D(pub f64, pub f64); // dx, dy

impl CellSize2D {
    /// Uniform spacing for a domain of `xlength × ylength` split into `imax × jmax` cells.
    pub fn from_lengths(xlength: f64, ylength: f64, dimensions: GridDimensions2D) -> Self {
        let GridDimensions2D(imax, jmax) = dimensions;
        Self(xlength / imax as f64, ylength / jmax as f64)
    }

    /// `1/dx² + 1/dy²`, shared by every explicit stability bound and the SOR coefficient.
    pub fn inverse_square_sum(&self) -> f64 {
        let CellSize2D(dx, dy) = *self;
        1.0 / (dx * dx) + 1.0 / (dy * dy)
    }
}

/// Owned, bounds-checked 2-D array indexed as `field[(i, j)]`.
///
/// Indices start at zero, so the ghost layer of a cell-centred field sits at
/// `i = 0`, `i = imax + 1`, `j = 0` and `j = jmax + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field2D {
    data: DMatrix<f64>,
}

impl Field2D {
    pub fn zeros(ni: usize, nj: usize) -> Self {
        Self { data: DMatrix::zeros(ni, nj) }
    }

    pub fn from_element(ni: usize, nj: usize, value: f64) -> Self {
        Self { data: DMatrix::from_element(ni, nj, value) }
    }

    pub fn from_matrix(data: DMatrix<f64>) -> Self {
        Self { data }
    }

    /// Number of entries along `i` and along `j`.
    pub fn dim(&self) -> (usize, usize) {
        (self.data.nrows(), self.data.ncols())
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Copies every entry of `other`. Both fields must have the same shape.
    pub fn copy_from(&mut self, other: &Field2D) {
        self.data.copy_from(&other.data);
    }

    /// Exchanges the storage of two fields without copying.
    pub fn swap(&mut self, other: &mut Field2D) {
        std::mem::swap(&mut self.data, &mut other.data);
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
    }
}

impl Index<(usize, usize)> for Field2D {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize)> for Field2D {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index]
    }
}

/// All flow and heat fields of the staggered grid.
#[derive(Debug, Clone)]
pub struct Grid2D {
    pub dimensions: GridDimensions2D,
    pub cell_size: CellSize2D,
    pub u: Field2D,           // (imax+2) x (jmax+2), east faces
    pub v: Field2D,           // (imax+2) x (jmax+2), north faces
    pub pressure: Field2D,    // (imax+2) x (jmax+2), centres
    pub f: Field2D,           // (imax+1) x (jmax+1)
    pub g: Field2D,           // (imax+1) x (jmax+1)
    pub rs: Field2D,          // (imax+1) x (jmax+1), interior used
    pub temperature: Field2D, // (imax+2) x (jmax+2), centres
}

impl Grid2D {
    ///     ↑       ↑       ↑       ↑       ↑
    /// ┌───────┬───────┬───────┬───────┬───────┐
    /// │ ghost │ ghost │ ghost │ ghost │ ghost │   j = jmax+1
    /// ├───↑───┼───↑───┼───↑───┼───↑───┼───↑───┤
    /// │ ghost →   •   →   •   →   •   → ghost │   j = jmax
    /// ├───↑───┼───↑───┼───↑───┼───↑───┼───↑───┤
    /// │ ghost →   •   →   •   →   •   → ghost │   j = 1
    /// ├───↑───┼───↑───┼───↑───┼───↑───┼───↑───┤
    /// │ ghost │ ghost │ ghost │ ghost │ ghost │   j = 0
    /// └───────┴───────┴───────┴───────┴───────┘
    ///   i = 0    i = 1   ...    imax  imax+1
    ///
    /// `•` pressure/temperature at the cell centre, `→` U[i][j] on the east
    /// face, `↑` V[i][j] on the north face.
    pub fn new(dimensions: GridDimensions2D, cell_size: CellSize2D) -> Result<Self, GridError> {
        let GridDimensions2D(imax, jmax) = dimensions;
        if imax < 1 || jmax < 1 {
            return Err(GridError::InvalidGridSize(
                "Grid dimensions (imax, jmax) must be at least 1x1 for interior cells.".to_string(),
            ));
        }
        if !(cell_size.0 > 0.0 && cell_size.1 > 0.0) {
            return Err(GridError::InvalidGridSize(format!(
                "Cell size must be positive, got dx={}, dy={}",
                cell_size.0, cell_size.1
            )));
        }
        Ok(Self {
            dimensions,
            cell_size,
            u: Field2D::zeros(imax + 2, jmax + 2),
            v: Field2D::zeros(imax + 2, jmax + 2),
            pressure: Field2D::zeros(imax + 2, jmax + 2),
            f: Field2D::zeros(imax + 1, jmax + 1),
            g: Field2D::zeros(imax + 1, jmax + 1),
            rs: Field2D::zeros(imax + 1, jmax + 1),
            temperature: Field2D::zeros(imax + 2, jmax + 2),
        })
    }

    /// Assigns constant initial values to U, V and P over the whole domain, ghosts included.
    pub fn init_uvp(&mut self, ui: f64, vi: f64, pi: f64) {
        self.u.fill(ui);
        self.v.fill(vi);
        self.pressure.fill(pi);
    }

    /// A zeroed field with the ghost-inclusive cell-centred shape.
    pub fn cell_field(&self) -> Field2D {
        let GridDimensions2D(imax, jmax) = self.dimensions;
        Field2D::zeros(imax + 2, jmax + 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_creation() {
        let dims = GridDimensions2D(5, 4);
        let cell_size = CellSize2D(0.1, 0.2);
        let grid = Grid2D::new(dims, cell_size).unwrap();
        assert_eq!(grid.dimensions, dims);
        assert_eq!(grid.cell_size, cell_size);
        assert_eq!(grid.u.dim(), (7, 6));
        assert_eq!(grid.v.dim(), (7, 6));
        assert_eq!(grid.pressure.dim(), (7, 6));
        assert_eq!(grid.temperature.dim(), (7, 6));
        assert_eq!(grid.f.dim(), (6, 5));
        assert_eq!(grid.g.dim(), (6, 5));
        assert_eq!(grid.rs.dim(), (6, 5));
        assert_eq!(grid.cell_field().dim(), (7, 6));
    }

    #[test]
    fn test_grid_creation_invalid_size() {
        let cell_size = CellSize2D(0.1, 0.1);
        assert!(Grid2D::new(GridDimensions2D(0, 5), cell_size).is_err());
        assert!(Grid2D::new(GridDimensions2D(5, 0), cell_size).is_err());
        assert!(Grid2D::new(GridDimensions2D(5, 5), CellSize2D(0.0, 0.1)).is_err());
    }

    #[test]
    fn test_cell_size_from_lengths() {
        let cell = CellSize2D::from_lengths(2.0, 1.0, GridDimensions2D(4, 5));
        assert_relative_eq!(cell.0, 0.5);
        assert_relative_eq!(cell.1, 0.2);
        assert_relative_eq!(cell.inverse_square_sum(), 4.0 + 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_init_uvp_covers_ghosts() {
        let mut grid = Grid2D::new(GridDimensions2D(3, 3), CellSize2D(1.0, 1.0)).unwrap();
        grid.init_uvp(1.5, -0.5, 2.0);
        assert_relative_eq!(grid.u[(0, 0)], 1.5);
        assert_relative_eq!(grid.v[(4, 4)], -0.5);
        assert_relative_eq!(grid.pressure[(2, 4)], 2.0);
    }

    #[test]
    fn test_field_swap_exchanges_storage() {
        let mut a = Field2D::from_element(3, 3, 1.0);
        let mut b = Field2D::from_element(3, 3, 2.0);
        a[(1, 1)] = 7.0;
        a.swap(&mut b);
        assert_relative_eq!(a[(1, 1)], 2.0);
        assert_relative_eq!(b[(1, 1)], 7.0);
        assert_relative_eq!(b[(0, 0)], 1.0);
    }

    #[test]
    fn test_field_copy_and_max_abs() {
        let mut a = Field2D::zeros(2, 3);
        let mut b = Field2D::zeros(2, 3);
        b[(1, 2)] = -4.0;
        b[(0, 1)] = 3.0;
        a.copy_from(&b);
        assert_eq!(a, b);
        assert_relative_eq!(a.max_abs(), 4.0);
    }

    #[test]
    #[should_panic]
    fn test_field_index_is_bounds_checked() {
        let field = Field2D::zeros(3, 3);
        let _ = field[(3, 0)];
    }
}
