//! Fluid/obstacle classification of every grid cell.
//!
//! The obstacle mask is read once at startup and turned into a [`FlagField`]
//! holding one [`CellKind`] per cell. Nothing writes to the flag field after
//! construction.

use nalgebra::DMatrix;
use crate::domain::grid2d::GridDimensions2D;
use crate::error::GeometryError;

/// Grey value above which a mask pixel is fluid.
pub const FLUID_THRESHOLD: i32 = 100;

/// Obstacle image of `imax × jmax` pixels surrounded by a one-pixel border.
///
/// `pixels[(i, j)]` uses the same indexing as the cell-centred fields: the
/// border lives at `i = 0`, `i = imax + 1`, `j = 0` and `j = jmax + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleMask {
    pixels: DMatrix<i32>,
}

impl ObstacleMask {
    pub fn new(pixels: DMatrix<i32>) -> Result<Self, GeometryError> {
        if pixels.nrows() < 3 || pixels.ncols() < 3 {
            return Err(GeometryError::InvalidMask(format!(
                "mask of {}x{} pixels leaves no interior cells",
                pixels.nrows(),
                pixels.ncols()
            )));
        }
        Ok(Self { pixels })
    }

    /// Builds a mask from a predicate over interior cells. The border is solid.
    pub fn from_fn<F>(dimensions: GridDimensions2D, is_fluid: F) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let GridDimensions2D(imax, jmax) = dimensions;
        let pixels = DMatrix::from_fn(imax + 2, jmax + 2, |i, j| {
            let interior = (1..=imax).contains(&i) && (1..=jmax).contains(&j);
            if interior && is_fluid(i, j) { 255 } else { 0 }
        });
        Self { pixels }
    }

    pub fn all_fluid(dimensions: GridDimensions2D) -> Self {
        Self::from_fn(dimensions, |_, _| true)
    }

    pub fn dimensions(&self) -> GridDimensions2D {
        GridDimensions2D(self.pixels.nrows() - 2, self.pixels.ncols() - 2)
    }

    pub fn pixel(&self, i: usize, j: usize) -> i32 {
        self.pixels[(i, j)]
    }
}

/// Which of the four axis neighbours of a cell are fluid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborSet {
    pub north: bool,
    pub south: bool,
    pub west: bool,
    pub east: bool,
}

impl NeighborSet {
    pub fn count(&self) -> usize {
        [self.north, self.south, self.west, self.east]
            .iter()
            .filter(|&&fluid| fluid)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Fluid-facing sides of an obstacle cell that touches the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleFace {
    North,
    South,
    West,
    East,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ObstacleFace {
    /// `None` for no fluid neighbour, or for a pattern forbidden by classification.
    pub fn from_neighbors(n: NeighborSet) -> Option<Self> {
        match (n.north, n.south, n.west, n.east) {
            (true, false, false, false) => Some(Self::North),
            (false, true, false, false) => Some(Self::South),
            (false, false, true, false) => Some(Self::West),
            (false, false, false, true) => Some(Self::East),
            (true, false, false, true) => Some(Self::NorthEast),
            (true, false, true, false) => Some(Self::NorthWest),
            (false, true, false, true) => Some(Self::SouthEast),
            (false, true, true, false) => Some(Self::SouthWest),
            _ => None,
        }
    }

    pub fn neighbors(&self) -> NeighborSet {
        let (north, south, west, east) = match self {
            Self::North => (true, false, false, false),
            Self::South => (false, true, false, false),
            Self::West => (false, false, true, false),
            Self::East => (false, false, false, true),
            Self::NorthEast => (true, false, false, true),
            Self::NorthWest => (true, false, true, false),
            Self::SouthEast => (false, true, false, true),
            Self::SouthWest => (false, true, true, false),
        };
        NeighborSet { north, south, west, east }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Fluid,
    ObstacleBoundary(ObstacleFace),
    ObstacleInterior,
}

/// A fluid cell is forbidden when both neighbours along one axis are solid;
/// a solid cell is forbidden when both neighbours along one axis are fluid.
pub fn is_forbidden_cell(fluid: bool, neighbors: NeighborSet) -> bool {
    let NeighborSet { north, south, west, east } = neighbors;
    if fluid {
        (!north && !south) || (!west && !east)
    } else {
        (north && south) || (west && east)
    }
}

/// Per-cell classification over the ghost-inclusive index range.
///
/// Ghost cells are [`CellKind::ObstacleInterior`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlagField {
    kinds: DMatrix<CellKind>,
}

impl FlagField {
    pub fn from_mask(mask: &ObstacleMask) -> Result<Self, GeometryError> {
        Self::from_mask_with_threshold(mask, FLUID_THRESHOLD)
    }

    pub fn from_mask_with_threshold(mask: &ObstacleMask, threshold: i32) -> Result<Self, GeometryError> {
        let GridDimensions2D(imax, jmax) = mask.dimensions();
        let fluid = |i: usize, j: usize| mask.pixel(i, j) > threshold;

        let mut kinds = DMatrix::from_element(imax + 2, jmax + 2, CellKind::ObstacleInterior);
        for i in 1..=imax {
            for j in 1..=jmax {
                let neighbors = NeighborSet {
                    north: fluid(i, j + 1),
                    south: fluid(i, j - 1),
                    west: fluid(i - 1, j),
                    east: fluid(i + 1, j),
                };
                let is_fluid = fluid(i, j);
                if is_forbidden_cell(is_fluid, neighbors) {
                    return Err(GeometryError::ForbiddenCell { i, j });
                }
                kinds[(i, j)] = if is_fluid {
                    CellKind::Fluid
                } else {
                    match ObstacleFace::from_neighbors(neighbors) {
                        Some(face) => CellKind::ObstacleBoundary(face),
                        None => CellKind::ObstacleInterior,
                    }
                };
            }
        }
        Ok(Self { kinds })
    }

    /// Flags for an obstacle-free box.
    pub fn all_fluid(dimensions: GridDimensions2D) -> Result<Self, GeometryError> {
        Self::from_mask(&ObstacleMask::all_fluid(dimensions))
    }

    pub fn dimensions(&self) -> GridDimensions2D {
        GridDimensions2D(self.kinds.nrows() - 2, self.kinds.ncols() - 2)
    }

    pub fn kind(&self, i: usize, j: usize) -> CellKind {
        self.kinds[(i, j)]
    }

    pub fn is_fluid(&self, i: usize, j: usize) -> bool {
        self.kinds[(i, j)] == CellKind::Fluid
    }

    pub fn fluid_cell_count(&self) -> usize {
        self.kinds.iter().filter(|&&k| k == CellKind::Fluid).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&[i32]]) -> ObstacleMask {
        // rows[0] is the top row of the picture, i.e. the largest j
        let nj = rows.len();
        let ni = rows[0].len();
        let pixels = DMatrix::from_fn(ni, nj, |i, j| rows[nj - 1 - j][i]);
        ObstacleMask::new(pixels).unwrap()
    }

    #[test]
    fn test_all_fluid_box() {
        let flags = FlagField::all_fluid(GridDimensions2D(4, 3)).unwrap();
        assert_eq!(flags.dimensions(), GridDimensions2D(4, 3));
        assert_eq!(flags.fluid_cell_count(), 12);
        assert!(flags.is_fluid(1, 1));
        assert!(flags.is_fluid(4, 3));
        assert_eq!(flags.kind(0, 1), CellKind::ObstacleInterior);
        assert_eq!(flags.kind(5, 3), CellKind::ObstacleInterior);
        assert_eq!(flags.kind(2, 4), CellKind::ObstacleInterior);
    }

    #[test]
    fn test_single_solid_cell_in_fluid_ring() {
        // 3x3 interior, fluid border, one solid cell in the middle.
        // The forbidden-cell rule wins over treating it as a lone obstacle:
        // a solid cell with fluid on opposite sides is rejected.
        let mask = mask_from_rows(&[
            &[255, 255, 255, 255, 255],
            &[255, 255, 255, 255, 255],
            &[255, 255, 0, 255, 255],
            &[255, 255, 255, 255, 255],
            &[255, 255, 255, 255, 255],
        ]);
        let fluid = |i: usize, j: usize| mask.pixel(i, j) > FLUID_THRESHOLD;
        for i in 1..=3 {
            for j in 1..=3 {
                let neighbors = NeighborSet {
                    north: fluid(i, j + 1),
                    south: fluid(i, j - 1),
                    west: fluid(i - 1, j),
                    east: fluid(i + 1, j),
                };
                let forbidden = is_forbidden_cell(fluid(i, j), neighbors);
                if (i, j) == (2, 2) {
                    // a one-cell obstacle has fluid on both sides of both axes
                    assert!(forbidden);
                } else {
                    assert!(!forbidden, "cell ({}, {}) misclassified", i, j);
                }
            }
        }
        assert_eq!(
            FlagField::from_mask(&mask),
            Err(GeometryError::ForbiddenCell { i: 2, j: 2 })
        );
    }

    #[test]
    fn test_thin_fluid_channel_is_forbidden() {
        let mask = ObstacleMask::from_fn(GridDimensions2D(3, 3), |_, j| j == 2);
        assert_eq!(
            FlagField::from_mask(&mask),
            Err(GeometryError::ForbiddenCell { i: 1, j: 2 })
        );
    }

    #[test]
    fn test_obstacle_block_classification() {
        // 6x6 box with a 2x2 block at i = 3..=4, j = 3..=4
        let block = |i: usize, j: usize| (3..=4).contains(&i) && (3..=4).contains(&j);
        let mask = ObstacleMask::from_fn(GridDimensions2D(6, 6), |i, j| !block(i, j));
        let flags = FlagField::from_mask(&mask).unwrap();

        assert_eq!(flags.fluid_cell_count(), 32);
        assert_eq!(flags.kind(3, 3), CellKind::ObstacleBoundary(ObstacleFace::SouthWest));
        assert_eq!(flags.kind(4, 3), CellKind::ObstacleBoundary(ObstacleFace::SouthEast));
        assert_eq!(flags.kind(3, 4), CellKind::ObstacleBoundary(ObstacleFace::NorthWest));
        assert_eq!(flags.kind(4, 4), CellKind::ObstacleBoundary(ObstacleFace::NorthEast));
        assert!(flags.is_fluid(2, 3));
    }

    #[test]
    fn test_interior_obstacle_cells() {
        // 3x3 block: the centre has no fluid neighbour
        let block = |i: usize, j: usize| (3..=5).contains(&i) && (3..=5).contains(&j);
        let mask = ObstacleMask::from_fn(GridDimensions2D(7, 7), |i, j| !block(i, j));
        let flags = FlagField::from_mask(&mask).unwrap();
        assert_eq!(flags.kind(4, 4), CellKind::ObstacleInterior);
        assert_eq!(flags.kind(4, 5), CellKind::ObstacleBoundary(ObstacleFace::North));
        assert_eq!(flags.kind(4, 3), CellKind::ObstacleBoundary(ObstacleFace::South));
        assert_eq!(flags.kind(3, 4), CellKind::ObstacleBoundary(ObstacleFace::West));
        assert_eq!(flags.kind(5, 4), CellKind::ObstacleBoundary(ObstacleFace::East));
    }

    #[test]
    fn test_face_neighbor_round_trip() {
        for face in [
            ObstacleFace::North,
            ObstacleFace::South,
            ObstacleFace::West,
            ObstacleFace::East,
            ObstacleFace::NorthEast,
            ObstacleFace::NorthWest,
            ObstacleFace::SouthEast,
            ObstacleFace::SouthWest,
        ] {
            assert_eq!(ObstacleFace::from_neighbors(face.neighbors()), Some(face));
        }
        let opposite = NeighborSet { north: true, south: true, ..Default::default() };
        assert_eq!(ObstacleFace::from_neighbors(opposite), None);
        assert!(ObstacleFace::from_neighbors(NeighborSet::default()).is_none());
    }

    #[test]
    fn test_custom_threshold() {
        let mask = ObstacleMask::new(DMatrix::from_element(5, 5, 150)).unwrap();
        assert_eq!(FlagField::from_mask(&mask).unwrap().fluid_cell_count(), 9);
        // Every pixel solid at threshold 200: no forbidden pattern, no fluid.
        let flags = FlagField::from_mask_with_threshold(&mask, 200).unwrap();
        assert_eq!(flags.fluid_cell_count(), 0);
    }

    #[test]
    fn test_mask_too_small() {
        assert!(ObstacleMask::new(DMatrix::from_element(2, 5, 255)).is_err());
    }
}
