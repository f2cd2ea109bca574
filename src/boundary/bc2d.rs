use std::str::FromStr;

use crate::domain::grid2d::{CellSize2D, Field2D, GridDimensions2D};
use crate::error::BoundaryError;

/// Every boundary condition the solver knows, parsed once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Dirichlet,
    Neumann,
    NoSlip,
    FreeSlip,
    Outflow,
    Pressure,
}

impl BoundaryKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dirichlet => "dirichlet",
            Self::Neumann => "neumann",
            Self::NoSlip => "no-slip",
            Self::FreeSlip => "free-slip",
            Self::Outflow => "outflow",
            Self::Pressure => "pressure",
        }
    }

    pub fn is_velocity_kind(&self) -> bool {
        matches!(self, Self::NoSlip | Self::FreeSlip | Self::Outflow | Self::Pressure)
    }

    pub fn is_scalar_kind(&self) -> bool {
        matches!(self, Self::Dirichlet | Self::Neumann)
    }
}

impl FromStr for BoundaryKind {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dirichlet" => Ok(Self::Dirichlet),
            "neumann" => Ok(Self::Neumann),
            "no-slip" => Ok(Self::NoSlip),
            "free-slip" => Ok(Self::FreeSlip),
            "outflow" => Ok(Self::Outflow),
            "pressure" => Ok(Self::Pressure),
            other => Err(BoundaryError::InvalidBoundaryCondition(format!(
                "unknown boundary condition '{}'",
                other
            ))),
        }
    }
}

/// Scalar boundary: a kind plus the prescribed wall value (or gradient for Neumann).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallCondition {
    pub kind: BoundaryKind,
    pub value: f64,
}

impl WallCondition {
    pub fn dirichlet(value: f64) -> Self {
        Self { kind: BoundaryKind::Dirichlet, value }
    }

    pub fn neumann(value: f64) -> Self {
        Self { kind: BoundaryKind::Neumann, value }
    }
}

/// Low and high wall of one axis: (left, right) for x, (bottom, top) for y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBoundary<T>(pub T, pub T);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareBoundary<T> {
    pub x: FaceBoundary<T>,
    pub y: FaceBoundary<T>,
}

impl<T: Copy> SquareBoundary<T> {
    pub fn new(left: T, right: T, bottom: T, top: T) -> Self {
        Self { x: FaceBoundary(left, right), y: FaceBoundary(bottom, top) }
    }

    pub fn uniform(value: T) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn left(&self) -> T {
        self.x.0
    }

    pub fn right(&self) -> T {
        self.x.1
    }

    pub fn bottom(&self) -> T {
        self.y.0
    }

    pub fn top(&self) -> T {
        self.y.1
    }

    /// Walls paired with their names, in left/right/bottom/top order.
    pub fn walls(&self) -> [(&'static str, T); 4] {
        [
            ("left", self.left()),
            ("right", self.right()),
            ("bottom", self.bottom()),
            ("top", self.top()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConditions2D {
    /// Velocity kind per wall; a `Pressure` wall also fixes the pressure level.
    pub velocity: SquareBoundary<BoundaryKind>,
    /// Prescribed pressure per wall, used where the velocity kind is `Pressure`.
    pub pressure: SquareBoundary<f64>,
    pub temperature: SquareBoundary<WallCondition>,
    /// Condition of temperature on internal obstacles.
    pub obstacle: WallCondition,
}

impl BoundaryConditions2D {
    pub fn new(
        velocity: SquareBoundary<BoundaryKind>,
        pressure: SquareBoundary<f64>,
        temperature: SquareBoundary<WallCondition>,
        obstacle: WallCondition,
    ) -> Result<Self, BoundaryError> {
        for (wall, kind) in velocity.walls() {
            if !kind.is_velocity_kind() {
                return Err(BoundaryError::InvalidBoundaryCondition(format!(
                    "velocity at {} wall: '{}' is not a velocity condition",
                    wall,
                    kind.name()
                )));
            }
        }
        for (wall, condition) in temperature.walls() {
            if !condition.kind.is_scalar_kind() {
                return Err(BoundaryError::InvalidBoundaryCondition(format!(
                    "temperature at {} wall: '{}' is not a scalar condition",
                    wall,
                    condition.kind.name()
                )));
            }
        }
        if !obstacle.kind.is_scalar_kind() {
            return Err(BoundaryError::InvalidBoundaryCondition(format!(
                "temperature at obstacles: '{}' is not a scalar condition",
                obstacle.kind.name()
            )));
        }
        Ok(Self { velocity, pressure, temperature, obstacle })
    }

    /// Closed box: no-slip walls, adiabatic temperature walls and obstacles.
    pub fn closed_box() -> Self {
        Self {
            velocity: SquareBoundary::uniform(BoundaryKind::NoSlip),
            pressure: SquareBoundary::uniform(0.0),
            temperature: SquareBoundary::uniform(WallCondition::neumann(0.0)),
            obstacle: WallCondition::neumann(0.0),
        }
    }

    /// True when at least one wall prescribes the absolute pressure level.
    pub fn pressure_is_anchored(&self) -> bool {
        self.velocity.walls().iter().any(|(_, kind)| *kind == BoundaryKind::Pressure)
    }
}

/// Sets the ghost-layer velocities on the four domain walls.
///
/// No-slip and free-slip zero the normal component and mirror the tangential
/// one (with and without sign flip). Outflow and pressure walls extrapolate
/// both components from the interior.
pub fn apply_velocity_boundaries(
    u: &mut Field2D,
    v: &mut Field2D,
    kinds: &SquareBoundary<BoundaryKind>,
    dimensions: GridDimensions2D,
) {
    let GridDimensions2D(imax, jmax) = dimensions;

    // Left wall
    for j in 1..=jmax {
        match kinds.left() {
            BoundaryKind::NoSlip => {
                u[(0, j)] = 0.0;
                v[(0, j)] = -v[(1, j)];
            }
            BoundaryKind::FreeSlip => {
                u[(0, j)] = 0.0;
                v[(0, j)] = v[(1, j)];
            }
            _ => {
                u[(0, j)] = u[(1, j)];
                v[(0, j)] = v[(1, j)];
            }
        }
    }

    // Right wall
    for j in 1..=jmax {
        match kinds.right() {
            BoundaryKind::NoSlip => {
                u[(imax, j)] = 0.0;
                v[(imax + 1, j)] = -v[(imax, j)];
            }
            BoundaryKind::FreeSlip => {
                u[(imax, j)] = 0.0;
                v[(imax + 1, j)] = v[(imax, j)];
            }
            _ => {
                u[(imax, j)] = u[(imax - 1, j)];
                v[(imax + 1, j)] = v[(imax, j)];
            }
        }
    }

    // Top wall
    for i in 1..=imax {
        match kinds.top() {
            BoundaryKind::NoSlip => {
                u[(i, jmax + 1)] = -u[(i, jmax)];
                v[(i, jmax)] = 0.0;
            }
            BoundaryKind::FreeSlip => {
                u[(i, jmax + 1)] = u[(i, jmax)];
                v[(i, jmax)] = 0.0;
            }
            _ => {
                u[(i, jmax + 1)] = u[(i, jmax)];
                v[(i, jmax)] = v[(i, jmax - 1)];
            }
        }
    }

    // Bottom wall
    for i in 1..=imax {
        match kinds.bottom() {
            BoundaryKind::NoSlip => {
                u[(i, 0)] = -u[(i, 1)];
                v[(i, 0)] = 0.0;
            }
            BoundaryKind::FreeSlip => {
                u[(i, 0)] = u[(i, 1)];
                v[(i, 0)] = 0.0;
            }
            _ => {
                u[(i, 0)] = u[(i, 1)];
                v[(i, 0)] = v[(i, 1)];
            }
        }
    }
}

/// Dirichlet walls reflect about the wall value; Neumann walls extrapolate
/// with the prescribed gradient times the cell spacing.
pub fn apply_temperature_boundaries(
    t: &mut Field2D,
    walls: &SquareBoundary<WallCondition>,
    dimensions: GridDimensions2D,
    cell_size: CellSize2D,
) {
    let GridDimensions2D(imax, jmax) = dimensions;
    let CellSize2D(dx, dy) = cell_size;

    let ghost = |wall: WallCondition, inner: f64, h: f64| match wall.kind {
        BoundaryKind::Dirichlet => 2.0 * wall.value - inner,
        _ => inner - h * wall.value,
    };

    for j in 1..=jmax {
        t[(0, j)] = ghost(walls.left(), t[(1, j)], dx);
        t[(imax + 1, j)] = ghost(walls.right(), t[(imax, j)], dx);
    }
    for i in 1..=imax {
        t[(i, jmax + 1)] = ghost(walls.top(), t[(i, jmax)], dy);
        t[(i, 0)] = ghost(walls.bottom(), t[(i, 1)], dy);
    }
}

/// Zero-flux walls for a species concentration.
pub fn apply_concentration_boundaries(c: &mut Field2D, dimensions: GridDimensions2D) {
    let GridDimensions2D(imax, jmax) = dimensions;
    for i in 1..=imax {
        c[(i, jmax + 1)] = c[(i, jmax)];
        c[(i, 0)] = c[(i, 1)];
    }
    for j in 1..=jmax {
        c[(imax + 1, j)] = c[(imax, j)];
        c[(0, j)] = c[(1, j)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DIMS: GridDimensions2D = GridDimensions2D(3, 3);

    fn ramp() -> Field2D {
        // interior value encodes its position, ghosts start at zero
        let mut f = Field2D::zeros(5, 5);
        for i in 1..=3 {
            for j in 1..=3 {
                f[(i, j)] = (10 * i + j) as f64;
            }
        }
        f
    }

    #[test]
    fn test_parse_boundary_kind() {
        assert_eq!("No-Slip".parse::<BoundaryKind>().unwrap(), BoundaryKind::NoSlip);
        assert_eq!(" outflow ".parse::<BoundaryKind>().unwrap(), BoundaryKind::Outflow);
        assert_eq!("PRESSURE".parse::<BoundaryKind>().unwrap(), BoundaryKind::Pressure);
        assert!("periodic".parse::<BoundaryKind>().is_err());
    }

    #[test]
    fn test_new_rejects_mismatched_kinds() {
        let bad_velocity = BoundaryConditions2D::new(
            SquareBoundary::new(BoundaryKind::Dirichlet, BoundaryKind::NoSlip, BoundaryKind::NoSlip, BoundaryKind::NoSlip),
            SquareBoundary::uniform(0.0),
            SquareBoundary::uniform(WallCondition::neumann(0.0)),
            WallCondition::neumann(0.0),
        );
        assert!(bad_velocity.is_err());

        let bad_obstacle = BoundaryConditions2D::new(
            SquareBoundary::uniform(BoundaryKind::NoSlip),
            SquareBoundary::uniform(0.0),
            SquareBoundary::uniform(WallCondition::neumann(0.0)),
            WallCondition { kind: BoundaryKind::Outflow, value: 0.0 },
        );
        assert!(bad_obstacle.is_err());
    }

    #[test]
    fn test_pressure_anchor() {
        let mut bcs = BoundaryConditions2D::closed_box();
        assert!(!bcs.pressure_is_anchored());
        bcs.velocity.x.1 = BoundaryKind::Pressure;
        assert!(bcs.pressure_is_anchored());
    }

    #[test]
    fn test_no_slip_walls() {
        let mut u = ramp();
        let mut v = ramp();
        apply_velocity_boundaries(&mut u, &mut v, &SquareBoundary::uniform(BoundaryKind::NoSlip), DIMS);

        for j in 1..=3 {
            assert_relative_eq!(u[(0, j)], 0.0);
            assert_relative_eq!(u[(3, j)], 0.0);
        }
        // the top wall zeroes v(i, jmax) after the side mirrors
        for j in 1..3 {
            assert_relative_eq!(v[(0, j)], -v[(1, j)]);
            assert_relative_eq!(v[(4, j)], -v[(3, j)]);
        }
        assert_relative_eq!(v[(0, 3)], -13.0);
        assert_relative_eq!(v[(4, 3)], -33.0);
        for i in 1..=3 {
            assert_relative_eq!(v[(i, 0)], 0.0);
            assert_relative_eq!(v[(i, 3)], 0.0);
            assert_relative_eq!(u[(i, 0)], -u[(i, 1)]);
        }
        // top ghost mirrors the interior row
        assert_relative_eq!(u[(1, 4)], -13.0);
        assert_relative_eq!(u[(2, 4)], -23.0);
    }

    #[test]
    fn test_free_slip_and_outflow_walls() {
        let kinds = SquareBoundary::new(
            BoundaryKind::FreeSlip,
            BoundaryKind::Outflow,
            BoundaryKind::FreeSlip,
            BoundaryKind::Outflow,
        );
        let mut u = ramp();
        let mut v = ramp();
        apply_velocity_boundaries(&mut u, &mut v, &kinds, DIMS);

        // left: free slip
        assert_relative_eq!(u[(0, 2)], 0.0);
        assert_relative_eq!(v[(0, 2)], 12.0);
        // right: outflow
        assert_relative_eq!(u[(3, 2)], 22.0);
        assert_relative_eq!(v[(4, 2)], 32.0);
        // bottom: free slip
        assert_relative_eq!(u[(2, 0)], 21.0);
        assert_relative_eq!(v[(2, 0)], 0.0);
        // top: outflow
        assert_relative_eq!(u[(2, 4)], 23.0);
        assert_relative_eq!(v[(2, 3)], 22.0);
    }

    #[test]
    fn test_pressure_walls_extrapolate_velocity() {
        let kinds = SquareBoundary::new(
            BoundaryKind::Pressure,
            BoundaryKind::Pressure,
            BoundaryKind::NoSlip,
            BoundaryKind::NoSlip,
        );
        let mut u = ramp();
        let mut v = ramp();
        apply_velocity_boundaries(&mut u, &mut v, &kinds, DIMS);

        for j in 1..=3 {
            assert_relative_eq!(u[(0, j)], u[(1, j)]);
            assert_relative_eq!(u[(3, j)], u[(2, j)]);
        }
        assert_relative_eq!(u[(0, 2)], 12.0);
        assert_relative_eq!(v[(0, 2)], 12.0);
        assert_relative_eq!(u[(3, 2)], 22.0);
        assert_relative_eq!(v[(4, 2)], 32.0);

        // same ghosts as an outflow wall
        let outflow = SquareBoundary::new(
            BoundaryKind::Outflow,
            BoundaryKind::Outflow,
            BoundaryKind::NoSlip,
            BoundaryKind::NoSlip,
        );
        let mut u_out = ramp();
        let mut v_out = ramp();
        apply_velocity_boundaries(&mut u_out, &mut v_out, &outflow, DIMS);
        assert_eq!(u, u_out);
        assert_eq!(v, v_out);
    }

    #[test]
    fn test_temperature_walls() {
        let walls = SquareBoundary::new(
            WallCondition::dirichlet(1.0),
            WallCondition::neumann(2.0),
            WallCondition::dirichlet(0.0),
            WallCondition::neumann(-1.0),
        );
        let mut t = ramp();
        apply_temperature_boundaries(&mut t, &walls, DIMS, CellSize2D(0.5, 0.25));

        assert_relative_eq!(t[(0, 2)], 2.0 - 12.0);
        assert_relative_eq!(t[(4, 2)], 32.0 - 0.5 * 2.0);
        assert_relative_eq!(t[(2, 0)], -21.0);
        assert_relative_eq!(t[(2, 4)], 23.0 + 0.25);
        // the wall value sits halfway between ghost and interior
        assert_relative_eq!(0.5 * (t[(0, 3)] + t[(1, 3)]), 1.0);
    }

    #[test]
    fn test_concentration_walls_copy_interior() {
        let mut c = ramp();
        apply_concentration_boundaries(&mut c, DIMS);
        assert_relative_eq!(c[(0, 1)], 11.0);
        assert_relative_eq!(c[(4, 3)], 33.0);
        assert_relative_eq!(c[(2, 0)], 21.0);
        assert_relative_eq!(c[(2, 4)], 23.0);
    }
}
