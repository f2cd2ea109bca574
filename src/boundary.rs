pub mod bc2d;
pub mod inflow;
pub mod obstacle;
