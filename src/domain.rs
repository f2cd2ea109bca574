pub mod flags;
pub mod grid2d;
