//! Incompressible flow with heat transfer and reacting species on a 2-D
//! staggered grid with obstacles.

pub mod boundary;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod numerical;
pub mod poisson;
pub mod reaction;
pub mod solver;
pub mod transport;
