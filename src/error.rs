use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid grid size: {0}")]
    InvalidGridSize(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A fluid cell with solid cells on both sides of an axis, or the reverse.
    #[error("[{i}][{j}] is a forbidden cell")]
    ForbiddenCell { i: usize, j: usize },

    #[error("Invalid obstacle mask: {0}")]
    InvalidMask(String),
}

#[derive(Error, Debug, Clone)]
pub enum BoundaryError {
    #[error("Invalid boundary condition: {0}")]
    InvalidBoundaryCondition(String),

    #[error("Inflow profile '{profile}' cannot be applied: {reason}")]
    InvalidInflow { profile: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown {role} '{name}' in reaction")]
    UnknownSpecies { role: &'static str, name: String },

    #[error("Species '{0}' is declared more than once")]
    DuplicateSpecies(String),

    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("{what} has dimensions {found:?}, expected {expected:?}")]
    DimensionMismatch {
        what: String,
        found: (usize, usize),
        expected: (usize, usize),
    },

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Image error: {0}")]
    Pgm(#[from] PgmError),
}

#[derive(Error, Debug)]
pub enum PgmError {
    #[error("Can not read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Wrong magic number '{0}', expected P2")]
    BadMagic(String),

    #[error("Malformed header: {0}")]
    BadHeader(String),

    #[error("Pixel data ended after {read} of {expected} values")]
    Truncated { read: usize, expected: usize },

    #[error("Invalid pixel value '{0}'")]
    BadPixel(String),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize snapshot data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot does not match sink: {0}")]
    Mismatch(String),
}

#[derive(Error, Debug)]
pub enum SolverError {
    /// Residual or average requested over a domain without fluid cells.
    #[error("No fluid cells available for {0}")]
    NoFluidCells(&'static str),

    #[error("Reaction stability bound must be positive, got {0}")]
    NonPositiveReactionTimestep(f64),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Boundary condition error: {0}")]
    Boundary(#[from] BoundaryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}
