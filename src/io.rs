pub mod json;
pub mod pgm;
pub mod vtk;

use crate::config::{InitialField, OutputFormat, OutputSettings};
use crate::domain::grid2d::{CellSize2D, Field2D, Grid2D, GridDimensions2D};
use crate::error::{ConfigError, OutputError};

/// Read-only view of the simulation state handed to a sink.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub step: usize,
    pub time: f64,
    pub grid: &'a Grid2D,
    pub concentrations: &'a [Field2D],
    pub species: &'a [String],
}

/// Destination of periodic simulation snapshots.
pub trait SnapshotSink {
    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<(), OutputError>;

    /// Called once after the last snapshot.
    fn finish(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Builds the sink selected in the output settings.
pub fn create_sink(
    settings: &OutputSettings,
    dimensions: GridDimensions2D,
    cell_size: CellSize2D,
    species: &[String],
) -> Result<Box<dyn SnapshotSink>, OutputError> {
    Ok(match settings.format {
        OutputFormat::Vtk => Box::new(vtk::VtkWriter::new(
            &settings.directory,
            &settings.prefix,
            dimensions,
            cell_size,
        )?),
        OutputFormat::Json => Box::new(json::JsonSnapshotCollector::new(
            settings.directory.join(format!("{}.json", settings.prefix)),
            dimensions,
            cell_size,
            species.to_vec(),
        )?),
    })
}

/// Cell-centred field with ghost layer, either constant or read from a PGM
/// picture of exactly `imax × jmax` pixels.
pub fn load_initial_field(initial: &InitialField, dimensions: GridDimensions2D) -> Result<Field2D, ConfigError> {
    let GridDimensions2D(imax, jmax) = dimensions;
    match initial {
        InitialField::Constant(value) => Ok(Field2D::from_element(imax + 2, jmax + 2, *value)),
        InitialField::Image { path, coeff } => {
            let image = pgm::read_pgm(path)?;
            if image.dimensions() != dimensions {
                return Err(ConfigError::DimensionMismatch {
                    what: path.display().to_string(),
                    found: (image.width, image.height),
                    expected: (imax, jmax),
                });
            }
            Ok(image.to_field(*coeff))
        }
    }
}
