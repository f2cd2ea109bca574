use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::domain::grid2d::{CellSize2D, GridDimensions2D};
use crate::error::OutputError;
use crate::io::{Snapshot, SnapshotSink};
use crate::numerical::interpolate::{interior, interpolate_u_to_cell_centers, interpolate_v_to_cell_centers};

#[derive(Serialize, Debug)]
struct Metadata<'a> {
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    species: &'a [String],
    snapshots: usize,
}

/// Cell-centred values of one snapshot, column-major over `imax × jmax`.
#[derive(Serialize, Debug)]
pub struct SnapshotData {
    pub step: usize,
    pub time: f64,
    pub u_centers: Vec<f64>,
    pub v_centers: Vec<f64>,
    pub p_centers: Vec<f64>,
    pub t_centers: Vec<f64>,
    pub concentrations: BTreeMap<String, Vec<f64>>,
}

#[derive(Serialize, Debug)]
struct SimulationOutput<'a> {
    metadata: Metadata<'a>,
    data: &'a [SnapshotData],
}

/// Keeps every snapshot in memory and writes them as one JSON document on
/// [`SnapshotSink::finish`].
#[derive(Debug)]
pub struct JsonSnapshotCollector {
    path: PathBuf,
    dimensions: GridDimensions2D,
    cell_size: CellSize2D,
    species: Vec<String>,
    collected: Vec<SnapshotData>,
}

impl JsonSnapshotCollector {
    pub fn new(
        path: PathBuf,
        dimensions: GridDimensions2D,
        cell_size: CellSize2D,
        species: Vec<String>,
    ) -> Result<Self, OutputError> {
        if let Some(parent_dir) = path.parent() {
            fs::create_dir_all(parent_dir)?;
            info!("Ensured output directory exists: {}", parent_dir.display());
        }
        Ok(Self {
            path,
            dimensions,
            cell_size,
            species,
            collected: Vec::new(),
        })
    }

    pub fn collected(&self) -> &[SnapshotData] {
        &self.collected
    }
}

impl SnapshotSink for JsonSnapshotCollector {
    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<(), OutputError> {
        let grid = snapshot.grid;
        if grid.dimensions != self.dimensions {
            return Err(OutputError::Mismatch(format!(
                "grid dimensions ({},{}) do not match collector dimensions ({},{})",
                grid.dimensions.0, grid.dimensions.1, self.dimensions.0, self.dimensions.1
            )));
        }
        let dims = self.dimensions;
        let concentrations = snapshot
            .species
            .iter()
            .zip(snapshot.concentrations)
            .map(|(name, field)| (name.clone(), interior(field, dims).as_slice().to_vec()))
            .collect();

        self.collected.push(SnapshotData {
            step: snapshot.step,
            time: snapshot.time,
            u_centers: interpolate_u_to_cell_centers(&grid.u, dims).as_slice().to_vec(),
            v_centers: interpolate_v_to_cell_centers(&grid.v, dims).as_slice().to_vec(),
            p_centers: interior(&grid.pressure, dims).as_slice().to_vec(),
            t_centers: interior(&grid.temperature, dims).as_slice().to_vec(),
            concentrations,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        if self.collected.is_empty() {
            info!("No data collected, skipping JSON output to {}.", self.path.display());
            return Ok(());
        }
        info!("Writing collected data to JSON file: {}...", self.path.display());
        let output_start = Instant::now();
        let output = SimulationOutput {
            metadata: Metadata {
                nx: self.dimensions.0,
                ny: self.dimensions.1,
                dx: self.cell_size.0,
                dy: self.cell_size.1,
                species: &self.species,
                snapshots: self.collected.len(),
            },
            data: &self.collected,
        };
        let json_string = serde_json::to_string_pretty(&output)?;
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(json_string.as_bytes())?;
        writer.flush()?;
        info!("JSON output finished in {:.2}ms", output_start.elapsed().as_millis());
        Ok(())
    }
}
