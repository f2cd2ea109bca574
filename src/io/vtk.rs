use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::grid2d::{CellSize2D, Field2D, GridDimensions2D};
use crate::error::OutputError;
use crate::io::{Snapshot, SnapshotSink};
use crate::numerical::interpolate::interpolate_velocity_to_nodes;

/// Writes one legacy ASCII VTK structured grid per snapshot, named
/// `<prefix>.<step>.vtk`.
#[derive(Debug)]
pub struct VtkWriter {
    directory: PathBuf,
    prefix: String,
    dimensions: GridDimensions2D,
    cell_size: CellSize2D,
    written: Vec<PathBuf>,
}

impl VtkWriter {
    pub fn new(
        directory: &Path,
        prefix: &str,
        dimensions: GridDimensions2D,
        cell_size: CellSize2D,
    ) -> Result<Self, OutputError> {
        fs::create_dir_all(directory)?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            dimensions,
            cell_size,
            written: Vec::new(),
        })
    }

    pub fn file_path(&self, step: usize) -> PathBuf {
        self.directory.join(format!("{}.{}.vtk", self.prefix, step))
    }

    /// Files produced so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_scalars<W: Write>(&self, out: &mut W, name: &str, field: &Field2D) -> Result<(), OutputError> {
        let GridDimensions2D(imax, jmax) = self.dimensions;
        writeln!(out, "SCALARS {} float 1", name)?;
        writeln!(out, "LOOKUP_TABLE default")?;
        for j in 1..=jmax {
            for i in 1..=imax {
                writeln!(out, "{}", field[(i, j)])?;
            }
        }
        writeln!(out)?;
        Ok(())
    }
}

impl SnapshotSink for VtkWriter {
    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<(), OutputError> {
        if snapshot.grid.dimensions != self.dimensions {
            return Err(OutputError::Mismatch(format!(
                "grid {:?} written to a VTK writer for {:?}",
                snapshot.grid.dimensions, self.dimensions
            )));
        }
        let GridDimensions2D(imax, jmax) = self.dimensions;
        let CellSize2D(dx, dy) = self.cell_size;
        let path = self.file_path(snapshot.step);
        let mut out = BufWriter::new(File::create(&path)?);

        writeln!(out, "# vtk DataFile Version 2.0")?;
        writeln!(out, "chemflow t={}", snapshot.time)?;
        writeln!(out, "ASCII")?;
        writeln!(out)?;
        writeln!(out, "DATASET STRUCTURED_GRID")?;
        writeln!(out, "DIMENSIONS {} {} 1", imax + 1, jmax + 1)?;
        writeln!(out, "POINTS {} float", (imax + 1) * (jmax + 1))?;
        writeln!(out)?;
        for j in 0..=jmax {
            for i in 0..=imax {
                writeln!(out, "{} {} 0", i as f64 * dx, j as f64 * dy)?;
            }
        }
        writeln!(out)?;

        let (un, vn) = interpolate_velocity_to_nodes(&snapshot.grid.u, &snapshot.grid.v, self.dimensions);
        writeln!(out, "POINT_DATA {}", (imax + 1) * (jmax + 1))?;
        writeln!(out)?;
        writeln!(out, "VECTORS velocity float")?;
        for j in 0..=jmax {
            for i in 0..=imax {
                writeln!(out, "{} {} 0", un[(i, j)], vn[(i, j)])?;
            }
        }
        writeln!(out)?;

        writeln!(out, "CELL_DATA {}", imax * jmax)?;
        self.write_scalars(&mut out, "pressure", &snapshot.grid.pressure)?;
        self.write_scalars(&mut out, "temperature", &snapshot.grid.temperature)?;
        for (name, field) in snapshot.species.iter().zip(snapshot.concentrations) {
            self.write_scalars(&mut out, &name.replace(' ', "_"), field)?;
        }
        out.flush()?;

        debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid2d::Grid2D;
    use tempfile::tempdir;

    #[test]
    fn test_writes_structured_grid() {
        let dir = tempdir().unwrap();
        let dims = GridDimensions2D(3, 2);
        let cell = CellSize2D(0.5, 1.0);
        let mut grid = Grid2D::new(dims, cell).unwrap();
        grid.u.fill(1.0);
        grid.pressure.fill(2.0);
        let c = vec![grid.cell_field()];
        let names = vec!["sodium chloride".to_string()];

        let mut writer = VtkWriter::new(&dir.path().join("out"), "wire", dims, cell).unwrap();
        writer
            .write_snapshot(&Snapshot { step: 7, time: 0.25, grid: &grid, concentrations: &c, species: &names })
            .unwrap();

        let path = dir.path().join("out").join("wire.7.vtk");
        assert_eq!(writer.written(), &[path.clone()]);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# vtk DataFile Version 2.0\n"));
        assert!(text.contains("DIMENSIONS 4 3 1"));
        assert!(text.contains("POINTS 12 float"));
        assert!(text.contains("1.5 1 0"));
        assert!(text.contains("POINT_DATA 12"));
        assert!(text.contains("CELL_DATA 6"));
        assert!(text.contains("SCALARS sodium_chloride float 1"));
        let pressure_block: Vec<&str> = text
            .split("SCALARS pressure float 1\nLOOKUP_TABLE default\n")
            .nth(1)
            .unwrap()
            .lines()
            .take(6)
            .collect();
        assert_eq!(pressure_block, vec!["2"; 6]);
    }

    #[test]
    fn test_rejects_foreign_grid() {
        let dir = tempdir().unwrap();
        let grid = Grid2D::new(GridDimensions2D(2, 2), CellSize2D(1.0, 1.0)).unwrap();
        let mut writer = VtkWriter::new(dir.path(), "x", GridDimensions2D(3, 3), CellSize2D(1.0, 1.0)).unwrap();
        let result = writer.write_snapshot(&Snapshot { step: 0, time: 0.0, grid: &grid, concentrations: &[], species: &[] });
        assert!(matches!(result, Err(OutputError::Mismatch(_))));
    }
}
