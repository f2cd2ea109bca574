//! Plain (ASCII, `P2`) PGM images used for obstacle masks and initial fields.

use std::fs;
use std::path::Path;

use nalgebra::DMatrix;

use crate::domain::flags::ObstacleMask;
use crate::domain::grid2d::{Field2D, GridDimensions2D};
use crate::error::{GeometryError, PgmError};

/// Grey values of a PGM picture, stored in grid orientation.
///
/// `pixels[(i, j)]` is column `i` of the picture counted from the left and
/// row `j` counted from the bottom, both starting at 1. A one-pixel border of
/// zeros surrounds the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct PgmImage {
    pub width: usize,
    pub height: usize,
    pub max_value: i32,
    pixels: DMatrix<i32>,
}

impl PgmImage {
    pub fn dimensions(&self) -> GridDimensions2D {
        GridDimensions2D(self.width, self.height)
    }

    pub fn pixel(&self, i: usize, j: usize) -> i32 {
        self.pixels[(i, j)]
    }

    pub fn to_mask(&self) -> Result<ObstacleMask, GeometryError> {
        ObstacleMask::new(self.pixels.clone())
    }

    /// Grey values scaled by `coeff`, with the zero border as ghost layer.
    pub fn to_field(&self, coeff: f64) -> Field2D {
        Field2D::from_matrix(self.pixels.map(|p| p as f64 * coeff))
    }
}

pub fn read_pgm(path: &Path) -> Result<PgmImage, PgmError> {
    let text = fs::read_to_string(path).map_err(|source| PgmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pgm(&text)
}

pub fn parse_pgm(text: &str) -> Result<PgmImage, PgmError> {
    let mut tokens = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);

    match tokens.next() {
        Some("P2") => {}
        Some(other) => return Err(PgmError::BadMagic(other.to_string())),
        None => return Err(PgmError::BadMagic(String::new())),
    }

    let mut header = |what: &str| -> Result<usize, PgmError> {
        let token = tokens
            .next()
            .ok_or_else(|| PgmError::BadHeader(format!("missing {}", what)))?;
        token
            .parse::<usize>()
            .map_err(|_| PgmError::BadHeader(format!("{} '{}' is not a non-negative integer", what, token)))
    };
    let width = header("width")?;
    let height = header("height")?;
    let max_value = header("maximum grey value")?;
    if width == 0 || height == 0 {
        return Err(PgmError::BadHeader(format!("empty image {}x{}", width, height)));
    }

    let expected = width * height;
    let mut pixels = DMatrix::zeros(width + 2, height + 2);
    for n in 0..expected {
        let token = tokens.next().ok_or(PgmError::Truncated { read: n, expected })?;
        let value = token
            .parse::<i32>()
            .map_err(|_| PgmError::BadPixel(token.to_string()))?;
        // the first picture row is the top of the domain
        let (col, row) = (n % width, n / width);
        pixels[(col + 1, height - row)] = value;
    }

    Ok(PgmImage { width, height, max_value: max_value as i32, pixels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flags::FlagField;
    use std::io::Write;
    use tempfile::tempdir;

    const CHANNEL: &str = "P2\n# channel with a solid corner\n4 3\n255\n200 255 255 255\n255 255 255 255\n255 255 255 0\n";

    #[test]
    fn test_parse_orientation_and_border() {
        let image = parse_pgm(CHANNEL).unwrap();
        assert_eq!(image.dimensions(), GridDimensions2D(4, 3));
        assert_eq!(image.max_value, 255);
        // top picture row is j = 3
        assert_eq!(image.pixel(1, 3), 200);
        assert_eq!(image.pixel(4, 1), 0);
        assert_eq!(image.pixel(4, 2), 255);
        assert_eq!(image.pixel(1, 1), 255);
        // border
        assert_eq!(image.pixel(0, 2), 0);
        assert_eq!(image.pixel(5, 2), 0);
        assert_eq!(image.pixel(3, 4), 0);
        assert_eq!(image.pixel(3, 0), 0);
    }

    #[test]
    fn test_image_to_mask_and_field() {
        let image = parse_pgm(CHANNEL).unwrap();
        let flags = FlagField::from_mask(&image.to_mask().unwrap()).unwrap();
        assert_eq!(flags.dimensions(), GridDimensions2D(4, 3));
        assert_eq!(flags.fluid_cell_count(), 11);

        let field = image.to_field(0.01);
        assert_eq!(field.dim(), (6, 5));
        approx::assert_relative_eq!(field[(1, 1)], 2.55, epsilon = 1e-12);
        approx::assert_relative_eq!(field[(0, 0)], 0.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_pgm("P5\n1 1\n255\n0"), Err(PgmError::BadMagic(_))));
        assert!(matches!(parse_pgm("P2\n2\n"), Err(PgmError::BadHeader(_))));
        assert!(matches!(parse_pgm("P2 2 2 255 1 2 3"), Err(PgmError::Truncated { read: 3, expected: 4 })));
        assert!(matches!(parse_pgm("P2 1 1 255 x"), Err(PgmError::BadPixel(_))));
    }

    #[test]
    fn test_read_pgm_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mask.pgm");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(CHANNEL.as_bytes()).unwrap();
        drop(file);

        let image = read_pgm(&path).unwrap();
        assert_eq!(image.width, 4);
        assert!(matches!(
            read_pgm(&dir.path().join("missing.pgm")),
            Err(PgmError::Io { .. })
        ));
    }
}
