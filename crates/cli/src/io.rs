//! External collaborators spec.md §1 carves out of the core: record
//! reading, grid writing, and logging setup.

use anyhow::{Context, Result};
use gridengine::finalize::{shrink_to_pixel_registration, OutputRegion, Registration};
use gridengine::prelude::*;
use std::fs;
use std::path::Path;
use tracing_subscriber::fmt::SubscriberBuilder;

pub fn init_logging() {
    SubscriberBuilder::default().with_target(false).init();
}

/// Reads whitespace-separated `x y z` triples, one per line. Blank lines
/// and lines starting with `#` are skipped.
pub fn read_points<P: AsRef<Path>>(path: P) -> Result<Vec<DataPoint>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading points from {}", path.display()))?;
    let mut points = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            anyhow::bail!("{}:{}: expected 3 fields, got {}", path.display(), lineno + 1, fields.len());
        }
        let x: f64 = fields[0].parse().with_context(|| format!("{}:{}: bad x", path.display(), lineno + 1))?;
        let y: f64 = fields[1].parse().with_context(|| format!("{}:{}: bad y", path.display(), lineno + 1))?;
        let z: f64 = fields[2].parse().with_context(|| format!("{}:{}: bad z", path.display(), lineno + 1))?;
        points.push(DataPoint::new(x, y, z, PointKind::Data));
    }
    Ok(points)
}

/// Reads a breakline polyline file: whitespace-separated `x y` or `x y z`
/// per line, one polyline per file. A `z_level` argument supplies the value
/// for lines that only carry `x y`.
pub fn read_breakline<P: AsRef<Path>>(path: P, z_level: f64) -> Result<Breakline> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading breakline from {}", path.display()))?;
    let mut vertices = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            anyhow::bail!("{}:{}: expected at least 2 fields, got {}", path.display(), lineno + 1, fields.len());
        }
        let x: f64 = fields[0].parse()?;
        let y: f64 = fields[1].parse()?;
        let z = if fields.len() >= 3 { Some(fields[2].parse()?) } else { None };
        vertices.push(BreaklineVertex { x, y, z });
    }
    Ok(Breakline { vertices, z_level })
}

/// Writes the output grid as a simple header-then-body ASCII format (no
/// concrete binary grid format is specified by the contract the core
/// hands off to): one header line of key=value pairs, then `n_rows` lines
/// of `n_columns` whitespace-separated values, north-to-south.
///
/// `registration` selects whether the header reports node-centered
/// ("gridline") or cell-centered ("pixel") coordinates (spec.md §4.12 item
/// 4); pixel registration also drops the grid's last row and column, which
/// the shrunk header folds into the pad.
pub fn write_grid<P: AsRef<Path>>(
    path: P,
    grid: &OutputGrid,
    west: f64,
    south: f64,
    dx: f64,
    dy: f64,
    registration: Registration,
) -> Result<()> {
    let path = path.as_ref();

    let mut region = OutputRegion {
        west,
        east: west + (grid.n_columns - 1) as f64 * dx,
        south,
        north: south + (grid.n_rows - 1) as f64 * dy,
        dx,
        dy,
        n_columns: grid.n_columns,
        n_rows: grid.n_rows,
        registration: Registration::Gridline,
    };
    if registration == Registration::Pixel {
        shrink_to_pixel_registration(&mut region);
    }

    let registration_str = match region.registration {
        Registration::Gridline => "gridline",
        Registration::Pixel => "pixel",
    };
    let mut body = format!(
        "n_columns={} n_rows={} west={} south={} dx={} dy={} registration={}\n",
        region.n_columns, region.n_rows, region.west, region.south, region.dx, region.dy, registration_str
    );
    for row in 0..region.n_rows {
        let mut line = String::new();
        for col in 0..region.n_columns {
            if col > 0 {
                line.push(' ');
            }
            line.push_str(&grid.get(row, col).to_string());
        }
        line.push('\n');
        body.push_str(&line);
    }
    fs::write(path, body).with_context(|| format!("writing grid to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn read_points_skips_blank_and_comment_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pts.xyz");
        fs::write(&path, "# header\n\n1.0 2.0 3.0\n4.0 5.0 6.0\n").unwrap();
        let points = read_points(&path).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].x, 4.0);
    }

    #[test]
    fn write_grid_round_trips_header_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.grd");
        let grid = OutputGrid {
            n_columns: 2,
            n_rows: 2,
            values: vec![1.0, 2.0, 3.0, 4.0],
        };
        write_grid(&path, &grid, 0.0, 0.0, 1.0, 1.0, Registration::Gridline).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("n_columns=2 n_rows=2"));
        assert!(text.contains("registration=gridline"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn write_grid_pixel_registration_shrinks_header_and_body() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.grd");
        let grid = OutputGrid {
            n_columns: 3,
            n_rows: 3,
            values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        };
        write_grid(&path, &grid, 0.0, 0.0, 1.0, 1.0, Registration::Pixel).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("n_columns=2 n_rows=2"));
        assert!(text.contains("registration=pixel"));
        assert_eq!(text.lines().count(), 3);
    }
}
