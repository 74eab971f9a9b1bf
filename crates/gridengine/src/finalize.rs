//! Post-solve finalization (spec.md §4.12): misfit diagnostics, trend
//! restoration, periodic exactness, and pixel-registration shrink.

use crate::geometry::StrideGeometry;
use crate::trend::Plane;
use crate::types::{DataPoint, NodeStatus, OUTSIDE};

/// Diagnostic-only misfit summary (spec.md §9: not load-bearing for
/// correctness, purely reported back to the caller).
#[derive(Clone, Copy, Debug)]
pub struct MisfitStats {
    pub mean: f64,
    pub rms: f64,
    pub laplacian_sum_sq: f64,
}

#[inline]
fn get(values: &[f32], geom: &StrideGeometry, row: i64, col: i64) -> f64 {
    values[geom.node_index(row, col)] as f64
}

/// Evaluates, for every non-pinned data point, a 3rd-order Taylor expansion
/// of the solved surface around its nearest node (first/second/third
/// partials approximated by central differences along each axis, cross
/// terms omitted — a diagnostic simplification, not a load-bearing
/// correction), and reports the mean/RMS of (estimate − observation) plus
/// the summed squared Laplacian over interior nodes. Call before
/// [`restore_trend`], while `values` and `points[].z` are both still in
/// detrended/normalized units.
pub fn compute_misfit(values: &[f32], geom: &StrideGeometry, points: &[DataPoint], status: &[NodeStatus]) -> MisfitStats {
    let mut residuals = Vec::new();

    for p in points {
        if p.bin_index == OUTSIDE {
            continue;
        }
        let row = (p.bin_index / geom.nx) as i64;
        let col = (p.bin_index % geom.nx) as i64;
        let idx = geom.node_index(row, col);
        if status[idx] == NodeStatus::Constrained {
            continue;
        }

        let (col_f, row_f) = geom.fractional_node(p.x, p.y);
        let fx = col_f - col as f64;
        let fy = row_f - row as f64;

        let center = get(values, geom, row, col);
        let e1 = get(values, geom, row, col + 1);
        let w1 = get(values, geom, row, col - 1);
        let e2 = get(values, geom, row, col + 2);
        let w2 = get(values, geom, row, col - 2);
        let n1 = get(values, geom, row - 1, col);
        let s1 = get(values, geom, row + 1, col);
        let n2 = get(values, geom, row - 2, col);
        let s2 = get(values, geom, row + 2, col);

        let d1x = (e1 - w1) / 2.0;
        let d2x = e1 - 2.0 * center + w1;
        let d3x = (e2 - 2.0 * e1 + 2.0 * w1 - w2) / 2.0;
        let d1y = (s1 - n1) / 2.0;
        let d2y = s1 - 2.0 * center + n1;
        let d3y = (s2 - 2.0 * s1 + 2.0 * n1 - n2) / 2.0;

        let estimate = center
            + d1x * fx
            + d1y * fy
            + 0.5 * d2x * fx * fx
            + 0.5 * d2y * fy * fy
            + d3x * fx * fx * fx / 6.0
            + d3y * fy * fy * fy / 6.0;

        residuals.push(estimate - p.z);
    }

    let n = residuals.len().max(1) as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let rms = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();

    let mut laplacian_sum_sq = 0.0f64;
    for row in 0..geom.ny as i64 {
        for col in 0..geom.nx as i64 {
            let lap = get(values, geom, row, col + 1)
                + get(values, geom, row, col - 1)
                + get(values, geom, row - 1, col)
                + get(values, geom, row + 1, col)
                - 4.0 * get(values, geom, row, col);
            laplacian_sum_sq += lap * lap;
        }
    }

    MisfitStats {
        mean,
        rms,
        laplacian_sum_sq,
    }
}

/// Multiplies every interior node by `rms` and adds back the best-fit plane
/// evaluated at that node's (col, row_from_south).
pub fn restore_trend(values: &mut [f32], geom: &StrideGeometry, plane: &Plane, rms: f64) {
    for row in 0..geom.ny as i64 {
        for col in 0..geom.nx as i64 {
            let row_from_south = (geom.ny as i64 - 1 - row) as f64;
            let idx = geom.node_index(row, col);
            let v = values[idx] as f64 * rms + plane.eval(col as f64, row_from_south);
            values[idx] = v as f32;
        }
    }
}

/// Forces the west and east boundary columns to their shared average, so
/// the periodic seam is exact rather than merely converged (spec.md §4.12).
pub fn enforce_periodic_exactness(values: &mut [f32], geom: &StrideGeometry) {
    let last_col = geom.nx as i64 - 1;
    for row in 0..geom.ny as i64 {
        let west = get(values, geom, row, 0);
        let east = get(values, geom, row, last_col);
        let avg = 0.5 * (west + east);
        let idx_w = geom.node_index(row, 0);
        let idx_e = geom.node_index(row, last_col);
        values[idx_w] = avg as f32;
        values[idx_e] = avg as f32;
    }
}

/// Whether the output grid reports node-centered ("gridline") or
/// cell-centered ("pixel") coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    Gridline,
    Pixel,
}

/// The header fields handed off alongside the output body (spec.md §6).
#[derive(Clone, Copy, Debug)]
pub struct OutputRegion {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
    pub dx: f64,
    pub dy: f64,
    pub n_columns: usize,
    pub n_rows: usize,
    pub registration: Registration,
}

/// Emulates pixel registration by shrinking the declared region inward by
/// half an increment on the north and west edges and folding the last row
/// and column into the pad — the node grid itself is untouched, only the
/// reported header shrinks by one row/column (spec.md §3, §4.12).
pub fn shrink_to_pixel_registration(region: &mut OutputRegion) {
    region.west += region.dx / 2.0;
    region.north -= region.dy / 2.0;
    region.n_columns -= 1;
    region.n_rows -= 1;
    region.east = region.west + (region.n_columns - 1) as f64 * region.dx;
    region.south = region.north - (region.n_rows - 1) as f64 * region.dy;
    region.registration = Registration::Pixel;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_trend_adds_plane_and_scales_by_rms() {
        let geom = StrideGeometry::new(1, 4, 4, 1.0, 1.0, 0.0, 0.0);
        let mut values = vec![0.0f32; geom.mx * geom.my];
        for row in 0..geom.ny as i64 {
            for col in 0..geom.nx as i64 {
                let idx = geom.node_index(row, col);
                values[idx] = 1.0;
            }
        }
        let plane = Plane {
            icept: 10.0,
            sx: 0.0,
            sy: 0.0,
        };
        restore_trend(&mut values, &geom, &plane, 2.0);
        let idx = geom.node_index(0, 0);
        assert!((values[idx] as f64 - 12.0).abs() < 1e-6);
    }

    #[test]
    fn periodic_exactness_forces_equal_edges() {
        let geom = StrideGeometry::new(1, 8, 4, 1.0, 1.0, 0.0, 0.0);
        let mut values = vec![0.0f32; geom.mx * geom.my];
        for row in 0..geom.ny as i64 {
            let idx_w = geom.node_index(row, 0);
            let idx_e = geom.node_index(row, geom.nx as i64 - 1);
            values[idx_w] = 1.0;
            values[idx_e] = 3.0;
        }
        enforce_periodic_exactness(&mut values, &geom);
        for row in 0..geom.ny as i64 {
            let w = get(&values, &geom, row, 0);
            let e = get(&values, &geom, row, geom.nx as i64 - 1);
            assert!((w - 2.0).abs() < 1e-6);
            assert!((e - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn pixel_shrink_reduces_dimensions_by_one() {
        let mut region = OutputRegion {
            west: 0.0,
            east: 10.0,
            south: 0.0,
            north: 10.0,
            dx: 1.0,
            dy: 1.0,
            n_columns: 11,
            n_rows: 11,
            registration: Registration::Gridline,
        };
        shrink_to_pixel_registration(&mut region);
        assert_eq!(region.n_columns, 10);
        assert_eq!(region.n_rows, 10);
        assert_eq!(region.registration, Registration::Pixel);
        assert!((region.west - 0.5).abs() < 1e-9);
    }
}
