//! Nearest-constraint classification (spec.md §4.4).

use crate::briggs::{compute_briggs, reflect_to_quadrant1, BriggsCoeffs, BriggsConstants};
use crate::envelope::Envelopes;
use crate::geometry::StrideGeometry;
use crate::trend::Plane;
use crate::types::{DataPoint, NodeStatus, OUTSIDE};

pub struct ClassifyOutput {
    pub status: Vec<NodeStatus>,
    /// Briggs entries in the order bins were first visited; `NodeStatus::Quad`
    /// nodes consume exactly one entry each, in the same traversal order
    /// the relaxation sweep will later walk the grid in (row-major).
    pub briggs: Vec<BriggsCoeffs>,
}

/// Offset threshold (in node units) below which a datum is considered to
/// coincide with its node and gets pinned rather than Briggs-corrected.
const PIN_TOLERANCE: f64 = 0.05;

/// Resets every interior node to `Unconstrained`, then walks `points`
/// (already sorted ascending by bin_index, breaklines before data, nearest
/// first) assigning status and, for off-node constraints, Briggs entries.
/// Writes pinned node values directly into `grid_values` (padded buffer
/// addressed via `geom`).
#[allow(clippy::too_many_arguments)]
pub fn classify_stride(
    points: &[DataPoint],
    geom: &StrideGeometry,
    plane: &Plane,
    rms: f64,
    consts: BriggsConstants,
    envelopes: Option<&Envelopes>,
    grid_values: &mut [f32],
) -> ClassifyOutput {
    let mut status = vec![NodeStatus::Unconstrained; geom.mx * geom.my];
    let mut briggs = Vec::new();

    let mut last_bin: Option<usize> = None;
    for p in points {
        if p.bin_index == OUTSIDE {
            continue;
        }
        if last_bin == Some(p.bin_index) {
            continue;
        }
        last_bin = Some(p.bin_index);

        let row = (p.bin_index / geom.nx) as i64;
        let col = (p.bin_index % geom.nx) as i64;

        let (col_f, row_f) = geom.fractional_node(p.x, p.y);
        let dx = col_f - col as f64;
        let dy = row as f64 - row_f; // positive northward: row grows southward

        let idx = geom.node_index(row, col);

        if dx.abs() < PIN_TOLERANCE && dy.abs() < PIN_TOLERANCE {
            status[idx] = NodeStatus::Constrained;
            let mut value = p.z + (1.0 / rms) * geom.stride as f64 * (plane.sx * dx + plane.sy * dy);
            if let Some(env) = envelopes {
                let full_row = row as usize * geom.stride as usize;
                let full_col = col as usize * geom.stride as usize;
                value = env.clamp(full_row, full_col, value);
            }
            grid_values[idx] = value as f32;
        } else {
            let (xx, yy, quadrant) = reflect_to_quadrant1(dx, dy);
            let coeffs = compute_briggs(xx, yy, p.z, consts);
            status[idx] = NodeStatus::Quad(quadrant);
            briggs.push(coeffs);
        }
    }

    ClassifyOutput { status, briggs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::{assign_bins, sort_points};
    use crate::types::PointKind;

    #[test]
    fn on_node_point_pins_exact_value() {
        let geom = StrideGeometry::new(1, 10, 10, 1.0, 1.0, 0.0, 0.0);
        let mut pts = vec![DataPoint::new(5.0, 5.0, 42.0, PointKind::Data)];
        assign_bins(&mut pts, &geom);
        sort_points(&mut pts);
        let consts = BriggsConstants::new(0.0, 1.0);
        let mut grid = vec![0.0f32; geom.mx * geom.my];
        let plane = Plane::zero();
        let out = classify_stride(&pts, &geom, &plane, 1.0, consts, None, &mut grid);
        let idx = geom.node_index(4, 5);
        assert_eq!(out.status[idx], NodeStatus::Constrained);
        assert!((grid[idx] - 42.0).abs() < 1e-4);
    }

    #[test]
    fn off_node_point_gets_briggs_entry() {
        let geom = StrideGeometry::new(1, 10, 10, 1.0, 1.0, 0.0, 0.0);
        let mut pts = vec![DataPoint::new(5.3, 5.3, 1.0, PointKind::Data)];
        assign_bins(&mut pts, &geom);
        sort_points(&mut pts);
        let consts = BriggsConstants::new(0.0, 1.0);
        let mut grid = vec![0.0f32; geom.mx * geom.my];
        let plane = Plane::zero();
        let out = classify_stride(&pts, &geom, &plane, 1.0, consts, None, &mut grid);
        assert_eq!(out.briggs.len(), 1);
        let idx = geom.node_index(4, 5);
        assert!(matches!(out.status[idx], NodeStatus::Quad(_)));
    }
}
