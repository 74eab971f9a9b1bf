//! Breakline ingestion and densification (spec.md §4.10).

use crate::binning::{assign_bins, sort_points};
use crate::geometry::StrideGeometry;
use crate::types::{DataPoint, PointKind, OUTSIDE};

/// One vertex of an input polyline. `z` is `None` when the polyline instead
/// carries a single constant `z_level` for its whole length.
#[derive(Clone, Copy, Debug)]
pub struct BreaklineVertex {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// Densifies `vertices` at (at least) one sample per grid cell crossed, then
/// keeps exactly one breakline point per finest-stride bin — the candidate
/// (densified sample or orthogonal-projection foot) closest to the bin's
/// node. `z_level` supplies `z` for vertices that didn't carry their own.
///
/// Per spec.md §9's open question, a vertex whose resolved `z` is NaN is
/// dropped but still counted toward `n_int` densification (it was already
/// accounted for when `n_int` was computed from segment geometry alone).
pub fn inject_breakline(vertices: &[BreaklineVertex], z_level: f64, geom: &StrideGeometry) -> Vec<DataPoint> {
    let mut candidates: Vec<DataPoint> = Vec::new();

    for seg in vertices.windows(2) {
        let (v0, v1) = (seg[0], seg[1]);
        let seg_dx = v1.x - v0.x;
        let seg_dy = v1.y - v0.y;
        let len = seg_dx.hypot(seg_dy);
        let n_int = ((len * (1.0 / geom.dx).max(1.0 / geom.dy)).ceil() as usize).max(1);

        let z_at = |t: f64| -> f64 {
            match (v0.z, v1.z) {
                (Some(z0), Some(z1)) => z0 + t * (z1 - z0),
                _ => z_level,
            }
        };

        for i in 0..=n_int {
            let t = i as f64 / n_int as f64;
            let z = z_at(t);
            if z.is_nan() {
                continue;
            }
            let x = v0.x + t * seg_dx;
            let y = v0.y + t * seg_dy;
            candidates.push(DataPoint::new(x, y, z, PointKind::Breakline));
        }

        // Orthogonal projection of each touched bin's node onto this
        // segment, accepted only when the foot lies within the segment and
        // projects back into the same bin.
        let seg_len2 = seg_dx * seg_dx + seg_dy * seg_dy;
        if seg_len2 < 1e-12 {
            continue;
        }
        let mut touched = std::collections::HashSet::new();
        for i in 0..=n_int {
            let t = i as f64 / n_int as f64;
            let x = v0.x + t * seg_dx;
            let y = v0.y + t * seg_dy;
            if let Some(bin) = geom.bin_of(x, y) {
                touched.insert(bin);
            }
        }
        for (row, col) in touched {
            let col_node = geom.x0 + col as f64 * geom.step_x();
            let row_from_south = (geom.ny as i64 - 1 - row) as f64;
            let row_node = geom.y0 + row_from_south * geom.step_y();

            let t = ((col_node - v0.x) * seg_dx + (row_node - v0.y) * seg_dy) / seg_len2;
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let foot_x = v0.x + t * seg_dx;
            let foot_y = v0.y + t * seg_dy;
            if geom.bin_of(foot_x, foot_y) != Some((row, col)) {
                continue;
            }
            let z = z_at(t);
            if z.is_nan() {
                continue;
            }
            candidates.push(DataPoint::new(foot_x, foot_y, z, PointKind::Breakline));
        }
    }

    assign_bins(&mut candidates, geom);
    sort_points(&mut candidates);

    let mut result = Vec::with_capacity(candidates.len());
    let mut last_bin: Option<usize> = None;
    for p in candidates {
        if p.bin_index == OUTSIDE || last_bin == Some(p.bin_index) {
            continue;
        }
        last_bin = Some(p.bin_index);
        result.push(p);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_segment_produces_one_point_per_crossed_bin() {
        let geom = StrideGeometry::new(1, 11, 11, 1.0, 1.0, 0.0, 0.0);
        let vertices = [
            BreaklineVertex { x: 3.0, y: 5.0, z: Some(10.0) },
            BreaklineVertex { x: 7.0, y: 5.0, z: Some(10.0) },
        ];
        let pts = inject_breakline(&vertices, 0.0, &geom);
        assert!(!pts.is_empty());
        for p in &pts {
            assert_eq!(p.kind, PointKind::Breakline);
            assert!((p.z - 10.0).abs() < 1e-9);
        }
        // at most one point per bin_index
        let mut bins: Vec<usize> = pts.iter().map(|p| p.bin_index).collect();
        bins.sort_unstable();
        bins.dedup();
        assert_eq!(bins.len(), pts.len());
    }

    #[test]
    fn constant_z_level_applies_when_vertices_carry_no_z() {
        let geom = StrideGeometry::new(1, 11, 11, 1.0, 1.0, 0.0, 0.0);
        let vertices = [
            BreaklineVertex { x: 1.0, y: 1.0, z: None },
            BreaklineVertex { x: 1.0, y: 4.0, z: None },
        ];
        let pts = inject_breakline(&vertices, 7.5, &geom);
        assert!(pts.iter().all(|p| (p.z - 7.5).abs() < 1e-9));
    }
}
