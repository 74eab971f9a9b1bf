//! Point-to-cell binning, sort, and dedup (spec.md §4.3).

use crate::geometry::StrideGeometry;
use crate::types::{DataPoint, PointKind, OUTSIDE};

/// Assigns `bin_index` (or `OUTSIDE`) and the squared distance from each
/// point to its bin's node, at the given stride's geometry.
pub fn assign_bins(points: &mut [DataPoint], geom: &StrideGeometry) {
    for p in points.iter_mut() {
        match geom.bin_of(p.x, p.y) {
            Some((row, col)) => {
                p.bin_index = geom.bin_index(row, col);
                let (col_f, row_f) = geom.fractional_node(p.x, p.y);
                let dc = col_f - col as f64;
                let dr = row_f - row as f64;
                p.dist2 = dc * dc + dr * dr;
            }
            None => {
                p.bin_index = OUTSIDE;
                p.dist2 = f64::INFINITY;
            }
        }
    }
}

/// Orders points by (bin_index ascending, OUTSIDE last; breakline before
/// data; distance-to-node ascending) per spec.md §4.3's comparator.
pub fn sort_points(points: &mut [DataPoint]) {
    points.sort_by(|a, b| {
        let ak = if a.bin_index == OUTSIDE { usize::MAX } else { a.bin_index };
        let bk = if b.bin_index == OUTSIDE { usize::MAX } else { b.bin_index };
        ak.cmp(&bk)
            .then_with(|| a.kind.cmp(&b.kind))
            .then(a.dist2.partial_cmp(&b.dist2).unwrap_or(std::cmp::Ordering::Equal))
    });
}

/// At stride 1, keeps only the first (highest-priority) point per bin and
/// reports how many were discarded as redundant. Points with `OUTSIDE`
/// bin_index were already excluded upstream and are not touched here.
pub fn dedup_first_per_bin(points: Vec<DataPoint>) -> (Vec<DataPoint>, usize) {
    let mut kept = Vec::with_capacity(points.len());
    let mut discarded = 0usize;
    let mut last_bin: Option<usize> = None;
    for p in points {
        if p.bin_index == OUTSIDE {
            continue;
        }
        if last_bin == Some(p.bin_index) {
            discarded += 1;
            continue;
        }
        last_bin = Some(p.bin_index);
        kept.push(p);
    }
    if discarded > 0 {
        tracing::warn!(discarded, "discarded redundant points sharing a grid bin");
    }
    (kept, discarded)
}

/// Duplicates data points that lie within half a cell of the periodic
/// east/west edges onto the opposite edge, wrapping by 360 degrees in x
/// (spec.md §4.3). Call once, before the first stride's binning.
pub fn duplicate_periodic(points: &mut Vec<DataPoint>, x0: f64, x1: f64, dx: f64) {
    let half_cell = dx / 2.0;
    let snapshot: Vec<DataPoint> = points.clone();
    for p in snapshot {
        if (p.x - x1).abs() <= half_cell {
            let mut dup = p;
            dup.x -= 360.0;
            points.push(dup);
        }
        if (p.x - x0).abs() <= half_cell {
            let mut dup = p;
            dup.x += 360.0;
            points.push(dup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt_at(bin: usize, dist2: f64, kind: PointKind) -> DataPoint {
        let mut p = DataPoint::new(0.0, 0.0, 0.0, kind);
        p.bin_index = bin;
        p.dist2 = dist2;
        p
    }

    #[test]
    fn sort_orders_by_bin_then_kind_then_distance() {
        let mut pts = vec![
            pt_at(2, 0.1, PointKind::Data),
            pt_at(1, 0.5, PointKind::Data),
            pt_at(1, 0.2, PointKind::Breakline),
            pt_at(1, 0.1, PointKind::Data),
            pt_at(OUTSIDE, 0.0, PointKind::Data),
        ];
        sort_points(&mut pts);
        let bins: Vec<usize> = pts.iter().map(|p| p.bin_index).collect();
        assert_eq!(bins, vec![1, 1, 1, 2, OUTSIDE]);
        assert_eq!(pts[0].kind, PointKind::Breakline);
        assert_eq!(pts[1].dist2, 0.1);
        assert_eq!(pts[2].dist2, 0.5);
    }

    #[test]
    fn dedup_keeps_first_per_bin() {
        let mut pts = vec![
            pt_at(1, 0.1, PointKind::Breakline),
            pt_at(1, 0.5, PointKind::Data),
            pt_at(2, 0.0, PointKind::Data),
        ];
        sort_points(&mut pts);
        let (kept, discarded) = dedup_first_per_bin(pts);
        assert_eq!(discarded, 1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].bin_index, 1);
        assert_eq!(kept[0].kind, PointKind::Breakline);
    }

    #[test]
    fn periodic_duplication_wraps_near_edges() {
        let mut pts = vec![DataPoint::new(359.6, 0.0, 1.0, PointKind::Data)];
        duplicate_periodic(&mut pts, 0.0, 360.0, 1.0);
        assert_eq!(pts.len(), 2);
        assert!((pts[1].x - (-0.4)).abs() < 1e-9);
    }
}
