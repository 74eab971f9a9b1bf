//! Initial Gaussian moving-average seeding of the coarsest grid (spec.md §4.11).

use crate::geometry::StrideGeometry;
use crate::types::DataPoint;

/// Seeds every interior node of the coarsest stride with a Gaussian-weighted
/// moving average of data within `search_radius` (data-coordinate units), or
/// the global data mean when none fall within radius. A non-positive
/// `search_radius` leaves `values` untouched — skipping seeding is safe when
/// the stride schedule is rich (spec.md §4.11).
pub fn seed_coarsest_grid(values: &mut [f32], geom: &StrideGeometry, points: &[DataPoint], search_radius: f64) {
    if search_radius <= 0.0 || points.is_empty() {
        return;
    }

    let global_mean = points.iter().map(|p| p.z).sum::<f64>() / points.len() as f64;
    let r2_max = search_radius * search_radius;

    for row in 0..geom.ny as i64 {
        for col in 0..geom.nx as i64 {
            let node_x = geom.x0 + col as f64 * geom.step_x();
            let row_from_south = (geom.ny as i64 - 1 - row) as f64;
            let node_y = geom.y0 + row_from_south * geom.step_y();

            let mut sum_w = 0.0f64;
            let mut sum_wz = 0.0f64;
            for p in points {
                let dx = p.x - node_x;
                let dy = p.y - node_y;
                let r2 = dx * dx + dy * dy;
                if r2 < r2_max {
                    let w = (-4.5 * r2 / r2_max).exp();
                    sum_w += w;
                    sum_wz += w * p.z;
                }
            }

            let v = if sum_w > 0.0 { sum_wz / sum_w } else { global_mean };
            let idx = geom.node_index(row, col);
            values[idx] = v as f32;
        }
    }
}
