//! Grid expansion / bilinear forecaster (spec.md §4.9).
//!
//! Refines the active sub-grid from `prev` stride to `new` stride (a
//! smaller stride, so more active nodes) by relocating every previous node
//! to its new padded position and bilinearly filling the nodes in between.
//!
//! Edge naming note: the spec calls the two edges left uncovered by the 2D
//! bilinear squares "north and east"; this implementation fills whichever
//! edges are actually uncovered (the grid's last-row and last-column, given
//! the row/col iteration direction below) — the functional requirement
//! (every node ends up filled) holds regardless of which compass label
//! attaches to which edge. See DESIGN.md.

use crate::geometry::StrideGeometry;
use crate::types::NodeStatus;

/// Returns the new stride's status array: `Constrained` at every relocated
/// previous node, `Unconstrained` everywhere else (spec.md §4.9 step 4).
pub fn bilinear_forecast(values: &mut [f32], prev: &StrideGeometry, new: &StrideGeometry) -> Vec<NodeStatus> {
    assert_eq!(prev.stride % new.stride, 0, "stride must refine by an integer factor");
    let e = (prev.stride / new.stride) as i64;
    let mut status = vec![NodeStatus::Unconstrained; new.mx * new.my];

    // Step 1: relocate previous nodes, south-east to north-west, so the
    // destination index is always ahead of any not-yet-read source index.
    for row in (0..prev.ny as i64).rev() {
        for col in (0..prev.nx as i64).rev() {
            let old_idx = prev.node_index(row, col);
            let v = values[old_idx];
            let new_idx = new.node_index(row * e, col * e);
            values[new_idx] = v;
        }
    }
    for row in 0..prev.ny as i64 {
        for col in 0..prev.nx as i64 {
            let new_idx = new.node_index(row * e, col * e);
            status[new_idx] = NodeStatus::Constrained;
        }
    }

    if e <= 1 {
        return status;
    }

    // Step 2: bilinear fill inside every previous bin-square.
    for row in 0..(prev.ny as i64 - 1) {
        for col in 0..(prev.nx as i64 - 1) {
            let r0 = row * e;
            let c0 = col * e;
            let u00 = values[new.node_index(r0, c0)] as f64;
            let u10 = values[new.node_index(r0, c0 + e)] as f64;
            let u01 = values[new.node_index(r0 + e, c0)] as f64;
            let u11 = values[new.node_index(r0 + e, c0 + e)] as f64;

            let c = u00;
            let sx = u10 - c;
            let sy = u01 - c;
            let sxy = u11 - u10 - sy;

            for drow in 0..e {
                for dcol in 0..e {
                    if drow == 0 && dcol == 0 {
                        continue;
                    }
                    let fx = dcol as f64 / e as f64;
                    let fy = drow as f64 / e as f64;
                    let v = (c + sy * fy) + fx * (sx + sxy * fy);
                    let idx = new.node_index(r0 + drow, c0 + dcol);
                    values[idx] = v as f32;
                }
            }
        }
    }

    // Step 3: 1-D interpolation along the two edges the 2D squares don't
    // reach (the final row and final column of previous nodes).
    let last_row = (prev.ny as i64 - 1) * e;
    for col in 0..(prev.nx as i64 - 1) {
        let c0 = col * e;
        let u0 = values[new.node_index(last_row, c0)] as f64;
        let u1 = values[new.node_index(last_row, c0 + e)] as f64;
        for dcol in 1..e {
            let f = dcol as f64 / e as f64;
            let idx = new.node_index(last_row, c0 + dcol);
            values[idx] = (u0 + f * (u1 - u0)) as f32;
        }
    }
    let last_col = (prev.nx as i64 - 1) * e;
    for row in 0..(prev.ny as i64 - 1) {
        let r0 = row * e;
        let u0 = values[new.node_index(r0, last_col)] as f64;
        let u1 = values[new.node_index(r0 + e, last_col)] as f64;
        for drow in 1..e {
            let f = drow as f64 / e as f64;
            let idx = new.node_index(r0 + drow, last_col);
            values[idx] = (u0 + f * (u1 - u0)) as f32;
        }
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_fill_reproduces_exact_plane() {
        // z = col + 2*row on the coarse grid; refinement should reproduce
        // the same plane exactly (bilinear is exact for a linear field).
        let prev = StrideGeometry::new(2, 9, 9, 1.0, 1.0, 0.0, 0.0);
        let new = StrideGeometry::new(1, 9, 9, 1.0, 1.0, 0.0, 0.0);
        let mut values = vec![0.0f32; new.mx * new.my];
        for row in 0..prev.ny as i64 {
            for col in 0..prev.nx as i64 {
                let idx = prev.node_index(row, col);
                values[idx] = (col + 2 * row) as f32;
            }
        }
        let status = bilinear_forecast(&mut values, &prev, &new);
        for row in 0..new.ny as i64 {
            for col in 0..new.nx as i64 {
                let idx = new.node_index(row, col);
                let expected = (col + 2 * row) as f32;
                assert!((values[idx] - expected).abs() < 1e-4, "row={row} col={col}");
            }
        }
        // Every other node along relocated rows/cols should be Constrained.
        let relocated = new.node_index(0, 0);
        assert_eq!(status[relocated], NodeStatus::Constrained);
    }
}
