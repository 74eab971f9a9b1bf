//! Gauss-Seidel SOR relaxation sweep (spec.md §4.8).
//!
//! The four-position table `P[q]` used by the Briggs correction is stated
//! in the spec only as "fixed 4x4 table indexed by quadrant" without the
//! concrete offsets. This implementation derives it from the symmetry the
//! Briggs formula itself exhibits (b1/b2 and b0/b3 swap under xx<->yy,
//! which is exactly the reflection used to fold a quadrant into Q1): the
//! corner neighbor in the data's quadrant, the two edge neighbors forming
//! that corner, and the node's own pre-sweep value. See DESIGN.md.

use crate::briggs::BriggsCoeffs;
use crate::envelope::Envelopes;
use crate::geometry::{Compass, StrideGeometry};
use crate::stencil::StencilCoeffs;
use crate::types::{NodeStatus, Quadrant};

/// Row/col deltas of the 4 Briggs-correction positions for each quadrant,
/// in the order `[corner, edge_x, edge_y, center]` matching `b0..b3`.
fn quadrant_positions(q: Quadrant) -> [(i64, i64); 4] {
    match q {
        Quadrant::Q1 => [Compass::NE.delta(), Compass::E1.delta(), Compass::N1.delta(), (0, 0)],
        Quadrant::Q2 => [Compass::NW.delta(), Compass::W1.delta(), Compass::N1.delta(), (0, 0)],
        Quadrant::Q3 => [Compass::SW.delta(), Compass::W1.delta(), Compass::S1.delta(), (0, 0)],
        Quadrant::Q4 => [Compass::SE.delta(), Compass::E1.delta(), Compass::S1.delta(), (0, 0)],
    }
}

/// Runs one Gauss-Seidel/SOR sweep over every interior node, in place.
/// Returns the largest `|u_new - u_old|` observed, in the grid's
/// normalized units (the caller multiplies by RMS to compare against a
/// physical-units threshold).
#[allow(clippy::too_many_arguments)]
pub fn sweep(
    values: &mut [f32],
    status: &[NodeStatus],
    briggs: &[BriggsCoeffs],
    geom: &StrideGeometry,
    stencil: &StencilCoeffs,
    a0_const_2: f64,
    omega: f64,
    envelopes: Option<&Envelopes>,
) -> f64 {
    let mx = geom.mx as i64;
    let mut offsets12 = [0i64; 12];
    for (i, c) in Compass::ALL.iter().enumerate() {
        offsets12[i] = c.offset(mx);
    }

    let mut max_change = 0.0f64;
    let mut briggs_cursor = 0usize;

    for row in 0..geom.ny as i64 {
        for col in 0..geom.nx as i64 {
            let idx = geom.node_index(row, col);
            let st = status[idx];
            if st == NodeStatus::Constrained {
                continue;
            }

            let coeffs = match st {
                NodeStatus::Unconstrained => &stencil.unconstrained,
                NodeStatus::Quad(_) => &stencil.constrained,
                NodeStatus::Constrained => unreachable!(),
            };

            let mut u_new = 0.0f64;
            for k in 0..12 {
                let neighbor = (idx as i64 + offsets12[k]) as usize;
                u_new += coeffs[k] * values[neighbor] as f64;
            }

            if let NodeStatus::Quad(q) = st {
                let b = &briggs[briggs_cursor];
                briggs_cursor += 1;
                let positions = quadrant_positions(q);
                let mut sum = 0.0f64;
                for (k, (dr, dc)) in positions.iter().enumerate() {
                    let neighbor = (idx as i64 + dr * mx + dc) as usize;
                    sum += b.b[k] * values[neighbor] as f64;
                }
                u_new = (u_new + a0_const_2 * (sum + b.b[4])) * b.b[5];
            }

            let u_old = values[idx] as f64;
            u_new = omega * u_new + (1.0 - omega) * u_old;

            if let Some(env) = envelopes {
                let full_row = row as usize * geom.stride as usize;
                let full_col = col as usize * geom.stride as usize;
                if !u_new.is_nan() {
                    u_new = env.clamp(full_row, full_col, u_new);
                }
            }

            let change = (u_new - u_old).abs();
            if change > max_change {
                max_change = change;
            }
            values[idx] = u_new as f32;
        }
    }

    max_change
}
