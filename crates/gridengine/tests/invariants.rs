//! Property-based tests for the universal invariants spec.md §8 names.

use gridengine::binning::sort_points;
use gridengine::boundary::apply_boundary_conditions;
use gridengine::geometry::StrideGeometry;
use gridengine::relax::sweep;
use gridengine::schedule::compute_stride_schedule;
use gridengine::stencil::StencilCoeffs;
use gridengine::types::{DataPoint, NodeStatus, PointKind, OUTSIDE};
use proptest::prelude::*;

fn node_count(n: usize, stride: u32) -> usize {
    (n - 1) / stride as usize + 1
}

proptest! {
    #[test]
    fn stride_schedule_respects_minimum_nodes_and_ends_at_one(
        n_columns in 5usize..400,
        n_rows in 5usize..400,
    ) {
        let strides = compute_stride_schedule(n_columns, n_rows);
        prop_assert_eq!(*strides.last().unwrap(), 1);
        for &s in &strides {
            prop_assert!(node_count(n_columns, s) >= 4);
            prop_assert!(node_count(n_rows, s) >= 4);
        }
        for w in strides.windows(2) {
            prop_assert!(w[0] > w[1]);
        }
    }

    #[test]
    fn sort_preserves_bin_ordering(
        bins in prop::collection::vec(0usize..20, 1..60),
        kinds in prop::collection::vec(any::<bool>(), 1..60),
        dists in prop::collection::vec(0.0f64..10.0, 1..60),
    ) {
        let n = bins.len().min(kinds.len()).min(dists.len());
        let mut points: Vec<DataPoint> = (0..n)
            .map(|i| {
                let mut p = DataPoint::new(0.0, 0.0, 0.0, if kinds[i] { PointKind::Breakline } else { PointKind::Data });
                p.bin_index = bins[i];
                p.dist2 = dists[i];
                p
            })
            .collect();
        // Scatter in a few OUTSIDE sentinels too.
        if n > 3 {
            points[0].bin_index = OUTSIDE;
        }
        sort_points(&mut points);

        for w in points.windows(2) {
            let a_key = if w[0].bin_index == OUTSIDE { usize::MAX } else { w[0].bin_index };
            let b_key = if w[1].bin_index == OUTSIDE { usize::MAX } else { w[1].bin_index };
            prop_assert!(a_key <= b_key);
            if a_key == b_key {
                prop_assert!(w[0].kind <= w[1].kind);
                if w[0].kind == w[1].kind {
                    prop_assert!(w[0].dist2 <= w[1].dist2 + 1e-12);
                }
            }
        }
    }

    #[test]
    fn constrained_nodes_are_never_touched_by_sweep(
        pinned_row in 2i64..6,
        pinned_col in 2i64..6,
        pinned_value in -100.0f64..100.0,
        omega in 1.0f64..2.0,
    ) {
        let geom = StrideGeometry::new(1, 8, 8, 1.0, 1.0, 0.0, 0.0);
        let mut values = vec![0.0f32; geom.mx * geom.my];
        let mut status = vec![NodeStatus::Unconstrained; geom.mx * geom.my];
        let idx = geom.node_index(pinned_row, pinned_col);
        status[idx] = NodeStatus::Constrained;
        values[idx] = pinned_value as f32;

        let stencil = StencilCoeffs::new(0.2, 1.0);
        apply_boundary_conditions(&mut values, &geom, 0.3, 1.0, false);
        for _ in 0..5 {
            apply_boundary_conditions(&mut values, &geom, 0.3, 1.0, false);
            sweep(&mut values, &status, &[], &geom, &stencil, 0.0, omega, None);
        }
        prop_assert_eq!(values[idx], pinned_value as f32);
    }
}
