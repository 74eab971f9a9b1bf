//! Top-level orchestrator (spec.md §2): ingest → detrend/normalize →
//! stride schedule → {apply BCs → classify → relax → refine → forecast}
//! until stride 1 → finalize.

use tracing::{info, info_span};

use crate::binning::{assign_bins, dedup_first_per_bin, duplicate_periodic, sort_points};
use crate::boundary::apply_boundary_conditions;
use crate::breakline::{inject_breakline, BreaklineVertex};
use crate::briggs::BriggsConstants;
use crate::classify::classify_stride;
use crate::config::EngineConfig;
use crate::envelope::Envelopes;
use crate::error::{GridError, Result};
use crate::expand::bilinear_forecast;
use crate::finalize::{compute_misfit, enforce_periodic_exactness, restore_trend, MisfitStats};
use crate::geometry::StrideGeometry;
use crate::relax::sweep;
use crate::schedule::{compute_stride_schedule, suggest_dimensions};
use crate::seed::seed_coarsest_grid;
use crate::stencil::StencilCoeffs;
use crate::trend::{detrend_and_normalize, Plane};
use crate::types::{DataPoint, NodeStatus};

/// The finished surface: interior nodes only, row-major, north-to-south,
/// west-to-east (spec.md §6).
#[derive(Clone, Debug)]
pub struct OutputGrid {
    pub n_columns: usize,
    pub n_rows: usize,
    pub values: Vec<f32>,
}

impl OutputGrid {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.n_columns + col]
    }
}

/// Outcome of a run, beyond the grid itself.
#[derive(Clone, Debug)]
pub struct Report {
    /// False when the finest stride hit its iteration cap before the
    /// convergence threshold — not an error, the partial solution still
    /// ships (spec.md §7).
    pub converged: bool,
    pub total_iterations: u32,
    pub plane: Plane,
    pub rms: f64,
    /// `true` when the input was exactly planar: no iteration ran.
    pub plane_only: bool,
    pub misfit: Option<MisfitStats>,
}

/// One input breakline: its vertices plus the constant z it falls back to
/// when a vertex carries no z of its own.
pub struct Breakline {
    pub vertices: Vec<BreaklineVertex>,
    pub z_level: f64,
}

pub struct Engine {
    config: EngineConfig,
}

/// How far `suggest_sizes` is allowed to search for a richer factorization
/// (spec.md §4.1's "nearby (n_columns, n_rows) pairs").
const SUGGEST_MAX_EXTRA: usize = 8;

impl Engine {
    pub fn new(mut config: EngineConfig) -> Result<Self> {
        if config.suggest_sizes {
            if let Some((nc, nr, speedup)) = suggest_dimensions(config.n_columns, config.n_rows, SUGGEST_MAX_EXTRA) {
                tracing::info!(
                    from_n_columns = config.n_columns,
                    from_n_rows = config.n_rows,
                    to_n_columns = nc,
                    to_n_rows = nr,
                    speedup,
                    "expanding grid to a richer multigrid factorization"
                );
                config.n_columns = nc;
                config.n_rows = nr;
            }
        }
        config.validate()?;
        Ok(Engine { config })
    }

    /// Runs the full ingest-to-finalization pipeline. `points` carries raw
    /// (x, y, z) observations; NaN z and out-of-region points are dropped
    /// with a warning, not an error. `breaklines` is optional.
    pub fn run(&self, mut points: Vec<DataPoint>, breaklines: &[Breakline]) -> Result<(OutputGrid, Report)> {
        let cfg = &self.config;
        let span = info_span!("gridengine_run", n_columns = cfg.n_columns, n_rows = cfg.n_rows);
        let _enter = span.enter();

        let before = points.len();
        points.retain(|p| !p.z.is_nan());
        let dropped_nan = before - points.len();
        if dropped_nan > 0 {
            tracing::warn!(dropped_nan, "dropped points with NaN z");
        }

        let full_geom = StrideGeometry::new(1, cfg.n_columns, cfg.n_rows, cfg.dx, cfg.dy, cfg.x0, cfg.y0);

        for bl in breaklines {
            let mut bl_points = inject_breakline(&bl.vertices, bl.z_level, &full_geom);
            points.append(&mut bl_points);
        }

        if cfg.periodic {
            let x1 = cfg.x0 + (cfg.n_columns - 1) as f64 * cfg.dx;
            duplicate_periodic(&mut points, cfg.x0, x1, cfg.dx);
        }

        assign_bins(&mut points, &full_geom);
        points.retain(|p| p.bin_index != crate::types::OUTSIDE);
        if points.is_empty() {
            return Err(GridError::EmptyInput);
        }

        let raw_z: Vec<f64> = points.iter().map(|p| p.z).collect();

        let detrend = detrend_and_normalize(&mut points, cfg.dx, cfg.dy, cfg.x0, cfg.y0, cfg.periodic);
        let plane = detrend.plane;
        let rms = detrend.rms;

        if detrend.plane_only {
            info!("data lie exactly on a plane; skipping iteration");
            let plane_only_envelopes = if matches!(cfg.lower_envelope, crate::config::EnvelopeSpec::None)
                && matches!(cfg.upper_envelope, crate::config::EnvelopeSpec::None)
            {
                None
            } else {
                // Values here are the raw plane evaluation, not a detrended
                // residual, so materialize the bounds in raw units too: a
                // zero plane and rms=1 make `materialize`'s
                // `(bound - plane(node)) / rms` an identity on `bound`.
                Some(Envelopes::build(&cfg.lower_envelope, &cfg.upper_envelope, &raw_z, full_geom.nx, full_geom.ny, |_, _| 0.0, 1.0)?)
            };
            let mut values = vec![0.0f32; full_geom.nx * full_geom.ny];
            for row in 0..full_geom.ny {
                for col in 0..full_geom.nx {
                    let row_from_south = (full_geom.ny - 1 - row) as f64;
                    let mut v = plane.eval(col as f64, row_from_south);
                    if let Some(env) = &plane_only_envelopes {
                        v = env.clamp(row, col, v);
                    }
                    values[row * full_geom.nx + col] = v as f32;
                }
            }
            let report = Report {
                converged: true,
                total_iterations: 0,
                plane,
                rms,
                plane_only: true,
                misfit: None,
            };
            return Ok((
                OutputGrid {
                    n_columns: full_geom.nx,
                    n_rows: full_geom.ny,
                    values,
                },
                report,
            ));
        }

        let envelopes = if matches!(cfg.lower_envelope, crate::config::EnvelopeSpec::None)
            && matches!(cfg.upper_envelope, crate::config::EnvelopeSpec::None)
        {
            None
        } else {
            let plane_eval = |row: usize, col: usize| {
                let row_from_south = (full_geom.ny - 1 - row) as f64;
                plane.eval(col as f64, row_from_south)
            };
            Some(Envelopes::build(
                &cfg.lower_envelope,
                &cfg.upper_envelope,
                &raw_z,
                full_geom.nx,
                full_geom.ny,
                plane_eval,
                rms,
            )?)
        };

        let strides = compute_stride_schedule(cfg.n_columns, cfg.n_rows);
        let base_limit = cfg.convergence_limit.resolve(rms);

        let mut buffer = vec![0.0f32; full_geom.mx * full_geom.my];
        let mut prev_geom: Option<StrideGeometry> = None;
        let mut total_iterations = 0u32;
        let mut converged_at_finest = false;
        let mut status: Vec<NodeStatus> = Vec::new();

        for (level, &stride) in strides.iter().enumerate() {
            let geom = StrideGeometry::new(stride, cfg.n_columns, cfg.n_rows, cfg.dx, cfg.dy, cfg.x0, cfg.y0);
            let stencil = StencilCoeffs::new(cfg.tension_interior, cfg.aspect);
            let consts = BriggsConstants::new(cfg.tension_interior, cfg.aspect);

            if let Some(prev) = prev_geom {
                status = bilinear_forecast(&mut buffer, &prev, &geom);
                apply_boundary_conditions(&mut buffer, &geom, cfg.tension_boundary, cfg.aspect, cfg.periodic);
                let threshold = base_limit / geom.stride as f64;
                let max_iters = cfg.max_iterations.saturating_mul(geom.stride);
                for _ in 0..max_iters {
                    apply_boundary_conditions(&mut buffer, &geom, cfg.tension_boundary, cfg.aspect, cfg.periodic);
                    let max_change = sweep(&mut buffer, &status, &[], &geom, &stencil, consts.a0_const_2, cfg.over_relaxation, envelopes.as_ref());
                    total_iterations += 1;
                    if max_change * rms <= threshold {
                        break;
                    }
                }
            } else if cfg.search_radius > 0.0 {
                seed_coarsest_grid(&mut buffer, &geom, &points, cfg.search_radius);
                status = vec![NodeStatus::Unconstrained; geom.mx * geom.my];
            } else {
                status = vec![NodeStatus::Unconstrained; geom.mx * geom.my];
            }

            let mut points_at_stride = points.clone();
            assign_bins(&mut points_at_stride, &geom);
            sort_points(&mut points_at_stride);
            if stride == 1 {
                let (kept, _discarded) = dedup_first_per_bin(points_at_stride);
                points_at_stride = kept;
            }

            let classify_out = classify_stride(&points_at_stride, &geom, &plane, rms, consts, envelopes.as_ref(), &mut buffer);
            status = classify_out.status;

            let threshold = base_limit / geom.stride as f64;
            let max_iters = cfg.max_iterations.saturating_mul(geom.stride);
            let mut converged_this_level = false;
            for _ in 0..max_iters {
                apply_boundary_conditions(&mut buffer, &geom, cfg.tension_boundary, cfg.aspect, cfg.periodic);
                let max_change = sweep(
                    &mut buffer,
                    &status,
                    &classify_out.briggs,
                    &geom,
                    &stencil,
                    consts.a0_const_2,
                    cfg.over_relaxation,
                    envelopes.as_ref(),
                );
                total_iterations += 1;
                if max_change * rms <= threshold {
                    converged_this_level = true;
                    break;
                }
            }
            if level == strides.len() - 1 {
                converged_at_finest = converged_this_level;
            }

            prev_geom = Some(geom);
        }

        let final_geom = prev_geom.unwrap();
        let misfit = Some(compute_misfit(&buffer, &final_geom, &points, &status));

        restore_trend(&mut buffer, &final_geom, &plane, rms);
        if cfg.periodic {
            enforce_periodic_exactness(&mut buffer, &final_geom);
        }

        let mut values = vec![0.0f32; final_geom.nx * final_geom.ny];
        for row in 0..final_geom.ny as i64 {
            for col in 0..final_geom.nx as i64 {
                let idx = final_geom.node_index(row, col);
                values[(row as usize) * final_geom.nx + col as usize] = buffer[idx];
            }
        }

        let report = Report {
            converged: converged_at_finest,
            total_iterations,
            plane,
            rms,
            plane_only: false,
            misfit,
        };

        Ok((
            OutputGrid {
                n_columns: final_geom.nx,
                n_rows: final_geom.ny,
                values,
            },
            report,
        ))
    }
}
