use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gridengine::finalize::Registration;
use gridengine::prelude::*;
use serde_json::json;

mod io;
mod provenance;

/// CLI-facing mirror of [`Registration`] so `clap` can derive a `--registration`
/// flag without the core crate depending on `clap`.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum RegistrationArg {
    Gridline,
    Pixel,
}

impl From<RegistrationArg> for Registration {
    fn from(r: RegistrationArg) -> Self {
        match r {
            RegistrationArg::Gridline => Registration::Gridline,
            RegistrationArg::Pixel => Registration::Pixel,
        }
    }
}

#[derive(Parser)]
#[command(name = "gridengine-cli")]
#[command(about = "Continuous-curvature gridding engine driver")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Grid scattered (x, y, z) observations onto a regular surface.
    Grid {
        /// Path to whitespace-separated `x y z` triples.
        #[arg(long)]
        input: String,
        /// Output grid path (simple header+body ASCII).
        #[arg(long)]
        output: String,

        #[arg(long, allow_hyphen_values = true)]
        west: f64,
        #[arg(long, allow_hyphen_values = true)]
        east: f64,
        #[arg(long, allow_hyphen_values = true)]
        south: f64,
        #[arg(long, allow_hyphen_values = true)]
        north: f64,
        #[arg(long)]
        dx: f64,
        #[arg(long)]
        dy: Option<f64>,

        #[arg(long, default_value_t = 0.0)]
        tension: f64,
        #[arg(long)]
        tension_boundary: Option<f64>,
        #[arg(long, default_value_t = 1.0)]
        aspect: f64,
        #[arg(long, default_value_t = 1.4)]
        omega: f64,
        #[arg(long, default_value_t = 1e-4)]
        convergence: f64,
        #[arg(long, default_value_t = 250)]
        max_iterations: u32,
        #[arg(long, default_value_t = 0.0)]
        search_radius: f64,
        #[arg(long, default_value_t = false)]
        periodic: bool,

        #[arg(long)]
        lower: Option<f64>,
        #[arg(long)]
        upper: Option<f64>,

        /// Optional breakline polyline file (`x y` or `x y z` per line).
        #[arg(long)]
        breakline: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        breakline_z: f64,

        /// Allow the scheduler to enlarge the domain for a richer
        /// multigrid factorization (spec.md §4.1).
        #[arg(long, default_value_t = false)]
        suggest_sizes: bool,

        /// Whether the output header reports node-centered ("gridline") or
        /// cell-centered ("pixel") coordinates.
        #[arg(long, value_enum, default_value_t = RegistrationArg::Gridline)]
        registration: RegistrationArg,
    },
    /// Print a small provenance JSON block.
    Report,
}

fn main() -> Result<()> {
    io::init_logging();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Grid {
            input,
            output,
            west,
            east,
            south,
            north,
            dx,
            dy,
            tension,
            tension_boundary,
            aspect,
            omega,
            convergence,
            max_iterations,
            search_radius,
            periodic,
            lower,
            upper,
            breakline,
            breakline_z,
            suggest_sizes,
            registration,
        } => grid(
            input,
            output,
            west,
            east,
            south,
            north,
            dx,
            dy,
            tension,
            tension_boundary,
            aspect,
            omega,
            convergence,
            max_iterations,
            search_radius,
            periodic,
            lower,
            upper,
            breakline,
            breakline_z,
            suggest_sizes,
            registration,
        ),
        Action::Report => report(),
    }
}

#[allow(clippy::too_many_arguments)]
fn grid(
    input: String,
    output: String,
    west: f64,
    east: f64,
    south: f64,
    north: f64,
    dx: f64,
    dy: Option<f64>,
    tension: f64,
    tension_boundary: Option<f64>,
    aspect: f64,
    omega: f64,
    convergence: f64,
    max_iterations: u32,
    search_radius: f64,
    periodic: bool,
    lower: Option<f64>,
    upper: Option<f64>,
    breakline: Option<String>,
    breakline_z: f64,
    suggest_sizes: bool,
    registration: RegistrationArg,
) -> Result<()> {
    let dy = dy.unwrap_or(dx);
    let n_columns = ((east - west) / dx).round() as usize + 1;
    let n_rows = ((north - south) / dy).round() as usize + 1;

    let config = EngineConfig {
        n_columns,
        n_rows,
        dx,
        dy,
        x0: west,
        y0: south,
        tension_interior: tension,
        tension_boundary: tension_boundary.unwrap_or(tension),
        aspect,
        over_relaxation: omega,
        convergence_limit: ConvergenceLimit::FractionOfRms(convergence),
        max_iterations,
        search_radius,
        periodic,
        lower_envelope: lower.map(EnvelopeSpec::Constant).unwrap_or(EnvelopeSpec::None),
        upper_envelope: upper.map(EnvelopeSpec::Constant).unwrap_or(EnvelopeSpec::None),
        suggest_sizes,
    };

    let engine = Engine::new(config).with_context(|| format!("constructing engine for input {input}"))?;
    let points = io::read_points(&input)?;
    let breaklines = match breakline {
        Some(path) => vec![io::read_breakline(path, breakline_z)?],
        None => Vec::new(),
    };

    let (result, report) = engine
        .run(points, &breaklines)
        .with_context(|| format!("running gridding engine over {input}"))?;
    tracing::info!(
        converged = report.converged,
        iterations = report.total_iterations,
        plane_only = report.plane_only,
        "grid complete"
    );
    io::write_grid(&output, &result, west, south, dx, dy, registration.into())?;
    Ok(())
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "crate": "gridengine-cli",
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
