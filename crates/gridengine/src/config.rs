//! Control constants and configuration options (spec.md §3, §6).

use crate::error::{GridError, Result};

/// Absolute threshold, or a fraction of the RMS of the detrended data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConvergenceLimit {
    Absolute(f64),
    FractionOfRms(f64),
}

impl Default for ConvergenceLimit {
    fn default() -> Self {
        ConvergenceLimit::FractionOfRms(1e-4)
    }
}

impl ConvergenceLimit {
    pub fn resolve(self, rms: f64) -> f64 {
        match self {
            ConvergenceLimit::Absolute(v) => v,
            ConvergenceLimit::FractionOfRms(frac) => frac * rms,
        }
    }
}

/// One side of the optional envelope (lower or upper bound) channel.
#[derive(Clone, Debug)]
pub enum EnvelopeSpec {
    /// No clamping on this side.
    None,
    Constant(f64),
    /// Use the min (for lower) or max (for upper) of the input data.
    DataExtreme,
    /// Externally supplied full-resolution grid, row-major north-to-south.
    Grid { nx: usize, ny: usize, values: Vec<f64> },
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub n_columns: usize,
    pub n_rows: usize,
    pub dx: f64,
    pub dy: f64,
    pub x0: f64,
    pub y0: f64,

    pub tension_boundary: f64,
    pub tension_interior: f64,
    pub aspect: f64,
    pub convergence_limit: ConvergenceLimit,
    pub max_iterations: u32,
    pub over_relaxation: f64,
    pub search_radius: f64,

    pub periodic: bool,

    pub lower_envelope: EnvelopeSpec,
    pub upper_envelope: EnvelopeSpec,

    /// Allow the scheduler to enlarge the domain for a richer factorization.
    pub suggest_sizes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            n_columns: 0,
            n_rows: 0,
            dx: 1.0,
            dy: 1.0,
            x0: 0.0,
            y0: 0.0,
            tension_boundary: 0.0,
            tension_interior: 0.0,
            aspect: 1.0,
            convergence_limit: ConvergenceLimit::default(),
            max_iterations: 250,
            over_relaxation: 1.4,
            search_radius: 0.0,
            periodic: false,
            lower_envelope: EnvelopeSpec::None,
            upper_envelope: EnvelopeSpec::None,
            suggest_sizes: false,
        }
    }
}

impl EngineConfig {
    /// Raises `InvalidConfiguration` for every condition spec.md §7 names.
    /// Called once, before iteration begins.
    pub fn validate(&self) -> Result<()> {
        if self.n_columns < 2 || self.n_rows < 2 {
            return Err(GridError::InvalidConfiguration(
                "grid must have at least 2 columns and 2 rows".into(),
            ));
        }
        if self.dx <= 0.0 || self.dy <= 0.0 {
            return Err(GridError::InvalidConfiguration(
                "grid increments must be positive".into(),
            ));
        }
        for (name, t) in [
            ("tension_boundary", self.tension_boundary),
            ("tension_interior", self.tension_interior),
        ] {
            if !(0.0..=1.0).contains(&t) {
                return Err(GridError::InvalidConfiguration(format!(
                    "{name} must be in [0, 1], got {t}"
                )));
            }
        }
        if !(1.0..=2.0).contains(&self.over_relaxation) {
            return Err(GridError::InvalidConfiguration(format!(
                "over_relaxation must be in [1, 2], got {}",
                self.over_relaxation
            )));
        }
        if self.aspect <= 0.0 {
            return Err(GridError::InvalidConfiguration(
                "aspect ratio must be positive".into(),
            ));
        }
        if self.search_radius < 0.0 {
            return Err(GridError::InvalidConfiguration(
                "search_radius must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_tension() {
        let mut cfg = EngineConfig {
            n_columns: 10,
            n_rows: 10,
            ..Default::default()
        };
        cfg.tension_interior = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_config_with_dims_is_valid() {
        let cfg = EngineConfig {
            n_columns: 10,
            n_rows: 10,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn convergence_limit_resolves() {
        assert_eq!(ConvergenceLimit::Absolute(0.5).resolve(10.0), 0.5);
        assert!((ConvergenceLimit::FractionOfRms(1e-4).resolve(10.0) - 1e-3).abs() < 1e-12);
    }
}
