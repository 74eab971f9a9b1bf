//! Trend removal and RMS normalization (spec.md §4.2).

use nalgebra::{Matrix3, Vector3};

use crate::types::DataPoint;

/// Least-squares plane `z ~= icept + sx*col + sy*row_from_south`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub icept: f64,
    pub sx: f64,
    pub sy: f64,
}

impl Plane {
    pub fn zero() -> Self {
        Plane {
            icept: 0.0,
            sx: 0.0,
            sy: 0.0,
        }
    }

    #[inline]
    pub fn eval(&self, col: f64, row_from_south: f64) -> f64 {
        self.icept + self.sx * col + self.sy * row_from_south
    }
}

/// Outcome of detrending + RMS normalization.
pub struct DetrendResult {
    pub plane: Plane,
    pub rms: f64,
    /// True when the RMS of the detrended residuals is below threshold:
    /// the data lie exactly on a plane and no iteration is needed.
    pub plane_only: bool,
}

/// Fits the plane in fractional (col, row_from_south) coordinates derived
/// from `(x, y)` using the finest grid spacing, subtracts it from every
/// point's `z` in place, and divides by the residual RMS.
///
/// For periodic longitude grids `plane.sx` is forced to zero (spec.md §3).
pub fn detrend_and_normalize(points: &mut [DataPoint], dx: f64, dy: f64, x0: f64, y0: f64, periodic: bool) -> DetrendResult {
    let plane = fit_plane(points, dx, dy, x0, y0, periodic);

    for p in points.iter_mut() {
        let col = (p.x - x0) / dx;
        let row_from_south = (p.y - y0) / dy;
        p.z -= plane.eval(col, row_from_south);
    }

    let n = points.len().max(1) as f64;
    let sum_sq: f64 = points.iter().map(|p| p.z * p.z).sum();
    let rms = (sum_sq / n).sqrt();

    if rms < 1e-8 {
        return DetrendResult {
            plane,
            rms,
            plane_only: true,
        };
    }

    for p in points.iter_mut() {
        p.z /= rms;
    }

    DetrendResult {
        plane,
        rms,
        plane_only: false,
    }
}

fn fit_plane(points: &[DataPoint], dx: f64, dy: f64, x0: f64, y0: f64, periodic: bool) -> Plane {
    if points.is_empty() {
        return Plane::zero();
    }

    let mut ata = Matrix3::zeros();
    let mut atz = Vector3::zeros();
    for p in points {
        let col = (p.x - x0) / dx;
        let row = (p.y - y0) / dy;
        let a = Vector3::new(1.0, col, row);
        ata += a * a.transpose();
        atz += a * p.z;
    }

    let mut plane = match ata.try_inverse() {
        Some(inv) => {
            let beta = inv * atz;
            Plane {
                icept: beta[0],
                sx: beta[1],
                sy: beta[2],
            }
        }
        None => Plane::zero(),
    };

    if periodic {
        plane.sx = 0.0;
    }
    plane
}
