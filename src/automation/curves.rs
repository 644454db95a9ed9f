//! Gain interpolation curves.
//!
//! Every curve produces `n` values for `t = linspace(0, 1, n)`, so the first value is
//! the start gain and the last value is the end gain. Adjacent spans that share a
//! keyframe therefore meet without a step.

use crate::buffer::unit_ramp;
use crate::keyframes::CurveType;

/// Control points of the ease-in-out Bézier used by [`CurveType::CubicBezier`].
pub const BEZIER_P1: f64 = 0.42;
pub const BEZIER_P2: f64 = 0.58;

/// Floor used to keep logarithmic interpolation away from `log10(0)`.
const LOG_FLOOR: f64 = 1e-10;

/// Interpolate `n` linear gain values from `start` to `end` along `curve`.
pub fn interpolate(start: f64, end: f64, n: usize, curve: CurveType) -> Vec<f64> {
    let mut out = vec![0.0; n];
    interpolate_into(start, end, curve, &mut out);
    out
}

/// Like [`interpolate`], writing into a preallocated slice (its length is `n`).
pub fn interpolate_into(start: f64, end: f64, curve: CurveType, out: &mut [f64]) {
    let n = out.len();
    let ramp = unit_ramp(n);

    match curve {
        CurveType::Linear => fill(out, ramp, |t| lerp(start, end, t)),
        CurveType::Exponential => {
            // A zero endpoint has no ratio to raise; fall back to a straight line.
            if start == 0.0 || end == 0.0 {
                fill(out, ramp, |t| lerp(start, end, t));
            } else {
                let ratio = end / start;
                fill(out, ramp, |t| start * ratio.powf(t));
            }
        }
        CurveType::CubicBezier => fill(out, ramp, |t| lerp(start, end, bezier_t(t))),
        CurveType::Logarithmic => {
            let log_start = start.max(LOG_FLOOR).log10();
            let log_end = end.max(LOG_FLOOR).log10();
            fill(out, ramp, |t| 10f64.powf(lerp(log_start, log_end, t)));

            if start == 0.0
                && let Some(first) = out.first_mut()
            {
                *first = 0.0;
            }
            if end == 0.0
                && let Some(last) = out.last_mut()
            {
                *last = 0.0;
            }
        }
    }
}

/// Ease-in-out remap of `t` through the cubic Bézier `(0, P1, P2, 1)`.
pub fn bezier_t(t: f64) -> f64 {
    let u = 1.0 - t;
    3.0 * u * u * t * BEZIER_P1 + 3.0 * u * t * t * BEZIER_P2 + t * t * t
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn fill(out: &mut [f64], ramp: impl Iterator<Item = f64>, f: impl Fn(f64) -> f64) {
    for (slot, t) in out.iter_mut().zip(ramp) {
        *slot = f(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CurveType; 4] = [
        CurveType::Linear,
        CurveType::Exponential,
        CurveType::CubicBezier,
        CurveType::Logarithmic,
    ];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn every_curve_hits_its_endpoints() {
        for curve in ALL {
            let v = interpolate(1.0, 0.25, 101, curve);
            assert!(close(v[0], 1.0), "{curve:?} start {}", v[0]);
            assert!(close(v[100], 0.25), "{curve:?} end {}", v[100]);
        }
    }

    #[test]
    fn equal_gains_are_flat() {
        for curve in ALL {
            let v = interpolate(0.5, 0.5, 64, curve);
            assert!(v.iter().all(|&g| close(g, 0.5)), "{curve:?}");
        }
    }

    #[test]
    fn linear_midpoint() {
        let v = interpolate(0.0, 1.0, 3, CurveType::Linear);
        assert_eq!(v, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn exponential_midpoint_is_geometric_mean() {
        let v = interpolate(1.0, 0.25, 3, CurveType::Exponential);
        assert!(close(v[1], 0.5));
    }

    #[test]
    fn exponential_with_zero_endpoint_is_linear() {
        let v = interpolate(1.0, 0.0, 5, CurveType::Exponential);
        assert_eq!(v, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn bezier_is_symmetric_ease() {
        assert_eq!(bezier_t(0.0), 0.0);
        assert!(close(bezier_t(1.0), 1.0));
        assert!(close(bezier_t(0.5), 0.5));
        assert!(close(bezier_t(0.25) + bezier_t(0.75), 1.0));
    }

    #[test]
    fn logarithmic_restores_zero_endpoints() {
        let v = interpolate(0.0, 1.0, 4, CurveType::Logarithmic);
        assert_eq!(v[0], 0.0);
        assert!(close(v[3], 1.0));
        assert!(v[1] > 0.0 && v[1] < v[2]);

        let v = interpolate(1.0, 0.0, 4, CurveType::Logarithmic);
        assert!(close(v[0], 1.0));
        assert_eq!(v[3], 0.0);
    }

    #[test]
    fn degenerate_lengths() {
        for curve in ALL {
            assert!(interpolate(1.0, 0.5, 0, curve).is_empty());
            let v = interpolate(1.0, 0.5, 1, curve);
            assert_eq!(v.len(), 1);
            assert!(close(v[0], 1.0));
        }
    }
}
