//! Volume automation: keyframe plans rendered into per-sample gain envelopes.
//!
//! Responsibilities:
//! - Convert keyframe levels from dB to linear gain.
//! - Render each span between adjacent keyframes with the curve of the span's closing
//!   keyframe (see [`curves`]).
//! - Multiply a buffer by the rendered envelope, returning a new buffer.
//!
//! Envelope layout:
//! - The envelope is preallocated at the buffer's length and defaults to `1.0` (unity)
//!   everywhere no span covers.
//! - A span covers samples `[floor(t0 · rate), floor(t1 · rate))`, clamped to the buffer.
//!   Empty spans (duplicate timestamps, spans past the end) are skipped.

pub mod continuity;
pub mod curves;

use std::ops::Range;

use tracing::debug;

use crate::buffer::{AudioBuffer, secs_to_sample};
use crate::keyframes::{AudioKeyframe, sort_keyframes};

pub use continuity::{
    ContinuityReport, DEFAULT_CONTINUITY_TOLERANCE, Discontinuity, DiscontinuityKind,
    check_interpolation_continuity,
};

/// Convert decibels to linear gain (`10^(db/20)`).
pub fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Convert linear gain to decibels. Zero gain maps to negative infinity.
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}

/// Render a gain envelope of `len` samples from `keyframes`.
///
/// Keyframes are sorted by timestamp first (stable, so duplicates keep their order).
pub fn build_envelope(len: usize, keyframes: &[AudioKeyframe], sample_rate: u32) -> Vec<f64> {
    let mut sorted = keyframes.to_vec();
    sort_keyframes(&mut sorted);

    let mut envelope = vec![1.0; len];
    for (span, from, to) in rendered_spans(len, &sorted, sample_rate) {
        curves::interpolate_into(
            db_to_gain(from.volume_db),
            db_to_gain(to.volume_db),
            to.curve_type,
            &mut envelope[span],
        );
    }

    envelope
}

/// Non-empty sample ranges covered by adjacent pairs of already sorted `keyframes`.
pub(crate) fn rendered_spans<'a>(
    len: usize,
    sorted: &'a [AudioKeyframe],
    sample_rate: u32,
) -> impl Iterator<Item = (Range<usize>, &'a AudioKeyframe, &'a AudioKeyframe)> + 'a {
    sorted.windows(2).filter_map(move |pair| {
        let (from, to) = (&pair[0], &pair[1]);
        let start = secs_to_sample(from.timestamp, sample_rate).min(len);
        let end = secs_to_sample(to.timestamp, sample_rate).min(len);
        (end > start).then_some((start..end, from, to))
    })
}

/// Apply a keyframe plan to `buffer`, returning the automated copy.
pub fn apply_volume_automation(buffer: &AudioBuffer, keyframes: &[AudioKeyframe]) -> AudioBuffer {
    let envelope = build_envelope(buffer.len(), keyframes, buffer.sample_rate());
    let samples = buffer
        .samples()
        .iter()
        .zip(&envelope)
        .map(|(s, g)| s * g)
        .collect();

    debug!(
        samples = buffer.len(),
        keyframes = keyframes.len(),
        "volume automation applied"
    );
    AudioBuffer::new(samples, buffer.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframes::CurveType;

    fn ramp_buffer(len: usize, rate: u32) -> AudioBuffer {
        AudioBuffer::new((0..len).map(|i| (i as f64 * 0.37).sin()).collect(), rate)
    }

    #[test]
    fn db_conversions() {
        assert_eq!(db_to_gain(0.0), 1.0);
        assert!((db_to_gain(-6.0) - 0.501_187_233_627_272_2).abs() < 1e-12);
        assert!((gain_to_db(db_to_gain(-12.0)) + 12.0).abs() < 1e-9);
        assert_eq!(gain_to_db(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn unity_transition_is_identity() {
        let buf = ramp_buffer(1_000, 100);
        for curve in [
            CurveType::Linear,
            CurveType::Exponential,
            CurveType::CubicBezier,
            CurveType::Logarithmic,
        ] {
            let plan = [
                AudioKeyframe::new(0.0, 0.0, CurveType::Linear),
                AudioKeyframe::new(10.0, 0.0, curve),
            ];
            let out = apply_volume_automation(&buf, &plan);
            assert_eq!(out.samples(), buf.samples(), "{curve:?}");
        }
    }

    #[test]
    fn envelope_defaults_to_unity_outside_spans() {
        let plan = [
            AudioKeyframe::new(0.2, 0.0, CurveType::Linear),
            AudioKeyframe::new(0.4, -20.0, CurveType::Linear),
        ];
        let env = build_envelope(100, &plan, 100);
        assert!(env[..20].iter().all(|&g| g == 1.0));
        assert!(env[40..].iter().all(|&g| g == 1.0));
        assert_eq!(env[20], 1.0);
        assert!((env[39] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn unsorted_plan_is_sorted_before_rendering() {
        let sorted = [
            AudioKeyframe::new(0.0, 0.0, CurveType::Linear),
            AudioKeyframe::new(0.5, -6.0, CurveType::Exponential),
            AudioKeyframe::new(1.0, 0.0, CurveType::CubicBezier),
        ];
        let shuffled = [sorted[2], sorted[0], sorted[1]];
        assert_eq!(
            build_envelope(100, &sorted, 100),
            build_envelope(100, &shuffled, 100)
        );
    }

    #[test]
    fn spans_past_the_end_are_clamped() {
        let plan = [
            AudioKeyframe::new(0.0, -6.0, CurveType::Linear),
            AudioKeyframe::new(5.0, -6.0, CurveType::Linear),
        ];
        let env = build_envelope(10, &plan, 100);
        assert_eq!(env.len(), 10);
        assert!(env.iter().all(|&g| (g - db_to_gain(-6.0)).abs() < 1e-12));
    }

    #[test]
    fn automation_does_not_touch_input() {
        let buf = ramp_buffer(200, 100);
        let before = buf.clone();
        let plan = [
            AudioKeyframe::new(0.0, 0.0, CurveType::Linear),
            AudioKeyframe::new(2.0, -40.0, CurveType::Exponential),
        ];
        let out = apply_volume_automation(&buf, &plan);
        assert_eq!(buf, before);
        assert_ne!(out.samples(), buf.samples());
        assert_eq!(out.len(), buf.len());
    }

    #[test]
    fn empty_plan_is_identity() {
        let buf = ramp_buffer(50, 10);
        assert_eq!(apply_volume_automation(&buf, &[]), buf);
    }
}
