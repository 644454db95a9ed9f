//! Envelope continuity check.
//!
//! Renders a plan over a unit-amplitude signal and reports hard steps in the result.
//!
//! Inside a span the envelope follows its curve, and every curve starts and ends exactly on
//! its keyframe gains. Two regions therefore meet without a step unless the plan itself
//! changes level in no time (coincident keyframes, single-sample spans, a plan that starts
//! away from unity). The check looks at every edge where one rendered region hands over to
//! the next and reports a [`DiscontinuityKind::VolumeJump`] where the gain moves by more
//! than `tolerance` across it. Keyframe pairs that go backwards in time (in the order
//! given) are reported as [`DiscontinuityKind::NegativeTimeGap`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{build_envelope, rendered_spans};
use crate::buffer::{samples_to_secs, secs_to_sample};
use crate::keyframes::{AudioKeyframe, sort_keyframes};

/// Default step tolerance.
pub const DEFAULT_CONTINUITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscontinuityKind {
    VolumeJump,
    NegativeTimeGap,
}

/// One reported discontinuity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discontinuity {
    #[serde(rename = "type")]
    pub kind: DiscontinuityKind,

    /// Where it happens, in seconds.
    pub timestamp: f64,

    /// Gain step for a volume jump; seconds gone backwards for a negative time gap.
    pub magnitude: f64,

    /// Index of the offending keyframe, for negative time gaps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyframe_index: Option<usize>,
}

/// Result of [`check_interpolation_continuity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityReport {
    pub is_continuous: bool,
    pub discontinuities: Vec<Discontinuity>,
    pub max_discontinuity: f64,
}

/// Check that the envelope rendered from `keyframes` has no hard steps.
pub fn check_interpolation_continuity(
    keyframes: &[AudioKeyframe],
    sample_rate: u32,
    tolerance: f64,
) -> ContinuityReport {
    let mut discontinuities: Vec<Discontinuity> = keyframes
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].timestamp < pair[0].timestamp)
        .map(|(i, pair)| Discontinuity {
            kind: DiscontinuityKind::NegativeTimeGap,
            timestamp: pair[1].timestamp,
            magnitude: pair[0].timestamp - pair[1].timestamp,
            keyframe_index: Some(i + 1),
        })
        .collect();

    let mut sorted = keyframes.to_vec();
    sort_keyframes(&mut sorted);
    let last = sorted.iter().map(|k| k.timestamp).fold(0.0_f64, f64::max);
    let len = secs_to_sample(last, sample_rate);
    let envelope = build_envelope(len, &sorted, sample_rate);

    let edges: BTreeSet<usize> = rendered_spans(len, &sorted, sample_rate)
        .flat_map(|(span, _, _)| [span.start, span.end])
        .filter(|&edge| edge > 0 && edge < len)
        .collect();
    for edge in edges {
        let d = (envelope[edge] - envelope[edge - 1]).abs();
        if d > tolerance {
            discontinuities.push(Discontinuity {
                kind: DiscontinuityKind::VolumeJump,
                timestamp: samples_to_secs(edge, sample_rate),
                magnitude: d,
                keyframe_index: None,
            });
        }
    }

    let max_discontinuity = discontinuities
        .iter()
        .map(|d| d.magnitude)
        .fold(0.0_f64, f64::max);

    ContinuityReport {
        is_continuous: discontinuities.is_empty(),
        discontinuities,
        max_discontinuity,
    }
}
