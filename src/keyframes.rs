//! Ducking plans: voice segments → volume keyframes for the music track.
//!
//! Each voice segment produces four keyframes around it:
//!
//! ```text
//!   0 dB ────╮                    ╭──── 0 dB
//!            ╰──╮              ╭──╯
//!               ╰── reduction ─╯
//!       start-offset  start   end  end+offset
//! ```
//!
//! The plan always opens with `(0, 0 dB)` and closes with `(total_duration, 0 dB)`, so the
//! envelope rendered from it returns the music to full level.

use serde::{Deserialize, Serialize};

use crate::config::DuckingConfig;
use crate::vad::VoiceSegment;

/// Interpolation curve used to reach a keyframe from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    Linear,
    Exponential,
    CubicBezier,
    Logarithmic,
}

/// One control point of a volume-automation envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioKeyframe {
    /// Position in seconds (never negative).
    pub timestamp: f64,

    /// Target level at this point, in dB (0 dB = unity gain).
    pub volume_db: f64,

    /// Curve used on the span that ends at this keyframe.
    pub curve_type: CurveType,
}

impl AudioKeyframe {
    pub fn new(timestamp: f64, volume_db: f64, curve_type: CurveType) -> Self {
        Self {
            timestamp,
            volume_db,
            curve_type,
        }
    }
}

/// Build the ducking plan for `segments` over a track of `total_duration` seconds.
///
/// Pure and deterministic: identical inputs always produce an identical plan. The result
/// is sorted by timestamp; keyframes that share a timestamp keep their emission order.
pub fn generate_ducking_keyframes(
    segments: &[VoiceSegment],
    cfg: &DuckingConfig,
    total_duration: f64,
) -> Vec<AudioKeyframe> {
    let mut ordered: Vec<&VoiceSegment> = segments.iter().collect();
    ordered.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut keyframes = Vec::with_capacity(ordered.len() * 4 + 2);
    keyframes.push(AudioKeyframe::new(0.0, 0.0, CurveType::Linear));

    for seg in ordered {
        keyframes.extend([
            AudioKeyframe::new(
                (seg.start_time - cfg.offset).max(0.0),
                0.0,
                CurveType::Exponential,
            ),
            AudioKeyframe::new(seg.start_time, cfg.reduction_db, CurveType::Exponential),
            AudioKeyframe::new(seg.end_time, cfg.reduction_db, CurveType::Exponential),
            AudioKeyframe::new(
                (seg.end_time + cfg.offset).min(total_duration),
                0.0,
                CurveType::Exponential,
            ),
        ]);
    }

    if keyframes.last().map(|k| k.timestamp) != Some(total_duration) {
        keyframes.push(AudioKeyframe::new(total_duration, 0.0, CurveType::Linear));
    }

    sort_keyframes(&mut keyframes);
    keyframes
}

/// Stable ascending sort by timestamp.
pub fn sort_keyframes(keyframes: &mut [AudioKeyframe]) {
    keyframes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}
