//! Crossfades between clips.
//!
//! A crossfade overlaps the tail of clip A with the head of clip B and blends them with a
//! complementary pair of fade curves:
//!
//! - `EqualPower`: `cos`/`sin` quarter waves. `fade_out² + fade_in² = 1` everywhere, so
//!   perceived loudness stays constant through the transition.
//! - `Exponential`: squared ramps, normalised by `sqrt(fade_out² + fade_in²)`.
//! - `Linear`: straight ramps. Their power sums to 0.5 at the midpoint, which is heard
//!   as a ~3 dB dip; it is reported via `gain_compensation` and not corrected.
//!
//! The output is `A[..overlap_start] ++ blend ++ B[fade_len..]`.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::{AudioBuffer, AudioTrack, samples_to_secs, secs_to_sample, unit_ramp};
use crate::config::CrossfadeConfig;
use crate::error::{Error, Result};

/// Complementary fade-curve pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    Linear,
    Exponential,
    EqualPower,
}

/// What crossfade to perform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossfadeSpec {
    /// Requested fade length, in seconds.
    pub duration: f64,

    pub curve: FadeCurve,

    /// Where in clip A the fade starts, in seconds.
    ///
    /// Defaults to the end of clip A minus `duration`. Always clamped so the fade fits
    /// inside clip A.
    pub overlap_position: Option<f64>,
}

impl CrossfadeSpec {
    pub fn new(duration: f64, curve: FadeCurve) -> Self {
        Self {
            duration,
            curve,
            overlap_position: None,
        }
    }

    pub fn at(mut self, overlap_position: f64) -> Self {
        self.overlap_position = Some(overlap_position);
        self
    }
}

impl From<&CrossfadeConfig> for CrossfadeSpec {
    fn from(cfg: &CrossfadeConfig) -> Self {
        Self::new(cfg.duration, cfg.curve)
    }
}

impl Default for CrossfadeSpec {
    fn default() -> Self {
        Self::from(&CrossfadeConfig::default())
    }
}

/// Where a transition landed and how it was shaped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeInfo {
    /// Start of the blended region in the output, in seconds.
    pub fade_start: f64,

    /// End of the blended region in the output, in seconds.
    pub fade_end: f64,

    /// Actual blend length (may be shorter than requested when a clip is short).
    pub fade_duration: f64,

    /// Gain in dB that would restore unit power at the fade midpoint.
    pub gain_compensation: f64,

    pub curve_type: FadeCurve,
}

/// Result of [`apply_crossfade`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossfadeResult {
    pub crossfaded_samples: Vec<f64>,
    pub sample_rate: u32,
    pub duration: f64,

    #[serde(flatten)]
    pub fade: FadeInfo,
}

impl CrossfadeResult {
    pub fn into_buffer(self) -> AudioBuffer {
        AudioBuffer::new(self.crossfaded_samples, self.sample_rate)
    }
}

/// Result of [`crossfade_sequence`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossfadeSequenceResult {
    pub crossfaded_samples: Vec<f64>,
    pub sample_rate: u32,
    pub duration: f64,
    pub num_crossfades: usize,

    /// One entry per transition, in output order.
    pub transitions: Vec<FadeInfo>,
}

impl CrossfadeSequenceResult {
    pub fn into_buffer(self) -> AudioBuffer {
        AudioBuffer::new(self.crossfaded_samples, self.sample_rate)
    }
}

/// Build the `(fade_out, fade_in)` pair over `n` samples (`t = linspace(0, 1, n)`).
pub fn fade_curves(n: usize, curve: FadeCurve) -> (Vec<f64>, Vec<f64>) {
    let mut fade_out = Vec::with_capacity(n);
    let mut fade_in = Vec::with_capacity(n);

    for t in unit_ramp(n) {
        let (out, inn) = match curve {
            FadeCurve::Linear => (1.0 - t, t),
            FadeCurve::EqualPower => ((t * FRAC_PI_2).cos(), (t * FRAC_PI_2).sin()),
            FadeCurve::Exponential => {
                let out = (1.0 - t) * (1.0 - t);
                let inn = t * t;
                // (1-t)² and t² are never both zero, so the norm is positive.
                let norm = (out * out + inn * inn).sqrt();
                (out / norm, inn / norm)
            }
        };
        fade_out.push(out);
        fade_in.push(inn);
    }

    (fade_out, fade_in)
}

/// Gain (dB) needed to bring the curve pair back to unit power at its midpoint.
fn gain_compensation(curve: FadeCurve) -> f64 {
    if curve == FadeCurve::EqualPower {
        return 0.0;
    }

    let (out, inn) = fade_curves(3, curve);
    let power = out[1] * out[1] + inn[1] * inn[1];
    let db = -10.0 * power.log10();
    // Snap float noise (e.g. 1e-16 dB) to a clean zero.
    if db.abs() < 1e-9 { 0.0 } else { db }
}

/// Crossfade from `clip_a` into `clip_b`.
///
/// Both clips are downmixed to mono and must share a sample rate.
pub fn apply_crossfade(
    clip_a: &AudioTrack,
    clip_b: &AudioTrack,
    spec: &CrossfadeSpec,
) -> Result<CrossfadeResult> {
    let sample_rate = matching_rate(clip_a.sample_rate(), clip_b.sample_rate())?;
    let a = clip_a.require_mono("clip_a")?;
    let b = clip_b.require_mono("clip_b")?;

    let (mixed, fade) = crossfade_buffers(&a, &b, spec, spec.overlap_position);
    debug!(
        clip_a = a.len(),
        clip_b = b.len(),
        fade_duration = fade.fade_duration,
        curve = ?fade.curve_type,
        "crossfade applied"
    );

    Ok(CrossfadeResult {
        duration: mixed.duration(),
        crossfaded_samples: mixed.into_samples(),
        sample_rate,
        fade,
    })
}

/// Crossfade an ordered list of clips into one buffer.
///
/// Every transition uses `spec`'s duration and curve and starts at the default position
/// (the end of the material accumulated so far); `spec.overlap_position` is ignored here.
/// A single clip comes back unchanged. The first failing transition fails the whole
/// sequence.
pub fn crossfade_sequence(
    clips: &[AudioTrack],
    spec: &CrossfadeSpec,
) -> Result<CrossfadeSequenceResult> {
    let (first, rest) = clips.split_first().ok_or(Error::MissingData("clips"))?;

    let sample_rate = first.sample_rate();
    let mut acc = first.require_mono("clips")?;
    let mut transitions = Vec::with_capacity(rest.len());

    for clip in rest {
        matching_rate(sample_rate, clip.sample_rate())?;
        let next = clip.require_mono("clips")?;
        let (mixed, fade) = crossfade_buffers(&acc, &next, spec, None);
        transitions.push(fade);
        acc = mixed;
    }

    debug!(
        clips = clips.len(),
        samples = acc.len(),
        "crossfade sequence applied"
    );

    Ok(CrossfadeSequenceResult {
        duration: acc.duration(),
        crossfaded_samples: acc.into_samples(),
        sample_rate,
        num_crossfades: transitions.len(),
        transitions,
    })
}

fn matching_rate(left: u32, right: u32) -> Result<u32> {
    if left != right {
        return Err(Error::SampleRateMismatch { left, right });
    }
    if left == 0 {
        return Err(Error::config("sample rate must be positive"));
    }
    Ok(left)
}

/// Blend two mono buffers of the same rate.
fn crossfade_buffers(
    a: &AudioBuffer,
    b: &AudioBuffer,
    spec: &CrossfadeSpec,
    overlap_position: Option<f64>,
) -> (AudioBuffer, FadeInfo) {
    let sample_rate = a.sample_rate();
    let (a, b) = (a.samples(), b.samples());

    let fade_samples = secs_to_sample(spec.duration, sample_rate);
    let latest_start = a.len().saturating_sub(fade_samples);
    let overlap_start = overlap_position
        .map(|secs| secs_to_sample(secs, sample_rate))
        .unwrap_or(latest_start)
        .min(latest_start);
    let fade_len = fade_samples.min(a.len() - overlap_start).min(b.len());

    let (fade_out, fade_in) = fade_curves(fade_len, spec.curve);

    let mut out = Vec::with_capacity(overlap_start + fade_len + (b.len() - fade_len));
    out.extend_from_slice(&a[..overlap_start]);
    out.extend(
        a[overlap_start..overlap_start + fade_len]
            .iter()
            .zip(&b[..fade_len])
            .zip(fade_out.iter().zip(&fade_in))
            .map(|((sa, sb), (fo, fi))| sa * fo + sb * fi),
    );
    out.extend_from_slice(&b[fade_len..]);

    let fade = FadeInfo {
        fade_start: samples_to_secs(overlap_start, sample_rate),
        fade_end: samples_to_secs(overlap_start + fade_len, sample_rate),
        fade_duration: samples_to_secs(fade_len, sample_rate),
        gain_compensation: gain_compensation(spec.curve),
        curve_type: spec.curve,
    };

    (AudioBuffer::new(out, sample_rate), fade)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f64, len: usize, rate: u32) -> AudioTrack {
        AudioTrack::mono(vec![value; len], rate)
    }

    #[test]
    fn equal_power_pair_has_unit_power() {
        let (out, inn) = fade_curves(10_001, FadeCurve::EqualPower);
        for (o, i) in out.iter().zip(&inn) {
            assert!((o * o + i * i - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn normalised_exponential_pair_has_unit_power() {
        let (out, inn) = fade_curves(257, FadeCurve::Exponential);
        for (o, i) in out.iter().zip(&inn) {
            assert!((o * o + i * i - 1.0).abs() < 1e-9);
        }
        assert_eq!((out[0], inn[0]), (1.0, 0.0));
        assert_eq!((out[256], inn[256]), (0.0, 1.0));
    }

    #[test]
    fn linear_pair_sums_to_one() {
        let (out, inn) = fade_curves(5, FadeCurve::Linear);
        assert_eq!(out, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
        assert!(out.iter().zip(&inn).all(|(o, i)| o + i == 1.0));
    }

    #[test]
    fn compensation_per_curve() {
        assert_eq!(gain_compensation(FadeCurve::EqualPower), 0.0);
        assert_eq!(gain_compensation(FadeCurve::Exponential), 0.0);
        assert!((gain_compensation(FadeCurve::Linear) - 3.010_299_956_639_812).abs() < 1e-9);
    }

    #[test]
    fn default_position_overlaps_tail_of_a() -> Result<()> {
        let a = constant(1.0, 100, 100);
        let b = constant(-1.0, 100, 100);
        let res = apply_crossfade(&a, &b, &CrossfadeSpec::new(0.5, FadeCurve::Linear))?;

        assert_eq!(res.crossfaded_samples.len(), 150);
        assert_eq!(res.fade.fade_start, 0.5);
        assert_eq!(res.fade.fade_end, 1.0);
        assert_eq!(res.fade.fade_duration, 0.5);
        assert_eq!(res.duration, 1.5);
        assert_eq!(res.crossfaded_samples[0], 1.0);
        assert_eq!(res.crossfaded_samples[50], 1.0);
        assert_eq!(res.crossfaded_samples[99], -1.0);
        assert_eq!(res.crossfaded_samples[149], -1.0);
        Ok(())
    }

    #[test]
    fn explicit_position_is_clamped_into_clip_a() -> Result<()> {
        let a = constant(1.0, 100, 100);
        let b = constant(1.0, 100, 100);

        let late = apply_crossfade(&a, &b, &CrossfadeSpec::new(0.3, FadeCurve::EqualPower).at(5.0))?;
        assert_eq!(late.fade.fade_start, 0.7);

        let early =
            apply_crossfade(&a, &b, &CrossfadeSpec::new(0.3, FadeCurve::EqualPower).at(0.2))?;
        assert_eq!(early.fade.fade_start, 0.2);
        assert_eq!(early.crossfaded_samples.len(), 20 + 100);
        Ok(())
    }

    #[test]
    fn short_clip_b_limits_the_fade() -> Result<()> {
        let a = constant(1.0, 100, 100);
        let b = constant(0.0, 10, 100);
        let res = apply_crossfade(&a, &b, &CrossfadeSpec::new(0.5, FadeCurve::EqualPower))?;
        assert_eq!(res.fade.fade_duration, 0.1);
        assert_eq!(res.crossfaded_samples.len(), 60);
        Ok(())
    }

    #[test]
    fn fade_longer_than_clip_a_starts_at_zero() -> Result<()> {
        let a = constant(1.0, 30, 100);
        let b = constant(1.0, 100, 100);
        let res = apply_crossfade(&a, &b, &CrossfadeSpec::new(1.0, FadeCurve::Linear))?;
        assert_eq!(res.fade.fade_start, 0.0);
        assert_eq!(res.fade.fade_duration, 0.3);
        assert_eq!(res.crossfaded_samples.len(), 100);
        Ok(())
    }

    #[test]
    fn mismatched_rates_are_rejected() {
        let a = constant(0.1, 44_100, 44_100);
        let b = constant(0.1, 48_000, 48_000);
        let err = apply_crossfade(&a, &b, &CrossfadeSpec::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::SampleRateMismatch {
                left: 44_100,
                right: 48_000
            }
        ));
    }

    #[test]
    fn absent_clip_is_missing_data() {
        let a = AudioTrack::absent(100);
        let b = constant(0.1, 10, 100);
        let err = apply_crossfade(&a, &b, &CrossfadeSpec::default()).unwrap_err();
        assert!(matches!(err, Error::MissingData("clip_a")));
    }

    #[test]
    fn inputs_are_left_untouched() -> Result<()> {
        let a = constant(0.5, 100, 100);
        let b = constant(0.25, 100, 100);
        let (a0, b0) = (a.clone(), b.clone());
        apply_crossfade(&a, &b, &CrossfadeSpec::default())?;
        assert_eq!((a, b), (a0, b0));
        Ok(())
    }

    #[test]
    fn single_clip_sequence_is_identity() -> Result<()> {
        let clip = AudioTrack::mono(vec![0.1, 0.2, 0.3], 10);
        let res = crossfade_sequence(std::slice::from_ref(&clip), &CrossfadeSpec::default())?;
        assert_eq!(res.num_crossfades, 0);
        assert_eq!(res.crossfaded_samples, vec![0.1, 0.2, 0.3]);
        assert!(res.transitions.is_empty());
        Ok(())
    }

    #[test]
    fn sequence_folds_pairwise() -> Result<()> {
        let clips = vec![
            constant(1.0, 100, 100),
            constant(1.0, 100, 100),
            constant(1.0, 100, 100),
        ];
        let res = crossfade_sequence(&clips, &CrossfadeSpec::new(0.2, FadeCurve::EqualPower))?;
        assert_eq!(res.num_crossfades, 2);
        assert_eq!(res.crossfaded_samples.len(), 260);
        assert_eq!(res.transitions[0].fade_start, 0.8);
        assert_eq!(res.transitions[1].fade_start, 1.6);
        Ok(())
    }

    #[test]
    fn sequence_error_short_circuits() {
        let clips = vec![
            constant(1.0, 100, 100),
            constant(1.0, 100, 200),
            constant(1.0, 100, 100),
        ];
        assert!(matches!(
            crossfade_sequence(&clips, &CrossfadeSpec::default()),
            Err(Error::SampleRateMismatch { .. })
        ));
        assert!(matches!(
            crossfade_sequence(&[], &CrossfadeSpec::default()),
            Err(Error::MissingData("clips"))
        ));
    }

    #[test]
    fn absent_clip_in_sequence_names_the_clip_list() {
        let clips = vec![constant(1.0, 100, 100), AudioTrack::absent(100)];
        let err = crossfade_sequence(&clips, &CrossfadeSpec::default())
            .expect_err("absent clip must fail");
        assert!(matches!(err, Error::MissingData("clips")));
        assert_eq!(err.to_string(), "missing sample data: clips");
    }
}
