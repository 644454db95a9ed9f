//! Silence-gap detection and filling for finished timelines.
//!
//! Detection slides short RMS windows (50 ms, 25 ms hop by default) across the timeline.
//! A run of silent windows long enough to be heard as a dropout becomes a [`Gap`]; this
//! includes trailing silence that runs to the end of the buffer.
//!
//! Fill methods:
//! - `Ambient`: low-level Gaussian noise ("room tone") with short linear edge fades so
//!   the patch does not click.
//! - `Crossfade`: an equal-power blend of the material just before and just after the
//!   gap, centred in the gap. Falls back to ambient when one side has no material.
//! - `Silence`: detection only; the samples are returned exactly as given.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::automation::db_to_gain;
use crate::buffer::{AudioBuffer, AudioTrack, rms, samples_to_secs, unit_ramp};
use crate::config::GapConfig;
use crate::crossfade::{FadeCurve, fade_curves};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    Silence,
}

/// A detected silence gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub start_sample: usize,
    pub end_sample: usize,

    #[serde(rename = "type")]
    pub kind: GapKind,
}

impl Gap {
    fn from_samples(start_sample: usize, end_sample: usize, sample_rate: u32) -> Self {
        Self {
            start_time: samples_to_secs(start_sample, sample_rate),
            end_time: samples_to_secs(end_sample, sample_rate),
            duration: samples_to_secs(end_sample - start_sample, sample_rate),
            start_sample,
            end_sample,
            kind: GapKind::Silence,
        }
    }

    pub fn len(&self) -> usize {
        self.end_sample - self.start_sample
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    Ambient,
    Crossfade,
    Silence,
}

/// What to detect and how to fill it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillSpec {
    /// Minimum silent run that counts as a gap, in milliseconds.
    pub threshold_ms: f64,
    pub method: FillMethod,

    /// Level of the ambient noise fill, in dB.
    pub ambient_level_db: f64,
}

impl Default for FillSpec {
    fn default() -> Self {
        Self {
            threshold_ms: 100.0,
            method: FillMethod::Ambient,
            ambient_level_db: -40.0,
        }
    }
}

/// Result of [`fill_gaps`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillResult {
    pub filled_samples: Vec<f64>,
    pub sample_rate: u32,
    pub duration: f64,
    pub gaps: Vec<Gap>,
    pub gaps_filled: usize,
    pub total_gap_duration: f64,

    /// Share of the timeline covered by gaps, in percent.
    pub gap_percentage: f64,
    pub fill_method: FillMethod,
}

impl FillResult {
    pub fn into_buffer(self) -> AudioBuffer {
        AudioBuffer::new(self.filled_samples, self.sample_rate)
    }
}

/// Find silence gaps of at least `threshold_ms` in `buffer`.
pub fn detect_gaps(buffer: &AudioBuffer, threshold_ms: f64, cfg: &GapConfig) -> Vec<Gap> {
    let sample_rate = buffer.sample_rate();
    let samples = buffer.samples();
    let window_len = (cfg.window_secs * sample_rate as f64) as usize;
    let hop_len = (cfg.hop_secs * sample_rate as f64) as usize;

    if window_len == 0 || hop_len == 0 || samples.len() < window_len {
        return Vec::new();
    }

    let min_len = threshold_ms / 1000.0 * sample_rate as f64;
    let mut gaps = Vec::new();
    let mut push_run = |start: usize, end: usize| {
        if (end - start) as f64 >= min_len {
            gaps.push(Gap::from_samples(start, end, sample_rate));
        }
    };

    let mut silent_since: Option<usize> = None;
    for start in (0..=samples.len() - window_len).step_by(hop_len) {
        let silent = rms(&samples[start..start + window_len]) < cfg.silence_rms;
        match (silent, silent_since) {
            (true, None) => silent_since = Some(start),
            (false, Some(run_start)) => {
                push_run(run_start, start);
                silent_since = None;
            }
            _ => {}
        }
    }

    if let Some(run_start) = silent_since {
        push_run(run_start, samples.len());
    }

    gaps
}

/// Detect gaps in `timeline` and patch them according to `spec`.
///
/// The input is never modified; the result carries a filled copy.
pub fn fill_gaps(timeline: &AudioTrack, spec: &FillSpec, cfg: &GapConfig) -> Result<FillResult> {
    let buffer = timeline.require_mono("timeline")?;
    let sample_rate = buffer.sample_rate();
    if sample_rate == 0 {
        return Err(Error::config("sample rate must be positive"));
    }

    let gaps = detect_gaps(&buffer, spec.threshold_ms, cfg);
    let source = buffer.samples();
    let mut filled = source.to_vec();
    let mut ambient = AmbientFill {
        rng: StdRng::seed_from_u64(cfg.noise_seed),
        cfg,
        sample_rate,
    };

    let gaps_filled = match spec.method {
        FillMethod::Silence => 0,
        FillMethod::Ambient => {
            for gap in &gaps {
                ambient.write(&mut filled[gap.start_sample..gap.end_sample], spec.ambient_level_db);
            }
            gaps.len()
        }
        FillMethod::Crossfade => {
            for gap in &gaps {
                if !crossfade_fill(source, &mut filled, gap) {
                    ambient.write(
                        &mut filled[gap.start_sample..gap.end_sample],
                        cfg.fallback_ambient_db,
                    );
                }
            }
            gaps.len()
        }
    };

    let duration = buffer.duration();
    let total_gap_duration: f64 = gaps.iter().map(|g| g.duration).sum();
    let gap_percentage = if duration > 0.0 {
        total_gap_duration / duration * 100.0
    } else {
        0.0
    };

    debug!(
        samples = source.len(),
        gaps = gaps.len(),
        gaps_filled,
        method = ?spec.method,
        "gap fill complete"
    );

    Ok(FillResult {
        filled_samples: filled,
        sample_rate,
        duration,
        gaps,
        gaps_filled,
        total_gap_duration,
        gap_percentage,
        fill_method: spec.method,
    })
}

/// Seeded room-tone generator shared by every gap of one fill call.
struct AmbientFill<'a> {
    rng: StdRng,
    cfg: &'a GapConfig,
    sample_rate: u32,
}

impl AmbientFill<'_> {
    /// Overwrite `region` with Gaussian noise at `level_db`, faded in and out at the edges.
    fn write(&mut self, region: &mut [f64], level_db: f64) {
        let scale = db_to_gain(level_db);
        for s in region.iter_mut() {
            *s = gaussian(&mut self.rng) * scale;
        }

        let fade_len = ((self.cfg.edge_fade_secs * self.sample_rate as f64) as usize)
            .min((region.len() as f64 * self.cfg.edge_fade_fraction) as usize)
            .min(region.len() / 2);
        if fade_len == 0 {
            return;
        }

        let len = region.len();
        for (s, g) in region[..fade_len].iter_mut().zip(unit_ramp(fade_len)) {
            *s *= g;
        }
        for (s, g) in region[len - fade_len..]
            .iter_mut()
            .zip(unit_ramp(fade_len))
        {
            *s *= 1.0 - g;
        }
    }
}

/// Standard normal sample (Box–Muller).
fn gaussian(rng: &mut StdRng) -> f64 {
    // 1 - u keeps the log argument in (0, 1].
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Blend the material around `gap` into its centre. Returns `false` when either side of
/// the gap has no material to blend.
fn crossfade_fill(source: &[f64], filled: &mut [f64], gap: &Gap) -> bool {
    let gap_len = gap.len();
    let before = &source[gap.start_sample.saturating_sub(gap_len)..gap.start_sample];
    let after = &source[gap.end_sample..(gap.end_sample + gap_len).min(source.len())];
    if before.is_empty() || after.is_empty() {
        return false;
    }

    let blend_len = before.len().min(after.len()).min(gap_len);
    let tail = &before[before.len() - blend_len..];
    let head = &after[..blend_len];
    let (fade_out, fade_in) = fade_curves(blend_len, FadeCurve::EqualPower);

    let offset = gap.start_sample + (gap_len - blend_len) / 2;
    let target = &mut filled[offset..offset + blend_len];
    for (i, slot) in target.iter_mut().enumerate() {
        *slot = tail[i] * fade_out[i] + head[i] * fade_in[i];
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1_000;

    /// 0.5 DC everywhere except `[from, to)`, which is zero.
    fn with_hole(len: usize, from: usize, to: usize) -> Vec<f64> {
        (0..len)
            .map(|i| if (from..to).contains(&i) { 0.0 } else { 0.5 })
            .collect()
    }

    fn spec(method: FillMethod) -> FillSpec {
        FillSpec {
            method,
            ..FillSpec::default()
        }
    }

    #[test]
    fn detects_interior_gap() {
        let buf = AudioBuffer::new(with_hole(2_300, 1_000, 1_300), RATE);
        let gaps = detect_gaps(&buf, 100.0, &GapConfig::default());

        assert_eq!(gaps.len(), 1);
        let gap = gaps[0];
        assert_eq!((gap.start_sample, gap.end_sample), (1_000, 1_275));
        assert_eq!(gap.start_time, 1.0);
        assert_eq!(gap.duration, 0.275);
        assert_eq!(gap.kind, GapKind::Silence);
    }

    #[test]
    fn short_silence_is_not_a_gap() {
        let buf = AudioBuffer::new(with_hole(2_000, 1_000, 1_050), RATE);
        assert!(detect_gaps(&buf, 100.0, &GapConfig::default()).is_empty());
    }

    #[test]
    fn trailing_silence_is_a_gap() {
        let buf = AudioBuffer::new(with_hole(1_500, 1_000, 1_500), RATE);
        let gaps = detect_gaps(&buf, 100.0, &GapConfig::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!((gaps[0].start_sample, gaps[0].end_sample), (1_000, 1_500));
    }

    #[test]
    fn buffer_shorter_than_a_window_has_no_gaps() {
        let buf = AudioBuffer::new(vec![0.0; 10], RATE);
        assert!(detect_gaps(&buf, 1.0, &GapConfig::default()).is_empty());
    }

    #[test]
    fn silence_method_returns_input_exactly() -> Result<()> {
        let samples = with_hole(2_300, 1_000, 1_300);
        let track = AudioTrack::mono(samples.clone(), RATE);
        let res = fill_gaps(&track, &spec(FillMethod::Silence), &GapConfig::default())?;

        assert_eq!(res.filled_samples, samples);
        assert_eq!(res.gaps.len(), 1);
        assert_eq!(res.gaps_filled, 0);
        Ok(())
    }

    #[test]
    fn ambient_fill_is_quiet_faded_and_reproducible() -> Result<()> {
        let samples = with_hole(2_300, 1_000, 1_300);
        let track = AudioTrack::mono(samples.clone(), RATE);
        let cfg = GapConfig::default();
        let res = fill_gaps(&track, &spec(FillMethod::Ambient), &cfg)?;

        assert_eq!(res.gaps_filled, 1);
        let patch = &res.filled_samples[1_000..1_275];
        assert_eq!(patch[0], 0.0);
        assert_eq!(patch[patch.len() - 1], 0.0);

        // 10 ms edge fades at 1 kHz; the middle is unfaded noise near -40 dB.
        let level = rms(&patch[10..265]);
        assert!(level > 0.005 && level < 0.02, "rms {level}");

        assert_eq!(&res.filled_samples[..1_000], &samples[..1_000]);
        assert_eq!(&res.filled_samples[1_275..], &samples[1_275..]);

        let again = fill_gaps(&track, &spec(FillMethod::Ambient), &cfg)?;
        assert_eq!(again.filled_samples, res.filled_samples);
        Ok(())
    }

    #[test]
    fn oversized_edge_fades_stay_inside_the_gap() -> Result<()> {
        let track = AudioTrack::mono(with_hole(2_300, 1_000, 1_300), RATE);
        let cfg = GapConfig {
            edge_fade_secs: 10.0,
            edge_fade_fraction: 2.0,
            ..GapConfig::default()
        };
        let res = fill_gaps(&track, &spec(FillMethod::Ambient), &cfg)?;

        assert_eq!(res.gaps_filled, 1);
        let patch = &res.filled_samples[1_000..1_275];
        assert_eq!(patch[0], 0.0);
        assert_eq!(patch[patch.len() - 1], 0.0);
        assert!(patch.iter().all(|s| s.is_finite()));
        Ok(())
    }

    #[test]
    fn crossfade_fill_blends_neighbours() -> Result<()> {
        let track = AudioTrack::mono(with_hole(2_300, 1_000, 1_300), RATE);
        let res = fill_gaps(&track, &spec(FillMethod::Crossfade), &GapConfig::default())?;

        assert_eq!(res.gaps_filled, 1);
        let patch = &res.filled_samples[1_000..1_275];
        assert_eq!(patch[0], 0.5);
        // The head after the gap starts with 25 silent samples, so the blend opens slightly
        // under 0.5 before the equal-power bump toward 0.5·√2.
        assert!(patch.iter().all(|&s| (0.45..=0.5 * 2f64.sqrt() + 1e-12).contains(&s)));
        Ok(())
    }

    #[test]
    fn crossfade_fill_falls_back_to_ambient_at_edges() -> Result<()> {
        let track = AudioTrack::mono(with_hole(1_300, 0, 300), RATE);
        let res = fill_gaps(&track, &spec(FillMethod::Crossfade), &GapConfig::default())?;

        assert_eq!(res.gaps.len(), 1);
        assert_eq!(res.gaps[0].start_sample, 0);
        assert_eq!(res.gaps_filled, 1);
        let level = rms(&res.filled_samples[10..265]);
        assert!(level > 0.005 && level < 0.02, "rms {level}");
        Ok(())
    }

    #[test]
    fn gap_statistics() -> Result<()> {
        let track = AudioTrack::mono(with_hole(2_000, 1_000, 2_000), RATE);
        let res = fill_gaps(&track, &spec(FillMethod::Silence), &GapConfig::default())?;
        assert_eq!(res.total_gap_duration, 1.0);
        assert_eq!(res.gap_percentage, 50.0);
        assert_eq!(res.duration, 2.0);
        Ok(())
    }

    #[test]
    fn absent_timeline_is_missing_data() {
        let err = fill_gaps(
            &AudioTrack::absent(RATE),
            &FillSpec::default(),
            &GapConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingData("timeline")));
    }
}
