//! Configuration for every mixing stage.
//!
//! All DSP constants live here, grouped per component, and are passed by reference into
//! the component functions. There is no global mutable state: a `MixConfig` is a plain
//! value that can be cloned, shared across threads, or loaded from JSON.
//!
//! Every struct uses `#[serde(default)]`, so a partial JSON document only overrides the
//! fields it names:
//!
//! ```
//! let cfg = mixdown::config::MixConfig::from_json_str(r#"{ "ducking": { "reduction_db": -18.0 } }"#)?;
//! assert_eq!(cfg.ducking.reduction_db, -18.0);
//! assert_eq!(cfg.ducking.offset, 0.5);
//! # Ok::<(), mixdown::error::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::crossfade::FadeCurve;
use crate::error::{Error, Result};

/// Top-level configuration bundling every component's settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub vad: VadConfig,
    pub ducking: DuckingConfig,
    pub crossfade: CrossfadeConfig,
    pub gaps: GapConfig,
    pub mixer: MixerConfig,
}

impl MixConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values no component can work with.
    ///
    /// Defaults always validate.
    pub fn validate(&self) -> Result<()> {
        self.vad.validate()?;
        self.ducking.validate()?;
        self.crossfade.validate()?;
        self.gaps.validate()?;
        self.mixer.validate()
    }
}

/// Voice activity detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Lower edge of the voice band, in Hz (inclusive).
    pub voice_band_low_hz: f64,

    /// Upper edge of the voice band, in Hz (inclusive).
    pub voice_band_high_hz: f64,

    /// A window must exceed this RMS to count as voice.
    pub rms_threshold: f64,

    /// A window's voice-band share of spectral magnitude must exceed this ratio.
    pub voice_ratio_threshold: f64,

    /// Analysis window length, in seconds.
    pub window_secs: f64,

    /// Distance between consecutive window starts, in seconds.
    pub hop_secs: f64,

    /// Segments separated by at most this many seconds are merged.
    pub merge_gap_secs: f64,

    /// RMS that maps to full confidence for a one-second segment.
    pub confidence_reference_rms: f64,

    /// Segment duration (seconds) that maps to full confidence at the reference RMS.
    pub confidence_reference_secs: f64,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            voice_band_low_hz: 85.0,
            voice_band_high_hz: 255.0,
            rms_threshold: 0.02,
            voice_ratio_threshold: 0.1,
            window_secs: 0.1,
            hop_secs: 0.05,
            merge_gap_secs: 0.2,
            confidence_reference_rms: 0.1,
            confidence_reference_secs: 1.0,
        }
    }
}

impl VadConfig {
    fn validate(&self) -> Result<()> {
        if !(self.voice_band_low_hz >= 0.0 && self.voice_band_low_hz <= self.voice_band_high_hz) {
            return Err(Error::config(format!(
                "voice band [{}, {}] Hz is inverted or negative",
                self.voice_band_low_hz, self.voice_band_high_hz
            )));
        }
        positive("vad.window_secs", self.window_secs)?;
        positive("vad.hop_secs", self.hop_secs)?;
        positive("vad.confidence_reference_rms", self.confidence_reference_rms)?;
        positive("vad.confidence_reference_secs", self.confidence_reference_secs)?;
        non_negative("vad.merge_gap_secs", self.merge_gap_secs)
    }
}

/// Ducking plan settings used by the keyframe generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckingConfig {
    /// Gain applied to the music while voice is active, in dB (typically negative).
    pub reduction_db: f64,

    /// Lead/lag time of the duck ramps around each voice segment, in seconds.
    pub offset: f64,
}

impl Default for DuckingConfig {
    fn default() -> Self {
        Self {
            reduction_db: -12.0,
            offset: 0.5,
        }
    }
}

impl DuckingConfig {
    fn validate(&self) -> Result<()> {
        if !self.reduction_db.is_finite() {
            return Err(Error::config("ducking.reduction_db must be finite"));
        }
        non_negative("ducking.offset", self.offset)
    }
}

/// Crossfade defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    /// Default fade length, in seconds.
    pub duration: f64,

    /// Default curve pair.
    pub curve: FadeCurve,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        Self {
            duration: 1.0,
            curve: FadeCurve::EqualPower,
        }
    }
}

impl CrossfadeConfig {
    fn validate(&self) -> Result<()> {
        non_negative("crossfade.duration", self.duration)
    }
}

/// Gap detection and fill settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Analysis window length, in seconds.
    pub window_secs: f64,

    /// Distance between consecutive window starts, in seconds.
    pub hop_secs: f64,

    /// Windows with RMS below this are silent.
    pub silence_rms: f64,

    /// Upper bound on the click-suppression fade at each edge of an ambient fill, in seconds.
    pub edge_fade_secs: f64,

    /// Upper bound on the edge fade as a fraction of the gap length.
    pub edge_fade_fraction: f64,

    /// Level of the ambient fallback used when a crossfade fill has no material.
    pub fallback_ambient_db: f64,

    /// Seed for the ambient noise generator, so fills are reproducible.
    pub noise_seed: u64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            window_secs: 0.05,
            hop_secs: 0.025,
            silence_rms: 0.01,
            edge_fade_secs: 0.01,
            edge_fade_fraction: 0.25,
            fallback_ambient_db: -40.0,
            noise_seed: 0x6d69_7864_6f77_6e21,
        }
    }
}

impl GapConfig {
    fn validate(&self) -> Result<()> {
        positive("gaps.window_secs", self.window_secs)?;
        positive("gaps.hop_secs", self.hop_secs)?;
        non_negative("gaps.edge_fade_secs", self.edge_fade_secs)?;
        if !(0.0..=0.5).contains(&self.edge_fade_fraction) {
            return Err(Error::config(
                "gaps.edge_fade_fraction must lie within [0, 0.5]",
            ));
        }
        Ok(())
    }
}

/// Final mix settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Peak amplitude the summed mix is never allowed to exceed.
    pub peak_ceiling: f64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self { peak_ceiling: 0.95 }
    }
}

impl MixerConfig {
    fn validate(&self) -> Result<()> {
        positive("mixer.peak_ceiling", self.peak_ceiling)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{name} must be non-negative, got {value}"
        )))
    }
}
