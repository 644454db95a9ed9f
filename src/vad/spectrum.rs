use std::ops::RangeInclusive;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::Result;

/// Voice-band energy analysis for fixed-size windows.
///
/// The FFT is planned once and every buffer it needs is allocated up front, so analysing
/// a whole track performs no per-window allocation.
pub(crate) struct BandAnalyzer {
    r2c: Arc<dyn RealToComplex<f64>>,
    input: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    band_bins: Option<RangeInclusive<usize>>,
}

impl BandAnalyzer {
    /// Plan an analyser for windows of `window_len` samples at `sample_rate`.
    ///
    /// `band_hz` is inclusive on both ends.
    pub(crate) fn new(window_len: usize, sample_rate: u32, band_hz: (f64, f64)) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(window_len);
        let input = r2c.make_input_vec();
        let spectrum = r2c.make_output_vec();
        let scratch = r2c.make_scratch_vec();
        let band_bins = band_bins(window_len, spectrum.len(), sample_rate, band_hz);

        Self {
            r2c,
            input,
            spectrum,
            scratch,
            band_bins,
        }
    }

    /// Share of total spectral magnitude that falls inside the band.
    ///
    /// Returns `0.0` for a window with no spectral energy at all.
    pub(crate) fn band_ratio(&mut self, window: &[f64]) -> Result<f64> {
        // The FFT uses its input as scratch space, so copy the window in each time.
        self.input.copy_from_slice(window);
        self.r2c
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)?;

        let total: f64 = self.spectrum.iter().map(|c| c.norm()).sum();
        if total == 0.0 {
            return Ok(0.0);
        }

        let band: f64 = match &self.band_bins {
            Some(bins) => self.spectrum[bins.clone()].iter().map(|c| c.norm()).sum(),
            None => 0.0,
        };

        Ok(band / total)
    }
}

/// Inclusive range of FFT bins whose centre frequency lies inside `band_hz`.
///
/// Bin `k` sits at `k * sample_rate / window_len` Hz.
fn band_bins(
    window_len: usize,
    bin_count: usize,
    sample_rate: u32,
    (low_hz, high_hz): (f64, f64),
) -> Option<RangeInclusive<usize>> {
    if window_len == 0 || bin_count == 0 || sample_rate == 0 {
        return None;
    }

    let bin_hz = sample_rate as f64 / window_len as f64;
    let first = (low_hz / bin_hz).ceil().max(0.0) as usize;
    let last = ((high_hz / bin_hz).floor().max(0.0) as usize).min(bin_count - 1);

    // Guard against float error at the band edges.
    let first = (first.saturating_sub(1)..=first + 1)
        .find(|&k| k as f64 * bin_hz >= low_hz)
        .unwrap_or(first);
    let last = (last.saturating_sub(1)..=(last + 1).min(bin_count - 1))
        .rev()
        .find(|&k| k as f64 * bin_hz <= high_hz)
        .unwrap_or(last);

    (first <= last).then_some(first..=last)
}
