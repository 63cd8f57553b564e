// THEORY:
// Rhythm is the strongest single cue separating cyclic activities (running,
// walking, jumping jacks, sit-ups) from held or one-off movements. The `spectrum`
// module measures it by transforming the hip-height history into the frequency
// domain and asking two questions: which frequency dominates, and how much it
// stands out from the rest.
//
// The transform is recomputed from scratch every time. No FFT state survives
// between frames; the window contents are the only input.

use crate::core_modules::statistics::median;
use num_complex::Complex;
use rustfft::FftPlanner;

/// Added to the background level so a perfectly flat spectrum cannot divide by zero.
const STRENGTH_EPSILON: f64 = 1e-6;

/// Dominant oscillation of a sampled signal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Periodicity {
    /// Frequency of the strongest non-DC bin, in cycles per second.
    pub dominant_frequency: f64,
    /// Peak magnitude divided by the median magnitude of every other bin.
    pub strength: f64,
}

/// Magnitudes of the one-sided discrete Fourier transform of a real signal.
///
/// Returns `n / 2 + 1` bins for an input of length `n`; bin `k` corresponds to
/// `k × sample_rate / n` Hz.
pub fn magnitude_spectrum(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut buffer);

    buffer.iter().take(n / 2 + 1).map(|c| c.norm()).collect()
}

/// Finds the dominant frequency of `series` sampled at `sample_rate` Hz.
///
/// The series is mean-centered and the DC bin is discarded before the peak is
/// located. The zeroed DC bin still counts toward the background median.
pub fn periodicity(series: &[f64], sample_rate: f64) -> Periodicity {
    let n = series.len();
    if n < 2 {
        return Periodicity::default();
    }

    let mean = series.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = series.iter().map(|v| v - mean).collect();
    let mut magnitudes = magnitude_spectrum(&centered);
    magnitudes[0] = 0.0;

    let mut peak_bin = 0;
    for (bin, magnitude) in magnitudes.iter().enumerate() {
        if *magnitude > magnitudes[peak_bin] {
            peak_bin = bin;
        }
    }

    let peak = magnitudes.remove(peak_bin);
    let background = median(&magnitudes) + STRENGTH_EPSILON;

    Periodicity {
        dominant_frequency: peak_bin as f64 * sample_rate / n as f64,
        strength: peak / background,
    }
}
