//! MFCC Feature Extraction - STFT, mel filterbank, cepstra, per-segment descriptors
//!
//! Each eligible transcript segment is reduced to one fixed-length vector:
//! [mean of MFCCs over time, std of MFCCs over time, mean of delta-MFCCs].
//! Segments too short, silent, or producing non-finite values are skipped;
//! the cluster selector works only on the eligible subset.

use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

use crate::config::{
    FMIN, HOP_LENGTH, LOG_ZERO_GUARD, MIN_SEGMENT_DURATION, MIN_SPAN_EXTENSION, N_FFT, N_MELS,
    N_MFCC, WIN_LENGTH,
};
use crate::types::Segment;

/// Length of one segment descriptor: MFCC mean + MFCC std + delta mean.
pub const DESCRIPTOR_LEN: usize = 3 * N_MFCC;

/// Feature matrix for the eligible subset of segments.
///
/// `indices[i]` is the position in the original segment list that produced
/// row `i` of `matrix`.
#[derive(Debug)]
pub struct SegmentFeatures {
    pub indices: Vec<usize>,
    pub matrix: Array2<f32>,
}

/// Generate Hann window
fn hann_window(window_length: usize) -> Vec<f32> {
    (0..window_length)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / window_length as f32).cos())
        .collect()
}

/// Short-time Fourier transform, power spectrogram of shape (freq_bins, frames)
fn stft(audio: &[f32]) -> Array2<f32> {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(N_FFT);

    let hann = hann_window(WIN_LENGTH);
    let win_offset = (N_FFT - WIN_LENGTH) / 2;
    let mut fft_window = vec![0.0f32; N_FFT];
    for i in 0..WIN_LENGTH {
        fft_window[win_offset + i] = hann[i];
    }

    let pad_amount = N_FFT / 2;
    let mut padded_audio = vec![0.0; pad_amount];
    padded_audio.extend_from_slice(audio);
    padded_audio.extend(vec![0.0; pad_amount]);

    let num_frames = (padded_audio.len() - N_FFT) / HOP_LENGTH + 1;
    let freq_bins = N_FFT / 2 + 1;
    let mut spectrogram = Array2::<f32>::zeros((freq_bins, num_frames));

    for frame_idx in 0..num_frames {
        let start = frame_idx * HOP_LENGTH;
        let mut frame: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); N_FFT];

        for i in 0..N_FFT {
            if start + i < padded_audio.len() {
                frame[i] = Complex::new(padded_audio[start + i] * fft_window[i], 0.0);
            }
        }

        fft.process(&mut frame);
        for k in 0..freq_bins {
            let magnitude = frame[k].norm();
            spectrogram[[k, frame_idx]] = magnitude * magnitude;
        }
    }

    spectrogram
}

/// Convert Hz to Mel scale (Slaney formula)
fn hz_to_mel_slaney(hz: f64) -> f64 {
    let f_min = 0.0;
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = (min_log_hz - f_min) / f_sp;
    let logstep = (6.4f64).ln() / 27.0;

    if hz >= min_log_hz {
        min_log_mel + (hz / min_log_hz).ln() / logstep
    } else {
        (hz - f_min) / f_sp
    }
}

/// Convert Mel to Hz scale (Slaney formula)
fn mel_to_hz_slaney(mel: f64) -> f64 {
    let f_min = 0.0;
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = (min_log_hz - f_min) / f_sp;
    let logstep = (6.4f64).ln() / 27.0;

    if mel >= min_log_mel {
        min_log_hz * (logstep * (mel - min_log_mel)).exp()
    } else {
        f_min + f_sp * mel
    }
}

/// Create mel filterbank matrix sized to the decoded sample rate (fmax = Nyquist)
fn create_mel_filterbank(sample_rate: u32) -> Array2<f32> {
    let freq_bins = N_FFT / 2 + 1;
    let mut filterbank = Array2::<f32>::zeros((N_MELS, freq_bins));
    let fmax = sample_rate as f64 / 2.0;

    let fftfreqs: Vec<f64> = (0..freq_bins)
        .map(|k| k as f64 * sample_rate as f64 / N_FFT as f64)
        .collect();

    let fmin_mel = hz_to_mel_slaney(FMIN as f64);
    let fmax_mel = hz_to_mel_slaney(fmax);
    let mel_f: Vec<f64> = (0..=N_MELS + 1)
        .map(|i| {
            let mel = fmin_mel + (fmax_mel - fmin_mel) * i as f64 / (N_MELS + 1) as f64;
            mel_to_hz_slaney(mel)
        })
        .collect();

    let fdiff: Vec<f64> = mel_f.windows(2).map(|w| w[1] - w[0]).collect();

    for i in 0..N_MELS {
        for k in 0..freq_bins {
            let lower = (fftfreqs[k] - mel_f[i]) / fdiff[i];
            let upper = (mel_f[i + 2] - fftfreqs[k]) / fdiff[i + 1];
            filterbank[[i, k]] = 0.0f64.max(lower.min(upper)) as f32;
        }
    }

    for i in 0..N_MELS {
        let enorm = 2.0 / (mel_f[i + 2] - mel_f[i]);
        for k in 0..freq_bins {
            filterbank[[i, k]] *= enorm as f32;
        }
    }

    filterbank
}

/// Orthonormal DCT-II matrix mapping mel bands to cepstral coefficients
fn dct_matrix() -> Array2<f32> {
    let mut dct = Array2::<f32>::zeros((N_MFCC, N_MELS));
    let m = N_MELS as f32;

    for c in 0..N_MFCC {
        let scale = if c == 0 { (1.0 / m).sqrt() } else { (2.0 / m).sqrt() };
        for b in 0..N_MELS {
            dct[[c, b]] = scale * (PI / m * (b as f32 + 0.5) * c as f32).cos();
        }
    }

    dct
}

/// Compute MFCCs of shape (N_MFCC, frames) for an audio slice
fn mfcc(audio: &[f32], mel_basis: &Array2<f32>, dct_basis: &Array2<f32>) -> Array2<f32> {
    let spectrogram = stft(audio);
    let mel_spec = mel_basis.dot(&spectrogram);
    let log_mel_spec = mel_spec.mapv(|x| (x + LOG_ZERO_GUARD).ln());
    dct_basis.dot(&log_mel_spec)
}

/// First time-derivative via central differences (one-sided at the edges)
fn delta(features: &Array2<f32>) -> Array2<f32> {
    let (n_coeffs, n_frames) = features.dim();
    let mut out = Array2::<f32>::zeros((n_coeffs, n_frames));
    if n_frames < 2 {
        return out;
    }

    for c in 0..n_coeffs {
        for t in 0..n_frames {
            let prev = t.saturating_sub(1);
            let next = (t + 1).min(n_frames - 1);
            out[[c, t]] = (features[[c, next]] - features[[c, prev]]) / (next - prev) as f32;
        }
    }

    out
}

/// Flatten one MFCC matrix into the per-segment descriptor
fn pool_descriptor(coeffs: &Array2<f32>) -> Vec<f32> {
    let n_frames = coeffs.ncols() as f32;
    let deltas = delta(coeffs);
    let mut descriptor = Vec::with_capacity(DESCRIPTOR_LEN);

    for c in 0..N_MFCC {
        let mean = coeffs.row(c).sum() / n_frames;
        descriptor.push(mean);
    }
    for c in 0..N_MFCC {
        let mean = coeffs.row(c).sum() / n_frames;
        let var = coeffs.row(c).iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n_frames;
        descriptor.push(var.sqrt());
    }
    for c in 0..N_MFCC {
        descriptor.push(deltas.row(c).sum() / n_frames);
    }

    descriptor
}

/// Extract one descriptor per eligible segment.
///
/// Eligibility: duration >= 0.2s after clamping degenerate spans, slice at
/// least 0.2s of samples, at least one non-zero sample, and a fully finite
/// descriptor. Ineligible segments are simply absent from the result.
pub fn extract_segment_features(
    signal: &[f32],
    sample_rate: u32,
    segments: &[Segment],
) -> SegmentFeatures {
    let mel_basis = create_mel_filterbank(sample_rate);
    let dct_basis = dct_matrix();
    let min_samples = (MIN_SEGMENT_DURATION * sample_rate as f64) as usize;

    let mut indices = Vec::new();
    let mut rows: Vec<f32> = Vec::new();

    for (idx, seg) in segments.iter().enumerate() {
        let start = seg.start.max(0.0);
        let end = seg.end.max(start + MIN_SPAN_EXTENSION);
        if end - start < MIN_SEGMENT_DURATION {
            continue;
        }

        let start_idx = ((start * sample_rate as f64) as usize).min(signal.len());
        let end_idx = ((end * sample_rate as f64) as usize).min(signal.len());
        if end_idx - start_idx < min_samples {
            continue;
        }

        let snippet = &signal[start_idx..end_idx];
        if snippet.iter().all(|&s| s == 0.0) {
            continue;
        }

        let coeffs = mfcc(snippet, &mel_basis, &dct_basis);
        if coeffs.ncols() == 0 {
            continue;
        }

        let descriptor = pool_descriptor(&coeffs);
        if descriptor.iter().any(|v| !v.is_finite()) {
            log::debug!("Dropping segment {} with non-finite features", idx);
            continue;
        }

        indices.push(idx);
        rows.extend_from_slice(&descriptor);
    }

    let matrix = Array2::from_shape_vec((indices.len(), DESCRIPTOR_LEN), rows)
        .unwrap_or_else(|_| Array2::zeros((0, DESCRIPTOR_LEN)));

    SegmentFeatures { indices, matrix }
}
