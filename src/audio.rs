// audio.rs
//
// WAV decoding for the fallback diarization pipeline.
//
// The recording is decoded once per diarization call and sliced per
// segment by the feature extractor. Multi-channel files are mixed down
// to mono; the native sample rate is preserved.

use anyhow::{bail, Context, Result};
use hound::SampleFormat;
use std::path::Path;

/// Read a WAV file and return mono f32 samples plus the sample rate.
pub fn load_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    let channels = spec.channels.max(1) as usize;
    let sample_rate = spec.sample_rate;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("Failed to decode float samples")?,
        (SampleFormat::Int, bits) if bits <= 32 => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .context("Failed to decode integer samples")?
        }
        (format, bits) => bail!("Unsupported WAV format: {:?} {} bits", format, bits),
    };

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks(channels) {
        let sum: f32 = frame.iter().sum();
        mono.push(sum / channels as f32);
    }

    if sample_rate == 0 {
        bail!("WAV file reports a zero sample rate: {}", path.display());
    }

    Ok((mono, sample_rate))
}
