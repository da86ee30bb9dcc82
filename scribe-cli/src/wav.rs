//! WAV decoding into the core's interleaved integer samples.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;

/// Decoded interleaved samples and their layout.
pub struct DecodedWav {
    pub samples: Vec<i32>,
    pub channels: u16,
    pub sample_rate: u32,
}

fn float_to_i32(sample: f32) -> i32 {
    (f64::from(sample.clamp(-1.0, 1.0)) * f64::from(i32::MAX)) as i32
}

/// Reads every sample of a WAV file.
///
/// Integer samples are kept at their native scale; float samples in
/// `[-1, 1]` are scaled to the 32-bit integer range.
pub fn read_wav(path: &Path) -> Result<DecodedWav> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<i32> = match spec.sample_format {
        SampleFormat::Int => reader
            .samples::<i32>()
            .collect::<Result<_, _>>()
            .context("failed to decode integer samples")?,
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(float_to_i32))
            .collect::<Result<_, _>>()
            .context("failed to decode float samples")?,
    };

    if spec.channels == 0 {
        bail!("{} declares zero channels", path.display());
    }

    log::info!(
        "[WAV] {}: {} Hz, {} channel(s), {} bits, {} samples",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        samples.len()
    );

    Ok(DecodedWav {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}
