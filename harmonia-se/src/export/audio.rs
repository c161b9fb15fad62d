//! Audio payload generation
//!
//! The engine does not synthesize real audio. Payloads come from the
//! [`AudioPayloadGenerator`] seam so production synthesis can be swapped in
//! without touching export orchestration; the built-in generator produces
//! fixed placeholder payloads.

use crate::error::{Error, Result};
use crate::export::ExportFormat;
use std::io::Cursor;

/// Default sample rate when the request does not specify one (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

const CHANNELS: u16 = 2;
const BITS_PER_SAMPLE: u16 = 16;
const PLACEHOLDER_SECONDS: u32 = 1;

/// Produces the audio payload for one instrument
pub trait AudioPayloadGenerator: Send + Sync {
    /// Generate the byte payload for `instrument_id` in `format`
    fn generate(
        &self,
        instrument_id: &str,
        format: ExportFormat,
        sample_rate: u32,
    ) -> Result<Vec<u8>>;
}

/// Placeholder generator: one second of 16-bit stereo PCM silence for WAV,
/// a text marker for MP3 (real MP3 output needs an encoder behind the same
/// seam)
#[derive(Debug, Default)]
pub struct PlaceholderAudioGenerator;

impl AudioPayloadGenerator for PlaceholderAudioGenerator {
    fn generate(
        &self,
        instrument_id: &str,
        format: ExportFormat,
        sample_rate: u32,
    ) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Wav => silent_wav(sample_rate),
            ExportFormat::Mp3 => {
                Ok(format!("Placeholder MP3 data for {}", instrument_id).into_bytes())
            }
        }
    }
}

/// A minimal valid WAV payload holding one second of silence
fn silent_wav(sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| Error::AudioEncode(e.to_string()))?;
    for _ in 0..(sample_rate * u32::from(CHANNELS) * PLACEHOLDER_SECONDS) {
        writer
            .write_sample(0i16)
            .map_err(|e| Error::AudioEncode(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| Error::AudioEncode(e.to_string()))?;

    Ok(cursor.into_inner())
}
