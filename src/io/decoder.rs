//! Audio decoding using Symphonia
//!
//! Decodes an audio file into normalized 64-bit samples from channel 0
//! only. No channel mixing is performed: summing channels smears
//! transients on hard-panned material, so slicing always works on the
//! left channel.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;

use crate::error::SliceError;

/// Decode an audio file to channel-0 PCM samples
///
/// # Arguments
///
/// * `path` - Path to the audio file
///
/// # Returns
///
/// Tuple of (samples normalized to `[-1, 1]`, sample rate in Hz)
///
/// # Errors
///
/// Returns `SliceError::Io` if the file cannot be opened and
/// `SliceError::Decode` if the container or codec is invalid or
/// unsupported.
pub fn decode_channel(path: &str) -> Result<(Vec<f64>, u32), SliceError> {
    log::debug!("Decoding audio file: {}", path);

    let src = File::open(path)
        .map_err(|e| SliceError::Io(format!("failed to open '{}': {}", path, e)))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| SliceError::Decode(format!("unsupported format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| SliceError::Decode("no supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SliceError::Decode("missing sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SliceError::Decode(format!("unsupported codec: {}", e)))?;

    let mut samples: Vec<f64> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_channel_zero(&decoded, &mut samples),
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                // Corrupted packets are skipped, not fatal
                log::warn!("Skipping undecodable packet in '{}': {}", path, e);
                continue;
            }
            Err(e) => {
                return Err(SliceError::Decode(format!("decode failed: {}", e)));
            }
        }
    }

    log::debug!(
        "Decoded {} samples at {} Hz from '{}'",
        samples.len(),
        sample_rate,
        path
    );

    Ok((samples, sample_rate))
}

/// Append channel 0 of a decoded buffer as normalized f64 samples
fn append_channel_zero(decoded: &AudioBufferRef<'_>, out: &mut Vec<f64>) {
    match decoded {
        AudioBufferRef::F32(buf) => {
            out.extend(buf.chan(0).iter().map(|&s| s as f64));
        }
        AudioBufferRef::F64(buf) => {
            out.extend_from_slice(buf.chan(0));
        }
        AudioBufferRef::S16(buf) => {
            out.extend(buf.chan(0).iter().map(|&s| s as f64 / 32768.0));
        }
        AudioBufferRef::S24(buf) => {
            out.extend(buf.chan(0).iter().map(|&s| s.inner() as f64 / 8388608.0));
        }
        AudioBufferRef::S32(buf) => {
            out.extend(buf.chan(0).iter().map(|&s| s as f64 / 2147483648.0));
        }
        AudioBufferRef::U8(buf) => {
            out.extend(buf.chan(0).iter().map(|&s| (s as f64 - 128.0) / 128.0));
        }
        _ => {
            log::warn!("Skipping packet with unsupported sample format");
        }
    }
}
