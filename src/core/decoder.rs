// src/core/decoder.rs
//
// Audio decoding behind a small trait so the pipeline can be handed any
// source. The default implementation uses Symphonia for format-agnostic
// decoding.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as SymphoniaBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{FeatureError, Result};

/// File extensions the default decoder is built to handle
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg", "m4a", "aac", "aiff", "aif"];

/// True when `path` carries one of [`AUDIO_EXTENSIONS`]
pub fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decoded PCM with its native layout
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of audio channels
    pub channels: usize,
}

impl DecodedAudio {
    /// Samples per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Anything that can turn a path into PCM
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedAudio>;
}

/// Symphonia-backed decoder (WAV, FLAC, MP3, Vorbis, AAC/ALAC, AIFF)
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedAudio> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mut probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| {
                FeatureError::UnsupportedFormat(format!("{}: {}", path.display(), e))
            })?;

        let track = probed
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                FeatureError::UnsupportedFormat(format!(
                    "{}: no supported audio track",
                    path.display()
                ))
            })?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| FeatureError::Decode("stream does not specify a sample rate".into()))?;
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
        if channels == 0 {
            return Err(FeatureError::Decode("stream reports 0 audio channels".into()));
        }

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| FeatureError::UnsupportedFormat(e.to_string()))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SymphoniaBuffer<f32>> = None;

        loop {
            let packet = match probed.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(map_symphonia_error(e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(buf) => buf,
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::warn!("Skipping corrupt packet in {}: {}", path.display(), msg);
                    continue;
                }
                Err(e) => return Err(map_symphonia_error(e)),
            };

            if sample_buf.is_none() {
                let spec = *decoded.spec();
                let capacity = decoded.capacity() as u64;
                sample_buf = Some(SymphoniaBuffer::new(capacity, spec));
            }

            if let Some(ref mut buf) = sample_buf {
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
        }

        log::debug!(
            "Decoded {}: {} Hz, {} channel(s), {} samples",
            path.display(),
            sample_rate,
            channels,
            samples.len()
        );

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }
}

fn map_symphonia_error(err: SymphoniaError) -> FeatureError {
    match err {
        SymphoniaError::Unsupported(what) => FeatureError::UnsupportedFormat(what.to_string()),
        SymphoniaError::IoError(e) => FeatureError::Io(e),
        other => FeatureError::Decode(other.to_string()),
    }
}

/// Split interleaved samples into one vector per channel
pub fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    if channels == 0 {
        return Vec::new();
    }
    let frames = samples.len() / channels;
    let mut out = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, &s) in out.iter_mut().zip(frame) {
            ch.push(s);
        }
    }
    out
}

/// Average across channels
pub fn downmix_mono(channels: &[Vec<f32>]) -> Vec<f32> {
    match channels {
        [] => Vec::new(),
        [only] => only.clone(),
        _ => {
            let n = channels.iter().map(Vec::len).min().unwrap_or(0);
            let scale = 1.0 / channels.len() as f32;
            (0..n)
                .map(|i| channels.iter().map(|ch| ch[i]).sum::<f32>() * scale)
                .collect()
        }
    }
}
