//! Audio duration probing.

use std::io::Cursor;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::ProbeError;

/// Reads the play length of an audio asset.
pub trait DurationProbe: Send + Sync {
    /// Length in whole seconds (rounded up), `Ok(None)` when the container
    /// does not state it. Errors mean the bytes are not playable audio.
    fn probe_bytes(&self, bytes: &[u8], extension: Option<&str>) -> Result<Option<u64>, ProbeError>;

    fn probe_file(&self, path: &Path) -> Result<Option<u64>, ProbeError> {
        let bytes = std::fs::read(path)?;
        self.probe_bytes(&bytes, path.extension().and_then(|e| e.to_str()))
    }
}

/// Probe backed by symphonia's container readers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProbe;

impl SymphoniaProbe {
    fn probe_source(
        &self,
        source: Box<dyn MediaSource>,
        extension: Option<&str>,
    ) -> Result<Option<u64>, ProbeError> {
        let stream = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| ProbeError::Unsupported(e.to_string()))?;

        let track = probed
            .format
            .default_track()
            .ok_or_else(|| ProbeError::Unsupported("no audio track".to_string()))?;

        let params = &track.codec_params;
        Ok(match (params.time_base, params.n_frames) {
            (Some(time_base), Some(frames)) => {
                let time = time_base.calc_time(frames);
                Some(time.seconds + u64::from(time.frac > 0.0))
            }
            _ => None,
        })
    }
}

impl DurationProbe for SymphoniaProbe {
    fn probe_bytes(&self, bytes: &[u8], extension: Option<&str>) -> Result<Option<u64>, ProbeError> {
        self.probe_source(Box::new(Cursor::new(bytes.to_vec())), extension)
    }

    fn probe_file(&self, path: &Path) -> Result<Option<u64>, ProbeError> {
        let file = std::fs::File::open(path)?;
        self.probe_source(Box::new(file), path.extension().and_then(|e| e.to_str()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Minimal 8-bit mono PCM WAV with `seconds` of silence.
    pub fn wav(seconds: u32, sample_rate: u32) -> Vec<u8> {
        let data_len = seconds * sample_rate;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes()); // byte rate
        out.extend_from_slice(&1u16.to_le_bytes()); // block align
        out.extend_from_slice(&8u16.to_le_bytes()); // bits per sample
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(44 + data_len as usize, 128);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::wav;
    use super::*;

    #[test]
    fn wav_length_is_read() {
        let bytes = wav(2, 8000);
        assert_eq!(SymphoniaProbe.probe_bytes(&bytes, Some("wav")).unwrap(), Some(2));
    }

    #[test]
    fn file_probe_matches_bytes() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("three.wav");
        std::fs::write(&path, wav(3, 8000)).unwrap();

        assert_eq!(SymphoniaProbe.probe_file(&path).unwrap(), Some(3));
    }

    #[test]
    fn garbage_is_not_audio() {
        let err = SymphoniaProbe
            .probe_bytes(b"definitely not audio", Some("txt"))
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unsupported(_)));
    }
}
