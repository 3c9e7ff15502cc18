//! Mono downmix and 16-bit WAV encoding for upload.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::recorder::CapturedAudio;

/// Average interleaved channels into one.  `channels == 0` yields nothing.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => samples
            .chunks_exact(n as usize)
            .map(|frame| frame.iter().sum::<f32>() / f32::from(n))
            .collect(),
    }
}

/// Encode mono `f32` samples as a 16-bit PCM WAV file in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * f32::from(i16::MAX)) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Write `audio` as `<dir>/<UTC timestamp>.wav`, creating `dir` if needed.
pub fn save_recording(dir: &Path, audio: &CapturedAudio) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let path = dir.join(format!("{stamp}.wav"));
    std::fs::write(&path, &audio.bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn stereo_frames_are_averaged() {
        let mono = downmix_to_mono(&[0.5, -0.5, 0.4, 0.2], 2);
        assert_eq!(mono.len(), 2);
        assert!(mono[0].abs() < 1e-6);
        assert!((mono[1] - 0.3).abs() < 1e-6);
        assert!(downmix_to_mono(&[0.1], 0).is_empty());
    }

    #[test]
    fn encoded_wav_reads_back_with_same_spec() {
        let samples: Vec<f32> = (0..1600).map(|i| (i as f32 / 1600.0) - 0.5).collect();
        let bytes = encode_wav(&samples, 16_000).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 1600);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let bytes = encode_wav(&[2.0, -2.0], 8_000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(decoded, vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn recordings_are_saved_under_dir() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("recordings");
        let audio = CapturedAudio::wav(vec![1, 2, 3], Duration::from_secs(1));

        let path = save_recording(&target, &audio).unwrap();
        assert!(path.starts_with(&target));
        assert_eq!(path.extension().unwrap(), "wav");
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
