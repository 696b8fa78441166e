// tests/feature_pipeline_test.rs
//
// End-to-end feature extraction from WAV files on disk

mod test_utils;

use melkit::config::FeatureConfigBuilder;
use melkit::{FeatureConfig, FeatureError, FeatureExtractor, LoadOptions};
use test_utils::*;

#[test]
fn test_float_wav_roundtrips_through_decoder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let samples = sine(440.0, 16000, 16000, 0.5);
    write_wav_f32(&path, &samples, 16000, 1);

    let ex = FeatureExtractor::new(FeatureConfig::default()).unwrap();
    let audio = ex.load_and_read(&path, -1, -1).unwrap();

    assert_eq!(audio.sample_rate(), 16000);
    assert_eq!(audio.n_channels(), 1);
    assert_eq!(audio.n_frames(), 16000);
    for (a, b) in audio.mono.samples().iter().zip(&samples) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_stereo_pcm_downmix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let left = sine(440.0, 22050, 22050, 0.6);
    let right = vec![0.2f32; 22050];
    write_wav_i16(&path, &interleave(&[left.clone(), right.clone()]), 22050, 2);

    let ex = FeatureExtractor::new(FeatureConfig::default()).unwrap();
    let audio = ex.load_and_read(&path, -1, -1).unwrap();

    assert_eq!(audio.n_channels(), 2);
    let (l, r) = audio.stereo().unwrap();
    assert!((r[100] - 0.2).abs() < 1e-3);
    for i in [0, 1000, 20000] {
        let expected = (left[i] + right[i]) / 2.0;
        assert!((audio.mono.samples()[i] - expected).abs() < 1e-3);
        assert!((audio.mono.samples()[i] - (l[i] + r[i]) / 2.0).abs() < 1e-6);
    }
}

#[test]
fn test_duration_offset_and_resample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.wav");
    write_wav_f32(&path, &sine(300.0, 44100, 44100 * 3, 0.5), 44100, 1);

    let ex = FeatureExtractor::new(FeatureConfig::default()).unwrap();

    let audio = ex.load_and_read(&path, 22050, 2).unwrap();
    assert_eq!(audio.native_sample_rate, 44100);
    assert_eq!(audio.sample_rate(), 22050);
    assert_eq!(audio.n_frames(), 44100);

    let opts = LoadOptions {
        target_sample_rate: None,
        duration_secs: Some(1.0),
        offset_secs: 2.5,
    };
    // only 0.5s remain after the offset
    let tail = ex.load(&path, &opts).unwrap();
    assert_eq!(tail.n_frames(), 22050);
}

#[test]
fn test_invalid_sentinels_rejected() {
    let ex = FeatureExtractor::new(FeatureConfig::default()).unwrap();
    let path = std::path::Path::new("unused.wav");
    assert!(matches!(ex.load_and_read(path, 0, -1), Err(FeatureError::InvalidConfiguration(_))));
    assert!(matches!(ex.load_and_read(path, -1, -7), Err(FeatureError::InvalidConfiguration(_))));
}

#[test]
fn test_unsupported_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.wav");
    std::fs::write(&path, b"this is not audio at all, just some bytes").unwrap();

    let ex = FeatureExtractor::new(FeatureConfig::default()).unwrap();
    assert!(matches!(
        ex.load_and_read(&path, -1, -1),
        Err(FeatureError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_440hz_dominant_mel_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a4.wav");
    write_wav_f32(&path, &sine(440.0, 16000, 16000, 0.8), 16000, 1);

    let ex = FeatureExtractor::new(FeatureConfig::default()).unwrap();
    let audio = ex.load_and_read(&path, -1, -1).unwrap();

    let mel = ex.generate_mel_spectrogram(&audio.mono).unwrap();
    assert_eq!(mel.shape(), (128, 32));

    let totals: Vec<f64> = (0..128).map(|m| mel.feature_row(m).iter().sum()).collect();
    let fb = ex.filterbank(16000).unwrap();
    assert_eq!(argmax(&totals), fb.band_for_frequency(440.0));
}

#[test]
fn test_full_feature_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chord.wav");
    let a = sine(220.0, 22050, 22050 * 2, 0.3);
    let b = sine(660.0, 22050, 22050 * 2, 0.3);
    let mix: Vec<f32> = a.iter().zip(&b).map(|(x, y)| x + y).collect();
    write_wav_f32(&path, &mix, 22050, 1);

    let config = FeatureConfigBuilder::new().n_mels(64).n_mfcc(13).build().unwrap();
    let ex = FeatureExtractor::new(config).unwrap();
    let audio = ex.load_and_read(&path, -1, -1).unwrap();

    let stft = ex.generate_stft_features(&audio.mono).unwrap();
    assert_eq!(stft.shape(), (1025, 1 + 44100 / 512));

    let restored = ex
        .generate_inverse_stft_features(&stft, Some(audio.n_frames()))
        .unwrap();
    for i in 2048..audio.n_frames() - 2048 {
        assert!((restored.samples()[i] - audio.mono.samples()[i]).abs() < 1e-4);
    }

    let mfcc = ex.generate_mfcc_features(&audio.mono).unwrap();
    assert_eq!(mfcc.shape(), (13, stft.n_frames()));

    let mean = ex.generate_mean_mfcc_features(&mfcc).unwrap();
    assert_eq!(mean.len(), 13);
    for (k, &m) in mean.iter().enumerate() {
        let row = mfcc.feature_row(k);
        let expected = row.iter().sum::<f64>() / row.len() as f64;
        assert!((m - expected).abs() < 1e-9);
    }
}
