// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::core::decoder::has_audio_extension;
use crate::core::{FeatureExtractor, LoadOptions};

pub use args::{Args, Feature, PresetArg};
pub use output::{
    output_path, print_summary, write_json, write_wav, FeatureData, FeatureRecord, FileOutcome,
    FileSummary,
};

/// Audio files under `path`, sorted; a file path is returned as is
pub fn collect_audio_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return if has_audio_extension(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_audio_extension(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Run the CLI
pub fn run(args: &Args) -> Result<()> {
    let config = args.feature_config().context("Invalid feature configuration")?;
    let options = args.load_options().context("Invalid load options")?;
    let extractor = FeatureExtractor::new(config)?;

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let files = collect_audio_files(&args.input);
    if files.is_empty() {
        bail!("No audio files found in {}", args.input.display());
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    log::info!(
        "Extracting {} from {} file(s) into {}",
        args.feature.name(),
        files.len(),
        args.output.display()
    );

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {elapsed_precise}")?
            .progress_chars("=> "),
    );

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .progress_with(progress.clone())
        .map(|path| FileOutcome {
            input: path.clone(),
            result: process_file(&extractor, path, &options, args).map_err(|e| format!("{:#}", e)),
        })
        .collect();
    progress.finish_and_clear();

    print_summary(&outcomes, args.verbose);

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, outcomes.len());
    }
    Ok(())
}

fn process_file(
    extractor: &FeatureExtractor,
    path: &Path,
    options: &LoadOptions,
    args: &Args,
) -> Result<FileSummary> {
    let audio = extractor
        .load(path, options)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let buffer = &audio.mono;
    let out = output_path(&args.output, path, args.feature);

    let (shape, data) = match args.feature {
        Feature::Stft => {
            let stft = extractor.generate_stft_features(buffer)?;
            (vec![stft.n_bins(), stft.n_frames()], FeatureData::complex(&stft))
        }
        Feature::Istft => {
            let stft = extractor.generate_stft_features(buffer)?;
            let restored = extractor.generate_inverse_stft_features(&stft, Some(buffer.len()))?;
            write_wav(&out, &restored)?;
            return Ok(FileSummary {
                output: out,
                shape: vec![restored.len()],
                duration_secs: audio.duration_secs(),
                sample_rate: restored.sample_rate(),
            });
        }
        Feature::Mel => {
            let mel = extractor.generate_mel_spectrogram(buffer)?;
            (vec![mel.n_features(), mel.n_frames()], FeatureData::matrix(&mel))
        }
        Feature::Mfcc => {
            let mfcc = extractor.generate_mfcc_features(buffer)?;
            (vec![mfcc.n_features(), mfcc.n_frames()], FeatureData::matrix(&mfcc))
        }
        Feature::MeanMfcc => {
            let mfcc = extractor.generate_mfcc_features(buffer)?;
            let mean = extractor.generate_mean_mfcc_features(&mfcc)?;
            (vec![mean.len()], FeatureData::Vector(mean))
        }
    };

    let config = extractor.config();
    let record = FeatureRecord {
        file: path.display().to_string(),
        feature: args.feature,
        sample_rate: buffer.sample_rate(),
        n_fft: config.n_fft,
        hop_length: config.hop_length(),
        shape: shape.clone(),
        data,
    };
    write_json(&out, &record)?;

    Ok(FileSummary {
        output: out,
        shape,
        duration_secs: audio.duration_secs(),
        sample_rate: buffer.sample_rate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("z.wav"), b"").unwrap();
        fs::write(nested.join("y.FLAC"), b"").unwrap();
        fs::write(nested.join("notes.txt"), b"").unwrap();

        let files = collect_audio_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("a/b/y.FLAC")));
        assert!(files.iter().any(|p| p.ends_with("z.wav")));

        assert!(collect_audio_files(&nested.join("notes.txt")).is_empty());
        assert_eq!(collect_audio_files(&dir.path().join("z.wav")).len(), 1);
    }
}
