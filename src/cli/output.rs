//! Output writers and terminal formatting for CLI results

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colorful::Colorful;
use serde::Serialize;

use super::args::Feature;
use crate::core::dsp::FeatureMatrix;
use crate::core::{SampleBuffer, StftMatrix};

/// Feature values as written to JSON, in librosa `[feature][frame]` order
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FeatureData {
    Matrix(Vec<Vec<f64>>),
    /// `[re, im]` per cell
    Complex(Vec<Vec<[f64; 2]>>),
    Vector(Vec<f64>),
}

impl FeatureData {
    pub fn matrix(m: &FeatureMatrix<f64>) -> Self {
        Self::Matrix(m.to_nested())
    }

    pub fn complex(stft: &StftMatrix) -> Self {
        Self::Complex(
            stft.bins()
                .to_nested()
                .into_iter()
                .map(|row| row.into_iter().map(|c| [c.re, c.im]).collect())
                .collect(),
        )
    }
}

/// One JSON document per input file
#[derive(Debug, Serialize)]
pub struct FeatureRecord {
    pub file: String,
    pub feature: Feature,
    pub sample_rate: u32,
    pub n_fft: usize,
    pub hop_length: usize,
    pub shape: Vec<usize>,
    pub data: FeatureData,
}

/// What happened to one input file
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: std::result::Result<FileSummary, String>,
}

#[derive(Debug, Clone)]
pub struct FileSummary {
    pub output: PathBuf,
    pub shape: Vec<usize>,
    pub duration_secs: f64,
    pub sample_rate: u32,
}

/// `<output_dir>/<stem>.<feature>.json`, or `.wav` for the inverse STFT
pub fn output_path(output_dir: &Path, input: &Path, feature: Feature) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let ext = if feature == Feature::Istft { "wav" } else { "json" };
    output_dir.join(format!("{}.{}.{}", stem, feature.name(), ext))
}

pub fn write_json(path: &Path, record: &FeatureRecord) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, record)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Mono 32-bit float WAV
pub fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &s in buffer.samples() {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

fn format_shape(shape: &[usize]) -> String {
    shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(" x ")
}

/// Print one line per file, then the totals
pub fn print_summary(outcomes: &[FileOutcome], verbose: bool) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(summary) => {
                println!(
                    "{} {}",
                    "✓".green(),
                    outcome.input.display().to_string().cyan()
                );
                println!(
                    "    [{}] -> {}",
                    format_shape(&summary.shape),
                    summary.output.display()
                );
                if verbose {
                    println!(
                        "    {:.2}s at {} Hz",
                        summary.duration_secs, summary.sample_rate
                    );
                }
            }
            Err(msg) => {
                println!("{} {}", "✗".red(), outcome.input.display().to_string().cyan());
                println!("    {}", msg.clone().yellow());
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    println!();
    println!("{} file(s) processed", outcomes.len());
    if failed == 0 {
        println!("{}", "All files succeeded".green());
    } else {
        println!("{}", format!("{} file(s) failed", failed).red());
    }
}
