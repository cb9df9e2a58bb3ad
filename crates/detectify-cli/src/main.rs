use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use detectify::{DetectorConfig, FrameDetections, FrameDetector, ReferenceMatches};
use detectify_core::{Correspondence, Pt2, Real};
use log::info;
use serde::{Deserialize, Serialize};

/// Detect every instance of planar references from point correspondences.
#[derive(Debug, Parser)]
#[command(author, version, about = "Multi-instance planar reference detection")]
struct Args {
    /// Path to JSON file containing a FrameInput.
    #[arg(long)]
    input: String,

    /// Optional path to JSON DetectorConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<String>,
}

/// One reference with its matches as two parallel point lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReferenceInput {
    label: String,
    width: Real,
    height: Real,
    /// Points in reference pixels.
    src: Vec<Pt2>,
    /// Matching points in frame pixels, same order as `src`.
    dst: Vec<Pt2>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FrameInput {
    references: Vec<ReferenceInput>,
}

impl ReferenceInput {
    fn into_matches(self) -> Result<ReferenceMatches> {
        let correspondences = Correspondence::from_point_lists(&self.src, &self.dst)
            .with_context(|| format!("reference '{}'", self.label))?;
        Ok(ReferenceMatches {
            label: self.label,
            width: self.width,
            height: self.height,
            correspondences,
        })
    }
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn detect_from_files(input_path: &str, config_path: Option<&str>) -> Result<FrameDetections> {
    let input: FrameInput = load_json_file(Path::new(input_path))?;

    let config = if let Some(cfg_path) = config_path {
        load_json_file::<DetectorConfig>(Path::new(cfg_path))?
    } else {
        DetectorConfig::default()
    };

    let references = input
        .references
        .into_iter()
        .map(ReferenceInput::into_matches)
        .collect::<Result<Vec<_>>>()?;

    let detector = FrameDetector::new(config)?;
    let detections = detector.detect_frame(&references)?;
    info!(
        "{} instances across {} references",
        detections.instance_count(),
        references.len()
    );
    Ok(detections)
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let detections = detect_from_files(&args.input, args.config.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&detections)?);
    Ok(())
}
