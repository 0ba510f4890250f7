use clap::Parser;
use realign::{
    encode_base64, AlignConfig, Aligner, ExtractConfig, Horizontal, InMemorySessionStore,
    MatchConfig, MotionEstimate, OverlayConfig, PipelineConfig, RealignError, SessionStore,
    Vertical,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Realign CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ExtractConfigJson {
    blur_kernel_size: usize,
    sigma: f32,
    num_intervals: usize,
    contrast_threshold: f32,
    edge_threshold: f32,
    double_base_image: bool,
    max_features: usize,
}

impl Default for ExtractConfigJson {
    fn default() -> Self {
        let cfg = ExtractConfig::default();
        Self {
            blur_kernel_size: cfg.blur_kernel_size,
            sigma: cfg.sigma,
            num_intervals: cfg.num_intervals,
            contrast_threshold: cfg.contrast_threshold,
            edge_threshold: cfg.edge_threshold,
            double_base_image: cfg.double_base_image,
            max_features: cfg.max_features,
        }
    }
}

impl From<ExtractConfigJson> for ExtractConfig {
    fn from(value: ExtractConfigJson) -> Self {
        Self {
            blur_kernel_size: value.blur_kernel_size,
            sigma: value.sigma,
            num_intervals: value.num_intervals,
            contrast_threshold: value.contrast_threshold,
            edge_threshold: value.edge_threshold,
            double_base_image: value.double_base_image,
            max_features: value.max_features,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OverlayConfigJson {
    low_ratio: f32,
    high_ratio: f32,
}

impl Default for OverlayConfigJson {
    fn default() -> Self {
        let cfg = OverlayConfig::default();
        Self {
            low_ratio: cfg.low_ratio,
            high_ratio: cfg.high_ratio,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    ratio: f32,
    max_matches: usize,
    parallel: bool,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            ratio: cfg.ratio,
            max_matches: cfg.max_matches,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct AlignConfigJson {
    tolerance_px: f32,
}

impl Default for AlignConfigJson {
    fn default() -> Self {
        Self {
            tolerance_px: AlignConfig::default().tolerance_px,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    reference_path: String,
    candidate_path: String,
    overlay_path: Option<String>,
    output_path: Option<String>,
    session_id: String,
    extract: ExtractConfigJson,
    overlay: OverlayConfigJson,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
    align: AlignConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_path: String::new(),
            candidate_path: String::new(),
            overlay_path: None,
            output_path: None,
            session_id: "cli".to_string(),
            extract: ExtractConfigJson::default(),
            overlay: OverlayConfigJson::default(),
            match_cfg: MatchConfigJson::default(),
            align: AlignConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GuidanceRecord {
    horizontal: Option<&'static str>,
    vertical: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct AlignmentRecord {
    is_aligned: bool,
    direction: [i32; 2],
    mean_dx: f32,
    mean_dy: f32,
    num_matches: usize,
    guidance: GuidanceRecord,
}

impl From<MotionEstimate> for AlignmentRecord {
    fn from(value: MotionEstimate) -> Self {
        let guidance = value.guidance();
        Self {
            is_aligned: value.is_aligned,
            direction: [value.dx, value.dy],
            mean_dx: value.mean_dx,
            mean_dy: value.mean_dy,
            num_matches: value.num_matches,
            guidance: GuidanceRecord {
                horizontal: guidance.horizontal.map(|h| match h {
                    Horizontal::Left => "left",
                    Horizontal::Right => "right",
                }),
                vertical: guidance.vertical.map(|v| match v {
                    Vertical::Up => "up",
                    Vertical::Down => "down",
                }),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    reference_features: usize,
    overlay_edges: usize,
    alignment: Option<AlignmentRecord>,
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("realign=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.reference_path.is_empty() || config.candidate_path.is_empty() {
        return Err("reference_path and candidate_path must be set in the config".into());
    }

    let aligner = Aligner::new(InMemorySessionStore::new()).with_config(PipelineConfig {
        extract: config.extract.into(),
        overlay: OverlayConfig {
            low_ratio: config.overlay.low_ratio,
            high_ratio: config.overlay.high_ratio,
        },
        matching: MatchConfig {
            ratio: config.match_cfg.ratio,
            max_matches: config.match_cfg.max_matches,
            parallel: config.match_cfg.parallel,
        },
        align: AlignConfig {
            tolerance_px: config.align.tolerance_px,
        },
    })?;

    let reference = encode_base64(&fs::read(&config.reference_path)?);
    let candidate = encode_base64(&fs::read(&config.candidate_path)?);

    let overlay = aligner.register_detailed(&config.session_id, &reference)?;
    if let Some(path) = &config.overlay_path {
        fs::write(path, overlay.to_png()?)?;
    }
    let reference_features = aligner
        .store()
        .get(&config.session_id)
        .map(|set| set.len())
        .unwrap_or(0);
    tracing::info!(
        session = %config.session_id,
        features = reference_features,
        edges = overlay.edge_count(),
        "reference registered"
    );

    let (alignment, error) = match aligner.compare_detailed(&config.session_id, &candidate) {
        Ok(estimate) => (Some(AlignmentRecord::from(estimate)), None),
        Err(err @ RealignError::InsufficientMatches) => (None, Some(err.to_string())),
        Err(err) => return Err(err.into()),
    };

    let report = Report {
        reference_features,
        overlay_edges: overlay.edge_count(),
        alignment,
        error,
    };
    let json = serde_json::to_string_pretty(&report)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
