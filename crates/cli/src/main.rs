use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use ballspot_core::detect::infrastructure::hsv_ball_detector::HsvBallDetector;
use ballspot_core::pipeline::config::PipelineConfig;
use ballspot_core::pipeline::detect_ball_use_case::DetectBallUseCase;
use ballspot_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use ballspot_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use ballspot_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Ball detection for videos: finds a uniformly-colored round object in
/// every frame and writes an annotated WebM copy.
#[derive(Parser)]
#[command(name = "ballspot")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Output base name; the extension is replaced with .webm.
    output: PathBuf,

    /// JSON file with a (possibly partial) pipeline configuration.
    /// Individual flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Processing width cap in pixels.
    #[arg(long, conflicts_with = "no_downscale")]
    target_width: Option<u32>,

    /// Process at source resolution (no downscaling).
    #[arg(long)]
    no_downscale: bool,

    /// Hue band, OpenCV scale (0-179).
    #[arg(long)]
    hue_min: Option<u8>,
    #[arg(long)]
    hue_max: Option<u8>,

    /// Saturation band (0-255).
    #[arg(long)]
    sat_min: Option<u8>,
    #[arg(long)]
    sat_max: Option<u8>,

    /// Value band (0-255).
    #[arg(long)]
    val_min: Option<u8>,
    #[arg(long)]
    val_max: Option<u8>,

    /// Minimum contour area in px² at processing resolution.
    #[arg(long)]
    min_area: Option<f64>,

    /// Circularity acceptance threshold (0-1].
    #[arg(long)]
    min_circularity: Option<f64>,

    /// Gaussian blur kernel size (odd).
    #[arg(long)]
    blur_kernel: Option<usize>,

    /// Morphological closing kernel size (odd).
    #[arg(long)]
    close_kernel: Option<usize>,
    #[arg(long)]
    close_iterations: Option<usize>,

    /// Post-closing erosion passes.
    #[arg(long)]
    erode_iterations: Option<usize>,

    /// Output frame rate (defaults to the source rate).
    #[arg(long)]
    fps: Option<f64>,

    /// Save the cleaned detection mask of sampled frames as PNGs here.
    #[arg(long)]
    dump_mask: Option<PathBuf>,

    /// Dump every Nth frame's mask (with --dump-mask).
    #[arg(long, default_value = "30")]
    dump_every: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    config.validate()?;

    let mut detector = HsvBallDetector::new(&config);
    if let Some(dir) = &cli.dump_mask {
        fs::create_dir_all(dir)?;
        detector = detector.with_mask_probe(mask_dumper(dir.clone(), cli.dump_every.max(1)));
    }

    let mut use_case = DetectBallUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        Box::new(detector),
        config,
        Box::new(CliLogger::default()),
    );

    let output = use_case.execute(&cli.input, &cli.output)?;
    eprintln!();
    log::info!("Output written to {}", output.display());
    println!("{}", output.display());
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if let Some(config) = &cli.config {
        if !config.exists() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    if cli.dump_every == 0 {
        return Err("--dump-every must be at least 1".into());
    }
    Ok(())
}

/// Layering: defaults ← config file ← individual flags.
fn build_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };

    if cli.no_downscale {
        config.target_width = 0;
    }
    if let Some(width) = cli.target_width {
        config.target_width = width;
    }
    if let Some(v) = cli.hue_min {
        config.hsv.hue_min = v;
    }
    if let Some(v) = cli.hue_max {
        config.hsv.hue_max = v;
    }
    if let Some(v) = cli.sat_min {
        config.hsv.sat_min = v;
    }
    if let Some(v) = cli.sat_max {
        config.hsv.sat_max = v;
    }
    if let Some(v) = cli.val_min {
        config.hsv.val_min = v;
    }
    if let Some(v) = cli.val_max {
        config.hsv.val_max = v;
    }
    if let Some(v) = cli.min_area {
        config.min_area = v;
    }
    if let Some(v) = cli.min_circularity {
        config.min_circularity = v;
    }
    if let Some(v) = cli.blur_kernel {
        config.blur_kernel = v;
    }
    if let Some(v) = cli.close_kernel {
        config.close_kernel = v;
    }
    if let Some(v) = cli.close_iterations {
        config.close_iterations = v;
    }
    if let Some(v) = cli.erode_iterations {
        config.erode_iterations = v;
    }
    if let Some(v) = cli.fps {
        config.fps = Some(v);
    }

    Ok(config)
}

/// Saves every Nth cleaned mask as a grayscale PNG for threshold tuning.
fn mask_dumper(
    dir: PathBuf,
    every: usize,
) -> Box<dyn FnMut(usize, &ballspot_core::shared::mask::Mask) + Send> {
    Box::new(move |index, mask| {
        if index % every != 0 {
            return;
        }
        let path = dir.join(format!("mask_{index:05}.png"));
        if let Err(e) = mask.to_gray_image().save(&path) {
            log::warn!("could not save mask {}: {e}", path.display());
        }
    })
}

/// Terminal progress on stderr; timings and summary via the log facade.
#[derive(Default)]
struct CliLogger {
    inner: StdoutPipelineLogger,
}

impl PipelineLogger for CliLogger {
    fn progress(&mut self, current: usize, total: usize) {
        if total > 0 {
            eprint!("\rProcessing frame {current}/{total}");
        } else {
            eprint!("\rProcessing frame {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.inner.timing(stage, duration_ms);
    }

    fn info(&mut self, message: &str) {
        self.inner.info(message);
    }

    fn summary(&self) {
        self.inner.summary();
    }
}
