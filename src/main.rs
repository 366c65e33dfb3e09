//! Joint temperature estimation from a depth camera or a recorded session.

use anyhow::{Context, Result};
use clap::Parser;
use joint_temperature::config::{Config, EXAMPLE_CONFIG};
use joint_temperature::frame::replay::ImageSequenceSource;
use joint_temperature::frame::FrameSource;
use joint_temperature::inference::onnx::OnnxPoseNetwork;
use joint_temperature::pipeline::JointTemperaturePipeline;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Depth camera index (overrides the configuration)
    #[arg(long, conflicts_with = "frames_dir")]
    cam: Option<i32>,

    /// Directory of color_NNNN.png / depth_NNNN.png pairs to replay
    #[arg(short = 'f', long)]
    frames_dir: Option<PathBuf>,

    /// Pose network ONNX model (overrides the configuration)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    max_frames: Option<usize>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    let customised = args.config.is_some() || args.cam.is_some() || args.model.is_some();
    if let Some(cam) = args.cam {
        config.camera.device = cam;
    }
    if let Some(model) = args.model {
        config.models.pose_network = model;
    }

    if args.print_config {
        if customised {
            print!("{}", config.to_yaml()?);
        } else {
            print!("{EXAMPLE_CONFIG}");
        }
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;

    let mut source = open_source(&config, args.frames_dir.as_ref())?;
    let metadata = source.metadata();
    info!(
        "Frames are {}x{}, depth scale {}",
        metadata.width, metadata.height, metadata.depth_scale
    );

    info!("Loading pose network from: {}", config.models.pose_network.display());
    let mut network = OnnxPoseNetwork::new(&config.models.pose_network, &config.inference)?;
    let pipeline = JointTemperaturePipeline::new(&config, metadata)?;

    let stdout = std::io::stdout();
    let processed = pipeline.run(&mut *source, &mut network, args.max_frames, |frame, estimate| {
        let record = serde_json::json!({
            "frame": frame,
            "selected": estimate.selected,
            "temperatures": estimate.temperatures,
        });
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &record)?;
        writeln!(out)?;
        Ok(())
    })?;

    info!("Done after {} frame(s)", processed);
    Ok(())
}

fn open_source(config: &Config, frames_dir: Option<&PathBuf>) -> Result<Box<dyn FrameSource>> {
    if let Some(dir) = frames_dir {
        info!("Replaying frames from: {}", dir.display());
        let source = ImageSequenceSource::open(dir, config.camera.depth_scale)?;
        return Ok(Box::new(source));
    }

    open_camera(config)
}

#[cfg(feature = "camera")]
fn open_camera(config: &Config) -> Result<Box<dyn FrameSource>> {
    use joint_temperature::frame::depth_camera::DepthCamera;

    info!("Opening depth camera {}", config.camera.device);
    Ok(Box::new(DepthCamera::open(&config.camera)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_config: &Config) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("Live capture needs the `camera` feature; pass --frames-dir to replay a recording")
}
