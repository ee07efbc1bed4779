//! Deployment wiring and self-check harness.
//!
//! The camera, contour-extraction and transport drivers are supplied by
//! the deployment build; this binary validates a configuration file and
//! runs the full detection/publication path against a synthetic scene so
//! a coprocessor image can be smoke-checked without a camera attached.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info, LevelFilter};
use retrotrack::config::VisionConfig;
use retrotrack::frame::{ContourExtractor, Frame, VideoSink};
use retrotrack::pipeline::{FrameConsumer, FramePipeline, SharedTarget};
use retrotrack::publish::{keys, LoopbackTransport, Publisher};
use retrotrack_core::{synthetic, Contour};

#[derive(Parser)]
#[command(
    name = "retrotrack",
    about = "Vision targeting config check and synthetic smoke run",
    version
)]
struct Args {
    /// Deployment configuration file.
    #[arg(long, default_value = "/boot/vision.json")]
    config: PathBuf,

    /// Use built-in defaults instead of reading a config file.
    #[arg(long)]
    default_config: bool,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Two correctly tilted strips centered slightly right of frame center.
struct SyntheticScene;

impl ContourExtractor for SyntheticScene {
    fn extract(&mut self, frame: &Frame) -> Vec<Contour> {
        let y = frame.height as f64 / 2.0;
        let cx = frame.width as f64 / 2.0 + 20.0;
        vec![
            synthetic::tilted_rect_contour((cx - 20.0, y), 30.0, 8.0, 75.5, 4),
            synthetic::tilted_rect_contour((cx + 20.0, y), 30.0, 8.0, 104.5, 4),
        ]
    }
}

#[derive(Default)]
struct CountingSink {
    frames: usize,
}

impl VideoSink for CountingSink {
    fn write_frame(&mut self, _frame: &Frame) {
        self.frames += 1;
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if retrotrack_core::init_with_level(level).is_err() {
        eprintln!("logger already installed");
    }

    let config = if args.default_config {
        VisionConfig::default()
    } else {
        match VisionConfig::from_path(&args.config) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        }
    };

    let fov = config.camera.fov_or_default();
    info!(
        "camera '{}' at {}x{}, FOV {fov} degrees",
        config.camera.name, config.camera.width, config.camera.height
    );

    // One synthetic frame through the real pipeline and publisher.
    let mut pipeline = FramePipeline::new(SyntheticScene, config.detector.clone());
    let shared = SharedTarget::new();
    let mut publisher = Publisher::new(LoopbackTransport::default(), CountingSink::default(), fov);

    let mut frame = Frame::new(config.camera.width as usize, config.camera.height as usize);
    let outcome = pipeline.process(&frame, Instant::now());
    shared.store(outcome.info);
    outcome.annotate_onto(&mut frame);
    publisher.on_frame(&shared, &frame);

    let published = publisher.transport().values.get(keys::TARGET_INFORMATION);
    match published {
        Some(record) => {
            info!("smoke check passed: published {record:?}");
            ExitCode::SUCCESS
        }
        None => {
            error!("smoke check failed: synthetic target was not published");
            ExitCode::FAILURE
        }
    }
}
