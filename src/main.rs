use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ffmpeg_pipe::ffmpeg::FfmpegBackend;
use ffmpeg_pipe::pipeline::{Pipeline, PipelineConfig};

/// Decodes the video stream of a media file and optionally re-encodes a
/// trimmed clip of it into a new container.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Input media file
    input: PathBuf,

    /// Output file; when omitted the pipeline decodes only and logs each
    /// frame
    output: Option<PathBuf>,

    /// Stop after this many decoded frames
    #[clap(short, long, default_value_t = 100)]
    frames: u64,
}

fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("ffmpeg_pipe", log::LevelFilter::Info)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    if let Err(e) = ffmpeg_pipe::init() {
        log::error!("ffmpeg init failed: {}", e);
        return ExitCode::FAILURE;
    }

    let config = PipelineConfig {
        max_frames: args.frames,
        ..PipelineConfig::default()
    };
    let mut pipeline = Pipeline::new(FfmpegBackend, config);

    match pipeline.run(&args.input, args.output.as_deref()) {
        Ok(report) => {
            log::info!("done: {}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{} failure: {}", e.phase(), e);
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}
