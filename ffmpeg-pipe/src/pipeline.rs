use std::fmt::{Display, Formatter};
use std::path::Path;

use ffmpeg_next::Rational;

use crate::{
    decode::DecodeStage,
    encode::EncodeStage,
    error::PipeError,
    frame::DecodedFrame,
    service::MediaBackend,
    sink::Sink,
    source::Source,
    trim::{FrameLimit, Gate},
};

/// Fixed per-run settings. Read-only for the lifetime of one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stop after this many decoded frames.
    pub max_frames: u64,
    /// Target encoder for transcode runs.
    pub codec: String,
    /// Output frame rate; the encoder time base is its inverse.
    pub frame_rate: Rational,
    pub keyframe_interval: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frames: 100,
            codec: "libx264".to_string(),
            frame_rate: Rational::new(25, 1),
            keyframe_interval: 25,
        }
    }
}

/// What one run did. `trailer_warning` carries a trailer-write failure on
/// an otherwise clean run, which degrades to a warning instead of failing
/// the run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub frames_processed: u64,
    pub units_written: u64,
    pub trailer_warning: Option<String>,
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "processed {} frames, wrote {} units",
            self.frames_processed, self.units_written
        )?;
        if let Some(warning) = &self.trailer_warning {
            write!(f, " (warning: {})", warning)?;
        }
        Ok(())
    }
}

/// Sink is declared before the encoder so it closes first: handles open
/// source → decode → encode → sink and must release in reverse.
struct EncodePath<B: MediaBackend> {
    sink: Sink<B::Mux>,
    encode: EncodeStage<B::Encoder>,
}

/// Single-threaded pull pipeline: demux → decode → [limit] → encode → mux.
/// Owns every stage handle for the duration of a run and releases them on
/// every exit path.
pub struct Pipeline<B: MediaBackend> {
    backend: B,
    config: PipelineConfig,
}

impl<B: MediaBackend> Pipeline<B> {
    pub fn new(backend: B, config: PipelineConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs one pass. No `output` means decode-only: frames are logged and
    /// released. `&mut self` keeps the pass exclusive.
    pub fn run(&mut self, input: &Path, output: Option<&Path>) -> Result<RunReport, PipeError> {
        let mut source = Source::open(&self.backend, input)?;
        let mut decode = DecodeStage::open(&self.backend, source.descriptor())?;
        let mut transcode = match output {
            Some(path) => {
                let encode = EncodeStage::open(&self.backend, &self.config, decode.descriptor())?;
                let sink = Sink::open(&self.backend, path, encode.descriptor())?;
                Some(EncodePath { sink, encode })
            }
            None => None,
        };

        let mut limit = FrameLimit::new(self.config.max_frames);
        let mut report = RunReport::default();
        let mut stopped = false;

        while let Some(unit) = source.next_unit()? {
            if unit.stream_index() != source.stream_index() {
                continue;
            }
            decode.submit(unit)?;
            stopped = Self::pump(decode.drain()?, &mut limit, &mut transcode, &mut report)?;
            if stopped {
                // Limit reached: the rest of the container is skipped.
                break;
            }
        }

        if !stopped {
            // End of container: the decoder's buffered tail goes through
            // the same gate, with the counter where the loop left it.
            Self::pump(decode.flush()?, &mut limit, &mut transcode, &mut report)?;
        }

        if let Some(path) = transcode.as_mut() {
            let mut units = path.encode.flush()?;
            while let Some(unit) = units.next() {
                path.sink.write(unit?)?;
                report.units_written += 1;
            }
            match path.sink.finish() {
                Ok(()) => {}
                Err(e @ PipeError::TrailerWrite { .. }) => {
                    log::warn!("completed with warning: {}", e);
                    report.trailer_warning = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Drains one frame sequence through the gate. Returns true when the
    /// gate halted the run.
    fn pump(
        frames: impl Iterator<Item = Result<DecodedFrame, PipeError>>,
        limit: &mut FrameLimit,
        transcode: &mut Option<EncodePath<B>>,
        report: &mut RunReport,
    ) -> Result<bool, PipeError> {
        for frame in frames {
            let frame = frame?;
            match limit.gate() {
                Gate::Stop => return Ok(true),
                Gate::Last => {
                    Self::forward(frame, transcode, report)?;
                    return Ok(true);
                }
                Gate::Pass => Self::forward(frame, transcode, report)?,
            }
        }
        Ok(false)
    }

    fn forward(
        frame: DecodedFrame,
        transcode: &mut Option<EncodePath<B>>,
        report: &mut RunReport,
    ) -> Result<(), PipeError> {
        report.frames_processed += 1;
        match transcode {
            None => {
                log::info!("[FRAME] id={} {}", report.frames_processed, frame);
            }
            Some(path) => {
                path.encode.submit(frame)?;
                let mut units = path.encode.drain()?;
                while let Some(unit) = units.next() {
                    path.sink.write(unit?)?;
                    report.units_written += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
