//! FFmpeg-backed implementations of the pipeline services.

mod convert;
mod decoder;
mod encoder;
mod input;
mod output;
mod scaler;

pub use decoder::FfmpegDecoder;
pub use encoder::FfmpegEncoder;
pub use input::FfmpegDemux;
pub use output::FfmpegMux;

use std::path::Path;

use crate::{
    error::PipeError,
    service::{EncoderSettings, MediaBackend},
    stream::StreamDescriptor,
};

/// Production backend: all four services wrap ffmpeg-next.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    type Demux = FfmpegDemux;
    type Decoder = FfmpegDecoder;
    type Encoder = FfmpegEncoder;
    type Mux = FfmpegMux;

    fn open_input(&self, path: &Path) -> Result<Self::Demux, PipeError> {
        FfmpegDemux::open(path)
    }

    fn open_decoder(
        &self,
        descriptor: &StreamDescriptor,
    ) -> Result<(Self::Decoder, StreamDescriptor), PipeError> {
        FfmpegDecoder::open(descriptor)
    }

    fn open_encoder(
        &self,
        settings: &EncoderSettings,
    ) -> Result<(Self::Encoder, StreamDescriptor), PipeError> {
        FfmpegEncoder::open(settings)
    }

    fn open_output(
        &self,
        path: &Path,
        descriptor: &StreamDescriptor,
    ) -> Result<Self::Mux, PipeError> {
        FfmpegMux::open(path, descriptor)
    }
}
