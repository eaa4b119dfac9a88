//! Seams between the pipeline stages and the codec/container
//! implementations. The stages drive these traits and nothing else; the
//! production implementations live in [`crate::ffmpeg`].

use std::path::Path;

use ffmpeg_next::Rational;

use crate::{
    error::PipeError,
    frame::DecodedFrame,
    packet::EncodedUnit,
    stream::{StreamDescriptor, StreamMeta},
};

/// Outcome of pushing one input into a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Accepted,
    /// The codec holds buffered output and refuses input until it is
    /// drained. Not an error; the stage drains and retries.
    Full,
}

/// Demuxed access to one container: probed stream table plus a lazy,
/// single-pass unit sequence. Closing is dropping.
pub trait DemuxService {
    fn streams(&self) -> &[StreamMeta];

    /// Next encoded unit in container order, any stream; `None` at
    /// end-of-container.
    fn read_unit(&mut self) -> Result<Option<EncodedUnit>, PipeError>;
}

pub trait DecodeService {
    fn send_unit(&mut self, unit: &EncodedUnit) -> Result<SubmitStatus, PipeError>;

    fn send_eof(&mut self) -> Result<(), PipeError>;

    /// One buffered frame, or `None` when the decoder has nothing to emit
    /// without new input.
    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>, PipeError>;
}

pub trait EncodeService {
    fn send_frame(&mut self, frame: &DecodedFrame) -> Result<SubmitStatus, PipeError>;

    fn send_eof(&mut self) -> Result<(), PipeError>;

    /// One buffered unit, or `None` when the encoder has nothing to emit
    /// without new input.
    fn receive_unit(&mut self) -> Result<Option<EncodedUnit>, PipeError>;
}

pub trait MuxService {
    fn write_header(&mut self) -> Result<(), PipeError>;

    /// Time base of the single output stream. Only meaningful after the
    /// header is written; muxers may renegotiate it there.
    fn stream_time_base(&self) -> Rational;

    /// Writes one unit already rescaled to [`Self::stream_time_base`].
    fn write_unit(&mut self, unit: &EncodedUnit) -> Result<(), PipeError>;

    fn write_trailer(&mut self) -> Result<(), PipeError>;
}

/// What the encode stage asks of an encoder implementation. Dimensions and
/// pixel format come from the input descriptor, the rest from the pipeline
/// configuration.
#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub pixel_format: ffmpeg_next::format::Pixel,
    pub frame_rate: Rational,
    pub keyframe_interval: u32,
}

/// Factory for the four services. One backend instance serves one pipeline.
pub trait MediaBackend {
    type Demux: DemuxService;
    type Decoder: DecodeService;
    type Encoder: EncodeService;
    type Mux: MuxService;

    fn open_input(&self, path: &Path) -> Result<Self::Demux, PipeError>;

    /// Opens a decoder for the stream described by `descriptor` and returns
    /// it together with the descriptor as the decoder negotiated it
    /// (actual dimensions and pixel format).
    fn open_decoder(
        &self,
        descriptor: &StreamDescriptor,
    ) -> Result<(Self::Decoder, StreamDescriptor), PipeError>;

    /// Opens an encoder for `settings` and returns it together with the
    /// negotiated output stream descriptor (actual time base, codec
    /// parameters).
    fn open_encoder(
        &self,
        settings: &EncoderSettings,
    ) -> Result<(Self::Encoder, StreamDescriptor), PipeError>;

    fn open_output(
        &self,
        path: &Path,
        descriptor: &StreamDescriptor,
    ) -> Result<Self::Mux, PipeError>;
}
