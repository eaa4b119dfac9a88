use ffmpeg_next::{Rational, codec, format::Pixel};

/// Negotiated parameters of one video stream, carried from the demuxer into
/// the decoder and from the encoder into the muxer. `parameters` is the
/// opaque codec-parameter handle (extradata carrier) when the stream comes
/// from FFmpeg; backends that do not need it leave it empty.
pub struct StreamDescriptor {
    pub codec: codec::Id,
    pub width: u32,
    pub height: u32,
    pub format: Pixel,
    pub time_base: Rational,
    pub frame_rate: Rational,
    pub keyframe_interval: u32,
    pub parameters: Option<codec::Parameters>,
}

impl Clone for StreamDescriptor {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec,
            width: self.width,
            height: self.height,
            format: self.format,
            time_base: self.time_base,
            frame_rate: self.frame_rate,
            keyframe_interval: self.keyframe_interval,
            parameters: self.parameters.clone(),
        }
    }
}

/// What the demuxer learned about one container stream; input to "best
/// video stream" selection.
#[derive(Clone)]
pub struct StreamMeta {
    pub index: usize,
    pub is_video: bool,
    /// Container marks this as the primary stream of its kind.
    pub is_default: bool,
    /// A decoder exists for the stream's codec.
    pub decodable: bool,
    pub descriptor: StreamDescriptor,
}
