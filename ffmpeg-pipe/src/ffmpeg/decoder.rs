use ffmpeg_next::Rational;

use super::convert;
use crate::{
    error::PipeError,
    frame::DecodedFrame,
    packet::EncodedUnit,
    service::{DecodeService, SubmitStatus},
    stream::StreamDescriptor,
};

pub struct FfmpegDecoder {
    inner: ffmpeg_next::codec::decoder::Video,
    time_base: Rational,
}

impl FfmpegDecoder {
    pub fn open(descriptor: &StreamDescriptor) -> Result<(Self, StreamDescriptor), PipeError> {
        if ffmpeg_next::decoder::find(descriptor.codec).is_none() {
            return Err(PipeError::UnsupportedCodec {
                codec: descriptor.codec,
            });
        }
        let parameters = descriptor
            .parameters
            .clone()
            .ok_or_else(|| PipeError::decoder_open("missing codec parameters"))?;

        let mut decoder_ctx = ffmpeg_next::codec::Context::new();
        unsafe {
            (*decoder_ctx.as_mut_ptr()).time_base = descriptor.time_base.into();
        }
        decoder_ctx
            .set_parameters(parameters)
            .map_err(PipeError::decoder_open)?;

        let inner = decoder_ctx
            .decoder()
            .video()
            .map_err(PipeError::decoder_open)?;
        if inner.format() == ffmpeg_next::format::Pixel::None
            || inner.width() == 0
            || inner.height() == 0
        {
            return Err(PipeError::decoder_open("missing codec parameters"));
        }

        let negotiated = StreamDescriptor {
            codec: descriptor.codec,
            width: inner.width(),
            height: inner.height(),
            format: inner.format(),
            time_base: descriptor.time_base,
            frame_rate: descriptor.frame_rate,
            keyframe_interval: descriptor.keyframe_interval,
            parameters: descriptor.parameters.clone(),
        };

        let time_base = inner.time_base();
        Ok((Self { inner, time_base }, negotiated))
    }
}

impl DecodeService for FfmpegDecoder {
    fn send_unit(&mut self, unit: &EncodedUnit) -> Result<SubmitStatus, PipeError> {
        let mut packet = ffmpeg_next::codec::packet::Packet::copy(unit.data());
        packet.set_pts(unit.pts());
        packet.set_dts(unit.dts());
        packet.rescale_ts(unit.time_base(), self.time_base);
        match self.inner.send_packet(&packet) {
            Ok(()) => Ok(SubmitStatus::Accepted),
            Err(ffmpeg_next::Error::Other { errno })
                if errno == ffmpeg_next::util::error::EAGAIN =>
            {
                Ok(SubmitStatus::Full)
            }
            Err(e) => Err(PipeError::decode(e)),
        }
    }

    fn send_eof(&mut self) -> Result<(), PipeError> {
        self.inner.send_eof().map_err(PipeError::decode)
    }

    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>, PipeError> {
        let mut frame = ffmpeg_next::frame::Video::empty();
        match self.inner.receive_frame(&mut frame) {
            Ok(()) => Ok(Some(convert::from_video_frame(&frame))),
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(ffmpeg_next::Error::Other { errno })
                if errno == ffmpeg_next::util::error::EAGAIN =>
            {
                Ok(None)
            }
            Err(e) => Err(PipeError::decode(e)),
        }
    }
}
