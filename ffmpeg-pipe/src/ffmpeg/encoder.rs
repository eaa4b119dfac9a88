use bytes::Bytes;
use ffmpeg_next::Rational;

use super::{convert, scaler::Scaler};
use crate::{
    error::PipeError,
    frame::DecodedFrame,
    packet::EncodedUnit,
    service::{EncodeService, EncoderSettings, SubmitStatus},
    stream::StreamDescriptor,
};

pub struct FfmpegEncoder {
    inner: ffmpeg_next::codec::encoder::Video,
    time_base: Rational,
    scaler: Option<Scaler>,
}

impl FfmpegEncoder {
    pub fn open(settings: &EncoderSettings) -> Result<(Self, StreamDescriptor), PipeError> {
        let codec = ffmpeg_next::encoder::find_by_name(&settings.codec).ok_or_else(|| {
            PipeError::EncoderUnavailable {
                name: settings.codec.clone(),
            }
        })?;
        let codec_id = codec.id();

        let encoder_context = ffmpeg_next::codec::Context::new_with_codec(codec);
        let mut encoder = encoder_context
            .encoder()
            .video()
            .map_err(|e| PipeError::encoder_open(&settings.codec, e))?;
        encoder.set_width(settings.width);
        encoder.set_height(settings.height);
        encoder.set_format(settings.pixel_format);
        encoder.set_frame_rate(Some(settings.frame_rate));
        encoder.set_time_base(settings.frame_rate.invert());
        unsafe {
            (*encoder.as_mut_ptr()).gop_size = settings.keyframe_interval as i32;
        }

        let mut opts = ffmpeg_next::Dictionary::new();
        opts.set("preset", "ultrafast");
        opts.set("tune", "zerolatency");
        let opened = encoder
            .open_with(opts)
            .map_err(|e| PipeError::encoder_open(&settings.codec, e))?;

        let time_base: Rational = unsafe { (*opened.0.as_ptr()).time_base.into() };
        // Copy the opened context into standalone parameters so the muxer
        // gets resolution, format and codec-private data (extradata).
        let mut parameters = ffmpeg_next::codec::Parameters::new();
        let ret = unsafe {
            ffmpeg_next::ffi::avcodec_parameters_from_context(
                parameters.as_mut_ptr(),
                opened.0.as_ptr(),
            )
        };
        if ret < 0 {
            return Err(PipeError::encoder_open(
                &settings.codec,
                ffmpeg_next::Error::from(ret),
            ));
        }

        log::info!(
            "encoder opened: {} {}x{} @ {:?}, time_base {:?}",
            settings.codec,
            settings.width,
            settings.height,
            settings.pixel_format,
            time_base
        );

        let descriptor = StreamDescriptor {
            codec: codec_id,
            width: settings.width,
            height: settings.height,
            format: settings.pixel_format,
            time_base,
            frame_rate: settings.frame_rate,
            keyframe_interval: settings.keyframe_interval,
            parameters: Some(parameters),
        };

        Ok((
            Self {
                inner: opened,
                time_base,
                scaler: None,
            },
            descriptor,
        ))
    }
}

impl EncodeService for FfmpegEncoder {
    fn send_frame(&mut self, frame: &DecodedFrame) -> Result<SubmitStatus, PipeError> {
        let mut raw = convert::to_video_frame(frame);
        if raw.format() != self.inner.format() {
            if self.scaler.is_none() {
                let context = ffmpeg_next::software::scaling::Context::get(
                    raw.format(),
                    raw.width(),
                    raw.height(),
                    self.inner.format(),
                    self.inner.width(),
                    self.inner.height(),
                    ffmpeg_next::software::scaling::flag::Flags::BILINEAR,
                )
                .map_err(PipeError::encode)?;
                self.scaler = Some(Scaler::new(context));
            }

            let mut converted = ffmpeg_next::frame::Video::empty();
            self.scaler
                .as_mut()
                .unwrap()
                .run(&raw, &mut converted)
                .map_err(PipeError::encode)?;
            converted.set_pts(raw.pts());
            raw = converted;
        }

        match self.inner.send_frame(&raw) {
            Ok(()) => Ok(SubmitStatus::Accepted),
            Err(ffmpeg_next::Error::Other { errno })
                if errno == ffmpeg_next::util::error::EAGAIN =>
            {
                Ok(SubmitStatus::Full)
            }
            Err(e) => Err(PipeError::encode(e)),
        }
    }

    fn send_eof(&mut self) -> Result<(), PipeError> {
        self.inner.send_eof().map_err(PipeError::encode)
    }

    fn receive_unit(&mut self) -> Result<Option<EncodedUnit>, PipeError> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match self.inner.receive_packet(&mut packet) {
            Ok(()) => {
                let data = packet.data().map(Bytes::copy_from_slice).unwrap_or_default();
                Ok(Some(EncodedUnit::new(
                    data,
                    0,
                    packet.pts(),
                    packet.dts(),
                    self.time_base,
                )))
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(ffmpeg_next::Error::Other { errno })
                if errno == ffmpeg_next::util::error::EAGAIN =>
            {
                Ok(None)
            }
            Err(e) => Err(PipeError::encode(e)),
        }
    }
}
