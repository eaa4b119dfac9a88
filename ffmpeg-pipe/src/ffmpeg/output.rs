use std::path::Path;

use ffmpeg_next::Rational;

use crate::{
    error::{PipeError, SinkOpenPhase},
    packet::EncodedUnit,
    service::MuxService,
    stream::StreamDescriptor,
};

pub struct FfmpegMux {
    inner: ffmpeg_next::format::context::Output,
    path: String,
    time_base: Rational,
}

impl FfmpegMux {
    /// Allocates the output context for the format inferred from `path` and
    /// creates its single stream. The header is written separately.
    pub fn open(path: &Path, descriptor: &StreamDescriptor) -> Result<Self, PipeError> {
        let display = path.display().to_string();
        let mut inner = ffmpeg_next::format::output(path)
            .map_err(|e| PipeError::sink_open(&display, SinkOpenPhase::Allocate, e))?;

        {
            let mut stream = inner
                .add_stream(ffmpeg_next::encoder::find(descriptor.codec))
                .map_err(|e| PipeError::sink_open(&display, SinkOpenPhase::CreateStream, e))?;
            match &descriptor.parameters {
                Some(parameters) => stream.set_parameters(parameters.clone()),
                None => unsafe {
                    let params = (*stream.as_mut_ptr()).codecpar;
                    (*params).codec_type = ffmpeg_next::media::Type::Video.into();
                    (*params).codec_id = descriptor.codec.into();
                    (*params).width = descriptor.width as i32;
                    (*params).height = descriptor.height as i32;
                },
            }
            // A hint only; the muxer may pick its own on header write.
            stream.set_time_base(descriptor.time_base);
        }

        Ok(Self {
            inner,
            path: display,
            time_base: descriptor.time_base,
        })
    }
}

impl MuxService for FfmpegMux {
    fn write_header(&mut self) -> Result<(), PipeError> {
        self.inner
            .write_header()
            .map_err(|e| PipeError::sink_open(&self.path, SinkOpenPhase::WriteHeader, e))?;
        // The muxer may have renegotiated the stream time base.
        if let Some(stream) = self.inner.stream(0) {
            self.time_base = stream.time_base();
        }
        Ok(())
    }

    fn stream_time_base(&self) -> Rational {
        self.time_base
    }

    fn write_unit(&mut self, unit: &EncodedUnit) -> Result<(), PipeError> {
        let mut packet = ffmpeg_next::codec::packet::Packet::copy(unit.data());
        packet.set_stream(0);
        packet.set_pts(unit.pts());
        packet.set_dts(unit.dts());
        packet.set_position(-1);
        packet
            .write(&mut self.inner)
            .map(|_| ())
            .map_err(PipeError::write)
    }

    fn write_trailer(&mut self) -> Result<(), PipeError> {
        self.inner.write_trailer().map_err(PipeError::trailer_write)
    }
}
