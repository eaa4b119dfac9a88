use std::path::Path;

use bytes::Bytes;
use ffmpeg_next::format::stream::Disposition;

use crate::{
    error::PipeError,
    packet::EncodedUnit,
    service::DemuxService,
    stream::{StreamDescriptor, StreamMeta},
};

pub struct FfmpegDemux {
    inner: ffmpeg_next::format::context::Input,
    metas: Vec<StreamMeta>,
}

impl FfmpegDemux {
    pub fn open(path: &Path) -> Result<Self, PipeError> {
        let display = path.display().to_string();
        let inner = ffmpeg_next::format::input(path)
            .map_err(|e| PipeError::container_open(&display, e))?;

        let metas: Vec<StreamMeta> = inner.streams().map(|s| stream_meta(&s)).collect();
        if metas.is_empty() {
            return Err(PipeError::stream_probe(&display, "container has no streams"));
        }

        log::info!("opened input {} ({})", display, inner.format().name());
        for meta in &metas {
            log::info!(
                "stream index: {}, id: {:?}, time_base: {:?}",
                meta.index,
                meta.descriptor.codec,
                meta.descriptor.time_base
            );
        }

        Ok(Self { inner, metas })
    }
}

impl DemuxService for FfmpegDemux {
    fn streams(&self) -> &[StreamMeta] {
        &self.metas
    }

    fn read_unit(&mut self) -> Result<Option<EncodedUnit>, PipeError> {
        match self.inner.packets().next() {
            Some((stream, packet)) => {
                let data = packet.data().map(Bytes::copy_from_slice).unwrap_or_default();
                Ok(Some(EncodedUnit::new(
                    data,
                    stream.index(),
                    packet.pts(),
                    packet.dts(),
                    stream.time_base(),
                )))
            }
            None => Ok(None),
        }
    }
}

fn stream_meta(stream: &ffmpeg_next::format::stream::Stream<'_>) -> StreamMeta {
    let parameters = stream.parameters();
    let is_video = parameters.medium() == ffmpeg_next::media::Type::Video;

    let (width, height, format) = unsafe {
        let ptr = parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
        let format = if is_video {
            ffmpeg_next::format::Pixel::from(std::mem::transmute::<
                i32,
                ffmpeg_next::ffi::AVPixelFormat,
            >((*ptr).format))
        } else {
            ffmpeg_next::format::Pixel::None
        };
        ((*ptr).width.max(0) as u32, (*ptr).height.max(0) as u32, format)
    };

    StreamMeta {
        index: stream.index(),
        is_video,
        is_default: stream.disposition().contains(Disposition::DEFAULT),
        decodable: ffmpeg_next::decoder::find(parameters.id()).is_some(),
        descriptor: StreamDescriptor {
            codec: parameters.id(),
            width,
            height,
            format,
            time_base: stream.time_base(),
            frame_rate: stream.avg_frame_rate(),
            keyframe_interval: 0,
            parameters: Some(parameters),
        },
    }
}
