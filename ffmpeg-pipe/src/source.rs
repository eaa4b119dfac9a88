use std::path::Path;

use crate::{
    error::PipeError,
    packet::EncodedUnit,
    service::{DemuxService, MediaBackend},
    stream::{StreamDescriptor, StreamMeta},
};

/// Open input container bound to its selected video stream. The unit
/// sequence is lazy, finite, single-pass and not restartable.
pub struct Source<D: DemuxService> {
    demux: Option<D>,
    selected: StreamMeta,
}

impl<D: DemuxService> Source<D> {
    pub fn open<B>(backend: &B, path: &Path) -> Result<Self, PipeError>
    where
        B: MediaBackend<Demux = D>,
    {
        let demux = backend.open_input(path)?;
        let selected = select_video_stream(demux.streams()).ok_or(PipeError::NoVideoStream)?;
        log::info!(
            "selected video stream {} ({:?}, {}x{})",
            selected.index,
            selected.descriptor.codec,
            selected.descriptor.width,
            selected.descriptor.height
        );
        Ok(Self {
            demux: Some(demux),
            selected,
        })
    }

    pub fn stream_index(&self) -> usize {
        self.selected.index
    }

    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.selected.descriptor
    }

    /// Next unit in container order (any stream); `None` at
    /// end-of-container.
    pub fn next_unit(&mut self) -> Result<Option<EncodedUnit>, PipeError> {
        match self.demux.as_mut() {
            Some(demux) => demux.read_unit(),
            None => Ok(None),
        }
    }

    pub fn close(&mut self) {
        self.demux = None;
    }
}

/// Prefers the stream the container marks as its primary video stream and
/// falls back to the first decodable video stream.
fn select_video_stream(streams: &[StreamMeta]) -> Option<StreamMeta> {
    streams
        .iter()
        .find(|s| s.is_video && s.decodable && s.is_default)
        .or_else(|| streams.iter().find(|s| s.is_video && s.decodable))
        .cloned()
}

#[cfg(test)]
#[path = "source_test.rs"]
mod source_test;
