//! Scripted in-memory backend for exercising the pipeline without FFmpeg.
//! Every service registers its open and its drop in a shared ledger so
//! tests can assert the acquire/release pairing on every exit path.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use ffmpeg_next::{Rational, codec, format::Pixel, picture};

use crate::{
    error::{PipeError, SinkOpenPhase},
    frame::DecodedFrame,
    packet::EncodedUnit,
    service::{
        DecodeService, DemuxService, EncodeService, EncoderSettings, MediaBackend, MuxService,
        SubmitStatus,
    },
    stream::{StreamDescriptor, StreamMeta},
};

pub fn input_time_base() -> Rational {
    Rational::new(1, 90_000)
}

pub fn mux_time_base() -> Rational {
    Rational::new(1, 12_800)
}

pub fn video_descriptor() -> StreamDescriptor {
    StreamDescriptor {
        codec: codec::Id::H264,
        width: 320,
        height: 240,
        format: Pixel::YUV420P,
        time_base: input_time_base(),
        frame_rate: Rational::new(25, 1),
        keyframe_interval: 0,
        parameters: None,
    }
}

pub fn audio_descriptor() -> StreamDescriptor {
    StreamDescriptor {
        codec: codec::Id::AAC,
        width: 0,
        height: 0,
        format: Pixel::None,
        time_base: Rational::new(1, 44_100),
        frame_rate: Rational::new(0, 1),
        keyframe_interval: 0,
        parameters: None,
    }
}

pub fn video_unit(stream_index: usize, pts: i64) -> EncodedUnit {
    EncodedUnit::new(
        Bytes::from_static(b"unit"),
        stream_index,
        Some(pts),
        Some(pts),
        input_time_base(),
    )
}

#[derive(Debug, Default)]
pub struct Counts {
    pub demux_open: usize,
    pub demux_close: usize,
    pub decoder_open: usize,
    pub decoder_close: usize,
    pub encoder_open: usize,
    pub encoder_close: usize,
    pub mux_open: usize,
    pub mux_close: usize,
    pub header_writes: usize,
    pub trailer_attempts: usize,
    pub trailer_writes: usize,
    pub units_read: usize,
    pub encoder_input_pts: Vec<i64>,
    pub written_pts: Vec<i64>,
}

impl Counts {
    /// Every successful open has exactly one matching release.
    pub fn balanced(&self) -> bool {
        self.demux_open == self.demux_close
            && self.decoder_open == self.decoder_close
            && self.encoder_open == self.encoder_close
            && self.mux_open == self.mux_close
    }
}

#[derive(Clone, Default)]
pub struct Ledger(Arc<Mutex<Counts>>);

impl Ledger {
    pub fn counts(&self) -> MutexGuard<'_, Counts> {
        self.0.lock().unwrap()
    }
}

/// Knobs for one scripted run.
#[derive(Clone)]
pub struct Script {
    /// Video units the container yields.
    pub video_units: usize,
    /// Frames the decoder emits per video unit.
    pub frames_per_unit: usize,
    /// Units the decoder buffers before emitting anything; released on eof.
    pub decoder_holdback: usize,
    /// Frames the encoder buffers until eof.
    pub encoder_holdback: usize,
    /// Interleave one non-video unit ahead of every video unit.
    pub interleave_other: bool,
    /// Replace the probed stream table entirely.
    pub custom_streams: Option<Vec<StreamMeta>>,
    /// Report "not ready" on every n-th decoder submit.
    pub decoder_full_every: Option<usize>,
    pub fail_open_input: bool,
    pub fail_probe: bool,
    pub decoder_missing: bool,
    pub encoder_missing: bool,
    /// 1-based ordinal of the sink write that fails.
    pub fail_write_at: Option<usize>,
    pub fail_header: bool,
    pub fail_trailer: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            video_units: 10,
            frames_per_unit: 1,
            decoder_holdback: 0,
            encoder_holdback: 0,
            interleave_other: false,
            custom_streams: None,
            decoder_full_every: None,
            fail_open_input: false,
            fail_probe: false,
            decoder_missing: false,
            encoder_missing: false,
            fail_write_at: None,
            fail_header: false,
            fail_trailer: false,
        }
    }
}

impl Script {
    /// Stream table the default script probes: one audio stream at index 0,
    /// the default-marked video stream at index 1.
    fn streams(&self) -> Vec<StreamMeta> {
        if let Some(streams) = &self.custom_streams {
            return streams.clone();
        }
        vec![
            StreamMeta {
                index: 0,
                is_video: false,
                is_default: false,
                decodable: true,
                descriptor: audio_descriptor(),
            },
            StreamMeta {
                index: 1,
                is_video: true,
                is_default: true,
                decodable: true,
                descriptor: video_descriptor(),
            },
        ]
    }

    fn units(&self) -> VecDeque<EncodedUnit> {
        let mut units = VecDeque::new();
        for i in 0..self.video_units {
            if self.interleave_other {
                units.push_back(EncodedUnit::new(
                    Bytes::from_static(b"other"),
                    0,
                    Some(i as i64 * 1024),
                    Some(i as i64 * 1024),
                    Rational::new(1, 44_100),
                ));
            }
            units.push_back(video_unit(1, i as i64 * 3600));
        }
        units
    }
}

#[derive(Clone)]
pub struct FakeBackend {
    pub ledger: Ledger,
    pub script: Script,
}

impl FakeBackend {
    pub fn new(script: Script) -> Self {
        Self {
            ledger: Ledger::default(),
            script,
        }
    }
}

impl MediaBackend for FakeBackend {
    type Demux = FakeDemux;
    type Decoder = FakeDecoder;
    type Encoder = FakeEncoder;
    type Mux = FakeMux;

    fn open_input(&self, path: &Path) -> Result<Self::Demux, PipeError> {
        if self.script.fail_open_input {
            return Err(PipeError::container_open(
                path.display().to_string(),
                "scripted open failure",
            ));
        }
        if self.script.fail_probe {
            return Err(PipeError::stream_probe(
                path.display().to_string(),
                "scripted probe failure",
            ));
        }
        self.ledger.counts().demux_open += 1;
        Ok(FakeDemux {
            ledger: self.ledger.clone(),
            metas: self.script.streams(),
            units: self.script.units(),
        })
    }

    fn open_decoder(
        &self,
        descriptor: &StreamDescriptor,
    ) -> Result<(Self::Decoder, StreamDescriptor), PipeError> {
        if self.script.decoder_missing {
            return Err(PipeError::UnsupportedCodec {
                codec: descriptor.codec,
            });
        }
        self.ledger.counts().decoder_open += 1;
        Ok((
            FakeDecoder {
                ledger: self.ledger.clone(),
                frames_per_unit: self.script.frames_per_unit,
                holdback: self.script.decoder_holdback,
                full_every: self.script.decoder_full_every,
                sends: 0,
                full_pending: false,
                queue: VecDeque::new(),
                out: VecDeque::new(),
            },
            descriptor.clone(),
        ))
    }

    fn open_encoder(
        &self,
        settings: &EncoderSettings,
    ) -> Result<(Self::Encoder, StreamDescriptor), PipeError> {
        if self.script.encoder_missing {
            return Err(PipeError::EncoderUnavailable {
                name: settings.codec.clone(),
            });
        }
        self.ledger.counts().encoder_open += 1;
        let time_base = settings.frame_rate.invert();
        let descriptor = StreamDescriptor {
            codec: codec::Id::H264,
            width: settings.width,
            height: settings.height,
            format: settings.pixel_format,
            time_base,
            frame_rate: settings.frame_rate,
            keyframe_interval: settings.keyframe_interval,
            parameters: None,
        };
        Ok((
            FakeEncoder {
                ledger: self.ledger.clone(),
                holdback: self.script.encoder_holdback,
                time_base,
                queue: VecDeque::new(),
                out: VecDeque::new(),
            },
            descriptor,
        ))
    }

    fn open_output(
        &self,
        _path: &Path,
        _descriptor: &StreamDescriptor,
    ) -> Result<Self::Mux, PipeError> {
        self.ledger.counts().mux_open += 1;
        Ok(FakeMux {
            ledger: self.ledger.clone(),
            fail_write_at: self.script.fail_write_at,
            fail_header: self.script.fail_header,
            fail_trailer: self.script.fail_trailer,
            written: 0,
        })
    }
}

pub struct FakeDemux {
    ledger: Ledger,
    metas: Vec<StreamMeta>,
    units: VecDeque<EncodedUnit>,
}

impl DemuxService for FakeDemux {
    fn streams(&self) -> &[StreamMeta] {
        &self.metas
    }

    fn read_unit(&mut self) -> Result<Option<EncodedUnit>, PipeError> {
        match self.units.pop_front() {
            Some(unit) => {
                self.ledger.counts().units_read += 1;
                Ok(Some(unit))
            }
            None => Ok(None),
        }
    }
}

impl Drop for FakeDemux {
    fn drop(&mut self) {
        self.ledger.counts().demux_close += 1;
    }
}

pub struct FakeDecoder {
    ledger: Ledger,
    frames_per_unit: usize,
    holdback: usize,
    full_every: Option<usize>,
    sends: usize,
    full_pending: bool,
    queue: VecDeque<i64>,
    out: VecDeque<DecodedFrame>,
}

impl FakeDecoder {
    fn emit_ready(&mut self) {
        while self.queue.len() > self.holdback {
            let pts = self.queue.pop_front().unwrap();
            for j in 0..self.frames_per_unit {
                self.out.push_back(DecodedFrame::new(
                    Bytes::new(),
                    320,
                    240,
                    Pixel::YUV420P,
                    Some(pts + j as i64),
                    picture::Type::I,
                ));
            }
        }
    }
}

impl DecodeService for FakeDecoder {
    fn send_unit(&mut self, unit: &EncodedUnit) -> Result<SubmitStatus, PipeError> {
        if self.full_pending {
            self.full_pending = false;
        } else {
            self.sends += 1;
            if let Some(every) = self.full_every {
                if self.sends % every == 0 && !self.out.is_empty() {
                    self.full_pending = true;
                    return Ok(SubmitStatus::Full);
                }
            }
        }
        self.queue.push_back(unit.pts().unwrap_or_default());
        self.emit_ready();
        Ok(SubmitStatus::Accepted)
    }

    fn send_eof(&mut self) -> Result<(), PipeError> {
        while let Some(pts) = self.queue.pop_front() {
            for j in 0..self.frames_per_unit {
                self.out.push_back(DecodedFrame::new(
                    Bytes::new(),
                    320,
                    240,
                    Pixel::YUV420P,
                    Some(pts + j as i64),
                    picture::Type::I,
                ));
            }
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>, PipeError> {
        Ok(self.out.pop_front())
    }
}

impl Drop for FakeDecoder {
    fn drop(&mut self) {
        self.ledger.counts().decoder_close += 1;
    }
}

pub struct FakeEncoder {
    ledger: Ledger,
    holdback: usize,
    time_base: Rational,
    queue: VecDeque<i64>,
    out: VecDeque<EncodedUnit>,
}

impl FakeEncoder {
    fn emit(&mut self, pts: i64) {
        self.out
            .push_back(EncodedUnit::new(Bytes::new(), 0, Some(pts), Some(pts), self.time_base));
    }
}

impl EncodeService for FakeEncoder {
    fn send_frame(&mut self, frame: &DecodedFrame) -> Result<SubmitStatus, PipeError> {
        let pts = frame.pts().unwrap_or_default();
        self.ledger.counts().encoder_input_pts.push(pts);
        self.queue.push_back(pts);
        while self.queue.len() > self.holdback {
            let pts = self.queue.pop_front().unwrap();
            self.emit(pts);
        }
        Ok(SubmitStatus::Accepted)
    }

    fn send_eof(&mut self) -> Result<(), PipeError> {
        while let Some(pts) = self.queue.pop_front() {
            self.emit(pts);
        }
        Ok(())
    }

    fn receive_unit(&mut self) -> Result<Option<EncodedUnit>, PipeError> {
        Ok(self.out.pop_front())
    }
}

impl Drop for FakeEncoder {
    fn drop(&mut self) {
        self.ledger.counts().encoder_close += 1;
    }
}

pub struct FakeMux {
    ledger: Ledger,
    fail_write_at: Option<usize>,
    fail_header: bool,
    fail_trailer: bool,
    written: usize,
}

impl MuxService for FakeMux {
    fn write_header(&mut self) -> Result<(), PipeError> {
        if self.fail_header {
            return Err(PipeError::sink_open(
                "fake://out",
                SinkOpenPhase::WriteHeader,
                "scripted header failure",
            ));
        }
        self.ledger.counts().header_writes += 1;
        Ok(())
    }

    fn stream_time_base(&self) -> Rational {
        mux_time_base()
    }

    fn write_unit(&mut self, unit: &EncodedUnit) -> Result<(), PipeError> {
        self.written += 1;
        if self.fail_write_at == Some(self.written) {
            return Err(PipeError::write("scripted write failure"));
        }
        self.ledger
            .counts()
            .written_pts
            .push(unit.pts().unwrap_or_default());
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<(), PipeError> {
        self.ledger.counts().trailer_attempts += 1;
        if self.fail_trailer {
            return Err(PipeError::trailer_write("scripted trailer failure"));
        }
        self.ledger.counts().trailer_writes += 1;
        Ok(())
    }
}

impl Drop for FakeMux {
    fn drop(&mut self) {
        self.ledger.counts().mux_close += 1;
    }
}
