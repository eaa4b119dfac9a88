use std::fmt;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Phase a failure belongs to, for user-facing messages and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePhase {
    Open,
    Decode,
    Encode,
    Mux,
}

impl fmt::Display for FailurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePhase::Open => write!(f, "open"),
            FailurePhase::Decode => write!(f, "decode"),
            FailurePhase::Encode => write!(f, "encode"),
            FailurePhase::Mux => write!(f, "mux"),
        }
    }
}

/// Which step of sink setup failed. A failed open never leaves a header
/// behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOpenPhase {
    Allocate,
    CreateStream,
    OpenFile,
    WriteHeader,
}

impl fmt::Display for SinkOpenPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkOpenPhase::Allocate => write!(f, "allocate context"),
            SinkOpenPhase::CreateStream => write!(f, "create stream"),
            SinkOpenPhase::OpenFile => write!(f, "open file"),
            SinkOpenPhase::WriteHeader => write!(f, "write header"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipeError {
    #[error("failed to open input container {path:?}: {source}")]
    ContainerOpen { path: String, source: BoxError },

    #[error("failed to resolve stream info for {path:?}: {source}")]
    StreamProbe { path: String, source: BoxError },

    #[error("no decodable video stream in input")]
    NoVideoStream,

    #[error("no decoder for codec {codec:?}")]
    UnsupportedCodec { codec: ffmpeg_next::codec::Id },

    #[error("failed to open decoder: {source}")]
    DecoderOpen { source: BoxError },

    #[error("encoder {name:?} unavailable")]
    EncoderUnavailable { name: String },

    #[error("failed to open encoder {name:?}: {source}")]
    EncoderOpen { name: String, source: BoxError },

    #[error("failed to open output {path:?} ({phase}): {source}")]
    SinkOpen {
        path: String,
        phase: SinkOpenPhase,
        source: BoxError,
    },

    #[error("decode error: {source}")]
    Decode { source: BoxError },

    #[error("encode error: {source}")]
    Encode { source: BoxError },

    /// A stage was driven in a state that does not permit the operation.
    /// Unreachable with a correct orchestrator; fatal when seen.
    #[error("{op} called on {stage} stage in {state} state")]
    StageTransition {
        stage: &'static str,
        op: &'static str,
        state: &'static str,
    },

    #[error("failed to write unit to output: {source}")]
    Write { source: BoxError },

    #[error("failed to write output trailer: {source}")]
    TrailerWrite { source: BoxError },
}

impl PipeError {
    pub fn container_open(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PipeError::ContainerOpen {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn stream_probe(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PipeError::StreamProbe {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn decoder_open(source: impl Into<BoxError>) -> Self {
        PipeError::DecoderOpen {
            source: source.into(),
        }
    }

    pub fn encoder_open(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PipeError::EncoderOpen {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn sink_open(
        path: impl Into<String>,
        phase: SinkOpenPhase,
        source: impl Into<BoxError>,
    ) -> Self {
        PipeError::SinkOpen {
            path: path.into(),
            phase,
            source: source.into(),
        }
    }

    pub fn decode(source: impl Into<BoxError>) -> Self {
        PipeError::Decode {
            source: source.into(),
        }
    }

    pub fn encode(source: impl Into<BoxError>) -> Self {
        PipeError::Encode {
            source: source.into(),
        }
    }

    pub fn write(source: impl Into<BoxError>) -> Self {
        PipeError::Write {
            source: source.into(),
        }
    }

    pub fn trailer_write(source: impl Into<BoxError>) -> Self {
        PipeError::TrailerWrite {
            source: source.into(),
        }
    }

    pub fn phase(&self) -> FailurePhase {
        match self {
            PipeError::ContainerOpen { .. }
            | PipeError::StreamProbe { .. }
            | PipeError::NoVideoStream
            | PipeError::UnsupportedCodec { .. }
            | PipeError::DecoderOpen { .. }
            | PipeError::EncoderUnavailable { .. }
            | PipeError::EncoderOpen { .. }
            | PipeError::SinkOpen { .. } => FailurePhase::Open,
            PipeError::Decode { .. } => FailurePhase::Decode,
            PipeError::Encode { .. } => FailurePhase::Encode,
            PipeError::StageTransition { stage, .. } => match *stage {
                "decode" => FailurePhase::Decode,
                "encode" => FailurePhase::Encode,
                "sink" => FailurePhase::Mux,
                _ => FailurePhase::Open,
            },
            PipeError::Write { .. } | PipeError::TrailerWrite { .. } => FailurePhase::Mux,
        }
    }

    /// Process exit status: the underlying FFmpeg errno when one exists,
    /// otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self.ffmpeg_source() {
            Some(ffmpeg_next::Error::Other { errno }) => errno.abs().clamp(1, 125),
            _ => 1,
        }
    }

    fn ffmpeg_source(&self) -> Option<&ffmpeg_next::Error> {
        let source = match self {
            PipeError::ContainerOpen { source, .. }
            | PipeError::StreamProbe { source, .. }
            | PipeError::DecoderOpen { source }
            | PipeError::EncoderOpen { source, .. }
            | PipeError::SinkOpen { source, .. }
            | PipeError::Decode { source }
            | PipeError::Encode { source }
            | PipeError::Write { source }
            | PipeError::TrailerWrite { source } => source,
            _ => return None,
        };
        source.downcast_ref::<ffmpeg_next::Error>()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
