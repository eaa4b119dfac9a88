use std::path::Path;

use ffmpeg_next::Rational;

use crate::{
    error::PipeError,
    packet::EncodedUnit,
    service::{MediaBackend, MuxService},
    stage::StageState,
    stream::StreamDescriptor,
};

/// Output container. Header and trailer bracket the unit writes: no unit
/// goes out before the header succeeds or after the trailer is written.
pub struct Sink<M: MuxService> {
    mux: Option<M>,
    out_time_base: Rational,
    state: StageState,
    wrote_trailer: bool,
}

impl<M: MuxService> Sink<M> {
    /// Allocates the output container, creates its single stream from
    /// `descriptor` and writes the header. Any failure leaves no header
    /// behind and no sink to tear down.
    pub fn open<B>(backend: &B, path: &Path, descriptor: &StreamDescriptor) -> Result<Self, PipeError>
    where
        B: MediaBackend<Mux = M>,
    {
        let mut mux = backend.open_output(path, descriptor)?;
        mux.write_header()?;
        // Muxers may renegotiate the stream time base on header write.
        let out_time_base = mux.stream_time_base();
        Ok(Self {
            mux: Some(mux),
            out_time_base,
            state: StageState::Open,
            wrote_trailer: false,
        })
    }

    pub fn time_base(&self) -> Rational {
        self.out_time_base
    }

    /// Rescales the unit from its own time base to the output stream's and
    /// hands it to the writer.
    pub fn write(&mut self, unit: EncodedUnit) -> Result<(), PipeError> {
        if self.state != StageState::Open {
            return Err(self.transition("write"));
        }
        let Some(mux) = self.mux.as_mut() else {
            return Err(self.transition("write"));
        };
        let unit = unit.rescaled(self.out_time_base);
        mux.write_unit(&unit)
    }

    /// Writes the trailer and closes the container. At most once; a second
    /// call is a stage-transition violation.
    pub fn finish(&mut self) -> Result<(), PipeError> {
        if self.state != StageState::Open || self.wrote_trailer {
            return Err(self.transition("finish"));
        }
        self.wrote_trailer = true;
        let result = match self.mux.as_mut() {
            Some(mux) => mux.write_trailer(),
            None => Ok(()),
        };
        self.close();
        result
    }

    /// Releases the container. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        self.mux = None;
        self.state = StageState::Closed;
    }

    fn transition(&self, op: &'static str) -> PipeError {
        PipeError::StageTransition {
            stage: "sink",
            op,
            state: self.state.name(),
        }
    }
}

impl<M: MuxService> Drop for Sink<M> {
    fn drop(&mut self) {
        // Failure unwind: the trailer is still attempted, best effort,
        // so a partially written container stays readable.
        if !self.wrote_trailer {
            if let Some(mux) = self.mux.as_mut() {
                self.wrote_trailer = true;
                if let Err(e) = mux.write_trailer() {
                    log::warn!("trailer write failed during teardown: {e}");
                }
            }
        }
        self.mux = None;
        self.state = StageState::Closed;
    }
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod sink_test;
