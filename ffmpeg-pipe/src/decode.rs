use std::collections::VecDeque;

use crate::{
    error::PipeError,
    frame::DecodedFrame,
    packet::EncodedUnit,
    service::{DecodeService, MediaBackend, SubmitStatus},
    stage::StageState,
    stream::StreamDescriptor,
};

/// Decoder stage. One unit in, zero-to-many frames out; callers must drain
/// until empty after every submit or the decoder's buffers grow without
/// bound.
pub struct DecodeStage<D: DecodeService> {
    service: Option<D>,
    queued: VecDeque<DecodedFrame>,
    state: StageState,
    descriptor: StreamDescriptor,
}

impl<D: DecodeService> DecodeStage<D> {
    pub fn open<B>(backend: &B, descriptor: &StreamDescriptor) -> Result<Self, PipeError>
    where
        B: MediaBackend<Decoder = D>,
    {
        let (service, descriptor) = backend.open_decoder(descriptor)?;
        Ok(Self {
            service: Some(service),
            queued: VecDeque::new(),
            state: StageState::Open,
            descriptor,
        })
    }

    /// Stream parameters as the decoder negotiated them.
    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    /// Consumes one encoded unit. A decoder that is momentarily full is
    /// relieved by pulling its buffered frames aside and retrying; the
    /// frames come back out through the next `drain`.
    pub fn submit(&mut self, unit: EncodedUnit) -> Result<(), PipeError> {
        if self.state != StageState::Open {
            return Err(self.transition("submit"));
        }
        let Some(service) = self.service.as_mut() else {
            return Err(self.transition("submit"));
        };
        loop {
            match service.send_unit(&unit)? {
                SubmitStatus::Accepted => return Ok(()),
                SubmitStatus::Full => match service.receive_frame()? {
                    Some(frame) => self.queued.push_back(frame),
                    None => {
                        return Err(PipeError::decode(
                            "decoder refused input but has no pending frames",
                        ));
                    }
                },
            }
        }
    }

    /// Everything the decoder can emit without new input; ends when the
    /// decoder reports empty.
    pub fn drain(&mut self) -> Result<DrainFrames<'_, D>, PipeError> {
        if self.state != StageState::Open {
            return Err(self.transition("drain"));
        }
        Ok(DrainFrames {
            stage: self,
            closing: false,
        })
    }

    /// Signals end-of-input and drains the decoder's remaining frames. The
    /// stage reaches `Closed` once the returned sequence is exhausted.
    pub fn flush(&mut self) -> Result<DrainFrames<'_, D>, PipeError> {
        if self.state != StageState::Open {
            return Err(self.transition("flush"));
        }
        if let Some(service) = self.service.as_mut() {
            service.send_eof()?;
        }
        self.state = StageState::Draining;
        Ok(DrainFrames {
            stage: self,
            closing: true,
        })
    }

    /// Releases the decoder. Idempotent; also runs implicitly on drop.
    pub fn close(&mut self) {
        self.service = None;
        self.state = StageState::Closed;
    }

    fn transition(&self, op: &'static str) -> PipeError {
        PipeError::StageTransition {
            stage: "decode",
            op,
            state: self.state.name(),
        }
    }
}

pub struct DrainFrames<'a, D: DecodeService> {
    stage: &'a mut DecodeStage<D>,
    closing: bool,
}

impl<D: DecodeService> Iterator for DrainFrames<'_, D> {
    type Item = Result<DecodedFrame, PipeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(frame) = self.stage.queued.pop_front() {
            return Some(Ok(frame));
        }
        let service = self.stage.service.as_mut()?;
        match service.receive_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                if self.closing {
                    self.stage.close();
                }
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
