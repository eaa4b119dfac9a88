use std::collections::VecDeque;

use crate::{
    error::PipeError,
    frame::DecodedFrame,
    packet::EncodedUnit,
    pipeline::PipelineConfig,
    service::{EncodeService, EncoderSettings, MediaBackend, SubmitStatus},
    stage::StageState,
    stream::StreamDescriptor,
};

/// Encoder stage, the decoder's mirror image: zero-to-many units out per
/// frame in. Incoming frames are restamped with a pipeline-local pts
/// counter; the source container's timestamps do not survive into the
/// output time base.
pub struct EncodeStage<E: EncodeService> {
    service: Option<E>,
    queued: VecDeque<EncodedUnit>,
    state: StageState,
    descriptor: StreamDescriptor,
    next_pts: i64,
}

impl<E: EncodeService> EncodeStage<E> {
    pub fn open<B>(
        backend: &B,
        config: &PipelineConfig,
        input: &StreamDescriptor,
    ) -> Result<Self, PipeError>
    where
        B: MediaBackend<Encoder = E>,
    {
        let settings = EncoderSettings {
            codec: config.codec.clone(),
            width: input.width,
            height: input.height,
            pixel_format: input.format,
            frame_rate: config.frame_rate,
            keyframe_interval: config.keyframe_interval,
        };
        let (service, descriptor) = backend.open_encoder(&settings)?;
        Ok(Self {
            service: Some(service),
            queued: VecDeque::new(),
            state: StageState::Open,
            descriptor,
            next_pts: 1,
        })
    }

    /// Output stream parameters as the encoder negotiated them.
    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    pub fn submit(&mut self, mut frame: DecodedFrame) -> Result<(), PipeError> {
        if self.state != StageState::Open {
            return Err(self.transition("submit"));
        }
        let Some(service) = self.service.as_mut() else {
            return Err(self.transition("submit"));
        };
        frame.set_pts(Some(self.next_pts));
        self.next_pts += 1;
        loop {
            match service.send_frame(&frame)? {
                SubmitStatus::Accepted => return Ok(()),
                SubmitStatus::Full => match service.receive_unit()? {
                    Some(unit) => self.queued.push_back(unit),
                    None => {
                        return Err(PipeError::encode(
                            "encoder refused input but has no pending units",
                        ));
                    }
                },
            }
        }
    }

    pub fn drain(&mut self) -> Result<DrainUnits<'_, E>, PipeError> {
        if self.state != StageState::Open {
            return Err(self.transition("drain"));
        }
        Ok(DrainUnits {
            stage: self,
            closing: false,
        })
    }

    /// Signals end-of-input exactly once and drains the encoder's final
    /// buffered units; the stage reaches `Closed` once the sequence is
    /// exhausted.
    pub fn flush(&mut self) -> Result<DrainUnits<'_, E>, PipeError> {
        if self.state != StageState::Open {
            return Err(self.transition("flush"));
        }
        if let Some(service) = self.service.as_mut() {
            service.send_eof()?;
        }
        self.state = StageState::Draining;
        Ok(DrainUnits {
            stage: self,
            closing: true,
        })
    }

    /// Releases the encoder. Idempotent; also runs implicitly on drop.
    pub fn close(&mut self) {
        self.service = None;
        self.state = StageState::Closed;
    }

    fn transition(&self, op: &'static str) -> PipeError {
        PipeError::StageTransition {
            stage: "encode",
            op,
            state: self.state.name(),
        }
    }
}

pub struct DrainUnits<'a, E: EncodeService> {
    stage: &'a mut EncodeStage<E>,
    closing: bool,
}

impl<E: EncodeService> Iterator for DrainUnits<'_, E> {
    type Item = Result<EncodedUnit, PipeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(unit) = self.stage.queued.pop_front() {
            return Some(Ok(unit));
        }
        let service = self.stage.service.as_mut()?;
        match service.receive_unit() {
            Ok(Some(unit)) => Some(Ok(unit)),
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
#[path = "encode_test.rs"]
mod encode_test;
