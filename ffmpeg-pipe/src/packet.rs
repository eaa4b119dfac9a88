use bytes::Bytes;
use ffmpeg_next::Rational;

use crate::timestamp;

/// One compressed chunk of stream data, prior to decoding. Timestamps are
/// expressed in `time_base` units of the stream the unit came from.
#[derive(Clone)]
pub struct EncodedUnit {
    data: Bytes,
    stream_index: usize,
    pts: Option<i64>,
    dts: Option<i64>,
    time_base: Rational,
}

impl EncodedUnit {
    pub fn new(
        data: Bytes,
        stream_index: usize,
        pts: Option<i64>,
        dts: Option<i64>,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            stream_index,
            pts,
            dts,
            time_base,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    pub fn dts(&self) -> Option<i64> {
        self.dts
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Moves the unit's timestamps into another time base. Exact rational
    /// arithmetic; used at the mux boundary.
    pub fn rescaled(mut self, to: Rational) -> Self {
        self.pts = self.pts.map(|ts| timestamp::rescale(ts, self.time_base, to));
        self.dts = self.dts.map(|ts| timestamp::rescale(ts, self.time_base, to));
        self.time_base = to;
        self
    }
}
