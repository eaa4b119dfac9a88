use std::fmt::{Display, Formatter};

use bytes::Bytes;
use ffmpeg_next::{format::Pixel, picture};

/// One reconstructed raw picture. `data` holds the plane buffers
/// concatenated in plane order; `pts` is in the producing stream's time
/// base until the encode stage restamps it.
#[derive(Clone)]
pub struct DecodedFrame {
    data: Bytes,
    width: u32,
    height: u32,
    format: Pixel,
    pts: Option<i64>,
    kind: picture::Type,
}

impl DecodedFrame {
    pub fn new(
        data: Bytes,
        width: u32,
        height: u32,
        format: Pixel,
        pts: Option<i64>,
        kind: picture::Type,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            pts,
            kind,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> Pixel {
        self.format
    }

    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    pub fn set_pts(&mut self, pts: Option<i64>) {
        self.pts = pts;
    }

    pub fn kind(&self) -> picture::Type {
        self.kind
    }

    pub fn is_key(&self) -> bool {
        matches!(self.kind, picture::Type::I)
    }
}

impl Display for DecodedFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{}x{} format: {:?}, pts: {:?}, kind: {:?}",
            self.width, self.height, self.format, self.pts, self.kind
        )
    }
}
