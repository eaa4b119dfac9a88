/// Registers FFmpeg components (formats, codecs). Call once at startup
/// before opening any input.
pub fn init() -> Result<(), ffmpeg_next::Error> {
    ffmpeg_next::init()
}

pub mod decode;
pub mod encode;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod packet;
pub mod pipeline;
pub mod service;
pub mod sink;
pub mod source;
pub(crate) mod stage;
pub mod stream;
pub mod timestamp;
pub mod trim;

#[cfg(test)]
pub(crate) mod testutil;

pub use ffmpeg_next::Rational;
