use bytes::BytesMut;

use crate::frame::DecodedFrame;

/// Copies a decoded FFmpeg frame out into an owned [`DecodedFrame`],
/// plane buffers concatenated in plane order.
pub(crate) fn from_video_frame(frame: &ffmpeg_next::frame::Video) -> DecodedFrame {
    let mut data = BytesMut::new();
    for plane in 0..frame.planes() {
        data.extend_from_slice(frame.data(plane));
    }
    DecodedFrame::new(
        data.freeze(),
        frame.width(),
        frame.height(),
        frame.format(),
        frame.pts(),
        frame.kind(),
    )
}

/// Rebuilds an FFmpeg frame from an owned [`DecodedFrame`]. Plane layouts
/// can differ in alignment between producer and consumer, so each plane
/// copies at most its own length.
pub(crate) fn to_video_frame(frame: &DecodedFrame) -> ffmpeg_next::frame::Video {
    let mut out = ffmpeg_next::frame::Video::new(frame.format(), frame.width(), frame.height());
    let data = frame.data();
    let mut offset = 0usize;
    for plane in 0..out.planes() {
        let buf = out.data_mut(plane);
        let len = buf.len().min(data.len().saturating_sub(offset));
        buf[..len].copy_from_slice(&data[offset..offset + len]);
        offset += len;
    }
    out.set_pts(frame.pts());
    out.set_kind(frame.kind());
    out
}
