//! Decoding device buffers into frames, and in-place frame transforms.

use nokhwa::pixel_format::RgbFormat;

use super::types::Frame;

/// Decode whatever wire format the device sent into packed RGB.
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame::from_rgb(
        decoded.into_raw(),
        resolution.width(),
        resolution.height(),
    ))
}

/// Flip a frame left-to-right in place.
pub fn mirror_horizontal(frame: &mut Frame) {
    let bpp = frame.bytes_per_pixel();
    let stride = frame.width as usize * bpp;
    if stride == 0 {
        return;
    }

    // Reversing a row reverses the pixel order and each pixel's channels;
    // reversing every pixel again restores the channel order.
    for row in frame.data.chunks_exact_mut(stride) {
        row.reverse();
        for pixel in row.chunks_exact_mut(bpp) {
            pixel.reverse();
        }
    }
}
