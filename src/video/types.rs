use image::{ImageBuffer, Rgb, RgbImage, RgbaImage};

/// Represents a single video frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// the pixel operations used by the compositor.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| {
            Rgb(color)
        });
        Self { buffer }
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Raw RGB bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Alpha-blend an RGBA overlay with its top-left corner at (`x`, `y`).
    ///
    /// The overlay may extend past any edge; only the visible part is drawn.
    pub fn overlay_rgba(&mut self, overlay: &RgbaImage, x: i64, y: i64) {
        let (frame_w, frame_h) = (self.width() as i64, self.height() as i64);

        let x_start = x.max(0);
        let y_start = y.max(0);
        let x_end = (x + overlay.width() as i64).min(frame_w);
        let y_end = (y + overlay.height() as i64).min(frame_h);

        for fy in y_start..y_end {
            for fx in x_start..x_end {
                let src = overlay.get_pixel((fx - x) as u32, (fy - y) as u32).0;
                let alpha = src[3] as u16;
                if alpha == 0 {
                    continue;
                }

                let dst = self.buffer.get_pixel_mut(fx as u32, fy as u32);
                if alpha == 255 {
                    dst.0 = [src[0], src[1], src[2]];
                    continue;
                }

                let inv = 255 - alpha;
                for c in 0..3 {
                    dst.0[c] = mul_div255(src[c] as u16, alpha)
                        .saturating_add(mul_div255(dst.0[c] as u16, inv));
                }
            }
        }
    }
}

/// Rounded `a * b / 255` for 8-bit channel math
pub(crate) fn mul_div255(a: u16, b: u16) -> u8 {
    let t = a as u32 * b as u32 + 128;
    ((t + (t >> 8)) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_from_rgb_bytes_checks_length() {
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_overlay_blends_translucent_pixels() {
        let mut frame = Frame::new_filled(4, 4, [200, 100, 0]);
        let overlay = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128]));

        frame.overlay_rgba(&overlay, 1, 1);

        assert_eq!(frame.get_pixel(0, 0), [200, 100, 0]);
        assert_eq!(frame.get_pixel(1, 1), [100, 50, 0]);
        assert_eq!(frame.get_pixel(2, 2), [100, 50, 0]);
        assert_eq!(frame.get_pixel(3, 3), [200, 100, 0]);
    }

    #[test]
    fn test_overlay_is_clipped_at_edges() {
        let mut frame = Frame::new_filled(3, 3, [10, 10, 10]);
        let overlay = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));

        frame.overlay_rgba(&overlay, -2, 1);

        assert_eq!(frame.get_pixel(0, 0), [10, 10, 10]);
        assert_eq!(frame.get_pixel(0, 1), [255, 255, 255]);
        assert_eq!(frame.get_pixel(1, 2), [255, 255, 255]);
        assert_eq!(frame.get_pixel(2, 2), [10, 10, 10]);
    }

    #[test]
    fn test_transparent_overlay_is_noop() {
        let mut frame = Frame::new_filled(2, 2, [1, 2, 3]);
        frame.overlay_rgba(&RgbaImage::new(2, 2), 0, 0);
        assert_eq!(frame.as_bytes(), &[1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_mul_div255() {
        assert_eq!(mul_div255(255, 255), 255);
        assert_eq!(mul_div255(0, 255), 0);
        assert_eq!(mul_div255(200, 128), 100);
    }
}
