//! Owned pixel buffers that effects draw into.

use crate::color::Rgb;

/// An 8-bit RGBA pixel.
pub type Rgba = [u8; 4];

/// How a drawn color combines with what's already in the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha compositing.
    #[default]
    Over,
    /// Additive compositing, saturating each channel.
    /// Overlapping shapes get brighter.
    Add,
}

/// A 2D array of RGBA pixels in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// Create a buffer filled with transparent black.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width * height],
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate to a new size. Contents are cleared.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, [0; 4]);
    }

    /// All pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// All pixels in row-major order, mutably.
    /// Split into rows with `chunks_exact_mut(width)` for per-row work.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// The pixels as raw bytes, ready to upload to a texture or canvas.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Pixel at `(x, y)`, or `None` outside the buffer.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Overwrite the pixel at `(x, y)`. Out-of-bounds writes are ignored.
    #[inline]
    pub fn put(&mut self, x: usize, y: usize, color: Rgba) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    /// Fill an axis-aligned rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: Rgba) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        if x >= x_end {
            return;
        }
        for row in y..y_end {
            let start = row * self.width;
            self.pixels[start + x..start + x_end].fill(color);
        }
    }

    /// Blend `color` into the pixel at signed coordinates `(x, y)`
    /// with opacity `alpha` in `[0, 1]`. Out-of-bounds pixels are ignored.
    #[inline]
    pub fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f64, mode: BlendMode) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let px = &mut self.pixels[y as usize * self.width + x as usize];
        let src = [color.red(), color.green(), color.blue()];
        match mode {
            BlendMode::Over => {
                for (dst, s) in px.iter_mut().zip(src) {
                    *dst = (*dst as f64 + (s as f64 - *dst as f64) * alpha).round() as u8;
                }
                px[3] = (px[3] as f64 + (255.0 - px[3] as f64) * alpha).round() as u8;
            }
            BlendMode::Add => {
                for (dst, s) in px.iter_mut().zip(src) {
                    *dst = dst.saturating_add((s as f64 * alpha).round() as u8);
                }
                px[3] = px[3].saturating_add((255.0 * alpha).round() as u8);
            }
        }
    }
}

/// A pair of buffers: the front one holds the last complete frame,
/// the back one is drawn into.
///
/// Only complete frames are ever visible in the front buffer.
#[derive(Clone, Debug)]
pub struct FrameBuffers {
    front: PixelBuffer,
    back: PixelBuffer,
}

impl FrameBuffers {
    /// Create two buffers of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            front: PixelBuffer::new(width, height),
            back: PixelBuffer::new(width, height),
        }
    }

    /// The last complete frame.
    #[inline]
    pub fn front(&self) -> &PixelBuffer {
        &self.front
    }

    /// The frame being drawn.
    #[inline]
    pub fn back(&self) -> &PixelBuffer {
        &self.back
    }

    /// The frame being drawn, mutably.
    #[inline]
    pub fn back_mut(&mut self) -> &mut PixelBuffer {
        &mut self.back
    }

    /// Publish the back buffer as the new front.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Reallocate both buffers.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.front.resize(width, height);
        self.back.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_is_clipped() {
        let mut buf = PixelBuffer::new(4, 3);
        buf.fill_rect(2, 1, 10, 10, [9, 9, 9, 255]);
        assert_eq!(buf.get(1, 1), Some([0; 4]));
        assert_eq!(buf.get(2, 1), Some([9, 9, 9, 255]));
        assert_eq!(buf.get(3, 2), Some([9, 9, 9, 255]));
        assert_eq!(buf.get(4, 2), None);
        // fully outside does nothing
        buf.fill_rect(7, 0, 2, 2, [1; 4]);
    }

    #[test]
    fn blend_modes() {
        let mut buf = PixelBuffer::new(2, 1);
        buf.fill([100, 100, 100, 255]);
        buf.blend(0, 0, Rgb::new(200, 0, 100), 0.5, BlendMode::Over);
        assert_eq!(buf.get(0, 0), Some([150, 50, 100, 255]));
        buf.blend(1, 0, Rgb::new(200, 0, 100), 1.0, BlendMode::Add);
        assert_eq!(buf.get(1, 0), Some([255, 100, 200, 255]));
        // out of bounds is ignored
        buf.blend(-1, 0, Rgb::new(1, 1, 1), 1.0, BlendMode::Over);
        buf.blend(0, 5, Rgb::new(1, 1, 1), 1.0, BlendMode::Over);
    }

    #[test]
    fn swap_publishes_back_buffer() {
        let mut frames = FrameBuffers::new(2, 2);
        frames.back_mut().fill([1, 2, 3, 4]);
        assert_eq!(frames.front().get(0, 0), Some([0; 4]));
        frames.swap();
        assert_eq!(frames.front().get(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(frames.front().as_bytes().len(), 16);
    }
}
