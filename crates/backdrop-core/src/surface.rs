//! Drawable surfaces and the mapping from logical to pixel size.
//!
//! The host owns the actual display target (a canvas, a window, a file)
//! and exposes it through the [`Surface`] trait.
//! Engines render into their own [`PixelBuffer`]s
//! and hand finished frames to the surface.

use thiserror::Error;

use crate::{buffer::PixelBuffer, Vec2};

/// Error from a [`Surface`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface can't provide a drawing context at all.
    #[error("no drawing context available")]
    NoContext,
    /// The surface was lost or rejected the frame.
    #[error("surface lost: {0}")]
    Lost(String),
}

/// A drawable target owned by the host.
pub trait Surface {
    /// Size in logical (CSS) pixels.
    fn logical_size(&self) -> (f64, f64);

    /// Ratio of physical to logical pixels.
    /// Default: 1.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Obtain a drawing context. Called once during engine init.
    fn acquire(&mut self) -> Result<(), SurfaceError>;

    /// Display a finished frame.
    fn present(&mut self, frame: &PixelBuffer) -> Result<(), SurfaceError>;
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn logical_size(&self) -> (f64, f64) {
        (**self).logical_size()
    }

    fn device_pixel_ratio(&self) -> f64 {
        (**self).device_pixel_ratio()
    }

    fn acquire(&mut self) -> Result<(), SurfaceError> {
        (**self).acquire()
    }

    fn present(&mut self, frame: &PixelBuffer) -> Result<(), SurfaceError> {
        (**self).present(frame)
    }
}

/// Logical and backing pixel dimensions of a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels.
    pub css_width: f64,
    /// Height in logical pixels.
    pub css_height: f64,
    /// Device pixel ratio.
    pub dpr: f64,
    /// Width of the backing buffer, `floor(css_width * dpr)`.
    pub pixel_width: usize,
    /// Height of the backing buffer, `floor(css_height * dpr)`.
    pub pixel_height: usize,
}

impl Viewport {
    /// Compute the viewport of a surface.
    ///
    /// Returns `None` if the surface has zero area,
    /// in which case the previous viewport should be kept.
    pub fn measure(surface: &(impl Surface + ?Sized)) -> Option<Self> {
        let (w, h) = surface.logical_size();
        Self::new(w, h, surface.device_pixel_ratio())
    }

    /// Compute a viewport from a logical size and pixel ratio.
    /// Invalid pixel ratios are treated as 1.
    ///
    /// Returns `None` if the pixel size would be zero in either dimension.
    pub fn new(css_width: f64, css_height: f64, dpr: f64) -> Option<Self> {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let finite = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let (css_width, css_height) = (finite(css_width), finite(css_height));
        let pixel_width = (css_width * dpr).floor() as usize;
        let pixel_height = (css_height * dpr).floor() as usize;
        if pixel_width == 0 || pixel_height == 0 {
            return None;
        }
        Some(Self {
            css_width,
            css_height,
            dpr,
            pixel_width,
            pixel_height,
        })
    }

    /// Center of the surface in logical pixels.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.css_width / 2.0, self.css_height / 2.0)
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        self.css_width / self.css_height
    }

    /// Convert a point from pixel to logical coordinates.
    #[inline]
    pub fn to_logical(&self, p: Vec2) -> Vec2 {
        p / self.dpr
    }

    /// Convert a point from logical to pixel coordinates.
    #[inline]
    pub fn to_pixels(&self, p: Vec2) -> Vec2 {
        p * self.dpr
    }
}

/// A surface that keeps no display target,
/// only counting presented frames and optionally keeping the last one.
///
/// Useful for tests and offscreen rendering.
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
    size: (f64, f64),
    dpr: f64,
    drawable: bool,
    failures_pending: usize,
    presented: usize,
    keep_frames: bool,
    last_frame: Option<PixelBuffer>,
}

impl HeadlessSurface {
    /// Create a surface with the given logical size and pixel ratio.
    pub fn new(width: f64, height: f64, dpr: f64) -> Self {
        Self {
            size: (width, height),
            dpr,
            drawable: true,
            failures_pending: 0,
            presented: 0,
            keep_frames: false,
            last_frame: None,
        }
    }

    /// Keep a copy of each presented frame, retrievable with
    /// [`last_frame`][Self::last_frame].
    pub fn keeping_frames(mut self) -> Self {
        self.keep_frames = true;
        self
    }

    /// Change the logical size, as if the host element was resized.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = (width, height);
    }

    /// Change the pixel ratio.
    pub fn set_dpr(&mut self, dpr: f64) {
        self.dpr = dpr;
    }

    /// Make [`acquire`][Surface::acquire] fail or succeed.
    pub fn set_drawable(&mut self, drawable: bool) {
        self.drawable = drawable;
    }

    /// Make the next `count` presents fail.
    pub fn fail_next_presents(&mut self, count: usize) {
        self.failures_pending = count;
    }

    /// Number of successfully presented frames.
    pub fn presented(&self) -> usize {
        self.presented
    }

    /// The last presented frame, if frames are being kept.
    pub fn last_frame(&self) -> Option<&PixelBuffer> {
        self.last_frame.as_ref()
    }
}

impl Surface for HeadlessSurface {
    fn logical_size(&self) -> (f64, f64) {
        self.size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    fn acquire(&mut self) -> Result<(), SurfaceError> {
        if self.drawable {
            Ok(())
        } else {
            Err(SurfaceError::NoContext)
        }
    }

    fn present(&mut self, frame: &PixelBuffer) -> Result<(), SurfaceError> {
        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(SurfaceError::Lost("present rejected".to_string()));
        }
        self.presented += 1;
        if self.keep_frames {
            match &mut self.last_frame {
                Some(kept) => kept.clone_from(frame),
                None => self.last_frame = Some(frame.clone()),
            }
        }
        Ok(())
    }
}
