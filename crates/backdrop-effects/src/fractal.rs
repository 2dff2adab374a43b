//! Escape-time fractals (Mandelbrot and Julia sets) with a cycling palette.

use backdrop_core::{
    choice_param, effect_config,
    mouse::{relax, RELAX_FACTOR},
    Bounds, ChangeSet, ColorMap, DrawContext, Effect, Frame, PixelBuffer, Rgb, Role, Setup,
    Vec2, Viewport,
};
use nalgebra as na;
use rayon::prelude::*;

/// Complex number type used for iteration.
pub type Complex = na::Complex<f64>;

/// Constant `c` used for Julia sets.
pub const JULIA_C: Complex = Complex::new(-0.7, 0.27015);

/// Height of the view in the complex plane at zoom 1.
const VIEW_HEIGHT: f64 = 4.0;

choice_param! {
    /// Which escape-time set to draw.
    pub enum FractalKind {
        /// `z -> z² + c` starting from `z = 0`, with `c` the pixel's point.
        Mandelbrot => "mandelbrot",
        /// `z -> z² + c` starting from the pixel's point, with `c` fixed to [`JULIA_C`].
        Julia => "julia",
    }
}

effect_config! {
    /// Config of the [`Fractal`] effect.
    pub struct FractalConfig;
    /// Partial update of a [`FractalConfig`].
    pub struct FractalPatch;
    {
        /// Speed of palette cycling. Default: 1.
        speed: f64 = 1.0, Bounds::Range(0.1, 2.0), Role::Cosmetic;
        /// First palette color, for points escaping fastest.
        color1: Rgb = Rgb::new(0x0a, 0x0e, 0x2a), Bounds::Any, Role::Cosmetic;
        /// Middle palette color.
        color2: Rgb = Rgb::new(0x7b, 0x2f, 0xf7), Bounds::Any, Role::Cosmetic;
        /// Last palette color.
        color3: Rgb = Rgb::new(0x00, 0xf0, 0xff), Bounds::Any, Role::Cosmetic;
        /// Set to draw. Default: Mandelbrot.
        fractal_type: FractalKind = FractalKind::Mandelbrot, Bounds::Any, Role::Cosmetic;
        /// Iteration cap, also the palette length. Default: 200.
        max_iterations: u32 = 200, Bounds::Range(50, 500), Role::Cosmetic;
        /// Magnification. Default: 1.
        zoom: f64 = 1.0, Bounds::Range(1.0, 1000.0), Role::Cosmetic;
        /// Real part of the resting view center. Default: -0.5.
        center_x: f64 = -0.5, Bounds::Range(-2.0, 2.0), Role::Cosmetic;
        /// Imaginary part of the resting view center. Default: 0.
        center_y: f64 = 0.0, Bounds::Range(-2.0, 2.0), Role::Cosmetic;
        /// How fast the palette cycles, in percent. Default: 30.
        color_shift: f64 = 30.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl FractalConfig {
    fn palette(&self) -> ColorMap {
        ColorMap::piecewise(
            self.max_iterations as usize,
            [self.color1, self.color2, self.color3],
        )
    }
}

/// Result of iterating one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Escape {
    /// The orbit stayed bounded for the whole iteration cap.
    Bounded,
    /// The orbit left the radius-2 disc.
    Escaped {
        /// Number of iterations done.
        iterations: u32,
        /// `|z|²` at escape.
        norm_sqr: f64,
    },
}

impl Escape {
    /// Fractional iteration count for smooth coloring,
    /// `i + 1 - ln(ln |z|²) / ln 2`.
    pub fn smooth(&self) -> Option<f64> {
        match *self {
            Escape::Bounded => None,
            Escape::Escaped {
                iterations,
                norm_sqr,
            } => Some(iterations as f64 + 1.0 - norm_sqr.ln().ln() / std::f64::consts::LN_2),
        }
    }
}

/// Iterate `z -> z² + c` from `z` until `|z|² >= 4` or `max_iterations`.
pub fn escape(mut z: Complex, c: Complex, max_iterations: u32) -> Escape {
    for i in 0..max_iterations {
        z = z * z + c;
        let norm_sqr = z.norm_sqr();
        if norm_sqr >= 4.0 {
            return Escape::Escaped {
                iterations: i + 1,
                norm_sqr,
            };
        }
    }
    Escape::Bounded
}

/// The region of the complex plane shown on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneView {
    /// Corner mapped to pixel `(0, 0)`.
    pub min: Complex,
    /// Extent of the view.
    pub span: Vec2,
}

impl PlaneView {
    /// View of height `4 / zoom` around `center`, with the surface's aspect ratio.
    pub fn new(center: Vec2, zoom: f64, viewport: &Viewport) -> Self {
        let height = VIEW_HEIGHT / zoom;
        let width = height * viewport.aspect();
        Self {
            min: Complex::new(center.x - width / 2.0, center.y - height / 2.0),
            span: Vec2::new(width, height),
        }
    }

    /// Map a point given as a fraction of the surface size to the plane.
    #[inline]
    pub fn point_at(&self, frac_x: f64, frac_y: f64) -> Complex {
        Complex::new(
            self.min.re + frac_x * self.span.x,
            self.min.im + frac_y * self.span.y,
        )
    }
}

/// An animated escape-time fractal.
///
/// The palette cycles over time.
/// With pointer interaction on, the view drifts towards the point under the pointer
/// and eases back to the configured center otherwise.
#[derive(Clone, Debug)]
pub struct Fractal {
    center: Vec2,
    palette: ColorMap,
    color_offset: f64,
}

impl Fractal {
    /// Current view center in the complex plane.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Current palette phase.
    pub fn color_offset(&self) -> f64 {
        self.color_offset
    }
}

impl Effect for Fractal {
    type Config = FractalConfig;
    const NAME: &'static str = "fractal";

    fn build(setup: &mut Setup<FractalConfig>) -> Self {
        let cfg = setup.config;
        Self {
            center: Vec2::new(cfg.center_x, cfg.center_y),
            palette: cfg.palette(),
            color_offset: 0.0,
        }
    }

    fn resize(&mut self, _setup: &mut Setup<FractalConfig>) -> bool {
        // the view is recomputed from the viewport every frame
        false
    }

    fn reconfigure(&mut self, changes: &ChangeSet, setup: &mut Setup<FractalConfig>) {
        if changes.any(&["color1", "color2", "color3", "max_iterations"]) {
            log::trace!("fractal: rebuilding palette");
            self.palette = setup.config.palette();
        }
    }

    fn update(&mut self, frame: &mut Frame<FractalConfig>) {
        let cfg = frame.config;
        self.color_offset += cfg.speed * (cfg.color_shift / 100.0) * 0.1;

        let target = match frame.pointer {
            Some(pointer) => {
                let view = PlaneView::new(self.center, cfg.zoom, frame.viewport);
                let p = view.point_at(
                    pointer.x / frame.viewport.css_width,
                    pointer.y / frame.viewport.css_height,
                );
                Vec2::new(p.re, p.im)
            }
            None => Vec2::new(cfg.center_x, cfg.center_y),
        };
        self.center = relax(self.center, target, RELAX_FACTOR);
    }

    fn draw(&self, ctx: &DrawContext<FractalConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let view = PlaneView::new(self.center, cfg.zoom, ctx.viewport);
        let (width, height) = (buf.width(), buf.height());
        if width == 0 {
            return;
        }
        let black = Rgb::new(0, 0, 0).opaque();

        buf.pixels_mut()
            .par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let frac_y = y as f64 / height as f64;
                for (x, px) in row.iter_mut().enumerate() {
                    let point = view.point_at(x as f64 / width as f64, frac_y);
                    let (z0, c) = match cfg.fractal_type {
                        FractalKind::Mandelbrot => (Complex::new(0.0, 0.0), point),
                        FractalKind::Julia => (point, JULIA_C),
                    };
                    *px = match escape(z0, c, cfg.max_iterations).smooth() {
                        None => black,
                        Some(smooth) => self.palette.wrapped(smooth + self.color_offset).opaque(),
                    };
                }
            });
    }
}
