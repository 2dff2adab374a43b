//! Classic sum-of-sines plasma.

use backdrop_core::{
    effect_config, Bounds, ChangeSet, ColorMap, DrawContext, Effect, Frame, PixelBuffer, Rgb,
    Role, Setup, Vec2,
};

/// Number of palette entries.
const PALETTE_SIZE: usize = 256;

effect_config! {
    /// Config of the [`Plasma`] effect.
    pub struct PlasmaConfig;
    /// Partial update of a [`PlasmaConfig`].
    pub struct PlasmaPatch;
    {
        /// How fast the field shifts. Default: 40.
        speed: f64 = 40.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Spatial frequency of the field in percent. Default: 100.
        scale: f64 = 100.0, Bounds::Range(10.0, 200.0), Role::Cosmetic;
        /// Detail of the field. Above 50 the result is also softened. Default: 50.
        complexity: f64 = 50.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Brightness in percent. Default: 100.
        intensity: f64 = 100.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// First palette color.
        color1: Rgb = Rgb::new(0xff, 0x00, 0x6e), Bounds::Any, Role::Cosmetic;
        /// Middle palette color.
        color2: Rgb = Rgb::new(0x83, 0x38, 0xec), Bounds::Any, Role::Cosmetic;
        /// Last palette color.
        color3: Rgb = Rgb::new(0x3a, 0x86, 0xff), Bounds::Any, Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl PlasmaConfig {
    fn palette(&self) -> ColorMap {
        ColorMap::gradient(PALETTE_SIZE, [self.color1, self.color2, self.color3])
    }

    /// Size of a field grid cell in logical pixels.
    pub fn cell_size(&self) -> f64 {
        (8.0 - self.complexity / 20.0).max(2.0)
    }
}

/// Plasma field value at `p`, in `[-4, 4]`.
pub fn plasma_value(p: Vec2, scale: f64, time: f64) -> f64 {
    let (x, y) = (p.x * scale, p.y * scale);
    ((x + time) / 16.0).sin()
        + ((y + time) / 8.0).sin()
        + ((x + y + time) / 16.0 * scale).sin()
        + ((p.x * x + p.y * y + time).max(0.0).sqrt() / 8.0 * scale).sin()
}

/// Average every pixel with its neighbors.
fn box_blur(buf: &mut PixelBuffer) {
    let (w, h) = (buf.width(), buf.height());
    let src = buf.pixels().to_vec();
    for y in 0..h {
        for x in 0..w {
            let mut sum = [0u32; 4];
            let mut n = 0;
            for ny in y.saturating_sub(1)..(y + 2).min(h) {
                for nx in x.saturating_sub(1)..(x + 2).min(w) {
                    for (s, c) in sum.iter_mut().zip(src[ny * w + nx]) {
                        *s += c as u32;
                    }
                    n += 1;
                }
            }
            buf.put(x, y, sum.map(|s| (s / n) as u8));
        }
    }
}

/// A flowing plasma field.
#[derive(Clone, Debug)]
pub struct Plasma {
    palette: ColorMap,
    time: f64,
}

impl Effect for Plasma {
    type Config = PlasmaConfig;
    const NAME: &'static str = "plasma";

    fn build(setup: &mut Setup<PlasmaConfig>) -> Self {
        Self {
            palette: setup.config.palette(),
            time: 0.0,
        }
    }

    fn resize(&mut self, _setup: &mut Setup<PlasmaConfig>) -> bool {
        false
    }

    fn reconfigure(&mut self, changes: &ChangeSet, setup: &mut Setup<PlasmaConfig>) {
        if changes.any(&["color1", "color2", "color3"]) {
            self.palette = setup.config.palette();
        }
    }

    fn update(&mut self, frame: &mut Frame<PlasmaConfig>) {
        self.time += frame.config.speed / 1000.0 * 0.05;
    }

    fn draw(&self, ctx: &DrawContext<PlasmaConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        let cell = cfg.cell_size();
        let scale = cfg.scale / 100.0;
        let intensity = cfg.intensity / 100.0;
        let to_px = |v: f64| (v * vp.dpr).floor() as usize;

        let mut y = 0.0;
        while y < vp.css_height {
            let mut x = 0.0;
            while x < vp.css_width {
                let value = plasma_value(Vec2::new(x, y), scale, self.time);
                let index = (((value + 4.0) / 8.0) * 255.0).floor().max(0.0) as usize;
                let c = self.palette.get(index);
                let dim = |ch: u8| (ch as f64 * intensity).floor() as u8;
                let color = [dim(c.red()), dim(c.green()), dim(c.blue()), u8::MAX];
                let (px0, py0) = (to_px(x), to_px(y));
                buf.fill_rect(px0, py0, to_px(x + cell) - px0, to_px(y + cell) - py0, color);
                x += cell;
            }
            y += cell;
        }

        if cfg.complexity > 50.0 {
            box_blur(buf);
        }
    }
}
