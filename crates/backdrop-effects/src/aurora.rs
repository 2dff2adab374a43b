//! Curtains of northern lights over a starry sky.
//!
//! Each band is a sum of two sines drifting sideways,
//! filled downwards with a glow that peaks on the band's center line.
//! With pointer interaction on, bands drift towards the pointer's height
//! and ease back to their resting height once it leaves.

use backdrop_core::{
    effect_config, mouse::RELAX_FACTOR, rand::Rng, raster, BlendMode, Bounds, DrawContext, Effect,
    Frame, PixelBuffer, Rgb, Rgba, Role, Setup, Vec2, Viewport,
};
use std::f64::consts::TAU;

const BACKGROUND: Rgba = [0x0a, 0x0e, 0x1a, 255];

/// Number of background stars.
const STAR_COUNT: usize = 200;

/// Line segments per band outline.
const SEGMENTS: usize = 200;

/// Fraction of the distance to the pointer a band moves per frame.
const POINTER_PULL: f64 = 0.02;

effect_config! {
    /// Config of the [`Aurora`] effect.
    pub struct AuroraConfig;
    /// Partial update of an [`AuroraConfig`].
    pub struct AuroraPatch;
    {
        /// How fast the bands ripple. Default: 40.
        speed: f64 = 40.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Color of the first, fourth, ... band.
        color1: Rgb = Rgb::new(0x00, 0xff, 0x87), Bounds::Any, Role::Cosmetic;
        /// Color of the second, fifth, ... band.
        color2: Rgb = Rgb::new(0x60, 0xef, 0xff), Bounds::Any, Role::Cosmetic;
        /// Color of the third, sixth, ... band.
        color3: Rgb = Rgb::new(0xff, 0x00, 0xff), Bounds::Any, Role::Cosmetic;
        /// Height and brightness of the bands in percent. Default: 70.
        intensity: f64 = 70.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Number of bands. Default: 5.
        waves: u32 = 5, Bounds::Range(1, 10), Role::STRUCTURAL;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl AuroraConfig {
    fn band_color(&self, index: usize) -> Rgb {
        [self.color1, self.color2, self.color3][index % 3]
    }
}

#[derive(Clone, Debug)]
struct Band {
    /// Amplitude at full intensity, in logical pixels.
    amplitude: f64,
    /// Radians per logical pixel.
    frequency: f64,
    phase: f64,
    /// Phase advance multiplier at speed 50.
    rate: f64,
    /// Resting height of the center line.
    home: f64,
    /// Current height of the center line.
    y: f64,
}

impl Band {
    /// Height of the outline at `x`, all in logical pixels.
    fn height_at(&self, x: f64, amplitude: f64) -> f64 {
        self.y
            + (x * self.frequency + self.phase).sin() * amplitude
            + (x * self.frequency * 2.0 + self.phase * 1.5).sin() * amplitude * 0.3
    }
}

/// Waving aurora bands.
#[derive(Clone, Debug)]
pub struct Aurora {
    bands: Vec<Band>,
}

impl Aurora {
    /// Current heights of the band center lines in logical pixels.
    pub fn band_heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.bands.iter().map(|b| b.y)
    }

    /// Resting heights of the band center lines in logical pixels.
    pub fn band_homes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bands.iter().map(|b| b.home)
    }
}

impl Effect for Aurora {
    type Config = AuroraConfig;
    const NAME: &'static str = "aurora";

    fn build(setup: &mut Setup<AuroraConfig>) -> Self {
        let count = setup.config.waves;
        let height = setup.viewport.css_height;
        let rng = &mut *setup.rng;
        let bands = (0..count)
            .map(|i| {
                let home = height / (count + 1) as f64 * (i + 1) as f64;
                Band {
                    amplitude: rng.gen::<f64>() * 60.0 + 40.0,
                    frequency: rng.gen::<f64>() * 0.002 + 0.001,
                    phase: rng.gen::<f64>() * TAU,
                    rate: rng.gen::<f64>() * 0.5 + 0.5,
                    home,
                    y: home,
                }
            })
            .collect();
        Self { bands }
    }

    fn update(&mut self, frame: &mut Frame<AuroraConfig>) {
        let speed = frame.config.speed / 50.0;
        for band in &mut self.bands {
            // 4π is the common period of both sines
            band.phase = (band.phase + band.rate * speed * 0.02).rem_euclid(TAU * 2.0);
            match frame.pointer {
                Some(pointer) => band.y += (pointer.y - band.y) * POINTER_PULL,
                None => band.y += (band.home - band.y) * RELAX_FACTOR,
            }
        }
    }

    fn draw(&self, ctx: &DrawContext<AuroraConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);
        draw_stars(buf, vp);

        let intensity = cfg.intensity / 100.0;
        let peak_alpha = cfg.intensity / 150.0;
        for (i, band) in self.bands.iter().enumerate() {
            let color = cfg.band_color(i);
            let amplitude = band.amplitude * intensity;
            let outline: Vec<Vec2> = (0..=SEGMENTS)
                .map(|s| {
                    let x = vp.css_width / SEGMENTS as f64 * s as f64;
                    vp.to_pixels(Vec2::new(x, band.height_at(x, amplitude)))
                })
                .collect();

            let mut curtain = outline.clone();
            curtain.push(vp.to_pixels(Vec2::new(vp.css_width, vp.css_height)));
            curtain.push(vp.to_pixels(Vec2::new(0.0, vp.css_height)));
            raster::fill_polygon(buf, &curtain, BlendMode::Add, |p| {
                let from_center = (vp.to_logical(p).y - band.y).abs();
                (color, peak_alpha * (1.0 - from_center / amplitude).max(0.0))
            });

            raster::polyline(buf, &outline, 12.0 * vp.dpr, color, 0.15 * intensity, BlendMode::Add);
            raster::polyline(buf, &outline, 2.0 * vp.dpr, color, intensity, BlendMode::Add);
        }
    }
}

/// Faint stars at fixed positions in the upper part of the sky.
fn draw_stars(buf: &mut PixelBuffer, vp: &Viewport) {
    let white = Rgb::new(255, 255, 255);
    for i in 0..STAR_COUNT {
        let pos = Vec2::new(
            (i as f64 * 137.5) % vp.css_width,
            (i as f64 * 73.3) % vp.css_height * 0.6,
        );
        let size = ((i % 3) + 1) as f64 * 0.5;
        let brightness = 0.2 + (i % 10) as f64 / 10.0 * 0.3;
        raster::disc(
            buf,
            vp.to_pixels(pos),
            size * vp.dpr,
            white,
            0.3 * brightness,
            BlendMode::Over,
        );
    }
}
