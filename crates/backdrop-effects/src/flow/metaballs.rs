//! Soft glowing blobs drifting across the surface.

use super::{Body, Boundary};
use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, DrawContext, Effect, Frame, PixelBuffer,
    Rgb, Rgba, Role, Setup, Vec2,
};
use std::f64::consts::TAU;

const BACKGROUND: Rgba = [0x0d, 0x02, 0x21, 255];

/// Surface width at which blobs have their nominal size.
const REFERENCE_WIDTH: f64 = 1920.0;

/// Chance per frame that a blob gets a random kick.
const KICK_CHANCE: f64 = 0.01;

effect_config! {
    /// Config of the [`Metaballs`] effect.
    pub struct MetaballsConfig;
    /// Partial update of a [`MetaballsConfig`].
    pub struct MetaballsPatch;
    {
        /// How fast the blobs move. Default: 30.
        speed: f64 = 30.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Controls the number of blobs. Default: 50.
        complexity: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Structural { threshold: 10.0 };
        /// Extra softness of blob edges in percent. Default: 20.
        blur: f64 = 20.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// First blob color.
        color1: Rgb = Rgb::new(0xb5, 0x65, 0xd8), Bounds::Any, Role::Cosmetic;
        /// Second blob color.
        color2: Rgb = Rgb::new(0x7b, 0x2c, 0xbf), Bounds::Any, Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl MetaballsConfig {
    /// Number of blobs generated for the current complexity.
    pub fn blob_count(&self) -> usize {
        (self.complexity / 100.0 * 15.0).floor() as usize + 3
    }

    /// Top speed in logical pixels per frame.
    fn max_speed(&self) -> f64 {
        self.speed / 100.0 * 2.0
    }
}

#[derive(Clone, Debug)]
struct Blob {
    body: Body,
    radius: f64,
}

/// Blobs blended additively, so overlaps merge into brighter regions.
#[derive(Clone, Debug)]
pub struct Metaballs {
    blobs: Vec<Blob>,
    time: f64,
}

impl Metaballs {
    /// Number of blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether there are no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Blob positions in logical pixels.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.blobs.iter().map(|b| b.body.pos)
    }
}

impl Effect for Metaballs {
    type Config = MetaballsConfig;
    const NAME: &'static str = "metaballs";

    fn build(setup: &mut Setup<MetaballsConfig>) -> Self {
        let cfg = setup.config;
        let vp = setup.viewport;
        let speed = cfg.max_speed();
        let scale = vp.css_width / REFERENCE_WIDTH;
        let rng = &mut *setup.rng;
        let blobs = (0..cfg.blob_count())
            .map(|_| Blob {
                body: Body {
                    pos: Vec2::new(
                        rng.gen::<f64>() * vp.css_width,
                        rng.gen::<f64>() * vp.css_height,
                    ),
                    vel: Vec2::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5) * speed,
                    phase: rng.gen::<f64>() * TAU,
                },
                radius: (rng.gen::<f64>() * 80.0 + 40.0) * scale,
            })
            .collect();
        Self { blobs, time: 0.0 }
    }

    fn update(&mut self, frame: &mut Frame<MetaballsConfig>) {
        let speed = frame.config.max_speed();
        self.time += 0.01 * (frame.config.speed / 50.0);
        for blob in &mut self.blobs {
            let body = &mut blob.body;
            body.step();
            body.pos += Vec2::new(
                (self.time + body.phase).sin(),
                (self.time + body.phase * 1.3).cos(),
            ) * 0.5;
            body.constrain(Boundary::WrapPadded(blob.radius), frame.viewport);

            if frame.rng.gen_bool(KICK_CHANCE) {
                let kick = Vec2::new(frame.rng.gen::<f64>() - 0.5, frame.rng.gen::<f64>() - 0.5);
                body.vel += kick * 0.2 * speed;
                let limit = 1.5 * speed;
                body.vel = body.vel.map(|v| v.clamp(-limit, limit));
            }
        }
    }

    fn draw(&self, ctx: &DrawContext<MetaballsConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);
        let softness = 1.0 + cfg.blur / 100.0;
        for blob in &self.blobs {
            let mix = ((self.time * 0.5 + blob.body.phase).sin() + 1.0) / 2.0;
            let color = cfg.color1.lerp(cfg.color2, mix);
            raster::soft_disc(
                buf,
                vp.to_pixels(blob.body.pos),
                blob.radius * softness * vp.dpr,
                color,
                1.0,
                BlendMode::Add,
            );
        }
    }
}
