//! A drifting network of particles linked to their near neighbors.
//!
//! Particles move in straight lines and wrap around the edges.
//! Each pair closer than the connection distance is joined by a line
//! that fades out as the pair drifts apart.

use super::{Body, Boundary};
use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, ChangeSet, DrawContext, Effect, Frame,
    PixelBuffer, Rgb, Rgba, Role, Setup, Vec2,
};
use itertools::Itertools;

const BACKGROUND: Rgba = [0x0a, 0x0a, 0x1a, 255];

/// Opacity of a link between two particles at zero distance.
const LINK_ALPHA: f64 = 0.5;

/// Extra radius of the glow around each particle, in logical pixels.
const GLOW_RADIUS: f64 = 10.0;

effect_config! {
    /// Config of the [`Particles`] effect.
    pub struct ParticlesConfig;
    /// Partial update of a [`ParticlesConfig`].
    pub struct ParticlesPatch;
    {
        /// Drift speed of new particles. Default: 50.
        speed: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Color of particles and links.
        color: Rgb = Rgb::new(0x00, 0xd9, 0xff), Bounds::Any, Role::Cosmetic;
        /// Number of particles. Default: 150.
        count: u32 = 150, Bounds::Range(50, 1000), Role::Structural { threshold: 20.0 };
        /// Particle diameter in logical pixels. Default: 3.
        size: f64 = 3.0, Bounds::Range(1.0, 10.0), Role::Cosmetic;
        /// Longest link in logical pixels. Default: 150.
        connection_distance: f64 = 150.0, Bounds::Range(50.0, 300.0), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

#[derive(Clone, Debug)]
struct Particle {
    body: Body,
    radius: f64,
}

/// A constellation of wandering particles.
#[derive(Clone, Debug)]
pub struct Particles {
    particles: Vec<Particle>,
}

impl Particles {
    /// Number of particles.
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Particle positions in logical pixels.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.particles.iter().map(|p| p.body.pos)
    }

    /// Particle radii in logical pixels.
    pub fn radii(&self) -> impl Iterator<Item = f64> + '_ {
        self.particles.iter().map(|p| p.radius)
    }

    /// Pairs of particle indices close enough to be linked,
    /// with the opacity of their link.
    pub fn links(&self, max_distance: f64) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.particles
            .iter()
            .enumerate()
            .tuple_combinations()
            .filter_map(move |((i, a), (j, b))| {
                let dist = (a.body.pos - b.body.pos).norm();
                (dist < max_distance).then(|| (i, j, (1.0 - dist / max_distance) * LINK_ALPHA))
            })
    }
}

impl Effect for Particles {
    type Config = ParticlesConfig;
    const NAME: &'static str = "particles";

    fn build(setup: &mut Setup<ParticlesConfig>) -> Self {
        let cfg = setup.config;
        let vp = setup.viewport;
        let rng = &mut *setup.rng;
        let speed = cfg.speed / 100.0 * 2.0;
        let particles = (0..cfg.count)
            .map(|_| Particle {
                body: Body {
                    pos: Vec2::new(rng.gen::<f64>() * vp.css_width, rng.gen::<f64>() * vp.css_height),
                    vel: Vec2::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5) * speed,
                    phase: 0.0,
                },
                radius: cfg.size * 0.5,
            })
            .collect();
        Self { particles }
    }

    fn reconfigure(&mut self, changes: &ChangeSet, setup: &mut Setup<ParticlesConfig>) {
        if changes.contains("size") {
            let radius = setup.config.size * 0.5;
            for p in &mut self.particles {
                p.radius = radius;
            }
        }
    }

    fn update(&mut self, frame: &mut Frame<ParticlesConfig>) {
        for p in &mut self.particles {
            p.body.step();
            p.body.constrain(Boundary::Wrap, frame.viewport);
        }
    }

    fn draw(&self, ctx: &DrawContext<ParticlesConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);

        for (i, j, alpha) in self.links(cfg.connection_distance) {
            raster::line(
                buf,
                vp.to_pixels(self.particles[i].body.pos),
                vp.to_pixels(self.particles[j].body.pos),
                vp.dpr,
                cfg.color,
                alpha,
                BlendMode::Over,
            );
        }

        for p in &self.particles {
            let center = vp.to_pixels(p.body.pos);
            raster::soft_disc(
                buf,
                center,
                (p.radius + GLOW_RADIUS) * vp.dpr,
                cfg.color,
                0.4,
                BlendMode::Add,
            );
            raster::disc(buf, center, p.radius * vp.dpr, cfg.color, 1.0, BlendMode::Over);
        }
    }
}
