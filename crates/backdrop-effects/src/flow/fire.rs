//! Rising embers and smoke.
//!
//! Particles are emitted from a band near the bottom of the surface,
//! drift upwards with turbulence and a horizontal wind,
//! and cool through three colors before fading out.
//! A share of them are smoke puffs that spread and grow instead.
//! With pointer interaction on, the wind follows the pointer's
//! horizontal offset from the center.

use super::Body;
use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, DrawContext, Effect, EffectRng, Frame,
    PixelBuffer, Rgb, Role, Setup, Vec2, Viewport,
};
use itertools::Itertools;

/// Particles above this height (negative, in logical pixels) are recycled.
const CULL_HEIGHT: f64 = -100.0;

/// Radius of the glow around flame particles, in logical pixels.
const GLOW_RADIUS: f64 = 20.0;

effect_config! {
    /// Config of the [`Fire`] effect.
    pub struct FireConfig;
    /// Partial update of a [`FireConfig`].
    pub struct FirePatch;
    {
        /// Multiplier on particle motion and aging. Default: 1.
        speed: f64 = 1.0, Bounds::Range(0.1, 2.0), Role::Cosmetic;
        /// Color of fresh flame. Default: pale yellow.
        color1: Rgb = Rgb::new(0xff, 0xe0, 0x66), Bounds::Any, Role::Cosmetic;
        /// Color of flame midway through its life. Default: orange.
        color2: Rgb = Rgb::new(0xff, 0x6a, 0x00), Bounds::Any, Role::Cosmetic;
        /// Color of flame about to fade. Default: deep red.
        color3: Rgb = Rgb::new(0xb3, 0x00, 0x1b), Bounds::Any, Role::Cosmetic;
        /// Number of live particles.
        /// The pool grows right away and shrinks as particles burn out.
        /// Default: 500.
        particle_count: u32 = 500, Bounds::Range(100, 2000), Role::Cosmetic;
        /// Initial upward speed of new particles. Default: 50.
        intensity: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Horizontal wind, negative to the left. Default: 0.
        wind_speed: f64 = 0.0, Bounds::Range(-100.0, 100.0), Role::Cosmetic;
        /// Chance in percent that a new particle is smoke. Default: 20.
        smoke_amount: f64 = 20.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl FireConfig {
    /// Color of a flame particle that has used up `life_ratio` of its life.
    ///
    /// Flames go from `color1` to `color2` over the first third,
    /// on to `color3` over the second, and fade to black over the last.
    pub fn flame_color(&self, life_ratio: f64) -> Rgb {
        let t = life_ratio.clamp(0.0, 1.0);
        if t < 0.33 {
            self.color1.lerp(self.color2, t / 0.33)
        } else if t < 0.66 {
            self.color2.lerp(self.color3, (t - 0.33) / 0.33)
        } else {
            self.color3.lerp(Rgb::new(0, 0, 0), (t - 0.66) / 0.34)
        }
    }
}

#[derive(Clone, Debug)]
struct Ember {
    body: Body,
    life: f64,
    max_life: f64,
    size: f64,
    smoke: bool,
}

impl Ember {
    fn spawn(cfg: &FireConfig, viewport: &Viewport, rng: &mut EffectRng) -> Self {
        let (w, h) = (viewport.css_width, viewport.css_height);
        let smoke = rng.gen::<f64>() * 100.0 < cfg.smoke_amount;
        let pos = Vec2::new(
            w * 0.3 + rng.gen::<f64>() * w * 0.4,
            h - rng.gen::<f64>() * h * 0.2,
        );
        let rise = -(1.0 + rng.gen::<f64>() * 2.0) * (cfg.intensity / 50.0);
        let vel = Vec2::new(
            (rng.gen::<f64>() - 0.5) * 0.5 + cfg.wind_speed / 100.0,
            rise + (rng.gen::<f64>() - 0.5) * 0.5,
        );
        let (max_life, size) = if smoke {
            (80.0 + rng.gen::<f64>() * 40.0, 10.0 + rng.gen::<f64>() * 30.0)
        } else {
            (60.0 + rng.gen::<f64>() * 40.0, 5.0 + rng.gen::<f64>() * 15.0)
        };
        Self {
            body: Body {
                pos,
                vel,
                phase: 0.0,
            },
            life: 0.0,
            max_life,
            size,
            smoke,
        }
    }

    fn life_ratio(&self) -> f64 {
        self.life / self.max_life
    }

    fn burnt_out(&self) -> bool {
        self.life >= self.max_life || self.body.pos.y < CULL_HEIGHT
    }
}

/// A particle fire with smoke.
#[derive(Clone, Debug)]
pub struct Fire {
    embers: Vec<Ember>,
}

impl Fire {
    /// Number of live particles.
    pub fn particle_count(&self) -> usize {
        self.embers.len()
    }

    /// Particle positions in logical pixels.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.embers.iter().map(|e| e.body.pos)
    }
}

impl Effect for Fire {
    type Config = FireConfig;
    const NAME: &'static str = "fire";

    fn build(setup: &mut Setup<FireConfig>) -> Self {
        let (cfg, vp) = (setup.config, setup.viewport);
        let rng = &mut *setup.rng;
        let embers = (0..cfg.particle_count)
            .map(|_| Ember::spawn(cfg, vp, rng))
            .collect();
        Self { embers }
    }

    fn update(&mut self, frame: &mut Frame<FireConfig>) {
        let cfg = frame.config;
        let vp = frame.viewport;
        let wind = match frame.pointer {
            Some(pointer) => {
                let half = vp.css_width / 2.0;
                ((pointer.x - half) / half).clamp(-1.0, 1.0)
            }
            None => cfg.wind_speed / 100.0,
        };

        for ember in &mut self.embers {
            let body = &mut ember.body;
            body.vel.x += (wind - body.vel.x) * 0.1;
            body.pos += body.vel * cfg.speed;
            ember.life += cfg.speed;

            body.vel.x += (frame.rng.gen::<f64>() - 0.5) * 0.1;
            body.vel.y -= 0.02;
            if ember.smoke {
                body.vel.x += (frame.rng.gen::<f64>() - 0.5) * 0.2;
                ember.size += 0.1 * cfg.speed;
            }
        }

        self.embers.retain(|e| !e.burnt_out());
        while self.embers.len() < cfg.particle_count as usize {
            self.embers.push(Ember::spawn(cfg, vp, frame.rng));
        }
    }

    fn draw(&self, ctx: &DrawContext<FireConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill([0; 4]);

        // lowest first so rising particles end up on top
        let back_to_front = self
            .embers
            .iter()
            .sorted_by(|a, b| b.body.pos.y.total_cmp(&a.body.pos.y));
        for ember in back_to_front {
            let ratio = ember.life_ratio();
            let alpha = 1.0 - ratio;
            let center = vp.to_pixels(ember.body.pos);
            let radius = ember.size * vp.dpr;
            if ember.smoke {
                let gray = (50.0 + ratio * 100.0).floor() as u8;
                let color = Rgb::new(gray, gray, gray);
                raster::disc(buf, center, radius, color, alpha * 0.4, BlendMode::Over);
            } else {
                let color = cfg.flame_color(ratio);
                raster::soft_disc(
                    buf,
                    center,
                    radius + GLOW_RADIUS * vp.dpr,
                    color,
                    alpha * 0.3,
                    BlendMode::Add,
                );
                raster::disc(buf, center, radius, color, alpha, BlendMode::Add);
            }
        }
    }
}
