//! Twinkling stars in depth layers over slowly turning nebula clouds.
//!
//! With pointer interaction on, stars within [`ATTRACTION_RADIUS`]
//! are pulled towards the pointer while a spring holds them near home.
//! Once the pointer is gone they ease back into place.

use super::Body;
use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, DrawContext, Effect, EffectRng, Frame,
    PixelBuffer, Rgb, Role, Setup, Vec2,
};
use std::f64::consts::TAU;

/// Number of nebula clouds.
const NEBULA_COUNT: usize = 5;

/// Number of depth layers. Layer 0 is the nearest.
const LAYERS: u8 = 3;

/// Distance in logical pixels within which the pointer attracts stars.
pub const ATTRACTION_RADIUS: f64 = 300.0;

/// Distance from home under which a returning star snaps into place.
const SNAP_DISTANCE: f64 = 0.1;

/// Vertical squash of nebula clouds.
const NEBULA_ASPECT: f64 = 0.7;

effect_config! {
    /// Config of the [`Starfield`] effect.
    pub struct StarfieldConfig;
    /// Partial update of a [`StarfieldConfig`].
    pub struct StarfieldPatch;
    {
        /// How fast the nebulae turn. Default: 30.
        speed: f64 = 30.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Number of stars. Default: 500.
        star_count: u32 = 500, Bounds::Range(100, 2000), Role::Structural { threshold: 100.0 };
        /// Brightness of the nebulae in percent; 0 hides them. Default: 60.
        nebula_intensity: f64 = 60.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Color of nebula cores.
        color1: Rgb = Rgb::new(0xb5, 0x65, 0xd8), Bounds::Any, Role::Cosmetic;
        /// Color of nebula edges.
        color2: Rgb = Rgb::new(0x7b, 0x2c, 0xbf), Bounds::Any, Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

#[derive(Clone, Debug)]
struct Star {
    /// `phase` is the twinkle angle.
    body: Body,
    home: Vec2,
    size: f64,
    twinkle_speed: f64,
    layer: u8,
}

impl Star {
    fn brightness(&self) -> f64 {
        (self.body.phase.sin() + 1.0) / 2.0
    }
}

#[derive(Clone, Debug)]
struct Nebula {
    center: Vec2,
    radius: f64,
    rotation: f64,
    rotation_speed: f64,
}

/// A field of stars and nebulae.
#[derive(Clone, Debug)]
pub struct Starfield {
    stars: Vec<Star>,
    nebulae: Vec<Nebula>,
}

impl Starfield {
    /// Number of stars.
    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    /// Whether every star is resting at home.
    pub fn is_settled(&self) -> bool {
        self.stars
            .iter()
            .all(|s| s.body.pos == s.home && s.body.vel == Vec2::zeros())
    }

    /// Largest distance of any star from its home.
    pub fn max_displacement(&self) -> f64 {
        self.stars
            .iter()
            .map(|s| (s.body.pos - s.home).norm())
            .fold(0.0, f64::max)
    }
}

impl Effect for Starfield {
    type Config = StarfieldConfig;
    const NAME: &'static str = "starfield";

    fn build(setup: &mut Setup<StarfieldConfig>) -> Self {
        let vp = setup.viewport;
        let rng = &mut *setup.rng;
        let random_point = |rng: &mut EffectRng| {
            Vec2::new(rng.gen::<f64>() * vp.css_width, rng.gen::<f64>() * vp.css_height)
        };
        let stars = (0..setup.config.star_count)
            .map(|_| {
                let home = random_point(rng);
                Star {
                    body: Body {
                        pos: home,
                        vel: Vec2::zeros(),
                        phase: rng.gen::<f64>() * TAU,
                    },
                    home,
                    size: rng.gen::<f64>() * 2.0 + 0.5,
                    twinkle_speed: rng.gen::<f64>() * 0.02 + 0.01,
                    layer: rng.gen_range(0..LAYERS),
                }
            })
            .collect();
        let nebulae = (0..NEBULA_COUNT)
            .map(|_| Nebula {
                center: random_point(rng),
                radius: rng.gen::<f64>() * 200.0 + 150.0,
                rotation: rng.gen::<f64>() * TAU,
                rotation_speed: (rng.gen::<f64>() - 0.5) * 0.001,
            })
            .collect();
        Self { stars, nebulae }
    }

    fn update(&mut self, frame: &mut Frame<StarfieldConfig>) {
        let spin = frame.config.speed / 50.0;
        for nebula in &mut self.nebulae {
            nebula.rotation += nebula.rotation_speed * spin;
        }

        for star in &mut self.stars {
            let body = &mut star.body;
            body.phase += star.twinkle_speed;

            if let Some(pointer) = frame.pointer {
                let to_pointer = pointer - body.pos;
                let dist = to_pointer.norm();
                if dist > 0.0 && dist < ATTRACTION_RADIUS {
                    let force = (1.0 - dist / ATTRACTION_RADIUS) * 0.3 * (star.layer + 1) as f64;
                    body.vel += to_pointer / dist * force;
                }
                body.vel += (star.home - body.pos) * 0.01;
                body.step();
                body.vel *= 0.95;
            } else if body.vel != Vec2::zeros() {
                body.pos += (star.home - body.pos) * 0.05;
                body.vel *= 0.9;
                if (star.home - body.pos).norm() < SNAP_DISTANCE {
                    body.pos = star.home;
                    body.vel = Vec2::zeros();
                }
            }
        }
    }

    fn draw(&self, ctx: &DrawContext<StarfieldConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;

        // deep blue glow fading to black towards the edges
        buf.fill([0, 0, 0, 255]);
        raster::soft_disc(
            buf,
            vp.to_pixels(vp.center()),
            vp.css_width.max(vp.css_height) / 2.0 * vp.dpr,
            Rgb::new(0x0a, 0x0a, 0x2e),
            1.0,
            BlendMode::Over,
        );

        let intensity = cfg.nebula_intensity / 100.0;
        if intensity > 0.0 {
            for nebula in &self.nebulae {
                draw_nebula(buf, nebula, intensity, ctx);
            }
        }

        let white = Rgb::new(255, 255, 255);
        for layer in (0..LAYERS).rev() {
            let depth_scale = 1.0 - layer as f64 * 0.3;
            for star in self.stars.iter().filter(|s| s.layer == layer) {
                let brightness = star.brightness();
                let alpha = 0.4 + brightness * 0.6;
                let p = vp.to_pixels(star.body.pos);
                let radius = star.size * depth_scale * vp.dpr;
                raster::disc(buf, p, radius, white, alpha, BlendMode::Over);
                if star.size > 1.5 && brightness > 0.7 {
                    raster::disc(buf, p, radius * 2.0, white, alpha * 0.2, BlendMode::Over);
                }
            }
        }
    }
}

/// Draw a rotated elliptical cloud with color1 in the middle
/// fading through color2 to nothing at the edge.
fn draw_nebula(
    buf: &mut PixelBuffer,
    nebula: &Nebula,
    intensity: f64,
    ctx: &DrawContext<StarfieldConfig>,
) {
    let cfg = ctx.config;
    let vp = ctx.viewport;
    let center = vp.to_pixels(nebula.center);
    let radius = nebula.radius * vp.dpr;
    let (sin, cos) = nebula.rotation.sin_cos();
    let outline: Vec<Vec2> = (0..48)
        .map(|i| {
            let a = i as f64 / 48.0 * TAU;
            // slightly oversized so the polygon encloses the ellipse
            let local = Vec2::new(a.cos(), a.sin() * NEBULA_ASPECT) * radius * 1.01;
            center + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
        })
        .collect();
    raster::fill_polygon(buf, &outline, BlendMode::Add, |p| {
        let d = p - center;
        let local = Vec2::new(d.x * cos + d.y * sin, (-d.x * sin + d.y * cos) / NEBULA_ASPECT);
        let t = (local.norm() / radius).min(1.0);
        if t < 0.4 {
            let s = t / 0.4;
            (
                cfg.color1.lerp(cfg.color2, s),
                intensity * (0.6 - 0.2 * s),
            )
        } else {
            let s = (t - 0.4) / 0.6;
            (cfg.color2, intensity * 0.4 * (1.0 - s))
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use backdrop_core::Viewport;

    fn step(
        field: &mut Starfield,
        cfg: &StarfieldConfig,
        vp: &Viewport,
        rng: &mut EffectRng,
        pointer: Option<Vec2>,
    ) {
        field.update(&mut Frame {
            config: cfg,
            viewport: vp,
            pointer,
            dt: 1.0 / 60.0,
            time: 0.0,
            rng,
        });
    }

    #[test]
    fn stars_start_at_home_in_all_layers() {
        let cfg = StarfieldConfig::default();
        let vp = viewport(400.0, 300.0, 1.0);
        let mut rng = rng();
        let field = Starfield::build(&mut setup(&cfg, &vp, &mut rng));
        assert_eq!(field.star_count(), 500);
        assert_eq!(field.nebulae.len(), NEBULA_COUNT);
        assert!(field.is_settled());
        for layer in 0..LAYERS {
            assert!(field.stars.iter().any(|s| s.layer == layer));
        }
        for star in &field.stars {
            assert!((0.5..2.5).contains(&star.size));
            assert!((0.0..=400.0).contains(&star.home.x));
            assert!((0.0..=300.0).contains(&star.home.y));
        }
    }

    #[test]
    fn pointer_attracts_nearby_stars_only() {
        let cfg = StarfieldConfig {
            star_count: 100,
            ..Default::default()
        };
        let vp = viewport(2000.0, 2000.0, 1.0);
        let mut rng = rng();
        let mut field = Starfield::build(&mut setup(&cfg, &vp, &mut rng));
        let pointer = Vec2::new(1000.0, 1000.0);
        let before: Vec<f64> = field
            .stars
            .iter()
            .map(|s| (s.body.pos - pointer).norm())
            .collect();
        step(&mut field, &cfg, &vp, &mut rng, Some(pointer));
        for (star, before) in field.stars.iter().zip(before) {
            let after = (star.body.pos - pointer).norm();
            if before < ATTRACTION_RADIUS {
                assert!(after < before);
            } else {
                assert_eq!(star.body.pos, star.home);
            }
        }
    }

    #[test]
    fn stars_ease_home_after_the_pointer_leaves() {
        let cfg = StarfieldConfig {
            star_count: 200,
            ..Default::default()
        };
        let vp = viewport(600.0, 400.0, 1.0);
        let mut rng = rng();
        let mut field = Starfield::build(&mut setup(&cfg, &vp, &mut rng));
        for _ in 0..30 {
            step(&mut field, &cfg, &vp, &mut rng, Some(Vec2::new(300.0, 200.0)));
        }
        let disturbed = field.max_displacement();
        assert!(disturbed > 1.0);

        step(&mut field, &cfg, &vp, &mut rng, None);
        assert!(field.max_displacement() < disturbed);
        for _ in 0..500 {
            step(&mut field, &cfg, &vp, &mut rng, None);
        }
        assert!(field.is_settled());
    }

    #[test]
    fn nebulae_brighten_the_sky() {
        let vp = viewport(200.0, 200.0, 1.0);
        let mut rng = rng();
        let cfg = StarfieldConfig {
            star_count: 100,
            nebula_intensity: 0.0,
            ..Default::default()
        };
        let mut field = Starfield::build(&mut setup(&cfg, &vp, &mut rng));
        field.stars.clear();
        for nebula in &mut field.nebulae {
            nebula.center = Vec2::new(100.0, 100.0);
        }

        let sum = |cfg: &StarfieldConfig| {
            let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
            field.draw(
                &DrawContext {
                    config: cfg,
                    viewport: &vp,
                    pointer: None,
                    time: 0.0,
                },
                &mut buf,
            );
            buf.pixels()
                .iter()
                .map(|p| p[..3].iter().map(|&c| c as u64).sum::<u64>())
                .sum::<u64>()
        };
        let dark = sum(&cfg);
        let bright = sum(&StarfieldConfig {
            nebula_intensity: 100.0,
            ..cfg.clone()
        });
        assert!(bright > dark);
    }
}
