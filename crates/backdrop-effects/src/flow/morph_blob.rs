//! A single organic blob whose outline wobbles and slowly turns.
//! It follows the pointer when interaction is on.

use backdrop_core::{
    effect_config,
    mouse::{relax, RELAX_FACTOR},
    rand::Rng,
    raster, BlendMode, Bounds, DrawContext, Effect, Frame, PixelBuffer, Rgb, Rgba, Role, Setup,
    Vec2,
};
use std::f64::consts::TAU;

const BACKGROUND: Rgba = [0x0a, 0x0a, 0x1a, 255];

/// How far control points swing in and out, in logical pixels.
const WOBBLE: f64 = 30.0;

/// Line segments per outline curve.
const CURVE_STEPS: usize = 8;

effect_config! {
    /// Config of the [`MorphBlob`] effect.
    pub struct MorphBlobConfig;
    /// Partial update of a [`MorphBlobConfig`].
    pub struct MorphBlobPatch;
    {
        /// How fast the outline changes. Default: 40.
        speed: f64 = 40.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Fill color.
        color: Rgb = Rgb::new(0xb5, 0x65, 0xd8), Bounds::Any, Role::Cosmetic;
        /// Number of outline control points. Default: 12.
        complexity: u32 = 12, Bounds::Range(3, 20), Role::Structural { threshold: 2.0 };
        /// Mean radius in logical pixels. Default: 200.
        size: f64 = 200.0, Bounds::Range(50.0, 400.0), Role::Cosmetic;
        /// Strength of the surrounding glow in percent. Default: 50.
        glow: f64 = 50.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

#[derive(Clone, Debug)]
struct ControlPoint {
    angle: f64,
    radius: f64,
    speed: f64,
}

/// A blob outlined by a closed curve through radial control points.
#[derive(Clone, Debug)]
pub struct MorphBlob {
    points: Vec<ControlPoint>,
    center: Vec2,
    time: f64,
}

impl MorphBlob {
    /// Current center in logical pixels.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Number of control points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Control point positions in logical pixels.
    pub fn control_points(&self) -> impl Iterator<Item = Vec2> + '_ {
        let turn = self.time * 0.1;
        self.points.iter().map(move |p| {
            let angle = p.angle + turn;
            self.center + Vec2::new(angle.cos(), angle.sin()) * p.radius
        })
    }

    /// The smoothed outline: quadratic curves through the midpoints
    /// between control points, flattened to line segments.
    pub fn outline(&self) -> Vec<Vec2> {
        let ctrl: Vec<Vec2> = self.control_points().collect();
        let n = ctrl.len();
        if n < 3 {
            return ctrl;
        }
        let mut out = Vec::with_capacity(n * CURVE_STEPS);
        let mut start = ctrl[0];
        for i in 0..n {
            let via = ctrl[(i + 1) % n];
            let end = (via + ctrl[(i + 2) % n]) / 2.0;
            for step in 0..CURVE_STEPS {
                let t = step as f64 / CURVE_STEPS as f64;
                let u = 1.0 - t;
                out.push(start * (u * u) + via * (2.0 * u * t) + end * (t * t));
            }
            start = end;
        }
        out
    }
}

impl Effect for MorphBlob {
    type Config = MorphBlobConfig;
    const NAME: &'static str = "morph_blob";

    fn build(setup: &mut Setup<MorphBlobConfig>) -> Self {
        let cfg = setup.config;
        let count = cfg.complexity;
        let rng = &mut *setup.rng;
        let points = (0..count)
            .map(|i| ControlPoint {
                angle: i as f64 / count as f64 * TAU,
                radius: cfg.size + rng.gen::<f64>() * 50.0 - 25.0,
                speed: rng.gen::<f64>() * 0.02 + 0.01,
            })
            .collect();
        Self {
            points,
            center: setup.viewport.center(),
            time: 0.0,
        }
    }

    fn update(&mut self, frame: &mut Frame<MorphBlobConfig>) {
        let cfg = frame.config;
        self.time += 0.01 * (cfg.speed / 50.0);

        let target = frame.pointer.unwrap_or_else(|| frame.viewport.center());
        self.center = relax(self.center, target, RELAX_FACTOR);

        for p in &mut self.points {
            p.radius = cfg.size + (self.time * p.speed + p.angle).sin() * WOBBLE;
        }
    }

    fn draw(&self, ctx: &DrawContext<MorphBlobConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);

        let center = vp.to_pixels(self.center);
        let size = cfg.size * vp.dpr;
        if cfg.glow > 0.0 {
            let reach = (cfg.size + WOBBLE + cfg.glow / 100.0 * 40.0) * vp.dpr;
            raster::soft_disc(buf, center, reach, cfg.color, cfg.glow / 200.0, BlendMode::Add);
        }

        let outline: Vec<Vec2> = self.outline().into_iter().map(|p| vp.to_pixels(p)).collect();
        let fill_radius = size * 1.5;
        raster::fill_polygon(buf, &outline, BlendMode::Over, |p| {
            let t = ((p - center).norm() / fill_radius).min(1.0);
            let alpha = if t < 0.5 {
                0.9 - 0.6 * t
            } else {
                0.6 - 0.8 * (t - 0.5)
            };
            (cfg.color, alpha)
        });

        // highlight up and to the left of center
        let light = center - Vec2::repeat(size * 0.2);
        let light_radius = size * 0.8;
        let white = Rgb::new(255, 255, 255);
        raster::fill_polygon(buf, &outline, BlendMode::Over, |p| {
            let t = ((p - light).norm() / light_radius).min(1.0);
            (white, 0.3 * (1.0 - t))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use approx::assert_relative_eq;
    use backdrop_core::{EffectRng, Viewport};

    fn step(
        blob: &mut MorphBlob,
        cfg: &MorphBlobConfig,
        vp: &Viewport,
        rng: &mut EffectRng,
        pointer: Option<Vec2>,
    ) {
        blob.update(&mut Frame {
            config: cfg,
            viewport: vp,
            pointer,
            dt: 1.0 / 60.0,
            time: 0.0,
            rng,
        });
    }

    #[test]
    fn control_points_surround_the_center() {
        let cfg = MorphBlobConfig {
            complexity: 7,
            size: 100.0,
            ..Default::default()
        };
        let vp = viewport(600.0, 400.0, 1.0);
        let mut rng = rng();
        let mut blob = MorphBlob::build(&mut setup(&cfg, &vp, &mut rng));
        assert_eq!(blob.point_count(), 7);
        assert_eq!(blob.center(), Vec2::new(300.0, 200.0));
        for _ in 0..10 {
            step(&mut blob, &cfg, &vp, &mut rng, None);
        }
        for p in blob.control_points() {
            let r = (p - blob.center()).norm();
            assert!((100.0 - WOBBLE..=100.0 + WOBBLE).contains(&r));
        }
        assert_eq!(blob.outline().len(), 7 * CURVE_STEPS);
    }

    #[test]
    fn center_follows_pointer_and_returns() {
        let cfg = MorphBlobConfig::default();
        let vp = viewport(600.0, 400.0, 1.0);
        let mut rng = rng();
        let mut blob = MorphBlob::build(&mut setup(&cfg, &vp, &mut rng));

        let pointer = Vec2::new(500.0, 200.0);
        step(&mut blob, &cfg, &vp, &mut rng, Some(pointer));
        assert_relative_eq!(blob.center(), Vec2::new(310.0, 200.0), epsilon = 1e-9);
        for _ in 0..300 {
            step(&mut blob, &cfg, &vp, &mut rng, Some(pointer));
        }
        assert_relative_eq!(blob.center(), pointer, epsilon = 1e-3);

        for _ in 0..300 {
            step(&mut blob, &cfg, &vp, &mut rng, None);
        }
        assert_relative_eq!(blob.center(), vp.center(), epsilon = 1e-3);
    }

    #[test]
    fn blob_is_filled_inside_only() {
        let cfg = MorphBlobConfig {
            size: 50.0,
            glow: 0.0,
            ..Default::default()
        };
        let vp = viewport(300.0, 300.0, 1.0);
        let mut rng = rng();
        let blob = MorphBlob::build(&mut setup(&cfg, &vp, &mut rng));
        let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
        blob.draw(
            &DrawContext {
                config: &cfg,
                viewport: &vp,
                pointer: None,
                time: 0.0,
            },
            &mut buf,
        );
        assert_ne!(buf.get(150, 150), Some(BACKGROUND));
        assert_eq!(buf.get(5, 5), Some(BACKGROUND));
        assert_eq!(buf.get(290, 150), Some(BACKGROUND));
    }
}
