//! Glowing runners moving along a grid and leaving fading trails.

use super::{extent, Boundary};
use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, DrawContext, Effect, EffectRng, Frame,
    PixelBuffer, Rgb, Rgba, Role, Setup, Vec2, Viewport,
};
use itertools::Itertools;
use std::collections::VecDeque;

const BACKGROUND: Rgba = [0x0a, 0x0a, 0x1a, 255];

/// Spacing of the background grid and of runner start positions,
/// in logical pixels.
pub const GRID_SIZE: f64 = 20.0;

/// Runners closer than this to an edge may turn early.
const EDGE_MARGIN: f64 = 100.0;

/// Chance per frame of turning early near an edge.
const EDGE_TURN_CHANCE: f64 = 0.3;

effect_config! {
    /// Config of the [`NeonTrails`] effect.
    pub struct NeonTrailsConfig;
    /// Partial update of a [`NeonTrailsConfig`].
    pub struct NeonTrailsPatch;
    {
        /// How fast runners move. Default: 60.
        speed: f64 = 60.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Trail color.
        color: Rgb = Rgb::new(0xff, 0x00, 0xd9), Bounds::Any, Role::Cosmetic;
        /// Frames a trail point stays visible. Default: 100.
        trail_length: u32 = 100, Bounds::Range(10, 200), Role::Cosmetic;
        /// Number of runners. Default: 15.
        count: u32 = 15, Bounds::Range(3, 50), Role::Structural { threshold: 5.0 };
        /// Trail width in logical pixels. Default: 3.
        width: f64 = 3.0, Bounds::Range(1.0, 10.0), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl NeonTrailsConfig {
    /// Distance a runner covers per frame, in logical pixels.
    pub fn step_length(&self) -> f64 {
        self.speed / 100.0 * 3.0
    }
}

#[derive(Clone, Copy, Debug)]
struct TrailPoint {
    pos: Vec2,
    age: u32,
}

#[derive(Clone, Debug)]
struct Runner {
    pos: Vec2,
    /// Unit vector along one of the axes.
    heading: Vec2,
    /// Newest point at the back.
    trail: VecDeque<TrailPoint>,
    frames_to_turn: u32,
}

impl Runner {
    fn spawn(viewport: &Viewport, rng: &mut EffectRng) -> Self {
        let cells = |len: f64| (len / GRID_SIZE).floor().max(1.0) as u32;
        let pos = Vec2::new(
            rng.gen_range(0..cells(viewport.css_width)) as f64 * GRID_SIZE,
            rng.gen_range(0..cells(viewport.css_height)) as f64 * GRID_SIZE,
        );
        let heading = match rng.gen_range(0..4) {
            0 => Vec2::x(),
            1 => -Vec2::x(),
            2 => Vec2::y(),
            _ => -Vec2::y(),
        };
        Self {
            pos,
            heading,
            trail: VecDeque::new(),
            frames_to_turn: turn_delay(rng),
        }
    }

    /// Turn 90 degrees to a random side.
    fn turn(&mut self, rng: &mut EffectRng) {
        let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.heading = Vec2::new(-self.heading.y, self.heading.x) * side;
        self.frames_to_turn = turn_delay(rng);
    }

    fn near_edge(&self, viewport: &Viewport) -> bool {
        let far = extent(viewport) - Vec2::repeat(EDGE_MARGIN);
        self.pos.x < EDGE_MARGIN
            || self.pos.y < EDGE_MARGIN
            || self.pos.x > far.x
            || self.pos.y > far.y
    }
}

fn turn_delay(rng: &mut EffectRng) -> u32 {
    rng.gen_range(50..150)
}

/// Runners on a grid, in the style of light cycles.
#[derive(Clone, Debug)]
pub struct NeonTrails {
    runners: Vec<Runner>,
}

impl NeonTrails {
    /// Number of runners.
    pub fn runner_count(&self) -> usize {
        self.runners.len()
    }

    /// Runner positions in logical pixels.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.runners.iter().map(|r| r.pos)
    }
}

impl Effect for NeonTrails {
    type Config = NeonTrailsConfig;
    const NAME: &'static str = "neon_trails";

    fn build(setup: &mut Setup<NeonTrailsConfig>) -> Self {
        let vp = setup.viewport;
        let rng = &mut *setup.rng;
        let runners = (0..setup.config.count)
            .map(|_| Runner::spawn(vp, rng))
            .collect();
        Self { runners }
    }

    fn update(&mut self, frame: &mut Frame<NeonTrailsConfig>) {
        let cfg = frame.config;
        let step = cfg.step_length();
        for runner in &mut self.runners {
            runner.trail.push_back(TrailPoint {
                pos: runner.pos,
                age: 0,
            });
            for point in &mut runner.trail {
                point.age += 1;
            }
            while runner
                .trail
                .front()
                .is_some_and(|p| p.age > cfg.trail_length)
            {
                runner.trail.pop_front();
            }

            runner.pos += runner.heading * step;

            runner.frames_to_turn = runner.frames_to_turn.saturating_sub(1);
            let early = runner.near_edge(frame.viewport) && frame.rng.gen_bool(EDGE_TURN_CHANCE);
            if runner.frames_to_turn == 0 || early {
                runner.turn(frame.rng);
            }

            let mut heading = runner.heading;
            if Boundary::Wrap.apply(&mut runner.pos, &mut heading, extent(frame.viewport)) {
                runner.trail.clear();
            }
        }
    }

    fn draw(&self, ctx: &DrawContext<NeonTrailsConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);

        let grid_color = Rgb::new(100, 100, 255);
        let mut grid_line = |a: Vec2, b: Vec2| {
            raster::line(buf, a, b, 0.5 * vp.dpr, grid_color, 0.1, BlendMode::Over);
        };
        let (w, h) = (vp.pixel_width as f64, vp.pixel_height as f64);
        let mut x = 0.0;
        while x < vp.css_width {
            let px = x * vp.dpr;
            grid_line(Vec2::new(px, 0.0), Vec2::new(px, h));
            x += GRID_SIZE;
        }
        let mut y = 0.0;
        while y < vp.css_height {
            let py = y * vp.dpr;
            grid_line(Vec2::new(0.0, py), Vec2::new(w, py));
            y += GRID_SIZE;
        }

        let width = cfg.width * vp.dpr;
        let fade = cfg.trail_length as f64;
        for runner in &self.runners {
            if runner.trail.len() < 2 {
                continue;
            }
            for (a, b) in runner.trail.iter().tuple_windows() {
                let alpha = (1.0 - a.age as f64 / fade).max(0.0);
                let (pa, pb) = (vp.to_pixels(a.pos), vp.to_pixels(b.pos));
                raster::line(buf, pa, pb, width * 3.0, cfg.color, alpha * 0.2, BlendMode::Add);
                raster::line(buf, pa, pb, width, cfg.color, alpha, BlendMode::Add);
            }

            let head = vp.to_pixels(runner.pos);
            let halo = width * 1.5 + 20.0 * vp.dpr;
            raster::soft_disc(buf, head, halo, cfg.color, 0.5, BlendMode::Add);
            raster::disc(buf, head, width * 1.5, cfg.color, 1.0, BlendMode::Over);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    fn step(trails: &mut NeonTrails, cfg: &NeonTrailsConfig, vp: &Viewport, rng: &mut EffectRng) {
        trails.update(&mut Frame {
            config: cfg,
            viewport: vp,
            pointer: None,
            dt: 1.0 / 60.0,
            time: 0.0,
            rng,
        });
    }

    #[test]
    fn runners_start_on_the_grid() {
        let cfg = NeonTrailsConfig::default();
        let vp = viewport(410.0, 300.0, 2.0);
        let mut rng = rng();
        let trails = NeonTrails::build(&mut setup(&cfg, &vp, &mut rng));
        assert_eq!(trails.runner_count(), 15);
        for runner in &trails.runners {
            assert_eq!(runner.pos.map(|c| c % GRID_SIZE), Vec2::zeros());
            assert!(runner.pos.x < 410.0 && runner.pos.y < 300.0);
            assert_eq!(runner.heading.norm(), 1.0);
            assert!(runner.heading.x == 0.0 || runner.heading.y == 0.0);
        }
    }

    #[test]
    fn trails_are_bounded_and_runners_move_along_axes() {
        let cfg = NeonTrailsConfig {
            trail_length: 10,
            ..Default::default()
        };
        let vp = viewport(400.0, 300.0, 1.0);
        let mut rng = rng();
        let mut trails = NeonTrails::build(&mut setup(&cfg, &vp, &mut rng));
        for _ in 0..500 {
            let before: Vec<Vec2> = trails.positions().collect();
            step(&mut trails, &cfg, &vp, &mut rng);
            for (runner, before) in trails.runners.iter().zip(before) {
                assert!(runner.trail.len() <= 10);
                assert!(runner.trail.iter().all(|p| p.age <= 10));
                assert!((0.0..=400.0).contains(&runner.pos.x));
                assert!((0.0..=300.0).contains(&runner.pos.y));
                let moved = runner.pos - before;
                // either one axis-aligned step or a wrap
                assert!(moved.x == 0.0 || moved.y == 0.0 || runner.trail.is_empty());
            }
        }
    }

    #[test]
    fn wrapping_clears_the_trail() {
        let cfg = NeonTrailsConfig::default();
        let vp = viewport(200.0, 200.0, 1.0);
        let mut rng = rng();
        let mut trails = NeonTrails::build(&mut setup(&cfg, &vp, &mut rng));
        trails.runners.truncate(1);
        let runner = &mut trails.runners[0];
        runner.pos = Vec2::new(199.0, 100.0);
        runner.heading = Vec2::x();
        runner.frames_to_turn = 1000;
        runner.trail.extend((0..5).map(|i| TrailPoint {
            pos: Vec2::new(190.0 + i as f64, 100.0),
            age: 5 - i,
        }));
        step(&mut trails, &cfg, &vp, &mut rng);
        let runner = &trails.runners[0];
        assert!(runner.trail.is_empty());
        assert_eq!(runner.pos.x, 0.0);
    }

    #[test]
    fn trails_light_up_additively() {
        let cfg = NeonTrailsConfig {
            color: Rgb::new(0, 200, 0),
            ..Default::default()
        };
        let vp = viewport(200.0, 200.0, 1.0);
        let mut rng = rng();
        let mut trails = NeonTrails::build(&mut setup(&cfg, &vp, &mut rng));
        trails.runners.truncate(1);
        let runner = &mut trails.runners[0];
        runner.pos = Vec2::new(150.0, 150.0);
        runner.trail = [(50.0, 3), (100.0, 2), (150.0, 1)]
            .into_iter()
            .map(|(x, age)| TrailPoint {
                pos: Vec2::new(x, 150.0),
                age,
            })
            .collect();
        let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
        trails.draw(
            &DrawContext {
                config: &cfg,
                viewport: &vp,
                pointer: None,
                time: 0.0,
            },
            &mut buf,
        );
        let green = |x, y| buf.get(x, y).map_or(0, |p| p[1]);
        assert!(green(75, 150) > 150);
        assert!(green(75, 50) < 40);
    }
}
