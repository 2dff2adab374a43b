//! Recursively branching lightning bolts.
//!
//! Each bolt is a jagged path from the top of the surface to the bottom,
//! subdivided with random perpendicular jitter that shrinks towards the end.
//! Bolts randomly spawn branches, which can branch again up to [`MAX_DEPTH`].
//! Every path fades out over a short random lifetime,
//! after which the whole tree is replaced by a fresh one.

use backdrop_core::{
    effect_config, raster, BlendMode, Bounds, DrawContext, Effect, EffectRng, Frame, PixelBuffer,
    Rgb, Role, Setup, Vec2, Viewport,
};
use rand::Rng;
use std::f64::consts::{FRAC_PI_2, PI};

/// Deepest level of branching. Roots are at depth 0.
pub const MAX_DEPTH: u32 = 3;

/// Maximum perpendicular jitter of a path point, in logical pixels,
/// before tapering towards the end of the path.
const JITTER: f64 = 50.0;

effect_config! {
    /// Config of the [`Lightning`] effect.
    pub struct LightningConfig;
    /// Partial update of a [`LightningConfig`].
    pub struct LightningPatch;
    {
        /// Multiplier on how fast bolts fade. Default: 1.
        speed: f64 = 1.0, Bounds::Range(0.1, 2.0), Role::Cosmetic;
        /// Core color. Default: pale blue.
        color1: Rgb = Rgb::new(0xe0, 0xf0, 0xff), Bounds::Any, Role::Cosmetic;
        /// Glow color. Default: violet.
        color2: Rgb = Rgb::new(0x8a, 0x5c, 0xff), Bounds::Any, Role::Cosmetic;
        /// Number of simultaneous bolts. Default: 3.
        bolt_count: u32 = 3, Bounds::Range(0, 10), Role::STRUCTURAL;
        /// Chance in percent that a path spawns branches. Default: 30.
        branch_probability: f64 = 30.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Core line width in logical pixels. Default: 2.
        thickness: f64 = 2.0, Bounds::Range(1.0, 10.0), Role::Cosmetic;
        /// Strength of the glow around paths. Zero disables it. Default: 50.
        glow_intensity: f64 = 50.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Number of segments per path. Default: 30.
        segments: u32 = 30, Bounds::Range(10, 100), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

/// One path in a [`BoltTree`].
#[derive(Clone, Debug)]
pub struct BoltNode {
    /// Points of the path in logical pixels, including both ends.
    pub points: Vec<Vec2>,
    /// Index of the path this one branched from.
    pub parent: Option<usize>,
    /// Indices of the paths branching from this one.
    pub children: Vec<usize>,
    /// Branching level, 0 for the root.
    pub depth: u32,
    /// Seconds (scaled by speed) since the path appeared.
    pub lifetime: f64,
    /// Lifetime at which the path has fully faded.
    pub max_lifetime: f64,
}

impl BoltNode {
    /// Opacity of the path, fading linearly over its lifetime.
    pub fn alpha(&self) -> f64 {
        1.0 - self.lifetime / self.max_lifetime
    }
}

/// A root bolt and all of its branches,
/// stored in one arena with parents before their children.
#[derive(Clone, Debug)]
pub struct BoltTree {
    nodes: Vec<BoltNode>,
}

impl BoltTree {
    /// Generate a tree with its root going from `start` to `end`.
    pub fn generate(
        start: Vec2,
        end: Vec2,
        segments: u32,
        branch_probability: f64,
        rng: &mut EffectRng,
    ) -> Self {
        let mut nodes: Vec<BoltNode> = Vec::new();
        // (start, end, depth, parent)
        let mut pending: Vec<(Vec2, Vec2, u32, Option<usize>)> = vec![(start, end, 0, None)];

        while let Some((start, end, depth, parent)) = pending.pop() {
            let points = jagged_path(start, end, segments, rng);
            let idx = nodes.len();
            if let Some(p) = parent {
                nodes[p].children.push(idx);
            }

            if depth < MAX_DEPTH && rng.gen::<f64>() * 100.0 < branch_probability {
                let dir = end - start;
                let parent_len = dir.norm();
                let parent_angle = dir.y.atan2(dir.x);
                let branch_count = rng.gen_range(1..=2);
                for _ in 0..branch_count {
                    // branch off somewhere in the first 70% of the path
                    let from = (rng.gen::<f64>() * points.len() as f64 * 0.7).floor() as usize;
                    let from = points[from.min(points.len() - 1)];
                    let len = parent_len * (0.3 + rng.gen::<f64>() * 0.4);
                    let angle = parent_angle + (rng.gen::<f64>() - 0.5) * PI;
                    let to = from + Vec2::new(angle.cos(), angle.sin()) * len;
                    pending.push((from, to, depth + 1, Some(idx)));
                }
            }

            nodes.push(BoltNode {
                points,
                parent,
                children: Vec::new(),
                depth,
                lifetime: 0.0,
                max_lifetime: rng.gen_range(0.1..0.25),
            });
        }
        Self { nodes }
    }

    /// Generate a root spanning the surface from top to bottom.
    pub fn spawn(viewport: &Viewport, cfg: &LightningConfig, rng: &mut EffectRng) -> Self {
        let (w, h) = (viewport.css_width, viewport.css_height);
        let start_x = rng.gen::<f64>() * w;
        let end_x = start_x + (rng.gen::<f64>() - 0.5) * w * 0.3;
        Self::generate(
            Vec2::new(start_x, 0.0),
            Vec2::new(end_x, h),
            cfg.segments,
            cfg.branch_probability,
            rng,
        )
    }

    /// All paths, root first.
    pub fn nodes(&self) -> &[BoltNode] {
        &self.nodes
    }

    /// The root path.
    pub fn root(&self) -> &BoltNode {
        &self.nodes[0]
    }

    /// Number of paths other than the root.
    pub fn branch_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Advance every path's lifetime.
    pub fn age(&mut self, dt: f64) {
        for node in &mut self.nodes {
            node.lifetime += dt;
        }
    }

    /// Whether the root has faded out completely.
    pub fn expired(&self) -> bool {
        self.root().lifetime >= self.root().max_lifetime
    }
}

/// Subdivide `start`-`end` into `segments` pieces,
/// offsetting interior points perpendicular to the line.
fn jagged_path(start: Vec2, end: Vec2, segments: u32, rng: &mut EffectRng) -> Vec<Vec2> {
    let d = end - start;
    let normal_angle = d.y.atan2(d.x) + FRAC_PI_2;
    let normal = Vec2::new(normal_angle.cos(), normal_angle.sin());
    let mut points = Vec::with_capacity(segments as usize + 1);
    points.push(start);
    for i in 1..segments {
        let t = i as f64 / segments as f64;
        let offset = (rng.gen::<f64>() - 0.5) * JITTER * (1.0 - t);
        points.push(start + d * t + normal * offset);
    }
    points.push(end);
    points
}

/// A set of flickering lightning bolts on a transparent background.
#[derive(Clone, Debug)]
pub struct Lightning {
    bolts: Vec<BoltTree>,
}

impl Lightning {
    /// Current bolts.
    pub fn bolts(&self) -> &[BoltTree] {
        &self.bolts
    }
}

impl Effect for Lightning {
    type Config = LightningConfig;
    const NAME: &'static str = "lightning";

    fn build(setup: &mut Setup<LightningConfig>) -> Self {
        let bolts = (0..setup.config.bolt_count)
            .map(|_| BoltTree::spawn(setup.viewport, setup.config, setup.rng))
            .collect();
        Self { bolts }
    }

    fn update(&mut self, frame: &mut Frame<LightningConfig>) {
        let dt = frame.dt * frame.config.speed;
        for bolt in &mut self.bolts {
            bolt.age(dt);
            if bolt.expired() {
                *bolt = BoltTree::spawn(frame.viewport, frame.config, frame.rng);
            }
        }
    }

    fn draw(&self, ctx: &DrawContext<LightningConfig>, buf: &mut PixelBuffer) {
        buf.fill([0; 4]);
        let cfg = ctx.config;
        let vp = ctx.viewport;
        let core_width = cfg.thickness * vp.dpr;
        // wider glow for stronger intensity, standing in for a blur
        let glow_width = (cfg.thickness * 3.0 + cfg.glow_intensity * 0.1) * vp.dpr;

        let mut pixels = Vec::new();
        for bolt in &self.bolts {
            let mut visible = vec![false; bolt.nodes.len()];
            for (i, node) in bolt.nodes.iter().enumerate() {
                let alpha = node.alpha();
                // a faded path hides its branches too
                let shown = alpha > 0.0 && node.parent.map_or(true, |p| visible[p]);
                visible[i] = shown;
                if !shown {
                    continue;
                }
                pixels.clear();
                pixels.extend(node.points.iter().map(|&p| vp.to_pixels(p)));
                if cfg.glow_intensity > 0.0 {
                    raster::polyline(
                        buf,
                        &pixels,
                        glow_width,
                        cfg.color2,
                        alpha * 0.3,
                        BlendMode::Over,
                    );
                }
                raster::polyline(buf, &pixels, core_width, cfg.color1, alpha, BlendMode::Over);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_branches_without_probability() {
        let mut rng = rng();
        let vp = viewport(300.0, 200.0, 1.0);
        for (bolt_count, segments) in [(1, 10), (5, 37), (10, 100)] {
            let cfg = LightningConfig {
                bolt_count,
                segments,
                branch_probability: 0.0,
                ..Default::default()
            };
            let effect = Lightning::build(&mut setup(&cfg, &vp, &mut rng));
            assert_eq!(effect.bolts().len(), bolt_count as usize);
            for bolt in effect.bolts() {
                assert_eq!(bolt.branch_count(), 0);
                assert!(bolt.root().children.is_empty());
                assert_eq!(bolt.root().points.len(), segments as usize + 1);
            }
        }
    }

    #[test]
    fn roots_span_the_surface() {
        let mut rng = rng();
        let vp = viewport(300.0, 200.0, 1.0);
        let cfg = LightningConfig::default();
        for _ in 0..20 {
            let bolt = BoltTree::spawn(&vp, &cfg, &mut rng);
            let root = bolt.root();
            let (first, last) = (root.points[0], root.points[root.points.len() - 1]);
            assert_relative_eq!(first.y, 0.0);
            assert_relative_eq!(last.y, 200.0);
            assert!((0.0..300.0).contains(&first.x));
            assert!((last.x - first.x).abs() <= 45.0);
            assert!((0.1..0.25).contains(&root.max_lifetime));
        }
    }

    #[test]
    fn branches_respect_depth_and_links() {
        let mut rng = rng();
        let tree = BoltTree::generate(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 400.0),
            20,
            100.0,
            &mut rng,
        );
        // always branching gives 1-2 children down to the depth limit
        assert!(tree.branch_count() >= MAX_DEPTH as usize);
        for (i, node) in tree.nodes().iter().enumerate() {
            assert!(node.depth <= MAX_DEPTH);
            if node.depth < MAX_DEPTH {
                assert!((1..=2).contains(&node.children.len()));
            } else {
                assert!(node.children.is_empty());
            }
            for &child in &node.children {
                let child_node = &tree.nodes()[child];
                assert_eq!(child_node.parent, Some(i));
                assert_eq!(child_node.depth, node.depth + 1);
                // branches start on the parent's path
                assert!(node.points.contains(&child_node.points[0]));
            }
        }
    }

    #[test]
    fn expired_bolts_are_replaced() {
        let mut rng = rng();
        let vp = viewport(100.0, 100.0, 1.0);
        let cfg = LightningConfig {
            bolt_count: 4,
            ..Default::default()
        };
        let mut effect = Lightning::build(&mut setup(&cfg, &vp, &mut rng));
        let before: Vec<Vec2> = effect.bolts().iter().map(|b| b.root().points[0]).collect();
        effect.update(&mut Frame {
            config: &cfg,
            viewport: &vp,
            pointer: None,
            dt: 0.3,
            time: 0.3,
            rng: &mut rng,
        });
        assert_eq!(effect.bolts().len(), 4);
        for (bolt, old_start) in effect.bolts().iter().zip(before) {
            assert_relative_eq!(bolt.root().lifetime, 0.0);
            assert_ne!(bolt.root().points[0], old_start);
        }
    }

    #[test]
    fn faded_bolts_draw_nothing() {
        let mut rng = rng();
        let vp = viewport(50.0, 50.0, 2.0);
        let cfg = LightningConfig {
            bolt_count: 2,
            ..Default::default()
        };
        let mut effect = Lightning::build(&mut setup(&cfg, &vp, &mut rng));
        let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
        let ctx = DrawContext {
            config: &cfg,
            viewport: &vp,
            pointer: None,
            time: 0.0,
        };
        effect.draw(&ctx, &mut buf);
        assert!(buf.pixels().iter().any(|p| p[3] > 0));

        for bolt in &mut effect.bolts {
            for node in &mut bolt.nodes {
                node.lifetime = node.max_lifetime;
            }
        }
        effect.draw(&ctx, &mut buf);
        assert!(buf.pixels().iter().all(|p| *p == [0; 4]));
    }

    #[test]
    fn no_bolts_draws_a_blank_frame() {
        let mut rng = rng();
        let vp = viewport(40.0, 30.0, 1.5);
        let cfg = LightningConfig::default();
        let mut effect = Lightning::build(&mut setup(&cfg, &vp, &mut rng));
        assert_eq!(effect.bolts().len(), 3);

        let cfg = LightningConfig {
            bolt_count: 0,
            ..cfg
        };
        effect.rebuild(&mut setup(&cfg, &vp, &mut rng));
        assert!(effect.bolts().is_empty());

        let ctx = DrawContext {
            config: &cfg,
            viewport: &vp,
            pointer: None,
            time: 0.0,
        };
        // leftovers from an earlier frame are overwritten
        let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
        buf.fill([255; 4]);
        for _ in 0..3 {
            effect.update(&mut Frame {
                config: &cfg,
                viewport: &vp,
                pointer: None,
                dt: 0.3,
                time: 0.3,
                rng: &mut rng,
            });
            assert!(effect.bolts().is_empty());
            effect.draw(&ctx, &mut buf);
            assert!(buf.pixels().iter().all(|p| *p == [0; 4]));
        }
    }
}
