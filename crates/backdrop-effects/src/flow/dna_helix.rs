//! A rotating double helix with glowing base pairs.
//!
//! The helix is regenerated analytically every frame from its rotation,
//! so only the rotation and the base pair kinds are kept as state.
//! Depth along the viewing axis dims the far side of each strand.

use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, DrawContext, Effect, Frame, PixelBuffer,
    Rgb, Rgba, Role, Setup, Vec2, Viewport,
};
use std::f64::consts::{PI, TAU};

const BACKGROUND: Rgba = [10, 14, 10, 255];

/// Highest number of base pairs a helix can have.
pub const MAX_SEGMENTS: u32 = 300;

/// Tallest the helix gets, in logical pixels.
const MAX_HEIGHT: f64 = 600.0;

/// Radius of base pair nodes, in logical pixels.
const NODE_RADIUS: f64 = 3.0;

/// Width of the strands, in logical pixels.
const STRAND_WIDTH: f64 = 3.0;

/// Colors of the four kinds of base pairs.
fn pair_color(kind: u8) -> Rgb {
    match kind % 4 {
        0 => Rgb::new(0xff, 0x6b, 0x9d),
        1 => Rgb::new(0xc4, 0x45, 0x69),
        2 => Rgb::new(0x4a, 0x69, 0xbd),
        _ => Rgb::new(0x0c, 0x24, 0x61),
    }
}

effect_config! {
    /// Config of the [`DnaHelix`] effect.
    pub struct DnaHelixConfig;
    /// Partial update of a [`DnaHelixConfig`].
    pub struct DnaHelixPatch;
    {
        /// How fast the helix turns. Default: 50.
        speed: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Distance of the strands from the axis in logical pixels. Default: 100.
        helix_radius: f64 = 100.0, Bounds::Range(50.0, 200.0), Role::Cosmetic;
        /// Full turns over the height of the helix. Default: 3.
        turns: f64 = 3.0, Bounds::Range(1.0, 5.0), Role::Cosmetic;
        /// Number of base pairs. Default: 100.
        segments: u32 = 100, Bounds::Range(50, MAX_SEGMENTS), Role::Cosmetic;
        /// Strength of the glow and of the base pair links.
        /// Zero hides the links. Default: 50.
        glow_intensity: f64 = 50.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Color of the first strand.
        color1: Rgb = Rgb::new(0x00, 0xd9, 0xff), Bounds::Any, Role::Cosmetic;
        /// Color of the second strand.
        color2: Rgb = Rgb::new(0xff, 0x00, 0xd9), Bounds::Any, Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

/// A point on a strand: screen position and depth, in logical pixels.
/// Positive depth is towards the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrandPoint {
    /// Position on the surface.
    pub pos: Vec2,
    /// Distance towards the viewer from the helix axis.
    pub depth: f64,
}

/// A pair of opposite strand points linked across the helix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rung {
    /// Point on the first strand.
    pub left: StrandPoint,
    /// Point on the second strand.
    pub right: StrandPoint,
    /// Kind of base pair, selecting its color.
    pub kind: u8,
}

/// A double helix spinning around the vertical axis.
#[derive(Clone, Debug)]
pub struct DnaHelix {
    rotation: f64,
    kinds: Vec<u8>,
}

impl DnaHelix {
    /// Current rotation in radians, in `[0, 2π)`.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// The base pairs from top to bottom.
    pub fn rungs(&self, cfg: &DnaHelixConfig, viewport: &Viewport) -> Vec<Rung> {
        let center = viewport.center();
        let height = (viewport.css_height * 0.8).min(MAX_HEIGHT);
        let r = cfg.helix_radius;
        let segments = cfg.segments.min(MAX_SEGMENTS);
        (0..segments)
            .map(|i| {
                let t = i as f64 / segments as f64;
                let y = center.y - height / 2.0 + t * height;
                let angle = t * cfg.turns * TAU + self.rotation;
                let point = |angle: f64| StrandPoint {
                    pos: Vec2::new(center.x + angle.cos() * r, y),
                    depth: angle.sin() * r,
                };
                Rung {
                    left: point(angle),
                    right: point(angle + PI),
                    kind: self.kinds[i as usize],
                }
            })
            .collect()
    }
}

impl Effect for DnaHelix {
    type Config = DnaHelixConfig;
    const NAME: &'static str = "dna_helix";

    fn build(setup: &mut Setup<DnaHelixConfig>) -> Self {
        let kinds = (0..MAX_SEGMENTS).map(|_| setup.rng.gen_range(0..4)).collect();
        Self {
            rotation: 0.0,
            kinds,
        }
    }

    fn resize(&mut self, _setup: &mut Setup<DnaHelixConfig>) -> bool {
        // geometry is derived from the viewport on every frame
        false
    }

    fn update(&mut self, frame: &mut Frame<DnaHelixConfig>) {
        self.rotation = (self.rotation + frame.config.speed / 1000.0 * 0.5).rem_euclid(TAU);
    }

    fn draw(&self, ctx: &DrawContext<DnaHelixConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);
        let rungs = self.rungs(cfg, vp);
        let r = cfg.helix_radius;
        let glow = cfg.glow_intensity / 100.0;

        for rung in &rungs {
            let color = pair_color(rung.kind);
            let (a, b) = (vp.to_pixels(rung.left.pos), vp.to_pixels(rung.right.pos));
            raster::line(buf, a, b, 2.0 * vp.dpr, color, 0.3 * glow, BlendMode::Over);
        }

        // far nodes first
        let mut nodes: Vec<(StrandPoint, u8)> = rungs
            .iter()
            .flat_map(|rung| [(rung.left, rung.kind), (rung.right, rung.kind)])
            .collect();
        nodes.sort_by(|a, b| a.0.depth.total_cmp(&b.0.depth));
        for (point, kind) in nodes {
            let color = pair_color(kind);
            let opacity = 0.65 + 0.35 * point.depth / r;
            let center = vp.to_pixels(point.pos);
            if glow > 0.0 {
                let halo = (NODE_RADIUS + glow * 15.0) * vp.dpr;
                raster::soft_disc(buf, center, halo, color, opacity * 0.5, BlendMode::Add);
            }
            raster::disc(buf, center, NODE_RADIUS * vp.dpr, color, opacity, BlendMode::Over);
        }

        let strands = [
            (cfg.color1, rungs.iter().map(|r| r.left).collect::<Vec<_>>()),
            (cfg.color2, rungs.iter().map(|r| r.right).collect::<Vec<_>>()),
        ];
        for (color, points) in &strands {
            let pixels: Vec<Vec2> = points.iter().map(|p| vp.to_pixels(p.pos)).collect();
            if glow > 0.0 {
                let width = (STRAND_WIDTH + glow * 20.0) * vp.dpr;
                raster::polyline(buf, &pixels, width, *color, 0.25, BlendMode::Add);
            }
            raster::polyline(buf, &pixels, STRAND_WIDTH * vp.dpr, *color, 1.0, BlendMode::Over);
        }
    }
}
