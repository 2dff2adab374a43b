//! Drifting Voronoi tessellation.
//!
//! A set of sites moves around the surface, bouncing off its edges.
//! Every pixel takes the color of its nearest site,
//! and pixels almost equally close to two sites form the cell borders.

use crate::flow::{extent, Boundary};
use backdrop_core::{
    effect_config, Bounds, ChangeSet, DrawContext, Effect, EffectRng, Frame, PixelBuffer, Rgb,
    Rgba, Role, Setup, Vec2,
};
use rand::Rng;
use rayon::prelude::*;
use std::f64::consts::TAU;

effect_config! {
    /// Config of the [`Tessellation`] effect.
    pub struct TessellationConfig;
    /// Partial update of a [`TessellationConfig`].
    pub struct TessellationPatch;
    {
        /// Multiplier on site velocity. Default: 1.
        speed: f64 = 1.0, Bounds::Range(0.1, 2.0), Role::Cosmetic;
        /// Color at one end of the cell gradient.
        color1: Rgb = Rgb::new(0x1b, 0x26, 0x3b), Bounds::Any, Role::Cosmetic;
        /// Color at the other end of the cell gradient.
        color2: Rgb = Rgb::new(0x41, 0x5a, 0x77), Bounds::Any, Role::Cosmetic;
        /// Number of sites. Default: 30.
        cell_count: u32 = 30, Bounds::Range(0, 100), Role::STRUCTURAL;
        /// How fast sites drift. Default: 30.
        cell_movement: f64 = 30.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Border thickness in logical pixels. Zero disables borders. Default: 2.
        border_width: f64 = 2.0, Bounds::Range(0.0, 10.0), Role::Cosmetic;
        /// Border color.
        border_color: Rgb = Rgb::new(0x0d, 0x1b, 0x2a), Bounds::Any, Role::Cosmetic;
        /// Random spread of cell colors along the gradient, in percent. Default: 20.
        color_variation: f64 = 20.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Pixels are classified in square blocks of this size. Default: 1.
        sample_step: u32 = 1, Bounds::Range(1, 8), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

/// Color of frames without sites.
const BACKGROUND: Rgba = [0, 0, 0, 255];

/// A moving site.
#[derive(Clone, Copy, Debug)]
pub struct Site {
    /// Position in logical pixels.
    pub pos: Vec2,
    /// Unit direction of travel.
    pub heading: Vec2,
    /// Fill color of the site's cell.
    pub color: Rgb,
}

/// Classification of a point relative to the sites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    /// Index of the nearest site.
    pub index: usize,
    /// Distance to the nearest site.
    pub first: f64,
    /// Distance to the second nearest site, infinite if there's only one.
    pub second: f64,
}

/// Find the nearest and second nearest site to `p`.
pub fn nearest_two(p: Vec2, sites: &[Site]) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    for (index, site) in sites.iter().enumerate() {
        let d = (p - site.pos).norm();
        best = Some(match best {
            None => Nearest {
                index,
                first: d,
                second: f64::INFINITY,
            },
            Some(b) if d < b.first => Nearest {
                index,
                first: d,
                second: b.first,
            },
            Some(b) if d < b.second => Nearest { second: d, ..b },
            Some(b) => b,
        });
    }
    best
}

/// Color of the `index`th of `count` sites:
/// its place along the gradient plus a random offset, wrapped.
fn site_color(index: usize, cfg: &TessellationConfig, rng: &mut EffectRng) -> Rgb {
    let count = cfg.cell_count.max(1) as f64;
    let t = (index as f64 / count + rng.gen::<f64>() * cfg.color_variation / 100.0) % 1.0;
    cfg.color1.lerp(cfg.color2, t)
}

/// An animated Voronoi diagram.
#[derive(Clone, Debug)]
pub struct Tessellation {
    sites: Vec<Site>,
}

impl Tessellation {
    /// Current sites.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }
}

impl Effect for Tessellation {
    type Config = TessellationConfig;
    const NAME: &'static str = "tessellation";

    fn build(setup: &mut Setup<TessellationConfig>) -> Self {
        let (w, h) = (setup.viewport.css_width, setup.viewport.css_height);
        let sites = (0..setup.config.cell_count as usize)
            .map(|i| {
                let pos = Vec2::new(setup.rng.gen::<f64>() * w, setup.rng.gen::<f64>() * h);
                let angle = setup.rng.gen::<f64>() * TAU;
                Site {
                    pos,
                    heading: Vec2::new(angle.cos(), angle.sin()),
                    color: site_color(i, setup.config, setup.rng),
                }
            })
            .collect();
        Self { sites }
    }

    fn reconfigure(&mut self, changes: &ChangeSet, setup: &mut Setup<TessellationConfig>) {
        if changes.any(&["color1", "color2", "color_variation"]) {
            log::trace!("tessellation: recoloring {} cells", self.sites.len());
            for (i, site) in self.sites.iter_mut().enumerate() {
                site.color = site_color(i, setup.config, setup.rng);
            }
        }
    }

    fn update(&mut self, frame: &mut Frame<TessellationConfig>) {
        let cfg = frame.config;
        let area = extent(frame.viewport);
        let step = cfg.cell_movement * 0.02 * cfg.speed;
        for site in &mut self.sites {
            site.pos += site.heading * step;
            Boundary::Reflect.apply(&mut site.pos, &mut site.heading, area);
        }
    }

    fn draw(&self, ctx: &DrawContext<TessellationConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        if self.sites.is_empty() {
            buf.fill(BACKGROUND);
            return;
        }
        let width = buf.width();
        if width == 0 {
            return;
        }
        let dpr = ctx.viewport.dpr;
        let step = cfg.sample_step.max(1) as usize;
        let border = cfg.border_color.opaque();

        buf.pixels_mut()
            .par_chunks_mut(width * step)
            .enumerate()
            .for_each(|(block_row, rows)| {
                let y = block_row * step;
                for x in (0..width).step_by(step) {
                    let p = Vec2::new(x as f64, y as f64) / dpr;
                    let Some(nearest) = nearest_two(p, &self.sites) else {
                        continue;
                    };
                    let color = if cfg.border_width > 0.0
                        && nearest.second - nearest.first < cfg.border_width
                    {
                        border
                    } else {
                        self.sites[nearest.index].color.opaque()
                    };
                    let block_w = step.min(width - x);
                    for row in rows.chunks_exact_mut(width) {
                        row[x..x + block_w].fill(color);
                    }
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use backdrop_core::{EffectConfig, Viewport};

    fn draw(effect: &Tessellation, cfg: &TessellationConfig, vp: &Viewport) -> PixelBuffer {
        let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
        effect.draw(
            &DrawContext {
                config: cfg,
                viewport: vp,
                pointer: None,
                time: 0.0,
            },
            &mut buf,
        );
        buf
    }

    #[test]
    fn single_cell_has_no_borders() {
        let cfg = TessellationConfig {
            cell_count: 1,
            border_width: 10.0,
            ..Default::default()
        };
        let vp = viewport(40.0, 30.0, 1.5);
        let mut rng = rng();
        let effect = Tessellation::build(&mut setup(&cfg, &vp, &mut rng));
        let site_color = effect.sites()[0].color.opaque();
        let buf = draw(&effect, &cfg, &vp);
        assert!(buf.pixels().iter().all(|&p| p == site_color));
    }

    #[test]
    fn two_cells_split_with_border_between() {
        let cfg = TessellationConfig {
            border_width: 2.0,
            ..Default::default()
        };
        let effect = Tessellation {
            sites: vec![
                Site {
                    pos: Vec2::new(5.0, 5.0),
                    heading: Vec2::x(),
                    color: Rgb::new(255, 0, 0),
                },
                Site {
                    pos: Vec2::new(15.0, 5.0),
                    heading: Vec2::x(),
                    color: Rgb::new(0, 0, 255),
                },
            ],
        };
        let vp = viewport(20.0, 10.0, 1.0);
        let buf = draw(&effect, &cfg, &vp);
        assert_eq!(buf.get(2, 5), Some([255, 0, 0, 255]));
        assert_eq!(buf.get(17, 5), Some([0, 0, 255, 255]));
        assert_eq!(buf.get(10, 5), Some(cfg.border_color.opaque()));

        // without borders the midline belongs to a cell
        let no_border = TessellationConfig {
            border_width: 0.0,
            ..cfg.clone()
        };
        let buf = draw(&effect, &no_border, &vp);
        assert_ne!(buf.get(10, 5), Some(cfg.border_color.opaque()));
    }

    #[test]
    fn empty_tessellation_draws_background() {
        let cfg = TessellationConfig {
            cell_count: 0,
            ..Default::default()
        };
        let vp = viewport(8.0, 8.0, 1.0);
        let mut rng = rng();
        let effect = Tessellation::build(&mut setup(&cfg, &vp, &mut rng));
        let buf = draw(&effect, &cfg, &vp);
        assert!(buf.pixels().iter().all(|&p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn block_sampling_fills_whole_blocks() {
        let cfg = TessellationConfig {
            cell_count: 12,
            sample_step: 4,
            ..Default::default()
        };
        let vp = viewport(30.0, 18.0, 1.0);
        let mut rng = rng();
        let effect = Tessellation::build(&mut setup(&cfg, &vp, &mut rng));
        let buf = draw(&effect, &cfg, &vp);
        for y in 0..18 {
            for x in 0..30 {
                assert_eq!(buf.get(x, y), buf.get(x - x % 4, y - y % 4));
            }
        }
    }

    #[test]
    fn sites_stay_inside_and_recolor() {
        let mut cfg = TessellationConfig {
            cell_movement: 100.0,
            speed: 2.0,
            ..Default::default()
        };
        let vp = viewport(50.0, 40.0, 1.0);
        let mut rng = rng();
        let mut effect = Tessellation::build(&mut setup(&cfg, &vp, &mut rng));
        for _ in 0..500 {
            effect.update(&mut Frame {
                config: &cfg,
                viewport: &vp,
                pointer: None,
                dt: 1.0 / 60.0,
                time: 0.0,
                rng: &mut rng,
            });
        }
        for site in effect.sites() {
            assert!((0.0..=50.0).contains(&site.pos.x));
            assert!((0.0..=40.0).contains(&site.pos.y));
        }

        let changes = cfg.merge(&TessellationPatch {
            color1: Some(Rgb::new(200, 200, 200)),
            color2: Some(Rgb::new(200, 200, 200)),
            ..Default::default()
        });
        effect.reconfigure(&changes, &mut setup(&cfg, &vp, &mut rng));
        assert!(effect
            .sites()
            .iter()
            .all(|s| s.color == Rgb::new(200, 200, 200)));
    }
}
