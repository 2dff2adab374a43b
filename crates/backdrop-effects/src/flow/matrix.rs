//! Columns of glyphs raining down the surface.
//!
//! Each column is a streak of [`TRAIL_LENGTH`] glyphs
//! led by its brightest glyph at the bottom and fading upwards.
//! Glyphs are drawn from a built-in 3x5 dot font
//! and occasionally flicker to a different glyph.

use super::Body;
use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, DrawContext, Effect, EffectRng, Frame,
    PixelBuffer, Rgb, Rgba, Role, Setup, Vec2, Viewport,
};

const BACKGROUND: Rgba = [10, 14, 10, 255];

/// Number of glyphs in a column.
pub const TRAIL_LENGTH: usize = 30;

/// Chance per frame that one glyph of a column changes.
const FLICKER_CHANCE: f64 = 0.05;

/// Dot patterns of the glyphs, three bits per row from the top,
/// most significant bit at the top left.
const GLYPHS: [u16; 16] = [
    0b111_101_101_101_111, // 0
    0b010_110_010_010_111, // 1
    0b111_001_111_100_111, // 2
    0b111_001_111_001_111, // 3
    0b101_101_111_001_001, // 4
    0b111_100_111_001_111, // 5
    0b111_100_111_101_111, // 6
    0b111_001_010_010_010, // 7
    0b111_101_111_101_111, // 8
    0b111_101_111_001_111, // 9
    0b010_101_111_101_101, // A
    0b111_001_010_010_100,
    0b010_111_011_101_101,
    0b101_101_001_001_110,
    0b111_001_010_101_100,
    0b111_000_111_001_010,
];

effect_config! {
    /// Config of the [`Matrix`] effect.
    pub struct MatrixConfig;
    /// Partial update of a [`MatrixConfig`].
    pub struct MatrixPatch;
    {
        /// How fast columns fall. Default: 50.
        speed: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Glyph color. Default: green.
        color: Rgb = Rgb::new(0x00, 0xff, 0x41), Bounds::Any, Role::Cosmetic;
        /// Share of grid columns in use, in percent. Default: 50.
        density: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::STRUCTURAL;
        /// Strength of the glow around leading glyphs. Default: 30.
        glow: f64 = 30.0, Bounds::Range(0.0, 100.0), Role::Cosmetic;
        /// Glyph cell size in logical pixels. Default: 16.
        font_size: u32 = 16, Bounds::Range(10, 40), Role::STRUCTURAL;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl MatrixConfig {
    /// Number of columns generated on a surface of the given logical width.
    pub fn column_count(&self, width: f64) -> usize {
        (width / self.font_size as f64 * (self.density / 100.0)).floor() as usize
    }
}

#[derive(Clone, Debug)]
struct Column {
    /// Position of the lowest glyph's cell, bottom left corner.
    /// Velocity is the fall per frame at speed 50.
    body: Body,
    /// Glyph indices, leading glyph first.
    glyphs: [u8; TRAIL_LENGTH],
}

impl Column {
    fn spawn(cfg: &MatrixConfig, viewport: &Viewport, rng: &mut EffectRng) -> Self {
        let cell = cfg.font_size as f64;
        let slots = ((viewport.css_width / cell).floor() as u32).max(1);
        let h = viewport.css_height;
        let mut glyphs = [0; TRAIL_LENGTH];
        for g in &mut glyphs {
            *g = random_glyph(rng);
        }
        Self {
            body: Body {
                pos: Vec2::new(rng.gen_range(0..slots) as f64 * cell, rng.gen::<f64>() * h - h),
                vel: Vec2::new(0.0, rng.gen::<f64>() * 0.5 + 0.5),
                phase: 0.0,
            },
            glyphs,
        }
    }
}

fn random_glyph(rng: &mut EffectRng) -> u8 {
    rng.gen_range(0..GLYPHS.len() as u8)
}

/// Draw glyph `index` in the cell whose bottom left corner is `corner`,
/// all in logical pixels.
fn draw_glyph(
    buf: &mut PixelBuffer,
    viewport: &Viewport,
    index: u8,
    corner: Vec2,
    cell: f64,
    color: Rgb,
    alpha: f64,
) {
    let dot = cell / 6.0;
    let origin = Vec2::new(
        corner.x + (cell - 3.0 * dot) / 2.0,
        corner.y - cell + (cell - 5.0 * dot) / 2.0,
    );
    let bits = GLYPHS[index as usize % GLYPHS.len()];
    for row in 0..5 {
        for col in 0..3 {
            if bits & (1 << (14 - (row * 3 + col))) == 0 {
                continue;
            }
            let min = origin + Vec2::new(col as f64, row as f64) * dot;
            raster::rect(
                buf,
                viewport.to_pixels(min),
                viewport.to_pixels(min + Vec2::repeat(dot)),
                color,
                alpha,
                BlendMode::Add,
            );
        }
    }
}

/// Falling glyph columns.
#[derive(Clone, Debug)]
pub struct Matrix {
    columns: Vec<Column>,
}

impl Matrix {
    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Bottom left corners of the leading glyph cells, in logical pixels.
    pub fn heads(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.columns.iter().map(|c| c.body.pos)
    }
}

impl Effect for Matrix {
    type Config = MatrixConfig;
    const NAME: &'static str = "matrix";

    fn build(setup: &mut Setup<MatrixConfig>) -> Self {
        let (cfg, vp) = (setup.config, setup.viewport);
        let rng = &mut *setup.rng;
        let columns = (0..cfg.column_count(vp.css_width))
            .map(|_| Column::spawn(cfg, vp, rng))
            .collect();
        Self { columns }
    }

    fn update(&mut self, frame: &mut Frame<MatrixConfig>) {
        let cfg = frame.config;
        let fall = cfg.speed / 50.0;
        let trail = TRAIL_LENGTH as f64 * cfg.font_size as f64;
        for column in &mut self.columns {
            column.body.pos += column.body.vel * fall;

            if frame.rng.gen_bool(FLICKER_CHANCE) {
                let i = frame.rng.gen_range(0..TRAIL_LENGTH);
                column.glyphs[i] = random_glyph(frame.rng);
            }

            if column.body.pos.y - trail > frame.viewport.css_height {
                *column = Column::spawn(cfg, frame.viewport, frame.rng);
            }
        }
    }

    fn draw(&self, ctx: &DrawContext<MatrixConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);
        let cell = cfg.font_size as f64;

        for column in &self.columns {
            let head = column.body.pos;
            if cfg.glow > 0.0 {
                let center = head + Vec2::new(cell / 2.0, -cell / 2.0);
                raster::soft_disc(
                    buf,
                    vp.to_pixels(center),
                    (cell / 2.0 + cfg.glow / 100.0 * 20.0) * vp.dpr,
                    cfg.color,
                    cfg.glow / 100.0 * 0.5,
                    BlendMode::Add,
                );
            }
            for (i, &glyph) in column.glyphs.iter().enumerate() {
                let corner = head - Vec2::new(0.0, i as f64 * cell);
                if corner.y < 0.0 || corner.y - cell > vp.css_height {
                    continue;
                }
                let alpha = 1.0 - i as f64 / TRAIL_LENGTH as f64;
                draw_glyph(buf, vp, glyph, corner, cell, cfg.color, alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use backdrop_core::EffectConfig;

    fn step(matrix: &mut Matrix, cfg: &MatrixConfig, vp: &Viewport, rng: &mut EffectRng) {
        matrix.update(&mut Frame {
            config: cfg,
            viewport: vp,
            pointer: None,
            dt: 1.0 / 60.0,
            time: 0.0,
            rng,
        });
    }

    #[test]
    fn columns_sit_on_the_grid_above_the_surface() {
        let cfg = MatrixConfig::default();
        let vp = viewport(320.0, 240.0, 2.0);
        let mut rng = rng();
        let matrix = Matrix::build(&mut setup(&cfg, &vp, &mut rng));
        assert_eq!(matrix.column_count(), 10);
        for head in matrix.heads() {
            assert_eq!(head.x % 16.0, 0.0);
            assert!((0.0..320.0).contains(&head.x));
            assert!((-240.0..0.0).contains(&head.y));
        }
    }

    #[test]
    fn density_and_font_size_rebuild_on_any_change() {
        let built = MatrixConfig::default();
        let denser = MatrixConfig {
            density: 51.0,
            ..built.clone()
        };
        let bigger = MatrixConfig {
            font_size: 17,
            ..built.clone()
        };
        let recolored = MatrixConfig {
            color: Rgb::new(255, 255, 255),
            speed: 90.0,
            ..built.clone()
        };
        assert!(denser.needs_rebuild(&built));
        assert!(bigger.needs_rebuild(&built));
        assert!(!recolored.needs_rebuild(&built));
    }

    #[test]
    fn columns_fall_and_respawn() {
        let cfg = MatrixConfig::default();
        let vp = viewport(160.0, 100.0, 1.0);
        let mut rng = rng();
        let mut matrix = Matrix::build(&mut setup(&cfg, &vp, &mut rng));
        let before: Vec<Column> = matrix.columns.clone();
        step(&mut matrix, &cfg, &vp, &mut rng);
        for (column, old) in matrix.columns.iter().zip(&before) {
            let fallen = column.body.pos.y - old.body.pos.y;
            assert_eq!(column.body.pos.x, old.body.pos.x);
            assert!((0.5..=1.0).contains(&fallen), "{fallen}");
        }

        // push the first column's whole trail past the bottom
        let trail = TRAIL_LENGTH as f64 * 16.0;
        matrix.columns[0].body.pos.y = 100.0 + trail;
        step(&mut matrix, &cfg, &vp, &mut rng);
        assert!(matrix.columns[0].body.pos.y < 0.0);
    }

    #[test]
    fn glyphs_light_their_cell() {
        let cfg = MatrixConfig::default();
        let vp = viewport(96.0, 120.0, 1.0);
        let matrix = Matrix {
            columns: vec![Column {
                body: Body::at(Vec2::new(32.0, 100.0)),
                // digit eight fills its top row
                glyphs: [8; TRAIL_LENGTH],
            }],
        };
        let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
        matrix.draw(
            &DrawContext {
                config: &cfg,
                viewport: &vp,
                pointer: None,
                time: 0.0,
            },
            &mut buf,
        );
        // top left dot of the leading glyph
        assert_eq!(buf.get(36, 86).map(|p| p[1]), Some(255));
        // the middle of the second row is empty in an eight
        assert!(buf.get(40, 89).unwrap()[1] < 255);
        // other columns are untouched
        assert_eq!(buf.get(8, 86), Some(BACKGROUND));
        assert_eq!(buf.get(80, 50), Some(BACKGROUND));
    }
}
