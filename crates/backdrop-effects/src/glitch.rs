//! Digital corruption over a static backdrop:
//! chromatic aberration, displaced blocks and scanlines.
//!
//! The backdrop is rendered once into a cached image.
//! Every frame starts from that image, then randomly shifts
//! the red and blue channels apart and copies short-lived blocks
//! of the frame to offset positions.

use backdrop_core::{
    effect_config, rand::Rng, raster, BlendMode, Bounds, ChangeSet, ColorMap, DrawContext, Effect,
    Frame, PixelBuffer, Rgb, Role, Setup, Vec2, Viewport,
};

/// Number of outlined squares in the backdrop.
const SQUARE_COUNT: usize = 10;

/// Opacity of the tint over a displaced block.
const TINT_ALPHA: f64 = 0x20 as f64 / 255.0;

/// Distance between scanlines in logical pixels.
const SCANLINE_SPACING: usize = 4;

/// Lifetime of new blocks in frames.
const BLOCK_LIFETIME: std::ops::Range<u32> = 5..15;

effect_config! {
    /// Config of the [`Glitch`] effect.
    pub struct GlitchConfig;
    /// Partial update of a [`GlitchConfig`].
    pub struct GlitchPatch;
    {
        /// Strength of the channel shift and block displacement. Default: 50.
        intensity: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Color of the backdrop squares and of half the block tints.
        color1: Rgb = Rgb::new(0xff, 0x00, 0x80), Bounds::Any, Role::Cosmetic;
        /// Color of the other half of the block tints.
        color2: Rgb = Rgb::new(0x00, 0xff, 0xff), Bounds::Any, Role::Cosmetic;
        /// How often glitches happen. Default: 30.
        frequency: f64 = 30.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Typical block size in logical pixels. Default: 50.
        block_size: f64 = 50.0, Bounds::Range(10.0, 100.0), Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl GlitchConfig {
    /// Chance per frame of a channel shift.
    pub fn shift_chance(&self) -> f64 {
        (self.frequency / 200.0).clamp(0.0, 1.0)
    }

    /// Chance per frame of spawning new blocks.
    pub fn block_chance(&self) -> f64 {
        (self.frequency / 100.0 * 0.1).clamp(0.0, 1.0)
    }
}

/// A region of the frame drawn again at an offset, in logical pixels.
#[derive(Clone, Debug)]
struct Block {
    pos: Vec2,
    size: Vec2,
    offset: Vec2,
    lifetime: u32,
    second_color: bool,
}

/// Glitching backdrop.
#[derive(Clone, Debug)]
pub struct Glitch {
    /// Top left corner and side length of each square, in logical pixels.
    squares: Vec<(Vec2, f64)>,
    backdrop: PixelBuffer,
    blocks: Vec<Block>,
    shift: bool,
}

impl Glitch {
    /// Number of displaced blocks on screen.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the channels are shifted this frame.
    pub fn is_shifted(&self) -> bool {
        self.shift
    }

    fn render_backdrop(&mut self, cfg: &GlitchConfig, vp: &Viewport) {
        let (w, h) = (vp.pixel_width, vp.pixel_height);
        self.backdrop = PixelBuffer::new(w, h);
        let palette = ColorMap::piecewise(
            256,
            [
                Rgb::new(0x1a, 0x0a, 0x2e),
                Rgb::new(0x16, 0x21, 0x3e),
                Rgb::new(0x0f, 0x34, 0x60),
            ],
        );
        // diagonal from the top left to the bottom right corner
        let (wf, hf) = (w as f64, h as f64);
        let norm = wf * wf + hf * hf;
        for y in 0..h {
            for x in 0..w {
                let t = ((x as f64 + 0.5) * wf + (y as f64 + 0.5) * hf) / norm;
                self.backdrop.put(x, y, palette.sample(t).opaque());
            }
        }

        for &(corner, side) in &self.squares {
            let outline = [
                corner,
                corner + Vec2::new(side, 0.0),
                corner + Vec2::new(side, side),
                corner + Vec2::new(0.0, side),
                corner,
            ]
            .map(|p| vp.to_pixels(p));
            raster::polyline(
                &mut self.backdrop,
                &outline,
                2.0 * vp.dpr,
                cfg.color1,
                1.0,
                BlendMode::Over,
            );
        }
    }
}

impl Effect for Glitch {
    type Config = GlitchConfig;
    const NAME: &'static str = "glitch";

    fn build(setup: &mut Setup<GlitchConfig>) -> Self {
        let vp = setup.viewport;
        let rng = &mut *setup.rng;
        let squares = (0..SQUARE_COUNT)
            .map(|_| {
                let corner =
                    Vec2::new(rng.gen::<f64>() * vp.css_width, rng.gen::<f64>() * vp.css_height);
                (corner, rng.gen::<f64>() * 100.0 + 50.0)
            })
            .collect();
        let mut glitch = Self {
            squares,
            backdrop: PixelBuffer::new(0, 0),
            blocks: Vec::new(),
            shift: false,
        };
        glitch.render_backdrop(setup.config, vp);
        glitch
    }

    fn reconfigure(&mut self, changes: &ChangeSet, setup: &mut Setup<GlitchConfig>) {
        if changes.contains("color1") {
            self.render_backdrop(setup.config, setup.viewport);
        }
    }

    fn update(&mut self, frame: &mut Frame<GlitchConfig>) {
        let cfg = frame.config;
        let vp = frame.viewport;
        let rng = &mut *frame.rng;

        for block in &mut self.blocks {
            block.lifetime = block.lifetime.saturating_sub(1);
        }
        self.blocks.retain(|b| b.lifetime > 0);

        if rng.gen_bool(cfg.block_chance()) {
            let displacement = cfg.intensity / 100.0 * 50.0;
            let count = rng.gen_range(1..=3);
            for _ in 0..count {
                let mut side = || rng.gen::<f64>() * cfg.block_size + cfg.block_size / 2.0;
                let size = Vec2::new(side(), side());
                self.blocks.push(Block {
                    pos: Vec2::new(rng.gen::<f64>() * vp.css_width, rng.gen::<f64>() * vp.css_height),
                    size,
                    offset: Vec2::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5) * displacement,
                    lifetime: rng.gen_range(BLOCK_LIFETIME),
                    second_color: rng.gen(),
                });
            }
        }

        self.shift = rng.gen_bool(cfg.shift_chance());
    }

    fn draw(&self, ctx: &DrawContext<GlitchConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        if self.shift {
            let shift = (cfg.intensity / 100.0 * 10.0 * vp.dpr).floor() as usize;
            shift_channels(buf, &self.backdrop, shift);
        } else {
            for (dst, src) in buf.pixels_mut().iter_mut().zip(self.backdrop.pixels()) {
                *dst = *src;
            }
        }

        for block in &self.blocks {
            let src = vp.to_pixels(block.pos);
            let size = vp.to_pixels(block.size);
            let dest = vp.to_pixels(block.pos + block.offset);
            copy_region(
                buf,
                (src.x as usize, src.y as usize),
                (size.x as usize, size.y as usize),
                (dest.x.max(0.0) as usize, dest.y.max(0.0) as usize),
            );
            let tint = if block.second_color { cfg.color2 } else { cfg.color1 };
            raster::rect(buf, dest, dest + size, tint, TINT_ALPHA, BlendMode::Over);
        }

        let white = Rgb::new(255, 255, 255);
        let (width, height) = (vp.css_width, vp.css_height);
        for y in (0..height.ceil() as usize).step_by(SCANLINE_SPACING) {
            let y = y as f64;
            raster::line(
                buf,
                vp.to_pixels(Vec2::new(0.0, y)),
                vp.to_pixels(Vec2::new(width, y)),
                vp.dpr,
                white,
                0.05,
                BlendMode::Over,
            );
        }
    }
}

/// Write `src` into `buf` with the red channel sampled `shift` pixels
/// to the right and the blue channel `shift` pixels to the left,
/// clamped at the edges.
fn shift_channels(buf: &mut PixelBuffer, src: &PixelBuffer, shift: usize) {
    let width = src.width();
    if width == 0 {
        return;
    }
    let src = src.pixels();
    for (dst_row, src_row) in buf.pixels_mut().chunks_mut(width).zip(src.chunks(width)) {
        for (x, px) in dst_row.iter_mut().enumerate() {
            let red = src_row[(x + shift).min(width - 1)][0];
            let blue = src_row[x.saturating_sub(shift)][2];
            let [_, green, _, alpha] = src_row[x];
            *px = [red, green, blue, alpha];
        }
    }
}

/// Copy the `size` pixels at `src` to `dest`, clipped to the buffer.
/// Overlapping regions copy the pixels as they were before the copy.
fn copy_region(
    buf: &mut PixelBuffer,
    src: (usize, usize),
    size: (usize, usize),
    dest: (usize, usize),
) {
    let (w, h) = (buf.width(), buf.height());
    if src.0 >= w || src.1 >= h {
        return;
    }
    let cols = size.0.min(w - src.0);
    let rows = size.1.min(h - src.1);
    let region: Vec<_> = (0..rows)
        .flat_map(|y| (0..cols).map(move |x| (x, y)))
        .filter_map(|(x, y)| Some(((x, y), buf.get(src.0 + x, src.1 + y)?)))
        .collect();
    for ((x, y), px) in region {
        buf.put(dest.0 + x, dest.1 + y, px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use backdrop_core::EffectRng;

    fn step(glitch: &mut Glitch, cfg: &GlitchConfig, vp: &Viewport, rng: &mut EffectRng) {
        glitch.update(&mut Frame {
            config: cfg,
            viewport: vp,
            pointer: None,
            dt: 1.0 / 60.0,
            time: 0.0,
            rng,
        });
    }

    #[test]
    fn channel_shift_splits_red_and_blue() {
        let mut src = PixelBuffer::new(10, 4);
        src.fill([0, 0, 0, 255]);
        src.put(5, 2, [255, 255, 255, 255]);
        let mut buf = PixelBuffer::new(10, 4);
        shift_channels(&mut buf, &src, 2);
        assert_eq!(buf.get(3, 2), Some([255, 0, 0, 255]));
        assert_eq!(buf.get(5, 2), Some([0, 255, 0, 255]));
        assert_eq!(buf.get(7, 2), Some([0, 0, 255, 255]));
        assert_eq!(buf.get(5, 1), Some([0, 0, 0, 255]));

        // samples past the edge repeat the edge pixel
        let mut edge = PixelBuffer::new(10, 4);
        edge.fill([0, 0, 0, 255]);
        edge.put(9, 0, [255, 255, 255, 255]);
        shift_channels(&mut buf, &edge, 3);
        assert_eq!(buf.get(9, 0), Some([255, 255, 0, 255]));
        assert_eq!(buf.get(8, 0).map(|p| p[0]), Some(255));
    }

    #[test]
    fn blocks_copy_their_region_clipped_to_the_buffer() {
        let mut buf = PixelBuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                buf.put(x, y, [x as u8, y as u8, 0, 255]);
            }
        }
        copy_region(&mut buf, (1, 1), (2, 2), (2, 2));
        assert_eq!(buf.get(2, 2), Some([1, 1, 0, 255]));
        assert_eq!(buf.get(3, 3), Some([2, 2, 0, 255]));
        assert_eq!(buf.get(4, 4), Some([4, 4, 0, 255]));

        copy_region(&mut buf, (6, 6), (5, 5), (0, 0));
        assert_eq!(buf.get(1, 1), Some([7, 7, 0, 255]));
        assert_eq!(buf.get(2, 1), Some([2, 1, 0, 255]));
        copy_region(&mut buf, (0, 0), (3, 3), (7, 7));
        assert_eq!(buf.get(7, 7), Some([6, 6, 0, 255]));
    }

    #[test]
    fn blocks_expire_and_stay_bounded() {
        let cfg = GlitchConfig {
            frequency: 100.0,
            ..Default::default()
        };
        let vp = viewport(120.0, 80.0, 1.0);
        let mut rng = rng();
        let mut glitch = Glitch::build(&mut setup(&cfg, &vp, &mut rng));
        glitch.blocks.push(Block {
            pos: Vec2::new(10.0, 10.0),
            size: Vec2::new(20.0, 20.0),
            offset: Vec2::new(5.0, 0.0),
            lifetime: 1,
            second_color: false,
        });
        step(&mut glitch, &cfg, &vp, &mut rng);
        // new blocks start with at least the shortest lifetime
        assert!(glitch.blocks.iter().all(|b| b.lifetime >= BLOCK_LIFETIME.start));

        let mut spawned = false;
        for _ in 0..1000 {
            step(&mut glitch, &cfg, &vp, &mut rng);
            spawned |= glitch.block_count() > 0;
            assert!(glitch.block_count() <= 3 * BLOCK_LIFETIME.end as usize);
            assert!(glitch.blocks.iter().all(|b| b.lifetime < BLOCK_LIFETIME.end));
        }
        assert!(spawned);
    }

    #[test]
    fn frames_start_from_the_backdrop() {
        let cfg = GlitchConfig::default();
        let vp = viewport(64.0, 48.0, 1.0);
        let mut rng = rng();
        let mut glitch = Glitch::build(&mut setup(&cfg, &vp, &mut rng));
        glitch.squares.clear();
        glitch.render_backdrop(&cfg, &vp);

        let mut buf = PixelBuffer::new(vp.pixel_width, vp.pixel_height);
        buf.fill([255; 4]);
        glitch.draw(
            &DrawContext {
                config: &cfg,
                viewport: &vp,
                pointer: None,
                time: 0.0,
            },
            &mut buf,
        );
        // between scanlines the backdrop shows through untouched
        assert_eq!(buf.get(0, 2), glitch.backdrop.get(0, 2));
        assert_eq!(buf.get(63, 46), glitch.backdrop.get(63, 46));
        // dark purple at the top left, blue at the bottom right
        let top_left = buf.get(0, 2).unwrap();
        let bottom_right = buf.get(63, 46).unwrap();
        assert!(top_left[0] > top_left[1]);
        assert!(bottom_right[2] > top_left[2]);
    }
}
