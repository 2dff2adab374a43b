//! Interference of circular waves from point sources.

use backdrop_core::{
    effect_config, raster, BlendMode, Bounds, DrawContext, Effect, Frame, PixelBuffer, Rgb, Rgba,
    Role, Setup, Vec2, Viewport,
};
use std::{collections::VecDeque, f64::consts::TAU};

/// Most sources that can be added by clicking.
/// Adding more evicts the oldest.
pub const MAX_USER_SOURCES: usize = 10;

/// Color behind the field when there are no sources.
const BACKGROUND: Rgba = [10, 14, 10, 255];

/// Distance over which wave amplitude halves.
const DAMPING_DISTANCE: f64 = 500.0;

effect_config! {
    /// Config of the [`Wave`] effect.
    pub struct WaveConfig;
    /// Partial update of a [`WaveConfig`].
    pub struct WavePatch;
    {
        /// Phase advance per frame, in units of 1e-4 radians. Default: 50.
        speed: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Distance between wave crests in logical pixels. Default: 60.
        wavelength: f64 = 60.0, Bounds::Range(20.0, 200.0), Role::Cosmetic;
        /// Strength of the field in percent. Default: 80.
        amplitude: f64 = 80.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Number of built-in sources. Default: 2.
        source_count: u32 = 2, Bounds::Range(0, 8), Role::STRUCTURAL;
        /// Detail of the field; higher means smaller grid cells. Default: 50.
        resolution: f64 = 50.0, Bounds::Range(1.0, 100.0), Role::Cosmetic;
        /// Color of troughs.
        color1: Rgb = Rgb::new(0x00, 0x1f, 0x3f), Bounds::Any, Role::Cosmetic;
        /// Color of crests, also used to mark sources.
        color2: Rgb = Rgb::new(0x39, 0xcc, 0xcc), Bounds::Any, Role::Cosmetic;
        /// Frames per second. Default: 60.
        fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
    }
}

impl WaveConfig {
    /// Size of a field grid cell in logical pixels.
    pub fn cell_size(&self) -> f64 {
        (10.0 - self.resolution / 20.0).max(2.0)
    }
}

/// Positions of `count` built-in sources on a surface:
/// one in the center, two side by side, or more on a ring.
pub fn source_layout(count: u32, viewport: &Viewport) -> Vec<Vec2> {
    let center = viewport.center();
    match count {
        0 => Vec::new(),
        1 => vec![center],
        2 => {
            let half_spacing = viewport.css_width * 0.3 / 2.0;
            vec![
                center - Vec2::new(half_spacing, 0.0),
                center + Vec2::new(half_spacing, 0.0),
            ]
        }
        n => {
            let radius = viewport.css_width.min(viewport.css_height) * 0.3;
            (0..n)
                .map(|i| {
                    let angle = i as f64 / n as f64 * TAU;
                    center + Vec2::new(angle.cos(), angle.sin()) * radius
                })
                .collect()
        }
    }
}

/// Superposed field value at `p`:
/// the mean of damped sine waves from every source, scaled by amplitude.
///
/// Lies in `[-1, 1]`; zero without sources.
pub fn field_value(p: Vec2, sources: &[Vec2], phase: f64, wavelength: f64, amplitude: f64) -> f64 {
    if sources.is_empty() {
        return 0.0;
    }
    let k = TAU / wavelength;
    let sum: f64 = sources
        .iter()
        .map(|s| {
            let d = (p - s).norm();
            (k * d - phase).sin() / (1.0 + d / DAMPING_DISTANCE)
        })
        .sum();
    sum / sources.len() as f64 * (amplitude / 100.0)
}

/// A wave interference pattern.
///
/// Clicking with pointer interaction on adds extra sources,
/// which are removed again when interaction is turned off.
#[derive(Clone, Debug)]
pub struct Wave {
    sources: Vec<Vec2>,
    user_sources: VecDeque<Vec2>,
    phase: f64,
}

impl Wave {
    /// Built-in sources.
    pub fn sources(&self) -> &[Vec2] {
        &self.sources
    }

    /// Sources added by clicking, oldest first.
    pub fn user_sources(&self) -> impl Iterator<Item = &Vec2> {
        self.user_sources.iter()
    }

    /// Current phase of all sources.
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl Effect for Wave {
    type Config = WaveConfig;
    const NAME: &'static str = "wave";

    fn build(setup: &mut Setup<WaveConfig>) -> Self {
        Self {
            sources: source_layout(setup.config.source_count, setup.viewport),
            user_sources: VecDeque::new(),
            phase: 0.0,
        }
    }

    fn rebuild(&mut self, setup: &mut Setup<WaveConfig>) {
        // user sources survive a new layout
        self.sources = source_layout(setup.config.source_count, setup.viewport);
    }

    fn update(&mut self, frame: &mut Frame<WaveConfig>) {
        self.phase += frame.config.speed / 1000.0 * 0.1;
    }

    fn draw(&self, ctx: &DrawContext<WaveConfig>, buf: &mut PixelBuffer) {
        let cfg = ctx.config;
        let vp = ctx.viewport;
        buf.fill(BACKGROUND);

        let all: Vec<Vec2> = self
            .sources
            .iter()
            .chain(&self.user_sources)
            .copied()
            .collect();
        if all.is_empty() {
            return;
        }

        let cell = cfg.cell_size();
        let to_px = |v: f64| (v * vp.dpr).floor() as usize;
        let mut y = 0.0;
        while y < vp.css_height {
            let (py0, py1) = (to_px(y), to_px(y + cell));
            let mut x = 0.0;
            while x < vp.css_width {
                let (px0, px1) = (to_px(x), to_px(x + cell));
                let value = field_value(
                    Vec2::new(x, y),
                    &all,
                    self.phase,
                    cfg.wavelength,
                    cfg.amplitude,
                );
                let intensity = ((value + 1.0) / 2.0).clamp(0.0, 1.0);
                let color = cfg.color1.lerp(cfg.color2, intensity).opaque();
                buf.fill_rect(px0, py0, px1 - px0, py1 - py0, color);
                x += cell;
            }
            y += cell;
        }

        // mark the built-in sources on strong fields
        if cfg.amplitude > 30.0 {
            for &source in &self.sources {
                let p = vp.to_pixels(source);
                raster::soft_disc(buf, p, 15.0 * vp.dpr, cfg.color2, 0.5, BlendMode::Over);
                raster::disc(buf, p, 5.0 * vp.dpr, cfg.color2, 1.0, BlendMode::Over);
            }
        }
    }

    fn release(&mut self) {
        self.user_sources.clear();
    }

    fn click(&mut self, pos: Vec2, _setup: &mut Setup<WaveConfig>) {
        self.user_sources.push_back(pos);
        if self.user_sources.len() > MAX_USER_SOURCES {
            if let Some(oldest) = self.user_sources.pop_front() {
                log::trace!("wave: dropping source at ({}, {})", oldest.x, oldest.y);
            }
        }
    }
}
