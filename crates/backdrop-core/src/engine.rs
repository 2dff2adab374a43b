//! The engine driving an [`Effect`] on a [`Surface`].

use crate::{
    buffer::{FrameBuffers, PixelBuffer},
    clock::FrameClock,
    config::EffectConfig,
    effect::{DrawContext, Effect, Frame, Setup},
    lifecycle::{EngineError, InitError, Lifecycle},
    mouse::MouseState,
    surface::{Surface, Viewport},
    EffectRng, Vec2,
};

/// Number of consecutive failed presents after which a warning is logged.
pub const PRESENT_FAILURE_WARN_THRESHOLD: usize = 3;

/// Longest frame time passed to effects, in seconds.
///
/// If the host stalls (e.g. a background tab), the first frame afterwards
/// sees at most this much time pass instead of jumping ahead.
pub const MAX_FRAME_DT: f64 = 0.25;

/// Outcome of [`Engine::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The engine isn't running.
    Inactive,
    /// Too early for the next frame.
    Skipped,
    /// A frame was produced and presented.
    Presented,
    /// A frame was produced but the surface rejected it.
    /// The previous frame stays visible.
    Dropped,
}

/// State that exists between init and destroy.
struct Active<E, S> {
    effect: E,
    surface: S,
    viewport: Viewport,
    frames: FrameBuffers,
    rng: EffectRng,
}

/// Drives an [`Effect`] through its lifecycle and presents its frames.
///
/// The host calls [`init`][Self::init] once,
/// then [`start`][Self::start] and [`tick`][Self::tick] repeatedly
/// with the current time in milliseconds.
/// Config patches, resizes and pointer events can arrive between ticks.
/// [`destroy`][Self::destroy] is final.
pub struct Engine<E: Effect, S: Surface> {
    config: E::Config,
    // config the effect's structural state was generated from
    built_with: E::Config,
    lifecycle: Lifecycle,
    clock: FrameClock,
    mouse: MouseState,
    time: f64,
    // timestamp of the last accepted frame, or of start
    last_frame_at: f64,
    present_failures: usize,
    active: Option<Active<E, S>>,
}

impl<E: Effect, S: Surface> Engine<E, S> {
    /// Create an engine with the given config.
    /// Out-of-range values are clamped.
    pub fn new(mut config: E::Config) -> Self {
        config.clamp();
        Self {
            clock: FrameClock::new(config.fps()),
            built_with: config.clone(),
            config,
            lifecycle: Lifecycle::Uninitialized,
            mouse: MouseState::default(),
            time: 0.0,
            last_frame_at: 0.0,
            present_failures: 0,
            active: None,
        }
    }

    /// Attach to a surface and generate the effect's state.
    ///
    /// On failure the engine stays uninitialized and `init` can be retried.
    pub fn init(&mut self, mut surface: S, mut rng: EffectRng) -> Result<(), InitError> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Destroyed => return Err(InitError::Destroyed),
            _ => return Err(InitError::AlreadyInitialized),
        }
        surface.acquire().map_err(InitError::NoContext)?;

        let viewport = Viewport::measure(&surface).unwrap_or_else(|| {
            log::debug!("{}: surface has zero area, using a 1x1 placeholder", E::NAME);
            PLACEHOLDER
        });
        let effect = E::build(&mut Setup {
            config: &self.config,
            viewport: &viewport,
            rng: &mut rng,
        });
        self.active = Some(Active {
            effect,
            surface,
            frames: FrameBuffers::new(viewport.pixel_width, viewport.pixel_height),
            viewport,
            rng,
        });
        self.built_with = self.config.clone();
        self.lifecycle = Lifecycle::Initialized;
        log::debug!(
            "{}: initialized at {}x{} pixels",
            E::NAME,
            viewport.pixel_width,
            viewport.pixel_height
        );
        Ok(())
    }

    /// Start producing frames. `now` is the current time in milliseconds.
    ///
    /// Starting a running engine does nothing.
    pub fn start(&mut self, now: f64) -> Result<(), EngineError> {
        self.lifecycle.require_attached()?;
        if self.lifecycle != Lifecycle::Running {
            self.clock.reset(now);
            self.last_frame_at = now;
            self.lifecycle = Lifecycle::Running;
            log::debug!("{}: started", E::NAME);
        }
        Ok(())
    }

    /// Stop producing frames. State is kept.
    ///
    /// Stopping an engine that isn't running does nothing.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.lifecycle.require_attached()?;
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Stopped;
            log::debug!("{}: stopped", E::NAME);
        }
        Ok(())
    }

    /// Tear down the engine, releasing the surface and all state.
    /// Every later call fails with [`EngineError::Destroyed`].
    pub fn destroy(&mut self) {
        if self.lifecycle != Lifecycle::Destroyed {
            self.active = None;
            self.lifecycle = Lifecycle::Destroyed;
            log::debug!("{}: destroyed", E::NAME);
        }
    }

    /// Merge a partial config.
    ///
    /// Values are clamped to their ranges.
    /// Structural changes regenerate the effect's state immediately;
    /// other changes take effect on the next frame.
    pub fn update_config(
        &mut self,
        patch: &<E::Config as EffectConfig>::Patch,
    ) -> Result<(), EngineError> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(EngineError::Destroyed);
        }
        let changes = self.config.merge(patch);
        if changes.is_empty() {
            return Ok(());
        }
        if changes.fps_changed() {
            self.clock.set_fps(self.config.fps());
        }

        let Some(Active {
            effect,
            viewport,
            rng,
            ..
        }) = self.active.as_mut()
        else {
            // nothing built yet, init picks up the new config
            self.built_with = self.config.clone();
            return Ok(());
        };
        let mut setup = Setup {
            config: &self.config,
            viewport,
            rng,
        };
        if self.config.needs_rebuild(&self.built_with) {
            log::debug!("{}: structural config change, rebuilding", E::NAME);
            effect.rebuild(&mut setup);
            self.built_with = self.config.clone();
        } else {
            effect.reconfigure(&changes, &mut setup);
        }
        Ok(())
    }

    /// Re-read the surface size, reallocating buffers
    /// and regenerating size-dependent state.
    ///
    /// Zero-area surfaces are ignored.
    pub fn resize(&mut self) -> Result<(), EngineError> {
        self.lifecycle.require_attached()?;
        let Some(active) = self.active.as_mut() else {
            return Err(EngineError::NotInitialized);
        };
        let Some(viewport) = Viewport::measure(&active.surface) else {
            log::debug!("{}: ignoring resize to zero area", E::NAME);
            return Ok(());
        };
        if viewport == active.viewport {
            return Ok(());
        }
        active.viewport = viewport;
        active
            .frames
            .resize(viewport.pixel_width, viewport.pixel_height);
        let rebuilt = active.effect.resize(&mut Setup {
            config: &self.config,
            viewport: &active.viewport,
            rng: &mut active.rng,
        });
        if rebuilt {
            self.built_with = self.config.clone();
        }
        log::debug!(
            "{}: resized to {}x{} pixels",
            E::NAME,
            viewport.pixel_width,
            viewport.pixel_height
        );
        Ok(())
    }

    /// Advance to time `now` (milliseconds),
    /// producing and presenting a frame if one is due.
    pub fn tick(&mut self, now: f64) -> Result<Tick, EngineError> {
        match self.lifecycle {
            Lifecycle::Destroyed => return Err(EngineError::Destroyed),
            Lifecycle::Running => {}
            _ => return Ok(Tick::Inactive),
        }
        let Some(Active {
            effect,
            surface,
            viewport,
            frames,
            rng,
        }) = self.active.as_mut()
        else {
            return Err(EngineError::NotInitialized);
        };
        if self.clock.advance(now).is_none() {
            return Ok(Tick::Skipped);
        }

        // the clock's elapsed time includes the phase carry
        // already counted by the previous frame
        let dt = ((now - self.last_frame_at) / 1000.0).clamp(0.0, MAX_FRAME_DT);
        self.last_frame_at = now;
        self.time += dt;
        let pointer = self.mouse.position().map(|p| viewport.to_logical(p));

        effect.update(&mut Frame {
            config: &self.config,
            viewport,
            pointer,
            dt,
            time: self.time,
            rng,
        });
        effect.draw(
            &DrawContext {
                config: &self.config,
                viewport,
                pointer,
                time: self.time,
            },
            frames.back_mut(),
        );

        match surface.present(frames.back()) {
            Ok(()) => {
                frames.swap();
                if self.present_failures >= PRESENT_FAILURE_WARN_THRESHOLD {
                    log::info!(
                        "{}: presenting again after {} failed frames",
                        E::NAME,
                        self.present_failures
                    );
                }
                self.present_failures = 0;
                Ok(Tick::Presented)
            }
            Err(err) => {
                self.present_failures += 1;
                if self.present_failures == PRESENT_FAILURE_WARN_THRESHOLD {
                    log::warn!(
                        "{}: {} consecutive frames failed to present: {err}",
                        E::NAME,
                        self.present_failures
                    );
                } else {
                    log::debug!("{}: dropped frame: {err}", E::NAME);
                }
                Ok(Tick::Dropped)
            }
        }
    }

    /// Report the pointer position in logical pixels.
    /// Ignored while interaction is disabled.
    pub fn set_mouse_position(&mut self, x: f64, y: f64) -> Result<(), EngineError> {
        self.lifecycle.require_attached()?;
        let Some(active) = self.active.as_ref() else {
            return Err(EngineError::NotInitialized);
        };
        self.mouse
            .set_position(active.viewport.to_pixels(Vec2::new(x, y)));
        Ok(())
    }

    /// Turn pointer interaction on or off.
    /// Turning it off makes mouse-influenced state relax to its baseline.
    pub fn set_mouse_interaction(&mut self, enabled: bool) -> Result<(), EngineError> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(EngineError::Destroyed);
        }
        if self.mouse.set_enabled(enabled) {
            if let Some(active) = self.active.as_mut() {
                active.effect.release();
            }
        }
        Ok(())
    }

    /// Report a click at a logical position.
    /// Ignored while interaction is disabled.
    pub fn click(&mut self, x: f64, y: f64) -> Result<(), EngineError> {
        self.lifecycle.require_attached()?;
        let Some(active) = self.active.as_mut() else {
            return Err(EngineError::NotInitialized);
        };
        if self.mouse.is_enabled() {
            active.effect.click(
                Vec2::new(x, y),
                &mut Setup {
                    config: &self.config,
                    viewport: &active.viewport,
                    rng: &mut active.rng,
                },
            );
        }
        Ok(())
    }

    //
    // accessors
    //

    /// Current config.
    #[inline]
    pub fn config(&self) -> &E::Config {
        &self.config
    }

    /// Current lifecycle state.
    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Minimum time between frames in milliseconds.
    #[inline]
    pub fn frame_interval(&self) -> f64 {
        self.clock.frame_interval()
    }

    /// Pointer interaction state.
    #[inline]
    pub fn mouse(&self) -> &MouseState {
        &self.mouse
    }

    /// Current surface dimensions, if initialized.
    pub fn viewport(&self) -> Option<&Viewport> {
        self.active.as_ref().map(|a| &a.viewport)
    }

    /// The last complete frame, if initialized.
    pub fn front_buffer(&self) -> Option<&PixelBuffer> {
        self.active.as_ref().map(|a| a.frames.front())
    }

    /// The effect's state, if initialized.
    pub fn effect(&self) -> Option<&E> {
        self.active.as_ref().map(|a| &a.effect)
    }

    /// The surface, if initialized.
    pub fn surface(&self) -> Option<&S> {
        self.active.as_ref().map(|a| &a.surface)
    }

    /// The surface, mutably, if initialized.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.active.as_mut().map(|a| &mut a.surface)
    }

    /// Number of consecutive frames the surface has rejected.
    #[inline]
    pub fn present_failures(&self) -> usize {
        self.present_failures
    }

    /// Seconds of animation time since init.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }
}

const PLACEHOLDER: Viewport = Viewport {
    css_width: 1.0,
    css_height: 1.0,
    dpr: 1.0,
    pixel_width: 1,
    pixel_height: 1,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::PixelBuffer,
        color::Rgb,
        config::{Bounds, ChangeSet, Role},
        surface::{HeadlessSurface, SurfaceError},
    };
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    crate::effect_config! {
        /// Config of the test effect.
        pub struct SolidConfig;
        /// Patch of the test effect.
        pub struct SolidPatch;
        {
            /// Fill color.
            tint: Rgb = Rgb::new(10, 20, 30), Bounds::Any, Role::Cosmetic;
            /// Structural with a threshold.
            count: u32 = 10, Bounds::Range(0, 100), Role::Structural { threshold: 5.0 };
            /// Frame rate.
            fps: f64 = 30.0, Bounds::Range(30.0, 60.0), Role::Timing;
        }
    }

    /// Fills the frame with a solid color and counts what happens to it.
    struct Solid {
        builds: usize,
        reconfigures: usize,
        updates: usize,
        releases: usize,
        clicks: Vec<Vec2>,
        last_pointer: Option<Vec2>,
        built_count: u32,
    }

    impl Effect for Solid {
        type Config = SolidConfig;
        const NAME: &'static str = "solid";

        fn build(setup: &mut Setup<SolidConfig>) -> Self {
            Self {
                builds: 1,
                reconfigures: 0,
                updates: 0,
                releases: 0,
                clicks: Vec::new(),
                last_pointer: None,
                built_count: setup.config.count,
            }
        }

        fn rebuild(&mut self, setup: &mut Setup<SolidConfig>) {
            let builds = self.builds;
            *self = Self::build(setup);
            self.builds = builds + 1;
        }

        fn reconfigure(&mut self, _changes: &ChangeSet, _setup: &mut Setup<SolidConfig>) {
            self.reconfigures += 1;
        }

        fn update(&mut self, frame: &mut Frame<SolidConfig>) {
            self.updates += 1;
            self.last_pointer = frame.pointer;
        }

        fn draw(&self, ctx: &DrawContext<SolidConfig>, buf: &mut PixelBuffer) {
            buf.fill(ctx.config.tint.opaque());
        }

        fn release(&mut self) {
            self.releases += 1;
        }

        fn click(&mut self, pos: Vec2, _setup: &mut Setup<SolidConfig>) {
            self.clicks.push(pos);
        }
    }

    type TestEngine = Engine<Solid, HeadlessSurface>;

    fn running_engine() -> TestEngine {
        let mut engine = TestEngine::new(SolidConfig::default());
        engine
            .init(
                HeadlessSurface::new(8.0, 4.0, 2.0),
                EffectRng::seed_from_u64(1),
            )
            .unwrap();
        engine.start(0.0).unwrap();
        engine
    }

    #[test]
    fn init_fails_without_context() {
        let mut engine = TestEngine::new(SolidConfig::default());
        let mut surface = HeadlessSurface::new(8.0, 4.0, 1.0);
        surface.set_drawable(false);
        let err = engine.init(surface, EffectRng::seed_from_u64(0));
        assert!(matches!(
            err,
            Err(InitError::NoContext(SurfaceError::NoContext))
        ));
        assert_eq!(engine.lifecycle(), Lifecycle::Uninitialized);
        assert_eq!(engine.start(0.0), Err(EngineError::NotInitialized));

        // retrying with a working surface succeeds
        engine
            .init(HeadlessSurface::new(8.0, 4.0, 1.0), EffectRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(engine.lifecycle(), Lifecycle::Initialized);
        assert!(matches!(
            engine.init(HeadlessSurface::new(1.0, 1.0, 1.0), EffectRng::seed_from_u64(0)),
            Err(InitError::AlreadyInitialized)
        ));
    }

    #[test]
    fn frames_are_paced_to_fps() {
        let mut engine = running_engine();
        let mut presented = 0;
        for i in 1..=125 {
            if engine.tick(i as f64 * 8.0).unwrap() == Tick::Presented {
                presented += 1;
            }
        }
        assert!((29..=31).contains(&presented), "got {presented} frames");
        assert_eq!(engine.surface().unwrap().presented(), presented);
        assert_eq!(engine.effect().unwrap().updates, presented);
        assert_relative_eq!(engine.time(), 1.0, epsilon = 0.05);
    }

    #[test]
    fn animation_time_counts_gaps_between_frames() {
        // 30 fps engine started at 0
        let mut engine = running_engine();
        assert_eq!(engine.tick(50.0), Ok(Tick::Presented));
        assert_relative_eq!(engine.time(), 0.05, epsilon = 1e-9);
        // due early thanks to the phase carry, but only 20 ms have passed
        assert_eq!(engine.tick(70.0), Ok(Tick::Presented));
        assert_relative_eq!(engine.time(), 0.07, epsilon = 1e-9);
        // a long stall advances by at most the cap
        assert_eq!(engine.tick(5070.0), Ok(Tick::Presented));
        assert_relative_eq!(engine.time(), 0.07 + MAX_FRAME_DT, epsilon = 1e-9);

        // restarting measures from the new start time
        engine.stop().unwrap();
        engine.start(10_000.0).unwrap();
        assert_eq!(engine.tick(10_040.0), Ok(Tick::Presented));
        assert_relative_eq!(engine.time(), 0.36, epsilon = 1e-9);
    }

    #[test]
    fn stop_and_start_are_idempotent() {
        let mut engine = running_engine();
        assert_eq!(engine.tick(40.0), Ok(Tick::Presented));
        engine.stop().unwrap();
        engine.stop().unwrap();
        assert_eq!(engine.lifecycle(), Lifecycle::Stopped);
        assert_eq!(engine.tick(1000.0), Ok(Tick::Inactive));

        engine.start(1000.0).unwrap();
        engine.start(1010.0).unwrap();
        // the second start didn't reset the clock
        assert_eq!(engine.tick(1034.0), Ok(Tick::Presented));
    }

    #[test]
    fn destroy_is_terminal() {
        let mut engine = running_engine();
        engine.destroy();
        engine.destroy();
        assert_eq!(engine.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(engine.tick(100.0), Err(EngineError::Destroyed));
        assert_eq!(engine.start(100.0), Err(EngineError::Destroyed));
        assert_eq!(engine.stop(), Err(EngineError::Destroyed));
        assert_eq!(engine.resize(), Err(EngineError::Destroyed));
        assert_eq!(
            engine.update_config(&SolidPatch::default()),
            Err(EngineError::Destroyed)
        );
        assert_eq!(engine.set_mouse_position(1.0, 1.0), Err(EngineError::Destroyed));
        assert_eq!(engine.set_mouse_interaction(true), Err(EngineError::Destroyed));
        assert!(engine.front_buffer().is_none());
        assert!(matches!(
            engine.init(HeadlessSurface::new(1.0, 1.0, 1.0), EffectRng::seed_from_u64(0)),
            Err(InitError::Destroyed)
        ));
    }

    #[test]
    fn structural_changes_rebuild_and_cosmetic_ones_dont() {
        let mut engine = running_engine();
        engine
            .update_config(&SolidPatch {
                tint: Some(Rgb::new(1, 2, 3)),
                ..Default::default()
            })
            .unwrap();
        let effect = engine.effect().unwrap();
        assert_eq!((effect.builds, effect.reconfigures), (1, 1));

        // under the threshold
        engine
            .update_config(&SolidPatch {
                count: Some(14),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(engine.effect().unwrap().builds, 1);

        // cumulative drift past the threshold
        engine
            .update_config(&SolidPatch {
                count: Some(17),
                ..Default::default()
            })
            .unwrap();
        let effect = engine.effect().unwrap();
        assert_eq!(effect.builds, 2);
        assert_eq!(effect.built_count, 17);
    }

    #[test]
    fn config_is_clamped_and_fps_retunes_clock() {
        let mut config = SolidConfig::default();
        config.fps = 500.0;
        let mut engine = TestEngine::new(config);
        assert_relative_eq!(engine.config().fps, 60.0);
        assert_relative_eq!(engine.frame_interval(), 1000.0 / 60.0);

        engine
            .update_config(&SolidPatch {
                fps: Some(10.0),
                count: Some(1000),
                ..Default::default()
            })
            .unwrap();
        assert_relative_eq!(engine.config().fps, 30.0);
        assert_eq!(engine.config().count, 100);
        assert_relative_eq!(engine.frame_interval(), 1000.0 / 30.0);
    }

    #[test]
    fn resize_reallocates_and_ignores_zero_area() {
        let mut engine = running_engine();
        assert_eq!(engine.viewport().unwrap().pixel_width, 16);

        engine.surface_mut().unwrap().set_size(0.0, 10.0);
        engine.resize().unwrap();
        assert_eq!(engine.viewport().unwrap().pixel_width, 16);
        assert_eq!(engine.effect().unwrap().builds, 1);

        engine.surface_mut().unwrap().set_size(10.0, 5.0);
        engine.resize().unwrap();
        let vp = *engine.viewport().unwrap();
        assert_eq!((vp.pixel_width, vp.pixel_height), (20, 10));
        assert_eq!(engine.effect().unwrap().builds, 2);

        assert_eq!(engine.tick(40.0), Ok(Tick::Presented));
        let front = engine.front_buffer().unwrap();
        assert_eq!((front.width(), front.height()), (20, 10));
    }

    #[test]
    fn failed_presents_keep_last_frame() {
        let mut engine = running_engine();
        assert_eq!(engine.tick(40.0), Ok(Tick::Presented));
        engine
            .update_config(&SolidPatch {
                tint: Some(Rgb::new(200, 0, 0)),
                ..Default::default()
            })
            .unwrap();

        engine.surface_mut().unwrap().fail_next_presents(3);
        for i in 0..3 {
            assert_eq!(engine.tick(80.0 + 40.0 * i as f64), Ok(Tick::Dropped));
        }
        assert_eq!(engine.present_failures(), 3);
        assert_eq!(
            engine.front_buffer().unwrap().get(0, 0),
            Some([10, 20, 30, 255])
        );

        assert_eq!(engine.tick(200.0), Ok(Tick::Presented));
        assert_eq!(engine.present_failures(), 0);
        assert_eq!(
            engine.front_buffer().unwrap().get(0, 0),
            Some([200, 0, 0, 255])
        );
    }

    #[test]
    fn mouse_positions_are_scaled_and_released() {
        let mut engine = running_engine();
        engine.set_mouse_position(3.0, 1.0).unwrap();
        assert_eq!(engine.mouse().position(), None);

        engine.set_mouse_interaction(true).unwrap();
        engine.set_mouse_position(3.0, 1.0).unwrap();
        // stored in pixels with dpr 2
        assert_eq!(engine.mouse().position(), Some(Vec2::new(6.0, 2.0)));
        engine.tick(40.0).unwrap();
        // effects see logical coordinates
        assert_eq!(
            engine.effect().unwrap().last_pointer,
            Some(Vec2::new(3.0, 1.0))
        );
        engine.click(2.0, 2.0).unwrap();

        engine.set_mouse_interaction(false).unwrap();
        engine.click(5.0, 5.0).unwrap();
        let effect = engine.effect().unwrap();
        assert_eq!(effect.releases, 1);
        assert_eq!(effect.clicks, vec![Vec2::new(2.0, 2.0)]);
        assert_eq!(engine.mouse().position(), None);
    }
}
