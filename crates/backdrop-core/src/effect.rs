//! The interface between the engine and animation algorithms.

use crate::{
    buffer::PixelBuffer,
    config::{ChangeSet, EffectConfig},
    surface::Viewport,
    EffectRng, Vec2,
};

/// Everything an effect needs to generate its state.
pub struct Setup<'a, C> {
    /// Current config.
    pub config: &'a C,
    /// Current surface dimensions.
    pub viewport: &'a Viewport,
    /// Source of randomness.
    pub rng: &'a mut EffectRng,
}

/// Input to [`Effect::update`].
pub struct Frame<'a, C> {
    /// Current config.
    pub config: &'a C,
    /// Current surface dimensions.
    pub viewport: &'a Viewport,
    /// Pointer position in logical pixels,
    /// if interaction is enabled and the pointer has been seen.
    pub pointer: Option<Vec2>,
    /// Seconds since the previous frame.
    pub dt: f64,
    /// Seconds of animation time since init.
    pub time: f64,
    /// Source of randomness.
    pub rng: &'a mut EffectRng,
}

impl<'a, C> Frame<'a, C> {
    /// Borrow the parts needed to regenerate state mid-update.
    pub fn setup(&mut self) -> Setup<'_, C> {
        Setup {
            config: self.config,
            viewport: self.viewport,
            rng: &mut *self.rng,
        }
    }
}

/// Input to [`Effect::draw`].
pub struct DrawContext<'a, C> {
    /// Current config.
    pub config: &'a C,
    /// Current surface dimensions.
    pub viewport: &'a Viewport,
    /// Pointer position in logical pixels, if tracked.
    pub pointer: Option<Vec2>,
    /// Seconds of animation time since init.
    pub time: f64,
}

/// A real-time procedural animation algorithm.
///
/// The [`Engine`][crate::Engine] owns the effect and calls
/// [`update`][Self::update] followed by [`draw`][Self::draw]
/// once per accepted frame.
/// Everything else is in reaction to host calls.
///
/// Effects simulate in logical pixels and draw in backing pixels;
/// use [`Viewport::to_pixels`] to convert.
pub trait Effect: Sized {
    /// Config of the effect.
    type Config: EffectConfig;

    /// Name used in log messages.
    const NAME: &'static str;

    /// Generate the effect's state.
    fn build(setup: &mut Setup<Self::Config>) -> Self;

    /// Regenerate state after a structural config change.
    ///
    /// The default implementation builds from scratch.
    fn rebuild(&mut self, setup: &mut Setup<Self::Config>) {
        *self = Self::build(setup);
    }

    /// React to a change in surface size.
    /// Returns whether the state was regenerated from the current config.
    ///
    /// The default implementation rebuilds.
    fn resize(&mut self, setup: &mut Setup<Self::Config>) -> bool {
        self.rebuild(setup);
        true
    }

    /// React to config changes that didn't require a rebuild,
    /// e.g. by refreshing derived data such as palettes.
    ///
    /// The default implementation does nothing,
    /// which is right for effects reading their config every frame.
    #[allow(unused_variables)]
    fn reconfigure(&mut self, changes: &ChangeSet, setup: &mut Setup<Self::Config>) {}

    /// Advance the simulation by one frame.
    fn update(&mut self, frame: &mut Frame<Self::Config>);

    /// Render the current state into `buf`, overwriting all of it.
    fn draw(&self, ctx: &DrawContext<Self::Config>, buf: &mut PixelBuffer);

    /// Called when pointer interaction is turned off.
    fn release(&mut self) {}

    /// React to a click at a logical position while interaction is on.
    #[allow(unused_variables)]
    fn click(&mut self, pos: Vec2, setup: &mut Setup<Self::Config>) {}
}
