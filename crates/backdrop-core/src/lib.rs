//! This is the core crate of `backdrop`, containing the machinery
//! shared by every animation algorithm:
//! frame pacing, the engine lifecycle, the config store,
//! surfaces and pixel buffers.
//! The algorithms themselves live in `backdrop-effects`,
//! and the `backdrop` crate ties everything together.

#![warn(missing_docs)]

pub mod clock;
#[doc(inline)]
pub use clock::FrameClock;

pub mod lifecycle;
#[doc(inline)]
pub use lifecycle::{EngineError, InitError, Lifecycle};

pub mod config;
#[doc(inline)]
pub use config::{Bounds, ChangeSet, EffectConfig, Param, ParamKind, ParamSpec, Role};

pub mod surface;
#[doc(inline)]
pub use surface::{HeadlessSurface, Surface, SurfaceError, Viewport};

pub mod mouse;
#[doc(inline)]
pub use mouse::{MousePhase, MouseState};

pub mod buffer;
#[doc(inline)]
pub use buffer::{BlendMode, FrameBuffers, PixelBuffer, Rgba};

pub mod raster;

pub mod color;
#[doc(inline)]
pub use color::{ColorMap, HexColorError, Rgb};

pub mod effect;
#[doc(inline)]
pub use effect::{DrawContext, Effect, Frame, Setup};

pub mod engine;
#[doc(inline)]
pub use engine::{Engine, Tick};

// nalgebra re-exports of common types for convenience

pub use nalgebra as na;
/// Type alias for a 2D `nalgebra` vector.
pub type Vec2 = na::Vector2<f64>;

/// Random number generator injected into engines.
///
/// Seed it with [`rand::SeedableRng::seed_from_u64`]
/// to get reproducible geometry.
pub type EffectRng = rand::rngs::StdRng;

pub use rand;
