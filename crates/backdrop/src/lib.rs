//! Real-time procedural animations for backgrounds.
//!
//! Each animation is an [`Effect`] driven by an [`Engine`],
//! which takes care of frame pacing, live config changes,
//! resizing and pointer interaction.
//! The effects themselves live in [`effects`].
//!
//! ```
//! use backdrop::{effects, rand::SeedableRng, EffectRng, Engine, HeadlessSurface, Tick};
//!
//! let mut engine: Engine<effects::Wave, _> = Engine::new(effects::WaveConfig::default());
//! engine.init(HeadlessSurface::new(320.0, 200.0, 2.0), EffectRng::seed_from_u64(0))?;
//! engine.start(0.0)?;
//! assert_eq!(engine.tick(17.0)?, Tick::Presented);
//!
//! // configs can be changed at any time between ticks
//! engine.update_config(&effects::WavePatch {
//!     source_count: Some(5),
//!     ..Default::default()
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Hosts that pick effects by name can use [`EffectKind`]
//! and the type-erased [`DynEngine`], which take configs as JSON.

#![warn(missing_docs)]

#[doc(inline)]
pub use backdrop_core::*;

pub use backdrop_effects as effects;

pub mod registry;
#[doc(inline)]
pub use registry::{DynEngine, EffectKind, PatchError, UnknownEffect};

pub mod player;
#[doc(inline)]
pub use player::{FrameStats, Player};
