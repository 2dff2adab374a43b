//! Procedural animation algorithms for `backdrop`.
//!
//! Each effect implements [`backdrop_core::Effect`]
//! and comes with a config struct and a patch type for partial updates.
//! Run one with a [`backdrop_core::Engine`].

#![warn(missing_docs)]

pub mod fractal;
#[doc(inline)]
pub use fractal::{Fractal, FractalConfig, FractalKind, FractalPatch};

pub mod lightning;
#[doc(inline)]
pub use lightning::{Lightning, LightningConfig, LightningPatch};

pub mod tessellation;
#[doc(inline)]
pub use tessellation::{Tessellation, TessellationConfig, TessellationPatch};

pub mod wave;
#[doc(inline)]
pub use wave::{Wave, WaveConfig, WavePatch};

pub mod plasma;
#[doc(inline)]
pub use plasma::{Plasma, PlasmaConfig, PlasmaPatch};

pub mod aurora;
#[doc(inline)]
pub use aurora::{Aurora, AuroraConfig, AuroraPatch};

pub mod glitch;
#[doc(inline)]
pub use glitch::{Glitch, GlitchConfig, GlitchPatch};

pub mod flow;
#[doc(inline)]
pub use flow::{
    dna_helix::{DnaHelix, DnaHelixConfig, DnaHelixPatch},
    fire::{Fire, FireConfig, FirePatch},
    matrix::{Matrix, MatrixConfig, MatrixPatch},
    metaballs::{Metaballs, MetaballsConfig, MetaballsPatch},
    morph_blob::{MorphBlob, MorphBlobConfig, MorphBlobPatch},
    neon_trails::{NeonTrails, NeonTrailsConfig, NeonTrailsPatch},
    particles::{Particles, ParticlesConfig, ParticlesPatch},
    starfield::{Starfield, StarfieldConfig, StarfieldPatch},
};

#[cfg(test)]
pub(crate) mod test_util {
    use backdrop_core::{rand::SeedableRng, EffectRng, Setup, Viewport};

    /// A viewport with the given logical size and pixel ratio.
    pub fn viewport(width: f64, height: f64, dpr: f64) -> Viewport {
        Viewport::new(width, height, dpr).expect("nonzero test viewport")
    }

    pub fn rng() -> EffectRng {
        EffectRng::seed_from_u64(7)
    }

    /// Build a setup borrowing the given parts.
    pub fn setup<'a, C>(config: &'a C, viewport: &'a Viewport, rng: &'a mut EffectRng) -> Setup<'a, C> {
        Setup {
            config,
            viewport,
            rng,
        }
    }
}
