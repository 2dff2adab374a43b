//! Choosing effects at runtime by name,
//! with configs exchanged as JSON.

use backdrop_core::{
    Effect, EffectConfig, EffectRng, Engine, EngineError, InitError, Lifecycle, ParamSpec,
    PixelBuffer, Surface, Tick, Viewport,
};
use backdrop_effects as fx;
use std::{fmt, str::FromStr};

/// One of the available effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// [`fx::Fractal`]
    Fractal,
    /// [`fx::Lightning`]
    Lightning,
    /// [`fx::Tessellation`]
    Tessellation,
    /// [`fx::Wave`]
    Wave,
    /// [`fx::Plasma`]
    Plasma,
    /// [`fx::Metaballs`]
    Metaballs,
    /// [`fx::Starfield`]
    Starfield,
    /// [`fx::MorphBlob`]
    MorphBlob,
    /// [`fx::NeonTrails`]
    NeonTrails,
    /// [`fx::Fire`]
    Fire,
    /// [`fx::Matrix`]
    Matrix,
    /// [`fx::DnaHelix`]
    DnaHelix,
    /// [`fx::Particles`]
    Particles,
    /// [`fx::Aurora`]
    Aurora,
    /// [`fx::Glitch`]
    Glitch,
}

/// Error parsing an [`EffectKind`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown effect {0:?}")]
pub struct UnknownEffect(pub String);

/// Error applying a JSON config patch.
#[derive(thiserror::Error, Debug)]
pub enum PatchError {
    /// The patch isn't valid JSON or has a value of the wrong type.
    #[error("invalid config patch")]
    Parse(#[from] serde_json::Error),
    /// The engine refused the update.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Associates an effect type with its [`EffectKind`].
pub trait Registered: Effect {
    /// Kind of the effect.
    const KIND: EffectKind;
}

macro_rules! registry {
    ($($kind:ident => $effect:ty, $name:literal;)*) => {
        $(impl Registered for $effect {
            const KIND: EffectKind = EffectKind::$kind;
        })*

        impl EffectKind {
            /// Every kind, in a fixed order.
            pub const ALL: &'static [EffectKind] = &[$(EffectKind::$kind),*];

            /// Name used by hosts to select the effect.
            pub fn name(self) -> &'static str {
                match self {
                    $(EffectKind::$kind => $name,)*
                }
            }

            /// Name of the effect type, as seen in log messages.
            pub fn effect_name(self) -> &'static str {
                match self {
                    $(EffectKind::$kind => <$effect as Effect>::NAME,)*
                }
            }

            /// Description of the effect's config fields.
            pub fn schema(self) -> Vec<ParamSpec> {
                match self {
                    $(EffectKind::$kind => <<$effect as Effect>::Config as EffectConfig>::schema(),)*
                }
            }

            /// Create an engine for the effect.
            ///
            /// `config` is an optional JSON object with any subset of the config fields;
            /// missing fields get their defaults and values are clamped.
            pub fn create<S: Surface + 'static>(
                self,
                config: Option<&str>,
            ) -> Result<Box<dyn DynEngine<S>>, serde_json::Error> {
                match self {
                    $(EffectKind::$kind => create::<$effect, S>(config),)*
                }
            }
        }
    };
}

registry! {
    Fractal => fx::Fractal, "fractal";
    Lightning => fx::Lightning, "lightning";
    Tessellation => fx::Tessellation, "tessellation";
    Wave => fx::Wave, "waveInterference";
    Plasma => fx::Plasma, "plasma";
    Metaballs => fx::Metaballs, "fluid";
    Starfield => fx::Starfield, "cosmic";
    MorphBlob => fx::MorphBlob, "morphBlob";
    NeonTrails => fx::NeonTrails, "neonTrails";
    Fire => fx::Fire, "fire";
    Matrix => fx::Matrix, "matrix";
    DnaHelix => fx::DnaHelix, "dnaHelix";
    Particles => fx::Particles, "particle";
    Aurora => fx::Aurora, "aurora";
    Glitch => fx::Glitch, "glitch";
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = UnknownEffect;

    /// Accepts both the host name and the effect type name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s || kind.effect_name() == s)
            .ok_or_else(|| UnknownEffect(s.to_string()))
    }
}

fn create<E: Registered + 'static, S: Surface + 'static>(
    config: Option<&str>,
) -> Result<Box<dyn DynEngine<S>>, serde_json::Error> {
    let mut cfg = E::Config::default();
    if let Some(json) = config {
        let patch: <E::Config as EffectConfig>::Patch = serde_json::from_str(json)?;
        cfg.merge(&patch);
    }
    Ok(Box::new(Engine::<E, S>::new(cfg)))
}

/// An [`Engine`] with its effect type erased.
///
/// Every method forwards to the engine method of the same name,
/// except that configs go in and out as JSON.
pub trait DynEngine<S: Surface> {
    /// Which effect is running.
    fn kind(&self) -> EffectKind;
    /// See [`Engine::init`].
    fn init(&mut self, surface: S, rng: EffectRng) -> Result<(), InitError>;
    /// See [`Engine::start`].
    fn start(&mut self, now: f64) -> Result<(), EngineError>;
    /// See [`Engine::stop`].
    fn stop(&mut self) -> Result<(), EngineError>;
    /// See [`Engine::destroy`].
    fn destroy(&mut self);
    /// Merge a partial config given as a JSON object.
    /// See [`Engine::update_config`].
    fn update_config_json(&mut self, patch: &str) -> Result<(), PatchError>;
    /// The current config as JSON.
    fn config_json(&self) -> Result<serde_json::Value, serde_json::Error>;
    /// See [`Engine::resize`].
    fn resize(&mut self) -> Result<(), EngineError>;
    /// See [`Engine::tick`].
    fn tick(&mut self, now: f64) -> Result<Tick, EngineError>;
    /// See [`Engine::set_mouse_position`].
    fn set_mouse_position(&mut self, x: f64, y: f64) -> Result<(), EngineError>;
    /// See [`Engine::set_mouse_interaction`].
    fn set_mouse_interaction(&mut self, enabled: bool) -> Result<(), EngineError>;
    /// See [`Engine::click`].
    fn click(&mut self, x: f64, y: f64) -> Result<(), EngineError>;
    /// See [`Engine::lifecycle`].
    fn lifecycle(&self) -> Lifecycle;
    /// See [`Engine::frame_interval`].
    fn frame_interval(&self) -> f64;
    /// See [`Engine::viewport`].
    fn viewport(&self) -> Option<&Viewport>;
    /// See [`Engine::front_buffer`].
    fn front_buffer(&self) -> Option<&PixelBuffer>;
    /// See [`Engine::surface`].
    fn surface(&self) -> Option<&S>;
    /// See [`Engine::surface_mut`].
    fn surface_mut(&mut self) -> Option<&mut S>;
}

impl<E: Registered, S: Surface> DynEngine<S> for Engine<E, S> {
    fn kind(&self) -> EffectKind {
        E::KIND
    }

    fn init(&mut self, surface: S, rng: EffectRng) -> Result<(), InitError> {
        Engine::init(self, surface, rng)
    }

    fn start(&mut self, now: f64) -> Result<(), EngineError> {
        Engine::start(self, now)
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        Engine::stop(self)
    }

    fn destroy(&mut self) {
        Engine::destroy(self)
    }

    fn update_config_json(&mut self, patch: &str) -> Result<(), PatchError> {
        let patch: <E::Config as EffectConfig>::Patch = serde_json::from_str(patch)?;
        Engine::update_config(self, &patch)?;
        Ok(())
    }

    fn config_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(Engine::config(self))
    }

    fn resize(&mut self) -> Result<(), EngineError> {
        Engine::resize(self)
    }

    fn tick(&mut self, now: f64) -> Result<Tick, EngineError> {
        Engine::tick(self, now)
    }

    fn set_mouse_position(&mut self, x: f64, y: f64) -> Result<(), EngineError> {
        Engine::set_mouse_position(self, x, y)
    }

    fn set_mouse_interaction(&mut self, enabled: bool) -> Result<(), EngineError> {
        Engine::set_mouse_interaction(self, enabled)
    }

    fn click(&mut self, x: f64, y: f64) -> Result<(), EngineError> {
        Engine::click(self, x, y)
    }

    fn lifecycle(&self) -> Lifecycle {
        Engine::lifecycle(self)
    }

    fn frame_interval(&self) -> f64 {
        Engine::frame_interval(self)
    }

    fn viewport(&self) -> Option<&Viewport> {
        Engine::viewport(self)
    }

    fn front_buffer(&self) -> Option<&PixelBuffer> {
        Engine::front_buffer(self)
    }

    fn surface(&self) -> Option<&S> {
        Engine::surface(self)
    }

    fn surface_mut(&mut self) -> Option<&mut S> {
        Engine::surface_mut(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use backdrop_core::{rand::SeedableRng, HeadlessSurface, ParamKind};

    fn headless(kind: EffectKind, config: Option<&str>) -> Box<dyn DynEngine<HeadlessSurface>> {
        let mut engine = kind.create(config).expect("valid config");
        engine
            .init(
                HeadlessSurface::new(64.0, 48.0, 1.5),
                EffectRng::seed_from_u64(1),
            )
            .expect("headless surface is drawable");
        engine
    }

    #[test]
    fn names_round_trip() {
        for &kind in EffectKind::ALL {
            assert_eq!(kind.name().parse::<EffectKind>(), Ok(kind));
            assert_eq!(kind.effect_name().parse::<EffectKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!("dnaHelix".parse::<EffectKind>(), Ok(EffectKind::DnaHelix));
        assert_eq!("particles".parse::<EffectKind>(), Ok(EffectKind::Particles));
        assert_eq!(
            "kaleidoscope".parse::<EffectKind>(),
            Err(UnknownEffect("kaleidoscope".to_string()))
        );
    }

    #[test]
    fn every_effect_renders_a_frame() {
        for &kind in EffectKind::ALL {
            let mut engine = headless(kind, None);
            assert_eq!(engine.kind(), kind);
            engine.start(0.0).unwrap();
            assert_eq!(engine.tick(20.0), Ok(Tick::Presented), "{kind}");
            let surface = engine.surface().unwrap();
            assert_eq!(surface.presented(), 1);
            let viewport = engine.viewport().unwrap();
            assert_eq!((viewport.pixel_width, viewport.pixel_height), (96, 72));
            engine.destroy();
            assert_eq!(engine.lifecycle(), Lifecycle::Destroyed);
        }
    }

    #[test]
    fn json_config_is_merged_and_clamped() {
        let mut engine = headless(
            EffectKind::Fractal,
            Some(r#"{"maxIterations": 5000, "fractalType": "julia"}"#),
        );
        let config = engine.config_json().unwrap();
        assert_eq!(config["maxIterations"], 500);
        assert_eq!(config["fractalType"], "julia");

        engine
            .update_config_json(r##"{"color1": "#102030", "fps": 30}"##)
            .unwrap();
        assert_eq!(engine.config_json().unwrap()["color1"], "#102030");
        assert_relative_eq!(engine.frame_interval(), 1000.0 / 30.0);

        assert!(matches!(
            engine.update_config_json(r#"{"maxIterations": "many"}"#),
            Err(PatchError::Parse(_))
        ));
        engine.destroy();
        assert!(matches!(
            engine.update_config_json("{}"),
            Err(PatchError::Engine(EngineError::Destroyed))
        ));
    }

    #[test]
    fn schemas_use_patch_keys() {
        let schema = EffectKind::Wave.schema();
        let keys: Vec<&str> = schema.iter().map(|p| p.key.as_str()).collect();
        assert!(keys.contains(&"sourceCount"));
        assert!(keys.contains(&"fps"));
        let color = schema.iter().find(|p| p.key == "color1").unwrap();
        assert_eq!(color.kind, ParamKind::Color);
    }
}
