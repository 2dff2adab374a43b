//! Config store and re-initialization policy.
//!
//! Every effect has a flat config record with a documented range per field.
//! Configs are changed with partial patches:
//! fields present in the patch are clamped to their range and merged,
//! absent fields keep their value.
//! Each field also has a [`Role`] deciding what a change to it costs.
//! Cosmetic changes are picked up on the next frame,
//! timing changes retune the frame clock,
//! and structural changes regenerate the effect's state.
//!
//! Configs are declared with the [`effect_config`][crate::effect_config] macro,
//! which generates the config struct, its patch type
//! and the [`EffectConfig`] implementation from one table of fields.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// A value that can appear in an effect config.
pub trait Param: Copy + PartialEq + fmt::Debug + fmt::Display {
    /// Kind of the parameter, reported in the schema.
    const KIND: ParamKind;

    /// Clamp the value into the given bounds.
    fn clamp_to(self, bounds: &Bounds<Self>) -> Self;

    /// Size of the change from `other` to `self`,
    /// compared against structural thresholds.
    fn distance(&self, other: &Self) -> f64;

    /// Numeric value of the parameter, or NaN for non-numeric ones.
    fn as_f64(&self) -> f64;

    /// Human-readable form of the bounds, reported in the schema.
    fn describe_bounds(bounds: &Bounds<Self>) -> String {
        match bounds {
            Bounds::Range(min, max) => format!("[{min}, {max}]"),
            Bounds::Any => "any".to_string(),
        }
    }
}

/// The range of values a parameter accepts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bounds<T> {
    /// Inclusive range.
    Range(T, T),
    /// Any value of the type is valid.
    Any,
}

/// Kind of a parameter, as reported in the schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Real number.
    Float,
    /// Whole number, typically a count.
    Integer,
    /// RGB color.
    Color,
    /// One of a fixed set of named options.
    Choice,
}

/// What changing a parameter costs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Role {
    /// Read every frame. Changing it never regenerates state.
    Cosmetic,
    /// Frame rate. Changing it recomputes the frame interval.
    Timing,
    /// Determines the effect's generated state.
    /// The state is regenerated when the value moves further than `threshold`
    /// from the value the state was built with.
    /// A threshold of zero means any change.
    Structural {
        /// Largest change tolerated without regenerating.
        threshold: f64,
    },
}

impl Role {
    /// Structural role regenerating on any change.
    pub const STRUCTURAL: Role = Role::Structural { threshold: 0.0 };
}

/// Description of one config field.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    /// Field name in Rust.
    pub name: &'static str,
    /// Key used in serialized configs and patches.
    pub key: String,
    /// Kind of value.
    pub kind: ParamKind,
    /// Accepted range.
    pub range: String,
    /// Default value.
    pub default: String,
    /// What changing the field costs.
    pub role: Role,
}

impl ParamSpec {
    /// Describe a field. Used by [`effect_config`][crate::effect_config].
    pub fn new<T: Param>(name: &'static str, bounds: &Bounds<T>, default: &T, role: Role) -> Self {
        Self {
            name,
            key: camel_case(name),
            kind: T::KIND,
            range: T::describe_bounds(bounds),
            default: default.to_string(),
            role,
        }
    }
}

/// Convert a snake_case field name into the camelCase key used in patches.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// The set of fields a merge actually changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    changed: Vec<&'static str>,
    fps: bool,
}

impl ChangeSet {
    /// Record a changed field. Used by [`effect_config`][crate::effect_config].
    pub fn record(&mut self, name: &'static str, role: Role) {
        self.changed.push(name);
        if role == Role::Timing {
            self.fps = true;
        }
    }

    /// Whether the named field changed.
    pub fn contains(&self, name: &str) -> bool {
        self.changed.iter().any(|&c| c == name)
    }

    /// Whether any of the named fields changed.
    pub fn any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.contains(n))
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// Whether the frame rate changed.
    pub fn fps_changed(&self) -> bool {
        self.fps
    }

    /// Names of the changed fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changed.iter().copied()
    }
}

/// A complete effect config. Implement with [`effect_config`][crate::effect_config].
pub trait EffectConfig:
    Clone + fmt::Debug + Default + Serialize + DeserializeOwned + Send + 'static
{
    /// Partial update of the config. Every field is optional.
    type Patch: Clone + fmt::Debug + Default + Serialize + DeserializeOwned;

    /// Clamp and merge the fields present in `patch`,
    /// returning the fields whose value changed.
    fn merge(&mut self, patch: &Self::Patch) -> ChangeSet;

    /// Clamp every field into its documented range.
    fn clamp(&mut self);

    /// Target frame rate.
    fn fps(&self) -> f64;

    /// Whether state built with the config `built_with`
    /// must be regenerated to match `self`.
    fn needs_rebuild(&self, built_with: &Self) -> bool;

    /// Description of every field.
    fn schema() -> Vec<ParamSpec>;
}

//
// param impls
//

impl Param for f64 {
    const KIND: ParamKind = ParamKind::Float;

    fn clamp_to(self, bounds: &Bounds<Self>) -> Self {
        match *bounds {
            // NaN fails every comparison, pin it to the low end
            Bounds::Range(min, _) if self.is_nan() => min,
            Bounds::Range(min, max) => self.clamp(min, max),
            Bounds::Any => self,
        }
    }

    fn distance(&self, other: &Self) -> f64 {
        (self - other).abs()
    }

    fn as_f64(&self) -> f64 {
        *self
    }
}

impl Param for u32 {
    const KIND: ParamKind = ParamKind::Integer;

    fn clamp_to(self, bounds: &Bounds<Self>) -> Self {
        match *bounds {
            Bounds::Range(min, max) => self.clamp(min, max),
            Bounds::Any => self,
        }
    }

    fn distance(&self, other: &Self) -> f64 {
        self.abs_diff(*other) as f64
    }

    fn as_f64(&self) -> f64 {
        *self as f64
    }
}

/// Declare an enum usable as a [`Param`] with [`ParamKind::Choice`].
///
/// Each variant is given the name it has in serialized configs.
/// ```
/// backdrop_core::choice_param! {
///     /// Shape of a thing.
///     pub enum Shape {
///         /// Round.
///         Circle => "circle",
///         /// Pointy.
///         Star => "star",
///     }
/// }
/// ```
/// The calling crate must depend on `serde`.
#[macro_export]
macro_rules! choice_param {
    (
        $(#[$meta:meta])*
        pub enum $Name:ident {
            $( $(#[$vmeta:meta])* $Variant:ident => $label:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $Name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $Variant, )*
        }

        impl ::std::fmt::Display for $Name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(match self {
                    $( Self::$Variant => $label, )*
                })
            }
        }

        impl $crate::config::Param for $Name {
            const KIND: $crate::config::ParamKind = $crate::config::ParamKind::Choice;

            fn clamp_to(self, _bounds: &$crate::config::Bounds<Self>) -> Self {
                self
            }

            fn distance(&self, other: &Self) -> f64 {
                if self == other {
                    0.0
                } else {
                    f64::INFINITY
                }
            }

            fn as_f64(&self) -> f64 {
                f64::NAN
            }

            fn describe_bounds(_bounds: &$crate::config::Bounds<Self>) -> String {
                [$($label),*].join(" | ")
            }
        }
    };
}

/// Declare an effect config and its patch type.
///
/// Every field is listed with its type, default value, bounds and role:
/// ```
/// use backdrop_core::{effect_config, Bounds, Role};
///
/// effect_config! {
///     /// Config of a spinning square.
///     pub struct SquareConfig;
///     /// Partial update of a [`SquareConfig`].
///     pub struct SquarePatch;
///     {
///         /// Rotations per second. Default: 1.
///         speed: f64 = 1.0, Bounds::Range(0.1, 2.0), Role::Cosmetic;
///         /// Number of squares. Default: 4.
///         count: u32 = 4, Bounds::Range(1, 10), Role::STRUCTURAL;
///         /// Frames per second. Default: 60.
///         fps: f64 = 60.0, Bounds::Range(30.0, 60.0), Role::Timing;
///     }
/// }
/// ```
/// The config serializes with camelCase keys and fills absent keys
/// with defaults; the patch skips absent fields entirely.
/// The calling crate must depend on `serde`.
#[macro_export]
macro_rules! effect_config {
    (
        $(#[$cfg_meta:meta])*
        pub struct $Cfg:ident;
        $(#[$patch_meta:meta])*
        pub struct $Patch:ident;
        {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty = $default:expr, $bounds:expr, $role:expr;
            )*
        }
    ) => {
        $(#[$cfg_meta])*
        #[derive(Clone, Debug, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default, rename_all = "camelCase")]
        pub struct $Cfg {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl Default for $Cfg {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        $(#[$patch_meta])*
        #[derive(Clone, Debug, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default, rename_all = "camelCase")]
        pub struct $Patch {
            $(
                #[doc = concat!("New value for `", stringify!($field), "`, if any.")]
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl $crate::config::EffectConfig for $Cfg {
            type Patch = $Patch;

            fn merge(&mut self, patch: &$Patch) -> $crate::config::ChangeSet {
                let mut changes = $crate::config::ChangeSet::default();
                $(
                    if let Some(value) = patch.$field {
                        let value = $crate::config::Param::clamp_to(value, &$bounds);
                        if value != self.$field {
                            self.$field = value;
                            changes.record(stringify!($field), $role);
                        }
                    }
                )*
                changes
            }

            fn clamp(&mut self) {
                $(
                    self.$field = $crate::config::Param::clamp_to(self.$field, &$bounds);
                )*
            }

            fn fps(&self) -> f64 {
                $(
                    let role: $crate::config::Role = $role;
                    if role == $crate::config::Role::Timing {
                        return $crate::config::Param::as_f64(&self.$field);
                    }
                )*
                60.0
            }

            fn needs_rebuild(&self, built_with: &Self) -> bool {
                $(
                    let role: $crate::config::Role = $role;
                    if let $crate::config::Role::Structural { threshold } = role {
                        let moved = $crate::config::Param::distance(&self.$field, &built_with.$field);
                        if moved > threshold {
                            return true;
                        }
                    }
                )*
                false
            }

            fn schema() -> Vec<$crate::config::ParamSpec> {
                let defaults = Self::default();
                vec![
                    $(
                        $crate::config::ParamSpec::new::<$ty>(
                            stringify!($field),
                            &$bounds,
                            &defaults.$field,
                            $role,
                        ),
                    )*
                ]
            }
        }
    };
}
