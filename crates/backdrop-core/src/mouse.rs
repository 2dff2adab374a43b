//! Pointer interaction state.

use crate::Vec2;

/// Per-frame interpolation factor used when easing
/// mouse-influenced quantities towards their targets.
pub const RELAX_FACTOR: f64 = 0.05;

/// Whether pointer interaction is on, and where the pointer is.
///
/// Positions are stored in backing pixel coordinates
/// (logical position times the device pixel ratio).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum MouseState {
    /// Pointer input is ignored and effects relax to their baseline.
    #[default]
    Disabled,
    /// Pointer input is accepted.
    Enabled {
        /// Last reported pointer position, if any.
        position: Option<Vec2>,
    },
}

/// Coarse state of [`MouseState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MousePhase {
    /// Interaction off.
    Disabled,
    /// Interaction on, no position reported yet.
    Idle,
    /// Interaction on and following the pointer.
    Tracking,
}

impl MouseState {
    /// Turn interaction on or off.
    ///
    /// Enabling keeps a tracked position if already enabled.
    /// Disabling forgets the position.
    /// Returns true if interaction was on and is now off.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        match (enabled, *self) {
            (true, MouseState::Disabled) => {
                *self = MouseState::Enabled { position: None };
                false
            }
            (true, MouseState::Enabled { .. }) => false,
            (false, MouseState::Enabled { .. }) => {
                *self = MouseState::Disabled;
                true
            }
            (false, MouseState::Disabled) => false,
        }
    }

    /// Record a pointer position in pixel coordinates.
    /// Ignored while disabled.
    pub fn set_position(&mut self, pixel_pos: Vec2) {
        if let MouseState::Enabled { position } = self {
            *position = Some(pixel_pos);
        }
    }

    /// Tracked pointer position in pixel coordinates.
    pub fn position(&self) -> Option<Vec2> {
        match self {
            MouseState::Enabled { position } => *position,
            MouseState::Disabled => None,
        }
    }

    /// Whether interaction is on.
    pub fn is_enabled(&self) -> bool {
        matches!(self, MouseState::Enabled { .. })
    }

    /// Coarse state.
    pub fn phase(&self) -> MousePhase {
        match self {
            MouseState::Disabled => MousePhase::Disabled,
            MouseState::Enabled { position: None } => MousePhase::Idle,
            MouseState::Enabled { position: Some(_) } => MousePhase::Tracking,
        }
    }
}

/// Move `current` a fraction `factor` of the way towards `target`.
#[inline]
pub fn relax(current: Vec2, target: Vec2, factor: f64) -> Vec2 {
    current + (target - current) * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn state_transitions() {
        let mut mouse = MouseState::default();
        assert_eq!(mouse.phase(), MousePhase::Disabled);
        mouse.set_position(Vec2::new(1.0, 1.0));
        assert_eq!(mouse.position(), None);

        assert!(!mouse.set_enabled(true));
        assert_eq!(mouse.phase(), MousePhase::Idle);
        mouse.set_position(Vec2::new(4.0, 2.0));
        assert_eq!(mouse.phase(), MousePhase::Tracking);
        // enabling again keeps tracking
        mouse.set_enabled(true);
        assert_eq!(mouse.position(), Some(Vec2::new(4.0, 2.0)));

        assert!(mouse.set_enabled(false));
        assert_eq!(mouse.position(), None);
        assert!(!mouse.set_enabled(false));
    }

    #[test]
    fn relaxation_converges() {
        let target = Vec2::new(-0.5, 0.0);
        let mut p = Vec2::new(1.5, 1.0);
        for _ in 0..300 {
            p = relax(p, target, RELAX_FACTOR);
        }
        assert_relative_eq!(p, target, epsilon = 1e-6);
    }
}
