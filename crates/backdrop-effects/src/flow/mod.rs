//! Collections of simple kinematic bodies
//! integrated with light random perturbation
//! and composited additively.

pub mod dna_helix;
pub mod fire;
pub mod matrix;
pub mod metaballs;
pub mod morph_blob;
pub mod neon_trails;
pub mod particles;
pub mod starfield;

use backdrop_core::{Vec2, Viewport};

/// A moving point with a phase for oscillating motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Position in logical pixels.
    pub pos: Vec2,
    /// Displacement per frame in logical pixels.
    pub vel: Vec2,
    /// Phase offset of any periodic motion, in radians.
    pub phase: f64,
}

impl Body {
    /// A body at rest.
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::zeros(),
            phase: 0.0,
        }
    }

    /// Move by one frame's worth of velocity.
    #[inline]
    pub fn step(&mut self) {
        self.pos += self.vel;
    }

    /// Keep the body on the surface according to `boundary`.
    /// Returns true if it jumped to the opposite edge.
    pub fn constrain(&mut self, boundary: Boundary, viewport: &Viewport) -> bool {
        boundary.apply(&mut self.pos, &mut self.vel, extent(viewport))
    }
}

/// Logical size of the surface as a vector.
#[inline]
pub fn extent(viewport: &Viewport) -> Vec2 {
    Vec2::new(viewport.css_width, viewport.css_height)
}

/// What happens to a body crossing the edge of the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Boundary {
    /// Jump to the opposite edge.
    Wrap,
    /// Jump to the opposite edge once fully outside by the given margin,
    /// e.g. a blob's radius.
    WrapPadded(f64),
    /// Stop at the edge and turn the velocity back inwards.
    Reflect,
    /// Stop at the edge.
    Clamp,
}

impl Boundary {
    /// Apply the policy to a position and velocity
    /// on an area from the origin to `extent`.
    /// Returns true if the position wrapped on either axis.
    pub fn apply(self, pos: &mut Vec2, vel: &mut Vec2, extent: Vec2) -> bool {
        let mut wrapped = false;
        for axis in 0..2 {
            wrapped |= self.apply_axis(&mut pos[axis], &mut vel[axis], extent[axis]);
        }
        wrapped
    }

    fn apply_axis(self, pos: &mut f64, vel: &mut f64, extent: f64) -> bool {
        match self {
            Boundary::Wrap => {
                if *pos < 0.0 {
                    *pos = extent;
                } else if *pos > extent {
                    *pos = 0.0;
                } else {
                    return false;
                }
                true
            }
            Boundary::WrapPadded(pad) => {
                if *pos < -pad {
                    *pos = extent + pad;
                } else if *pos > extent + pad {
                    *pos = -pad;
                } else {
                    return false;
                }
                true
            }
            Boundary::Reflect => {
                if *pos < 0.0 {
                    *vel = vel.abs();
                } else if *pos > extent {
                    *vel = -vel.abs();
                }
                *pos = pos.clamp(0.0, extent);
                false
            }
            Boundary::Clamp => {
                if *pos < 0.0 || *pos > extent {
                    *pos = pos.clamp(0.0, extent);
                    *vel = 0.0;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn boundary_policies() {
        let extent = Vec2::new(100.0, 50.0);

        let (mut pos, mut vel) = (Vec2::new(-1.0, 20.0), Vec2::new(-2.0, 0.0));
        assert!(Boundary::Wrap.apply(&mut pos, &mut vel, extent));
        assert_eq!(pos, Vec2::new(100.0, 20.0));
        assert_eq!(vel, Vec2::new(-2.0, 0.0));

        let (mut pos, mut vel) = (Vec2::new(-5.0, 55.0), Vec2::zeros());
        assert!(!Boundary::WrapPadded(10.0).apply(&mut pos, &mut vel, extent));
        let mut pos = Vec2::new(-11.0, 61.0);
        assert!(Boundary::WrapPadded(10.0).apply(&mut pos, &mut vel, extent));
        assert_eq!(pos, Vec2::new(110.0, -10.0));

        let (mut pos, mut vel) = (Vec2::new(103.0, -2.0), Vec2::new(4.0, -1.0));
        assert!(!Boundary::Reflect.apply(&mut pos, &mut vel, extent));
        assert_eq!(pos, Vec2::new(100.0, 0.0));
        assert_relative_eq!(vel, Vec2::new(-4.0, 1.0));

        let (mut pos, mut vel) = (Vec2::new(120.0, 10.0), Vec2::new(3.0, 3.0));
        Boundary::Clamp.apply(&mut pos, &mut vel, extent);
        assert_eq!(pos, Vec2::new(100.0, 10.0));
        assert_eq!(vel, Vec2::new(0.0, 3.0));
    }

    #[test]
    fn bodies_step_by_velocity() {
        let mut body = Body::at(Vec2::new(1.0, 1.0));
        body.vel = Vec2::new(0.5, -0.25);
        body.step();
        body.step();
        assert_relative_eq!(body.pos, Vec2::new(2.0, 0.5));
    }
}
