//! Planar rigid transforms.
//!
//! A [`Pose2D`] maps points expressed in its local frame into the frame the
//! pose itself is expressed in: `p_parent = R(theta) * p_local + translation`.

use glam::Vec2;

/// Rotate `v` counter-clockwise by `theta` radians.
#[inline]
pub fn rotate(v: Vec2, theta: f32) -> Vec2 {
    let (sin, cos) = theta.sin_cos();
    Vec2::new(cos * v.x - sin * v.y, sin * v.x + cos * v.y)
}

/// Rigid transform (x, y, yaw) in world units (meters, radians).
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub translation: Vec2,
    pub theta: f32,
}

impl Pose2D {
    pub const IDENTITY: Self = Self {
        translation: Vec2::ZERO,
        theta: 0.0,
    };

    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            translation: Vec2::new(x, y),
            theta,
        }
    }

    pub fn x(&self) -> f32 {
        self.translation.x
    }

    pub fn y(&self) -> f32 {
        self.translation.y
    }

    /// Transform a point from this pose's local frame into its parent frame.
    #[inline]
    pub fn apply(&self, point: Vec2) -> Vec2 {
        rotate(point, self.theta) + self.translation
    }

    /// The transform mapping parent-frame points back into the local frame.
    pub fn inverse(&self) -> Self {
        let theta = -self.theta;
        Self {
            translation: rotate(-self.translation, theta),
            theta,
        }
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Pose2D) -> Self {
        Self {
            translation: self.apply(other.translation),
            theta: self.theta + other.theta,
        }
    }
}
