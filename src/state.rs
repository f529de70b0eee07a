//! The last accepted transform, shared between the match thread (single
//! writer) and the broadcaster (reader).
//!
//! Writers replace the whole record under one write lock, so a reader always
//! sees a pose together with the stamp and frames it was committed with.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::types::Pose2D;

/// A pose between two named frames at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedTransform {
    pub pose: Pose2D,
    pub stamp: SystemTime,
    /// Frame the transform starts from (the reference map).
    pub source_frame: String,
    /// Frame the transform ends in (the live map).
    pub target_frame: String,
}

impl StampedTransform {
    /// Same pose and frames with a new stamp.
    pub fn restamped(&self, stamp: SystemTime) -> Self {
        Self {
            stamp,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchState {
    /// `None` until the first successful match.
    pub transform: Option<StampedTransform>,
    /// θ of the last accepted match; zero means "no prior".
    pub theta_prior: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SharedMatchState {
    inner: Arc<RwLock<MatchState>>,
}

impl SharedMatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MatchState {
        self.inner.read().clone()
    }

    pub fn transform(&self) -> Option<StampedTransform> {
        self.inner.read().transform.clone()
    }

    pub fn theta_prior(&self) -> f32 {
        self.inner.read().theta_prior
    }

    /// Replace the held record in one step.
    pub fn commit(&self, transform: StampedTransform, theta_prior: f32) {
        let mut state = self.inner.write();
        *state = MatchState {
            transform: Some(transform),
            theta_prior,
        };
    }
}
