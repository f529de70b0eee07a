//! Shared fixtures: synthetic maps, an oracle pose solver and recording sinks.

#![allow(dead_code)]

use std::sync::Arc;

use glam::{IVec2, UVec2, Vec2};
use parking_lot::Mutex;

use grid_localizer::grid::GridMap;
use grid_localizer::matching::{
    MatchRequest, MatchResult, MatchStage, PoseSolver, SolverError,
};
use grid_localizer::publish::{OverlaySink, TransformSink};
use grid_localizer::state::StampedTransform;
use grid_localizer::types::{MapInfo, OccupancyGridMsg, Pose2D, rotate};

pub const RESOLUTION: f32 = 0.0625;

/// Live frame -> reference frame transform used to build the live map.
pub fn truth() -> Pose2D {
    Pose2D::new(0.4, -0.3, 0.35)
}

/// 64x64 reference with a wall border and a few blocks.
pub fn reference_map() -> GridMap {
    let info = MapInfo {
        width: 64,
        height: 64,
        resolution: RESOLUTION,
        origin: Vec2::new(-2.0, -2.0),
    };
    let mut grid = GridMap::filled(info, 0.0).unwrap();
    for k in 0..64 {
        for cell in [
            UVec2::new(k, 0),
            UVec2::new(k, 63),
            UVec2::new(0, k),
            UVec2::new(63, k),
        ] {
            grid.set(cell, 1.0).unwrap();
        }
    }
    for i in 10..15 {
        for j in 40..50 {
            grid.set(UVec2::new(i, j), 1.0).unwrap();
        }
    }
    for i in 30..50 {
        grid.set(UVec2::new(i, 20), 1.0).unwrap();
    }
    grid
}

/// A 40x40 live map centered on the live frame origin, sampled from the
/// reference through `live_to_reference`.
pub fn live_map(reference: &GridMap, live_to_reference: Pose2D) -> OccupancyGridMsg {
    let info = MapInfo {
        width: 40,
        height: 40,
        resolution: RESOLUTION,
        origin: Vec2::new(-1.25, -1.25),
    };
    let mut live = GridMap::filled(info.clone(), 0.0).unwrap();
    for i in 0..info.width {
        for j in 0..info.height {
            let p_live = info.origin + (UVec2::new(i, j).as_vec2() + 0.5) * info.resolution;
            let p_ref = live_to_reference.apply(p_live);
            let b = ((p_ref - reference.info().origin) / reference.resolution())
                .floor()
                .as_ivec2();
            if reference.info().contains(b) {
                let value = reference.get(b.as_uvec2()).unwrap();
                live.set(UVec2::new(i, j), value).unwrap();
            }
        }
    }
    live.to_message("local_map")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Oracle,
    Unavailable,
    NotFound,
    /// Answer with this result regardless of the request.
    Fixed(MatchResult),
}

/// Answers every request with the offset implied by a known transform.
pub struct OracleSolver {
    truth: Pose2D,
    theta_bias: f32,
    dtheta: f32,
    reference: Option<MapInfo>,
    pub behavior: Arc<Mutex<Behavior>>,
    pub requests: Arc<Mutex<Vec<MatchRequest>>>,
}

impl OracleSolver {
    pub fn new(truth: Pose2D) -> Self {
        Self {
            truth,
            theta_bias: 0.0,
            dtheta: 0.05,
            reference: None,
            behavior: Arc::new(Mutex::new(Behavior::Oracle)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report `truth.theta + bias`, shifting the offset to match.
    pub fn with_theta_bias(mut self, bias: f32) -> Self {
        self.theta_bias = bias;
        self
    }

    pub fn with_behavior(self, behavior: Behavior) -> Self {
        *self.behavior.lock() = behavior;
        self
    }
}

impl PoseSolver for OracleSolver {
    fn set_reference_map(&mut self, grid: &OccupancyGridMsg) -> Result<(), SolverError> {
        self.reference = Some(grid.info.clone());
        Ok(())
    }

    fn match_to_reference(&mut self, request: &MatchRequest) -> Result<MatchResult, SolverError> {
        self.requests.lock().push(request.clone());
        match &*self.behavior.lock() {
            Behavior::Unavailable => {
                return Err(SolverError::Unavailable("connection refused".to_string()));
            }
            Behavior::NotFound => return Ok(MatchResult::not_found()),
            Behavior::Fixed(result) => return Ok(*result),
            Behavior::Oracle => {}
        }

        let reference = self
            .reference
            .clone()
            .ok_or_else(|| SolverError::Failed("no reference map".to_string()))?;
        let source = &request.source.info;
        let res = reference.resolution;
        let theta = self.truth.theta + self.theta_bias;
        let center = source.center();
        let offset = rotate(source.origin / res + center, theta)
            + (self.truth.translation - reference.origin) / res
            - center;

        Ok(MatchResult {
            found: true,
            theta,
            score: 90.0,
            max_score: 100.0,
            origin: offset.round().as_ivec2(),
            dtheta: self.dtheta,
        })
    }
}

#[derive(Default)]
pub struct RecordingTransforms {
    pub sent: Mutex<Vec<StampedTransform>>,
}

impl TransformSink for RecordingTransforms {
    fn send_transform(&self, transform: &StampedTransform) {
        self.sent.lock().push(transform.clone());
    }
}

#[derive(Default)]
pub struct RecordingOverlays {
    pub published: Mutex<Vec<(MatchStage, OccupancyGridMsg)>>,
}

impl OverlaySink for RecordingOverlays {
    fn publish_overlay(&self, stage: MatchStage, overlay: &OccupancyGridMsg) {
        self.published.lock().push((stage, overlay.clone()));
    }
}

/// An accepted result with no rotation and the given origin.
pub fn fixed(origin: IVec2) -> Behavior {
    Behavior::Fixed(MatchResult {
        found: true,
        theta: 0.0,
        score: 1.0,
        max_score: 1.0,
        origin,
        dtheta: 0.05,
    })
}
