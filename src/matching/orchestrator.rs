//! Two-stage (coarse, then fine) matching of live maps against the reference.
//!
//! Each live map runs through:
//!
//! ```text
//! Idle -> CoarseMatch -> CoarseAccepted -> FineMatch -> FineAccepted -> Published -> Idle
//!                     \-> CoarseRejected -> Idle       \-> FineRejected -> Published
//! ```
//!
//! A rejected coarse stage aborts the cycle without touching the shared state.
//! A rejected fine stage falls back to the coarse result.

use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use glam::{IVec2, UVec2, Vec2};
use log::{debug, info, warn};

use super::{MatchError, MatchRequest, MatchResult, PoseSolver};
use crate::config::LocalizerConfig;
use crate::grid::{GridMap, filter_out_of_bounds};
use crate::publish::{OverlaySink, TransformSink};
use crate::state::{SharedMatchState, StampedTransform};
use crate::types::{OVERLAY_MARK, OccupancyGridMsg, Pose2D};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStage {
    Coarse,
    Fine,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coarse => f.write_str("coarse"),
            Self::Fine => f.write_str("fine"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPhase {
    #[default]
    Idle,
    CoarseMatch,
    CoarseAccepted,
    CoarseRejected,
    FineMatch,
    FineAccepted,
    FineRejected,
    Published,
}

/// Search parameters of one request, everything but the source grid.
#[derive(Debug, Clone, Copy)]
struct SearchParams {
    acceptance_ratio: f32,
    rotation_downsample: u32,
    hit_sample_cap: u32,
    use_theta_prior: bool,
    use_window: bool,
    offset: IVec2,
    window: UVec2,
    theta_prior: f32,
    theta_window: f32,
}

/// What an accepted stage produced.
#[derive(Debug, Clone)]
struct StageOutcome {
    result: MatchResult,
    overlay: GridMap,
    pose: Pose2D,
}

pub struct MatchOrchestrator<S> {
    config: LocalizerConfig,
    coarse_reference: GridMap,
    fine_reference: GridMap,
    coarse_solver: S,
    fine_solver: S,
    state: SharedMatchState,
    transforms: Arc<dyn TransformSink>,
    overlays: Arc<dyn OverlaySink>,
    /// Fine cells per coarse cell, `2^coarse_level`.
    level_ratio: i32,
    phase: MatchPhase,
}

impl<S: PoseSolver> MatchOrchestrator<S> {
    /// Build the coarse reference level and hand each solver its reference map.
    pub fn new(
        config: LocalizerConfig,
        reference: GridMap,
        mut coarse_solver: S,
        mut fine_solver: S,
        state: SharedMatchState,
        transforms: Arc<dyn TransformSink>,
        overlays: Arc<dyn OverlaySink>,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        let level_ratio = u32::try_from(config.coarse_level)
            .ok()
            .and_then(|level| 1i32.checked_shl(level))
            .filter(|ratio| *ratio > 0)
            .ok_or_else(|| {
                MatchError::UnsupportedInput(format!(
                    "coarse_level {} does not fit cell offsets",
                    config.coarse_level
                ))
            })?;

        let mut levels = reference.pyramid(config.coarse_level)?;
        let coarse_reference = levels.pop().unwrap_or_else(|| reference.clone());
        if coarse_reference.info().cell_count() == 0 {
            return Err(MatchError::UnsupportedInput(format!(
                "a {}x{} reference map has no cells left at coarse_level {}",
                reference.width(),
                reference.height(),
                config.coarse_level
            )));
        }
        info!(
            "reference pyramid: fine {}x{} @ {} m, coarse {}x{} @ {} m",
            reference.width(),
            reference.height(),
            reference.resolution(),
            coarse_reference.width(),
            coarse_reference.height(),
            coarse_reference.resolution()
        );

        let frame = config.reference_frame.as_str();
        coarse_solver
            .set_reference_map(&coarse_reference.to_message(frame))
            .map_err(MatchError::ServiceUnavailable)?;
        fine_solver
            .set_reference_map(&reference.to_message(frame))
            .map_err(MatchError::ServiceUnavailable)?;

        Ok(Self {
            config,
            coarse_reference,
            fine_reference: reference,
            coarse_solver,
            fine_solver,
            state,
            transforms,
            overlays,
            level_ratio,
            phase: MatchPhase::Idle,
        })
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn coarse_reference(&self) -> &GridMap {
        &self.coarse_reference
    }

    pub fn fine_reference(&self) -> &GridMap {
        &self.fine_reference
    }

    pub fn state(&self) -> &SharedMatchState {
        &self.state
    }

    pub fn transform_sink(&self) -> Arc<dyn TransformSink> {
        Arc::clone(&self.transforms)
    }

    /// Run one full match cycle for a live map.
    ///
    /// On success the accepted transform has been committed to the shared
    /// state and broadcast. On error nothing has been committed.
    pub fn handle_live_map(
        &mut self,
        msg: &OccupancyGridMsg,
    ) -> Result<StampedTransform, MatchError> {
        let outcome = self.run_cycle(msg);
        if let Err(err) = &outcome {
            warn!("match cycle aborted: {err}");
        }
        self.set_phase(MatchPhase::Idle);
        outcome
    }

    fn run_cycle(&mut self, msg: &OccupancyGridMsg) -> Result<StampedTransform, MatchError> {
        if msg.origin_yaw != 0.0 {
            return Err(MatchError::UnsupportedInput(format!(
                "live map origin yaw must be zero, got {}",
                msg.origin_yaw
            )));
        }
        let live = GridMap::from_message(msg)?;
        let live_orientation = Pose2D::new(0.0, 0.0, msg.origin_yaw);
        let prior = self.state.theta_prior();

        self.set_phase(MatchPhase::CoarseMatch);
        let params = self.coarse_params(prior);
        let coarse = match solve_stage(
            &mut self.coarse_solver,
            &self.coarse_reference,
            &live,
            params,
            &self.config,
            &live_orientation,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.set_phase(MatchPhase::CoarseRejected);
                return Err(err);
            }
        };
        self.set_phase(MatchPhase::CoarseAccepted);
        info!(
            "coarse match: theta {:.4} score {}/{} origin {}",
            coarse.result.theta, coarse.result.score, coarse.result.max_score, coarse.result.origin
        );
        self.publish_overlay(MatchStage::Coarse, &coarse.overlay);

        self.set_phase(MatchPhase::FineMatch);
        let fine = self.fine_params(&coarse.result).and_then(|params| {
            solve_stage(
                &mut self.fine_solver,
                &self.fine_reference,
                &live,
                params,
                &self.config,
                &live_orientation,
            )
        });
        let accepted = match fine {
            Ok(fine) => {
                self.set_phase(MatchPhase::FineAccepted);
                info!(
                    "fine match: theta {:.4} score {}/{} origin {}",
                    fine.result.theta, fine.result.score, fine.result.max_score, fine.result.origin
                );
                self.publish_overlay(MatchStage::Fine, &fine.overlay);
                fine
            }
            Err(err) => {
                self.set_phase(MatchPhase::FineRejected);
                warn!("fine match failed ({err}), falling back to coarse result");
                coarse
            }
        };

        let target_frame = if msg.frame_id.is_empty() {
            self.config.live_frame.clone()
        } else {
            msg.frame_id.clone()
        };
        let transform = StampedTransform {
            pose: accepted.pose,
            stamp: SystemTime::now(),
            source_frame: self.config.reference_frame.clone(),
            target_frame,
        };
        self.state.commit(transform.clone(), accepted.result.theta);
        self.transforms.send_transform(&transform);
        self.set_phase(MatchPhase::Published);
        Ok(transform)
    }

    fn coarse_params(&self, prior: f32) -> SearchParams {
        let has_prior = prior != 0.0;
        SearchParams {
            acceptance_ratio: self.config.coarse.acceptance_ratio,
            rotation_downsample: self.config.coarse.rotation_downsample,
            hit_sample_cap: self.config.coarse.hit_sample_cap,
            use_theta_prior: has_prior,
            use_window: false,
            offset: IVec2::ZERO,
            window: UVec2::ZERO,
            theta_prior: prior,
            theta_window: if has_prior {
                self.config.coarse.prior_theta_window
            } else {
                TAU
            },
        }
    }

    fn fine_params(&self, coarse: &MatchResult) -> Result<SearchParams, MatchError> {
        let scale = |v: i32| v.checked_mul(self.level_ratio).and_then(i32::checked_neg);
        let offset = match (scale(coarse.origin.x), scale(coarse.origin.y)) {
            (Some(i), Some(j)) => IVec2::new(i, j),
            _ => {
                return Err(MatchError::InvalidSolution(format!(
                    "coarse origin {} overflows the fine level",
                    coarse.origin
                )));
            }
        };
        let size = 2 * self.config.fine.window_radius;
        Ok(SearchParams {
            acceptance_ratio: self.config.fine.acceptance_ratio,
            rotation_downsample: 1,
            hit_sample_cap: 0,
            use_theta_prior: true,
            use_window: true,
            // Positive offsets move the window toward decreasing indices.
            offset,
            window: UVec2::splat(size),
            theta_prior: coarse.theta,
            theta_window: 2.0 * coarse.dtheta,
        })
    }

    fn publish_overlay(&self, stage: MatchStage, overlay: &GridMap) {
        let msg = overlay.to_message(&self.config.reference_frame);
        self.overlays.publish_overlay(stage, &msg);
    }

    fn set_phase(&mut self, phase: MatchPhase) {
        debug!("match phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

/// Coarsen `live` until its resolution is within `tolerance` (relative) of
/// `target`, trimming odd dimensions before each halving.
///
/// At most `ceil(log2(target / live))` halvings are attempted.
pub fn normalize_resolution(
    live: &GridMap,
    target: f32,
    tolerance: f32,
) -> Result<GridMap, MatchError> {
    let within = |resolution: f32| ((resolution - target) / target).abs() <= tolerance;
    let ratio = target / live.resolution();
    let max_steps = if ratio > 1.0 {
        ratio.log2().ceil() as u32
    } else {
        0
    };

    let mut grid = live.clone();
    let mut steps = 0;
    while !within(grid.resolution()) && steps < max_steps {
        grid = grid.coarsen_trimmed()?;
        steps += 1;
    }

    if within(grid.resolution()) {
        Ok(grid)
    } else {
        Err(MatchError::ShapeMismatch {
            live: live.resolution(),
            target,
        })
    }
}

fn solve_stage<S: PoseSolver>(
    solver: &mut S,
    reference: &GridMap,
    live: &GridMap,
    params: SearchParams,
    config: &LocalizerConfig,
    live_orientation: &Pose2D,
) -> Result<StageOutcome, MatchError> {
    let source = normalize_resolution(live, reference.resolution(), config.resolution_tolerance)?;
    let request = MatchRequest {
        source: source.to_message(&config.live_frame),
        acceptance_ratio: params.acceptance_ratio,
        rotation_downsample: params.rotation_downsample,
        hit_sample_cap: params.hit_sample_cap,
        use_theta_prior: params.use_theta_prior,
        use_window: params.use_window,
        i_offset: params.offset.x,
        j_offset: params.offset.y,
        i_window: params.window.x,
        j_window: params.window.y,
        theta_prior: params.theta_prior,
        theta_window: params.theta_window,
    };

    let result = solver
        .match_to_reference(&request)
        .map_err(MatchError::ServiceUnavailable)?;
    if !result.found {
        return Err(MatchError::NoSolution);
    }
    if !result.theta.is_finite() {
        return Err(MatchError::InvalidSolution(format!("theta {}", result.theta)));
    }

    let occupied = source.occupied_cells(source.occupied_thresh());
    let projected = reproject(&source, &occupied, &result)?;
    let inside = filter_out_of_bounds(&projected, UVec2::new(reference.width(), reference.height()));
    let overlay = reference.marked(&inside, OVERLAY_MARK);

    let pose = candidate_pose(&source, reference, &result, live_orientation)?;
    Ok(StageOutcome {
        result,
        overlay,
        pose,
    })
}

/// Move source cells into the reference grid: rotate about the source
/// center, then shift by the matched origin.
fn reproject(
    source: &GridMap,
    cells: &[IVec2],
    result: &MatchResult,
) -> Result<Vec<IVec2>, MatchError> {
    source
        .rotate_around_center(cells, result.theta)
        .into_iter()
        .map(|cell| {
            cell.x
                .checked_add(result.origin.x)
                .zip(cell.y.checked_add(result.origin.y))
                .map(|(i, j)| IVec2::new(i, j))
                .ok_or_else(|| {
                    MatchError::InvalidSolution(format!(
                        "origin {} overflows cell {}",
                        result.origin, cell
                    ))
                })
        })
        .collect()
}

/// Pose of the reference frame origin expressed in the live map's frame.
fn candidate_pose(
    source: &GridMap,
    reference: &GridMap,
    result: &MatchResult,
    live_orientation: &Pose2D,
) -> Result<Pose2D, MatchError> {
    let local_origin = source.world_to_cell(Vec2::ZERO, false);
    let cell = reproject(source, &[local_origin], result)?[0];
    let live_in_reference = Pose2D {
        translation: reference.cell_to_world(cell),
        theta: result.theta,
    };
    Ok(live_in_reference.compose(live_orientation).inverse())
}
