//! Output sinks and the periodic transform re-broadcast.

pub mod broadcaster;

pub use broadcaster::{BroadcasterThread, TransformBroadcaster};

use crossbeam_channel::Sender;

use crate::matching::MatchStage;
use crate::state::StampedTransform;
use crate::types::OccupancyGridMsg;

/// Destination for accepted and re-broadcast transforms.
pub trait TransformSink: Send + Sync {
    fn send_transform(&self, transform: &StampedTransform);
}

/// Destination for debug overlays: the reference grid of a stage with the
/// matched source cells marked.
pub trait OverlaySink: Send + Sync {
    fn publish_overlay(&self, stage: MatchStage, overlay: &OccupancyGridMsg);
}

impl TransformSink for Sender<StampedTransform> {
    fn send_transform(&self, transform: &StampedTransform) {
        // A dropped receiver means nobody is listening anymore.
        let _ = self.send(transform.clone());
    }
}

impl OverlaySink for Sender<(MatchStage, OccupancyGridMsg)> {
    fn publish_overlay(&self, stage: MatchStage, overlay: &OccupancyGridMsg) {
        let _ = self.send((stage, overlay.clone()));
    }
}

/// Discards overlays.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlays;

impl OverlaySink for NoOverlays {
    fn publish_overlay(&self, _stage: MatchStage, _overlay: &OccupancyGridMsg) {}
}
