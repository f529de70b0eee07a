use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use log::{info, trace};

use super::TransformSink;
use crate::state::SharedMatchState;

/// Re-emits the held transform with a fresh stamp. Never runs matching logic
/// and never waits on the match thread beyond the state lock.
pub struct TransformBroadcaster {
    state: SharedMatchState,
    sink: Arc<dyn TransformSink>,
}

impl TransformBroadcaster {
    pub fn new(state: SharedMatchState, sink: Arc<dyn TransformSink>) -> Self {
        Self { state, sink }
    }

    /// Broadcast once. Returns false while no match has been accepted.
    pub fn tick(&self) -> bool {
        let Some(transform) = self.state.transform() else {
            return false;
        };
        let transform = transform.restamped(SystemTime::now());
        trace!(
            "re-broadcasting {} -> {}",
            transform.source_frame, transform.target_frame
        );
        self.sink.send_transform(&transform);
        true
    }

    /// Run [`TransformBroadcaster::tick`] every `interval` until `running` clears.
    pub fn spawn(
        self,
        interval: Duration,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<BroadcasterThread> {
        let handle = thread::Builder::new()
            .name("broadcaster".into())
            .spawn(move || {
                info!("broadcaster started ({} ms)", interval.as_millis());
                while running.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    self.tick();
                }
                info!("broadcaster stopped");
            })?;
        Ok(BroadcasterThread { handle })
    }
}

/// Broadcaster thread handle.
#[derive(Debug)]
pub struct BroadcasterThread {
    handle: JoinHandle<()>,
}

impl BroadcasterThread {
    /// Wait for thread to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}
