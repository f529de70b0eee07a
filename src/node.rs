//! Localization node: the match thread plus the transform broadcaster.
//!
//! Live maps are consumed one at a time, so match cycles never overlap. The
//! two threads share nothing but the [`SharedMatchState`](crate::state::SharedMatchState).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};

use crate::matching::{MatchOrchestrator, PoseSolver};
use crate::publish::{BroadcasterThread, TransformBroadcaster};
use crate::types::OccupancyGridMsg;

/// How long the match thread waits for a live map before re-checking `running`.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct LocalizationNode {
    matcher: JoinHandle<()>,
    broadcaster: BroadcasterThread,
    running: Arc<AtomicBool>,
}

impl LocalizationNode {
    pub fn spawn<S>(
        mut orchestrator: MatchOrchestrator<S>,
        live_maps: Receiver<OccupancyGridMsg>,
        broadcast_interval: Duration,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self>
    where
        S: PoseSolver + Send + 'static,
    {
        let broadcaster = TransformBroadcaster::new(
            orchestrator.state().clone(),
            orchestrator.transform_sink(),
        )
        .spawn(broadcast_interval, running.clone())?;

        let r = running.clone();
        let spawned = thread::Builder::new()
            .name("matcher".into())
            .spawn(move || {
                info!("match thread started");
                while r.load(Ordering::Relaxed) {
                    match live_maps.recv_timeout(POLL_INTERVAL) {
                        Ok(msg) => {
                            // Failures are logged by the orchestrator; the next map retries.
                            let _ = orchestrator.handle_live_map(&msg);
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => {
                            debug!("live map channel closed");
                            break;
                        }
                    }
                }
                info!("match thread stopped");
            });
        let (matcher, broadcaster) = stop_on_error(spawned, &running, broadcaster)?;

        Ok(Self {
            matcher,
            broadcaster,
            running,
        })
    }

    /// Stop both threads and wait for them.
    pub fn shutdown(self) -> thread::Result<()> {
        self.running.store(false, Ordering::Relaxed);
        self.matcher.join()?;
        self.broadcaster.join()
    }
}

/// Pair the matcher handle with the broadcaster, or stop and join the
/// broadcaster when the matcher could not be started.
fn stop_on_error(
    spawned: std::io::Result<JoinHandle<()>>,
    running: &AtomicBool,
    broadcaster: BroadcasterThread,
) -> std::io::Result<(JoinHandle<()>, BroadcasterThread)> {
    match spawned {
        Ok(matcher) => Ok((matcher, broadcaster)),
        Err(err) => {
            running.store(false, Ordering::Relaxed);
            if broadcaster.join().is_err() {
                warn!("broadcaster panicked while stopping");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crossbeam_channel::unbounded;

    use super::*;
    use crate::state::{SharedMatchState, StampedTransform};

    fn broadcaster(running: &Arc<AtomicBool>) -> BroadcasterThread {
        let (tx, _rx) = unbounded::<StampedTransform>();
        TransformBroadcaster::new(SharedMatchState::new(), Arc::new(tx))
            .spawn(Duration::from_millis(5), running.clone())
            .unwrap()
    }

    #[test]
    fn failed_matcher_spawn_stops_the_broadcaster() {
        let running = Arc::new(AtomicBool::new(true));
        let publisher = broadcaster(&running);

        let err = stop_on_error(Err(io::Error::other("no threads left")), &running, publisher)
            .unwrap_err();

        // Returning at all means the broadcaster was joined.
        assert_eq!(err.to_string(), "no threads left");
        assert!(!running.load(Ordering::Relaxed));
    }

    #[test]
    fn started_matcher_keeps_the_broadcaster_running() {
        let running = Arc::new(AtomicBool::new(true));
        let publisher = broadcaster(&running);
        let matcher = thread::spawn(|| {});

        let (matcher, publisher) = stop_on_error(Ok(matcher), &running, publisher).unwrap();
        assert!(running.load(Ordering::Relaxed));

        running.store(false, Ordering::Relaxed);
        matcher.join().unwrap();
        publisher.join().unwrap();
    }
}
