//! Background session worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::pipeline::AnalysisPipeline;
use crate::snapshot::{FrameDigest, SessionSnapshot};
use crate::source::PoseSource;

/// Handle to a running session worker.
///
/// The worker owns the pipeline exclusively; readers poll `snapshot()` for
/// the latest published state. The mutex only makes those reads atomic with
/// respect to the writer loop, it holds no cross-frame invariants.
pub struct SessionHandle {
    shared: Arc<Mutex<SessionSnapshot>>,
    stop: Arc<AtomicBool>,
    join: thread::JoinHandle<AnalysisPipeline>,
}

impl SessionHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        match self.shared.lock() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Request a stop; honored at the next frame boundary, never mid-update
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the loop to finish, returning the pipeline for final
    /// inspection
    pub fn join(self) -> thread::Result<AnalysisPipeline> {
        self.join.join()
    }
}

/// Spawns the frame-processing loop on a background thread
pub struct SessionWorker;

impl SessionWorker {
    /// Start processing frames from `source` until it ends or `stop` is
    /// requested, publishing a snapshot after every frame
    pub fn spawn(
        mut source: Box<dyn PoseSource + Send>,
        mut pipeline: AnalysisPipeline,
        session_id: String,
        started_at: DateTime<Utc>,
    ) -> SessionHandle {
        let shared = Arc::new(Mutex::new(SessionSnapshot::new(
            session_id.clone(),
            started_at,
        )));
        let stop = Arc::new(AtomicBool::new(false));

        let writer_shared = Arc::clone(&shared);
        let writer_stop = Arc::clone(&stop);

        let join = thread::spawn(move || {
            let mut frames: u64 = 0;
            info!(%session_id, "session worker started");

            while !writer_stop.load(Ordering::Relaxed) {
                let Some(frame) = source.next_frame() else {
                    break;
                };
                let summary = pipeline.process(&frame);
                frames += 1;

                let exercise = pipeline.stats(frame.timestamp);
                let surveillance = pipeline.surveillance_summary(frame.timestamp);

                match writer_shared.lock() {
                    Ok(mut snapshot) => {
                        snapshot.frames_processed = frames;
                        snapshot.last_frame = Some(FrameDigest {
                            index: frames - 1,
                            timestamp: frame.timestamp,
                            people_seen: summary.people_seen,
                        });
                        snapshot.exercise = exercise;
                        snapshot.surveillance = surveillance;
                    }
                    Err(_) => warn!("snapshot mutex poisoned; skipping publish"),
                }
            }

            info!(frames, "session worker finished");
            pipeline
        });

        SessionHandle { shared, stop, join }
    }
}
