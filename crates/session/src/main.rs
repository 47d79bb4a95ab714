//! Synthetic-session demo
//!
//! Drives the analysis pipeline from a generated pose stream: one person
//! squatting while drifting across the frame into a restricted zone.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use exercise_engine::{EventSink, TrackerEvent};
use person_tracking::{BoundingBox, PersonDetection};
use pose_geometry::{Joint, Point2, PoseSample};
use surveillance::RestrictedZone;

use session::{
    generate_session_id, AnalysisPipeline, FrameInput, PersonObservation, PipelineConfig,
    PoseSource, SessionWorker,
};

/// Logs lifecycle events as they happen
struct LoggingSink;

impl EventSink for LoggingSink {
    fn on_event(&mut self, event: &TrackerEvent) {
        match event {
            TrackerEvent::NewPerson { person_id } => {
                info!(person_id, "new person detected");
            }
            TrackerEvent::RepCompleted {
                person_id,
                rep_count,
                min_angle,
            } => {
                info!(person_id, rep_count, min_angle, "rep completed");
            }
            TrackerEvent::StateChanged { .. } => {}
        }
    }
}

/// Generates a squatting figure that drifts slowly to the right, paced at
/// roughly camera rate
struct SyntheticSource {
    frame: u64,
    total: u64,
    start: DateTime<Utc>,
}

impl SyntheticSource {
    fn figure(&self, cx: f64, knee_angle_deg: f64) -> PoseSample {
        let knee = Point2::new(cx, 300.0);
        let ankle = Point2::new(cx, 380.0);
        let rad = knee_angle_deg.to_radians();
        let hip = Point2::new(cx + 80.0 * rad.sin(), 300.0 + 80.0 * rad.cos());
        PoseSample::new()
            .with_landmark(Joint::LeftHip, hip, 0.95)
            .with_landmark(Joint::RightHip, Point2::new(hip.x + 30.0, hip.y), 0.95)
            .with_landmark(Joint::LeftKnee, knee, 0.95)
            .with_landmark(Joint::LeftAnkle, ankle, 0.95)
            .with_landmark(
                Joint::LeftShoulder,
                Point2::new(hip.x - 5.0, hip.y - 120.0),
                0.95,
            )
            .with_landmark(
                Joint::RightShoulder,
                Point2::new(hip.x + 35.0, hip.y - 120.0),
                0.95,
            )
    }
}

impl PoseSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<FrameInput> {
        if self.frame >= self.total {
            return None;
        }
        // ~30 fps pacing
        std::thread::sleep(std::time::Duration::from_millis(10));

        let timestamp = self.start + Duration::milliseconds(self.frame as i64 * 33);
        // One squat every 40 frames: knee angle swings 170 -> 90 -> 170
        let phase = (self.frame % 40) as f64 / 40.0;
        let knee_angle = 130.0 + 40.0 * (std::f64::consts::TAU * phase).cos();
        let cx = 150.0 + self.frame as f64 * 1.5;

        let sample = self.figure(cx, knee_angle);
        let detection =
            PersonDetection::new(BoundingBox::new(cx - 60.0, 120.0, 120.0, 300.0), 0.9);

        self.frame += 1;
        Some(FrameInput {
            timestamp,
            people: vec![PersonObservation {
                detection,
                pose: Some(sample),
            }],
        })
    }
}

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logging already initialized");
    }
}

fn main() -> Result<()> {
    init_logging();

    let config = PipelineConfig::load("pipeline").unwrap_or_else(|err| {
        warn!(%err, "falling back to default configuration");
        PipelineConfig::default()
    });

    let session_id = generate_session_id();
    let started_at = Utc::now();
    info!(%session_id, "starting synthetic session");

    let mut pipeline = AnalysisPipeline::new(&config, &session_id, started_at);
    pipeline.add_event_sink(Box::new(LoggingSink));

    if config.zones.is_empty() {
        // Place a zone in the figure's path so the demo raises an entry alert
        pipeline.surveillance_mut().add_zone(RestrictedZone::new(
            1,
            "Demo Zone",
            vec![
                Point2::new(400.0, 150.0),
                Point2::new(700.0, 150.0),
                Point2::new(700.0, 400.0),
                Point2::new(400.0, 400.0),
            ],
        ));
    }

    let source = SyntheticSource {
        frame: 0,
        total: 240,
        start: started_at,
    };
    let handle = SessionWorker::spawn(Box::new(source), pipeline, session_id, started_at);

    // Poll the shared snapshot the way a serving layer would
    for _ in 0..4 {
        std::thread::sleep(std::time::Duration::from_millis(500));
        let snapshot = handle.snapshot();
        info!(
            frames = snapshot.frames_processed,
            reps = snapshot.exercise.total_reps,
            alerts = snapshot.surveillance.total_alerts,
            "session progress"
        );
    }

    let pipeline = handle
        .join()
        .map_err(|_| anyhow!("session worker panicked"))?;

    let now = Utc::now();
    let stats = pipeline.stats(now);
    let summary = pipeline.surveillance_summary(now);
    info!(
        total_reps = stats.total_reps,
        people = stats.active_people,
        alerts = summary.total_alerts,
        zones = summary.zones,
        "session complete"
    );

    Ok(())
}
