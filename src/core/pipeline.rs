// Long-lived gesture pipeline
//
// One pipeline instance owns the classifier, detector, and confirmation
// state machine for the lifetime of the application shell. Exercise views
// attach and detach instead of rebuilding the camera/model stack per screen;
// the classifier and model handles are acquired once. The camera and
// classifier are owned exclusively by this instance: a second attach while
// one is active is rejected.

use crate::core::classifier::Classifier;
use crate::core::config::PipelineConfig;
use crate::core::confirmer::{ConfirmerEvent, GestureConfirmer};
use crate::core::detector::GestureDetector;
use crate::models::gesture::{
    ConfirmationSnapshot, DetectionEvent, GestureError, GestureResult, Letter, TrackerConfig,
};
use crate::models::hand::LandmarkFrame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Classifier or provider failed to initialize; no events will flow.
    NotReady,
    /// Initialized and waiting for an exercise view to attach.
    Ready,
    /// Attached and processing frames.
    Running,
}

pub struct GesturePipeline {
    config: PipelineConfig,
    classifier: Arc<dyn Classifier>,
    detector: GestureDetector,
    confirmer: Arc<GestureConfirmer>,
    router: Mutex<Option<JoinHandle<()>>>,
    raw_tap: Arc<Mutex<Option<mpsc::Sender<DetectionEvent>>>>,
}

impl GesturePipeline {
    /// Build the pipeline. Returns the pipeline and the receiver for
    /// confirmation events (confirmed / incorrect).
    pub fn new(
        config: PipelineConfig,
        classifier: Arc<dyn Classifier>,
    ) -> (Self, mpsc::Receiver<ConfirmerEvent>) {
        let detector = GestureDetector::new(config.detector.clone(), classifier.clone());
        let (confirmer, confirmer_rx) = GestureConfirmer::new(config.confirmer.clone());

        let pipeline = Self {
            config,
            classifier,
            detector,
            confirmer: Arc::new(confirmer),
            router: Mutex::new(None),
            raw_tap: Arc::new(Mutex::new(None)),
        };
        (pipeline, confirmer_rx)
    }

    pub async fn status(&self) -> PipelineStatus {
        if !self.classifier.is_ready() {
            PipelineStatus::NotReady
        } else if self.detector.is_running().await {
            PipelineStatus::Running
        } else {
            PipelineStatus::Ready
        }
    }

    /// Settings the external landmark provider should be configured with.
    pub fn tracker_config(&self) -> &TrackerConfig {
        &self.config.tracker
    }

    pub fn model_info(&self) -> String {
        self.classifier.model_info()
    }

    /// Attach an exercise view: subscribe to a landmark frame stream and set
    /// the letter the learner is expected to perform.
    pub async fn attach(
        &self,
        frames: mpsc::Receiver<LandmarkFrame>,
        expected: Option<Letter>,
    ) -> GestureResult<()> {
        if !self.classifier.is_ready() {
            return Err(GestureError::NotInitialized);
        }
        if self.detector.is_running().await {
            return Err(GestureError::AlreadyRunning);
        }

        self.confirmer.set_expected(expected).await;
        self.confirmer.set_paused(false).await;

        let (event_tx, mut event_rx) = mpsc::channel::<DetectionEvent>(64);
        self.detector.start(frames, event_tx).await;

        let confirmer = self.confirmer.clone();
        let raw_tap = self.raw_tap.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if let Some(tap) = raw_tap.lock().await.as_ref() {
                    // A slow tap consumer drops raw events, never blocks the
                    // confirmation path
                    let _ = tap.try_send(event);
                }
                confirmer.on_detection(&event).await;
            }
        });
        *self.router.lock().await = Some(handle);

        Ok(())
    }

    /// Detach the active exercise view: stop frame processing and clear all
    /// confirmation state. The classifier stays loaded for the next attach.
    pub async fn detach(&self) {
        self.detector.stop().await;
        if let Some(handle) = self.router.lock().await.take() {
            handle.abort();
        }
        self.confirmer.reset().await;
        self.confirmer.set_expected(None).await;
    }

    /// Subscribe to the raw per-frame detection events (one per processed
    /// frame), e.g. for UI overlays. Replaces any previous subscription.
    pub async fn tap_raw_events(&self) -> mpsc::Receiver<DetectionEvent> {
        let (tx, rx) = mpsc::channel(64);
        *self.raw_tap.lock().await = Some(tx);
        rx
    }

    pub async fn set_expected(&self, letter: Option<Letter>) {
        self.confirmer.set_expected(letter).await;
    }

    /// Pause/resume the confirmation state machine while the surrounding
    /// exercise is locked (transitioning between items, playing animations).
    pub async fn set_paused(&self, paused: bool) {
        self.confirmer.set_paused(paused).await;
    }

    pub async fn confirmation(&self) -> ConfirmationSnapshot {
        self.confirmer.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gesture::{ClassScores, DetectorConfig, GestureResult, ALPHABET_LEN};
    use crate::models::hand::{Hand, Landmark, HAND_LANDMARK_COUNT};
    use tokio::time::Duration;

    struct FixedClassifier {
        letter: char,
        confidence: f32,
    }

    impl Classifier for FixedClassifier {
        fn classify(
            &self,
            _features: &crate::core::features::FeatureVector,
        ) -> GestureResult<ClassScores> {
            let mut scores = [0.0f32; ALPHABET_LEN];
            scores[Letter::try_from(self.letter).unwrap().index()] = self.confidence;
            Ok(ClassScores(scores))
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn model_info(&self) -> String {
            "fixed".to_string()
        }
    }

    fn visible_hand() -> Hand {
        Hand::new(vec![Landmark::new(0.5, 0.5, 0.0); HAND_LANDMARK_COUNT])
    }

    fn letter(c: char) -> Letter {
        Letter::try_from(c).unwrap()
    }

    async fn run_for(ms: u64) {
        let step = 25;
        let mut remaining = ms;
        while remaining > 0 {
            let chunk = remaining.min(step);
            tokio::time::advance(Duration::from_millis(chunk)).await;
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            remaining -= chunk;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_hand_confirms_exactly_once_end_to_end() {
        // A stable, fully visible hand performing "C" at confidence 0.85 for
        // 2.5 continuous seconds, with expected = C
        let classifier = Arc::new(FixedClassifier { letter: 'C', confidence: 0.85 });
        let (pipeline, mut confirmed_rx) = GesturePipeline::new(PipelineConfig::default(), classifier);

        assert_eq!(pipeline.status().await, PipelineStatus::Ready);

        let (frame_tx, frame_rx) = mpsc::channel(64);
        pipeline.attach(frame_rx, Some(letter('C'))).await.unwrap();
        assert_eq!(pipeline.status().await, PipelineStatus::Running);

        let mut confirmations = 0;
        for _ in 0..25 {
            frame_tx
                .send(LandmarkFrame::new(0, vec![visible_hand()]))
                .await
                .unwrap();
            run_for(100).await;

            let snapshot = pipeline.confirmation().await;
            assert!(!snapshot.is_incorrect, "a correct run must never flag incorrect");

            while let Ok(event) = confirmed_rx.try_recv() {
                if matches!(event, ConfirmerEvent::Confirmed { letter: l } if l == letter('C')) {
                    confirmations += 1;
                }
            }
        }

        assert_eq!(confirmations, 1);

        pipeline.detach().await;
        assert_eq!(pipeline.status().await, PipelineStatus::Ready);

        // Frames after detach are inert
        let _ = frame_tx.send(LandmarkFrame::new(0, vec![visible_hand()])).await;
        run_for(2500).await;
        assert!(confirmed_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_rejects_concurrent_use() {
        let classifier = Arc::new(FixedClassifier { letter: 'A', confidence: 0.9 });
        let (pipeline, _rx) = GesturePipeline::new(PipelineConfig::default(), classifier);

        let (_tx1, rx1) = mpsc::channel(4);
        pipeline.attach(rx1, Some(letter('A'))).await.unwrap();

        let (_tx2, rx2) = mpsc::channel(4);
        assert!(matches!(
            pipeline.attach(rx2, Some(letter('A'))).await,
            Err(GestureError::AlreadyRunning)
        ));

        // Detach releases the slot for the next view
        pipeline.detach().await;
        let (_tx3, rx3) = mpsc::channel(4);
        pipeline.attach(rx3, Some(letter('B'))).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_classifier_blocks_attach() {
        let (pipeline, _rx) = GesturePipeline::new(
            PipelineConfig::default(),
            Arc::new(crate::core::classifier::NullClassifier),
        );

        assert_eq!(pipeline.status().await, PipelineStatus::NotReady);

        let (_tx, rx) = mpsc::channel(4);
        assert!(matches!(
            pipeline.attach(rx, Some(letter('A'))).await,
            Err(GestureError::NotInitialized)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_event_tap_sees_per_frame_detections() {
        let classifier = Arc::new(FixedClassifier { letter: 'D', confidence: 0.9 });
        let (pipeline, _confirmed_rx) = GesturePipeline::new(PipelineConfig::default(), classifier);

        let mut raw_rx = pipeline.tap_raw_events().await;
        let (frame_tx, frame_rx) = mpsc::channel(16);
        pipeline.attach(frame_rx, Some(letter('D'))).await.unwrap();

        frame_tx
            .send(LandmarkFrame::new(0, vec![visible_hand()]))
            .await
            .unwrap();
        run_for(50).await;

        let event = raw_rx.try_recv().unwrap();
        assert_eq!(event.label.unwrap().as_char(), 'D');

        pipeline.detach().await;

        let _ = frame_tx.send(LandmarkFrame::new(0, vec![visible_hand()])).await;
        run_for(1200).await;
        assert!(raw_rx.try_recv().is_err());
    }

    // Detector cooldown only rate-limits positive emissions; DetectorConfig
    // stays honored through the pipeline wiring.
    #[tokio::test(start_paused = true)]
    async fn test_pipeline_honors_detector_cooldown() {
        let classifier = Arc::new(FixedClassifier { letter: 'E', confidence: 0.9 });
        let mut config = PipelineConfig::default();
        config.detector = DetectorConfig { cooldown_ms: 500, ..DetectorConfig::default() };

        let (pipeline, _confirmed_rx) = GesturePipeline::new(config, classifier);
        let mut raw_rx = pipeline.tap_raw_events().await;
        let (frame_tx, frame_rx) = mpsc::channel(16);
        pipeline.attach(frame_rx, None).await.unwrap();

        for _ in 0..4 {
            frame_tx
                .send(LandmarkFrame::new(0, vec![visible_hand()]))
                .await
                .unwrap();
            run_for(100).await;
        }

        // 400 ms of frames under a 500 ms cooldown: only the first emits
        assert!(raw_rx.try_recv().is_ok());
        assert!(raw_rx.try_recv().is_err());
    }
}
