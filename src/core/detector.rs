// Gesture detector - per-frame capture -> gate -> classify loop
//
// Consumes the landmark provider's frame stream and emits rate-limited
// detection events. Frames are processed strictly in arrival order on a
// single worker task; per-frame inference failures are contained here and
// never tear down the stream.

use crate::core::classifier::Classifier;
use crate::core::features::encode_hands;
use crate::core::visibility::hand_fully_visible;
use crate::models::gesture::{DetectionEvent, DetectorConfig};
use crate::models::hand::{Hand, LandmarkFrame};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

pub struct GestureDetector {
    config: DetectorConfig,
    classifier: Arc<dyn Classifier>,
    is_running: Arc<RwLock<bool>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl GestureDetector {
    pub fn new(config: DetectorConfig, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            config,
            classifier,
            is_running: Arc::new(RwLock::new(false)),
            worker: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Begin continuous frame processing.
    ///
    /// Idempotent: calling start while already running is a no-op (the new
    /// frame stream is dropped). The worker simply waits if the source is
    /// not producing frames yet.
    pub async fn start(
        &self,
        mut frames: mpsc::Receiver<LandmarkFrame>,
        events: mpsc::Sender<DetectionEvent>,
    ) {
        let mut is_running = self.is_running.write().await;
        if *is_running {
            return;
        }
        *is_running = true;
        drop(is_running);

        let mut processor = FrameProcessor::new(self.config.clone(), self.classifier.clone());
        let running = self.is_running.clone();

        let handle = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                if !*running.read().await {
                    break;
                }
                if let Some(event) = processor.process(&frame) {
                    if events.send(event).await.is_err() {
                        // Subscriber went away; nothing left to do
                        break;
                    }
                }
            }
        });

        *self.worker.lock().await = Some(handle);
        println!("Gesture detector started ({})", self.classifier.model_info());
    }

    /// Halt processing and drop the frame subscription.
    ///
    /// Safe to call repeatedly. Any provider frames arriving after this
    /// produce no events and no classifier invocations.
    pub async fn stop(&self) {
        let mut is_running = self.is_running.write().await;
        if !*is_running {
            return;
        }
        *is_running = false;
        drop(is_running);

        if let Some(handle) = self.worker.lock().await.take() {
            handle.abort();
        }
        println!("Gesture detector stopped");
    }
}

// ==============================================================================
// Per-frame processing
// ==============================================================================

/// The synchronous per-frame rule set, kept separate from the task plumbing.
struct FrameProcessor {
    config: DetectorConfig,
    classifier: Arc<dyn Classifier>,
    hand_was_visible: bool,
    last_positive_emit: Option<Instant>,
}

impl FrameProcessor {
    fn new(config: DetectorConfig, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            config,
            classifier,
            hand_was_visible: false,
            last_positive_emit: None,
        }
    }

    /// Apply the per-frame rules, in order:
    ///
    /// 1. visible -> not-visible transition emits a null event immediately,
    ///    bypassing the cooldown ("hand removed" must clear UI state now);
    /// 2. frames with no hands are otherwise skipped;
    /// 3. only fully visible hands qualify for classification;
    /// 4. while the cooldown window since the last positive emission is
    ///    open, inference is skipped entirely;
    /// 5. arg-max probabilities at or below the confidence threshold become
    ///    a null event, everything above is emitted as a positive detection.
    fn process(&mut self, frame: &LandmarkFrame) -> Option<DetectionEvent> {
        if !frame.has_hands() {
            let was_visible = self.hand_was_visible;
            self.hand_was_visible = false;
            return was_visible.then(DetectionEvent::none);
        }
        self.hand_was_visible = true;

        let qualifying: Vec<Hand> = frame
            .hands
            .iter()
            .filter(|hand| {
                hand_fully_visible(hand, self.config.edge_margin, self.config.min_depth)
            })
            .cloned()
            .collect();

        if qualifying.is_empty() {
            // Partially visible hands are tracked for drawing only
            return None;
        }

        if let Some(last) = self.last_positive_emit {
            if last.elapsed() < Duration::from_millis(self.config.cooldown_ms) {
                return None;
            }
        }

        let features = encode_hands(&qualifying);

        match self.classifier.classify(&features) {
            Ok(scores) => {
                let (letter, confidence) = scores.top();
                if confidence <= self.config.confidence_threshold {
                    Some(DetectionEvent::none())
                } else {
                    self.last_positive_emit = Some(Instant::now());
                    Some(DetectionEvent::positive(letter, confidence))
                }
            }
            Err(e) => {
                // Contained: the stream stays alive and the next frame is
                // attempted normally
                eprintln!("Gesture inference failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::NullClassifier;
    use crate::models::gesture::{ClassScores, GestureResult, Letter, ALPHABET_LEN};
    use crate::models::hand::{Landmark, HAND_LANDMARK_COUNT};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test classifier returning a fixed letter/confidence, counting calls.
    struct ScriptedClassifier {
        letter: char,
        confidence: f32,
        calls: AtomicUsize,
    }

    impl ScriptedClassifier {
        fn new(letter: char, confidence: f32) -> Self {
            Self {
                letter,
                confidence,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Classifier for ScriptedClassifier {
        fn classify(
            &self,
            _features: &crate::core::features::FeatureVector,
        ) -> GestureResult<ClassScores> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut scores = [0.0f32; ALPHABET_LEN];
            scores[Letter::try_from(self.letter).unwrap().index()] = self.confidence;
            Ok(ClassScores(scores))
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn model_info(&self) -> String {
            "scripted".to_string()
        }
    }

    fn visible_hand() -> Hand {
        Hand::new(vec![Landmark::new(0.5, 0.5, 0.0); HAND_LANDMARK_COUNT])
    }

    fn truncated_hand() -> Hand {
        let mut hand = visible_hand();
        hand.landmarks[4] = Landmark::new(0.01, 0.5, 0.0); // thumb tip off frame
        hand
    }

    fn frame_with(hands: Vec<Hand>) -> LandmarkFrame {
        LandmarkFrame::new(0, hands)
    }

    fn processor(classifier: Arc<dyn Classifier>) -> FrameProcessor {
        FrameProcessor::new(DetectorConfig::default(), classifier)
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_detection_above_threshold() {
        let classifier = Arc::new(ScriptedClassifier::new('A', 0.9));
        let mut proc = processor(classifier.clone());

        let event = proc.process(&frame_with(vec![visible_hand()])).unwrap();
        assert_eq!(event.label.unwrap().as_char(), 'A');
        assert!((event.confidence - 0.9).abs() < 1e-6);
        assert_eq!(classifier.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_confidence_becomes_null_event() {
        let classifier = Arc::new(ScriptedClassifier::new('A', 0.5));
        let mut proc = processor(classifier.clone());

        let event = proc.process(&frame_with(vec![visible_hand()])).unwrap();
        assert!(event.label.is_none());
        assert_eq!(event.confidence, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gated_hand_never_reaches_classifier() {
        let classifier = Arc::new(ScriptedClassifier::new('A', 0.9));
        let mut proc = processor(classifier.clone());

        assert!(proc.process(&frame_with(vec![truncated_hand()])).is_none());
        assert_eq!(classifier.call_count(), 0);

        let short = Hand::new(vec![Landmark::new(0.5, 0.5, 0.0); 15]);
        assert!(proc.process(&frame_with(vec![short])).is_none());
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_hands_without_prior_visibility_is_silent() {
        let classifier = Arc::new(ScriptedClassifier::new('A', 0.9));
        let mut proc = processor(classifier);

        assert!(proc.process(&frame_with(vec![])).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hand_removal_emits_immediate_null() {
        let classifier = Arc::new(ScriptedClassifier::new('A', 0.9));
        let mut proc = processor(classifier);

        proc.process(&frame_with(vec![visible_hand()])).unwrap();

        // Hand disappears right inside the cooldown window: the null event
        // must not wait for it
        let event = proc.process(&frame_with(vec![])).unwrap();
        assert!(event.label.is_none());

        // Only the transition emits; sustained absence stays silent
        assert!(proc.process(&frame_with(vec![])).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_suppresses_inference_and_emission() {
        let classifier = Arc::new(ScriptedClassifier::new('A', 0.9));
        let mut proc = processor(classifier.clone());

        assert!(proc.process(&frame_with(vec![visible_hand()])).is_some());
        assert_eq!(classifier.call_count(), 1);

        // Within the 1000ms window: no event, and no inference either
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(proc.process(&frame_with(vec![visible_hand()])).is_none());
        assert_eq!(classifier.call_count(), 1);

        // Window elapsed: the held gesture is emitted again
        tokio::time::advance(Duration::from_millis(700)).await;
        let event = proc.process(&frame_with(vec![visible_hand()])).unwrap();
        assert_eq!(event.label.unwrap().as_char(), 'A');
        assert_eq!(classifier.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_null_emissions_do_not_arm_cooldown() {
        let classifier = Arc::new(ScriptedClassifier::new('A', 0.5));
        let mut proc = processor(classifier.clone());

        // Sub-threshold results emit a null event on every processed frame
        assert!(proc.process(&frame_with(vec![visible_hand()])).is_some());
        assert!(proc.process(&frame_with(vec![visible_hand()])).is_some());
        assert_eq!(classifier.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inference_failure_keeps_stream_alive() {
        let classifier = Arc::new(NullClassifier);
        let mut proc = processor(classifier);

        assert!(proc.process(&frame_with(vec![visible_hand()])).is_none());
        // Next frame is attempted normally
        assert!(proc.process(&frame_with(vec![visible_hand()])).is_none());
        // Visibility bookkeeping still works
        let event = proc.process(&frame_with(vec![])).unwrap();
        assert!(event.label.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_stop_halts_events() {
        let classifier = Arc::new(ScriptedClassifier::new('B', 0.95));
        let detector = GestureDetector::new(DetectorConfig::default(), classifier.clone());

        let (frame_tx, frame_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);

        detector.start(frame_rx, event_tx.clone()).await;
        assert!(detector.is_running().await);

        // Second start is a no-op
        let (_tx2, rx2) = mpsc::channel(16);
        detector.start(rx2, event_tx).await;

        frame_tx.send(frame_with(vec![visible_hand()])).await.unwrap();
        let event = event_rx.recv().await.unwrap();
        assert_eq!(event.label.unwrap().as_char(), 'B');

        detector.stop().await;
        detector.stop().await; // safe to call twice
        assert!(!detector.is_running().await);

        // Frames after stop produce no events and no classifier calls
        let calls_at_stop = classifier.call_count();
        let _ = frame_tx.send(frame_with(vec![visible_hand()])).await;
        tokio::task::yield_now().await;
        assert!(event_rx.try_recv().is_err());
        assert_eq!(classifier.call_count(), calls_at_stop);
    }
}
