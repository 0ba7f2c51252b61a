// Gesture confirmation state machine
//
// Decides when a stream of detection events constitutes a deliberate,
// sustained, correct performance of the expected gesture rather than a
// transient match. A correct detection starts a hold window polled at a
// fixed tick; confirmation requires the window to elapse AND the most
// recently supplied confidence to clear the floor (a conjunction, not an
// average: a mid-window dip does not reset progress, only the final sample
// matters). At most one timer task is ever live; every reset path aborts it.

use crate::models::gesture::{ConfirmationSnapshot, ConfirmerConfig, DetectionEvent, Letter};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// Events surfaced to the exercise controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfirmerEvent {
    /// Fired exactly once per successful sustained match.
    Confirmed { letter: Letter },
    /// A different letter arrived while one was expected.
    Incorrect { expected: Letter, detected: Letter },
}

#[derive(Debug)]
struct ConfirmState {
    expected: Option<Letter>,
    paused: bool,
    accumulating: bool,
    started_at: Option<Instant>,
    progress: f32,
    last_confidence: f32,
    is_correct: bool,
    is_incorrect: bool,
    /// Guards the transient incorrect flag against stale auto-clears.
    flash_seq: u64,
}

impl ConfirmState {
    fn new() -> Self {
        Self {
            expected: None,
            paused: false,
            accumulating: false,
            started_at: None,
            progress: 0.0,
            last_confidence: 0.0,
            is_correct: false,
            is_incorrect: false,
            flash_seq: 0,
        }
    }

    fn clear_attempt(&mut self) {
        self.accumulating = false;
        self.started_at = None;
        self.progress = 0.0;
        self.last_confidence = 0.0;
        self.is_correct = false;
        self.is_incorrect = false;
    }
}

pub struct GestureConfirmer {
    config: ConfirmerConfig,
    state: Arc<Mutex<ConfirmState>>,
    events: mpsc::Sender<ConfirmerEvent>,
    timer: Mutex<Option<JoinHandle<()>>>,
    flash: Mutex<Option<JoinHandle<()>>>,
}

impl GestureConfirmer {
    pub fn new(config: ConfirmerConfig) -> (Self, mpsc::Receiver<ConfirmerEvent>) {
        let (tx, rx) = mpsc::channel(32);
        let confirmer = Self {
            config,
            state: Arc::new(Mutex::new(ConfirmState::new())),
            events: tx,
            timer: Mutex::new(None),
            flash: Mutex::new(None),
        };
        (confirmer, rx)
    }

    /// Set (or clear) the expected letter. A change resets any in-flight
    /// attempt.
    pub async fn set_expected(&self, letter: Option<Letter>) {
        let mut state = self.state.lock().await;
        if state.expected == letter {
            return;
        }
        state.expected = letter;
        state.clear_attempt();
        drop(state);
        self.cancel_timer().await;
    }

    /// Pause guard for externally locked windows (exercise transitioning,
    /// confirmation animation still playing). Detections arriving while
    /// paused are ignored entirely; the hold timer is cleared so nothing
    /// ticks in the background, and resuming starts a fresh attempt.
    pub async fn set_paused(&self, paused: bool) {
        let mut state = self.state.lock().await;
        state.paused = paused;
        if paused {
            state.accumulating = false;
            state.started_at = None;
            drop(state);
            self.cancel_timer().await;
        }
    }

    /// Feed one detection event through the state machine.
    pub async fn on_detection(&self, event: &DetectionEvent) {
        let mut state = self.state.lock().await;
        if state.paused {
            return;
        }
        let expected = match state.expected {
            Some(letter) => letter,
            None => return,
        };

        match event.label {
            None => {
                // Visibility loss always wins over accumulated progress
                state.clear_attempt();
                drop(state);
                self.cancel_timer().await;
            }
            Some(letter) if letter == expected => {
                state.last_confidence = event.confidence.clamp(0.0, 1.0);
                if !state.accumulating {
                    state.accumulating = true;
                    state.started_at = Some(Instant::now());
                    state.progress = 0.0;
                    state.is_correct = false;
                    state.is_incorrect = false;
                    drop(state);
                    self.spawn_timer(expected).await;
                }
            }
            Some(detected) => {
                state.accumulating = false;
                state.started_at = None;
                state.progress = 0.0;
                state.is_incorrect = true;
                state.flash_seq += 1;
                let seq = state.flash_seq;
                drop(state);
                self.cancel_timer().await;
                let _ = self.events.try_send(ConfirmerEvent::Incorrect { expected, detected });
                self.spawn_flash_clear(seq).await;
            }
        }
    }

    /// Reset to idle: clears the attempt and all transient flags, aborting
    /// the timer. Called on detach/teardown.
    pub async fn reset(&self) {
        self.state.lock().await.clear_attempt();
        self.cancel_timer().await;
        if let Some(handle) = self.flash.lock().await.take() {
            handle.abort();
        }
    }

    pub async fn snapshot(&self) -> ConfirmationSnapshot {
        let state = self.state.lock().await;
        ConfirmationSnapshot {
            expected: state.expected,
            accumulating: state.accumulating,
            progress: state.progress.clamp(0.0, 1.0),
            is_correct: state.is_correct,
            is_incorrect: state.is_incorrect,
        }
    }

    async fn cancel_timer(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
        }
    }

    /// Start the hold-window poll task. The previous handle, if any, is
    /// aborted first so exactly one timer is live per attempt.
    async fn spawn_timer(&self, letter: Letter) {
        let state = self.state.clone();
        let events = self.events.clone();
        let tick = Duration::from_millis(self.config.tick_ms.max(1));
        let hold_secs = Duration::from_millis(self.config.hold_ms.max(1)).as_secs_f32();
        let floor = self.config.confidence_floor;

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(tick).await;
                let mut s = state.lock().await;
                if !s.accumulating {
                    break;
                }
                let started = match s.started_at {
                    Some(t) => t,
                    None => break,
                };
                s.progress = (started.elapsed().as_secs_f32() / hold_secs).min(1.0);
                if s.progress >= 1.0 && s.last_confidence >= floor {
                    s.accumulating = false;
                    s.started_at = None;
                    s.is_correct = true;
                    drop(s);
                    let _ = events.send(ConfirmerEvent::Confirmed { letter }).await;
                    break;
                }
            }
        });

        let mut timer = self.timer.lock().await;
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        *timer = Some(handle);
    }

    /// Auto-clear the transient incorrect flag after the flash window,
    /// unless a newer flash superseded this one.
    async fn spawn_flash_clear(&self, seq: u64) {
        let state = self.state.clone();
        let flash_ms = self.config.incorrect_flash_ms;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(flash_ms)).await;
            let mut s = state.lock().await;
            if s.flash_seq == seq {
                s.is_incorrect = false;
            }
        });

        let mut flash = self.flash.lock().await;
        if let Some(previous) = flash.take() {
            previous.abort();
        }
        *flash = Some(handle);
    }
}
