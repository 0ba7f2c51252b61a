// Exercise controller boundary
//
// One parametrized controller drives both practice modes; the difference
// between "single letter" and "word sequence" exercises is a plan strategy
// supplying the current expected letter and advancing on confirmation. The
// session owns the exercise game state exclusively; the confirmation state
// machine only reports progress. Hint/word lookups go through the opaque
// async content-source boundary.

use crate::models::gesture::{GameState, GestureError, GestureResult, Letter};
use async_trait::async_trait;
use uuid::Uuid;

// ==============================================================================
// Exercise Plans
// ==============================================================================

/// Strategy supplying the sequence of expected letters for one exercise.
pub trait ExercisePlan: Send {
    /// The letter the learner should currently perform.
    fn current(&self) -> Option<Letter>;

    /// Move to the next item; returns it, or `None` when the plan is done.
    fn advance(&mut self) -> Option<Letter>;

    /// (completed, total) items.
    fn progress(&self) -> (usize, usize);
}

/// Alphabet practice: a fixed sequence of standalone letters.
pub struct LetterDrill {
    letters: Vec<Letter>,
    index: usize,
}

impl LetterDrill {
    pub fn new(letters: Vec<Letter>) -> Self {
        Self { letters, index: 0 }
    }
}

impl ExercisePlan for LetterDrill {
    fn current(&self) -> Option<Letter> {
        self.letters.get(self.index).copied()
    }

    fn advance(&mut self) -> Option<Letter> {
        self.index += 1;
        self.current()
    }

    fn progress(&self) -> (usize, usize) {
        (self.index.min(self.letters.len()), self.letters.len())
    }
}

/// Word practice: the learner spells a word letter by letter.
pub struct WordDrill {
    word: String,
    letters: Vec<Letter>,
    index: usize,
}

impl WordDrill {
    pub fn new(word: &str) -> GestureResult<Self> {
        let letters: Vec<Letter> = word
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| Letter::try_from(c))
            .collect::<Result<_, _>>()?;

        if letters.is_empty() {
            return Err(GestureError::InvalidConfig(format!(
                "Word '{}' contains no spellable letters",
                word
            )));
        }

        Ok(Self {
            word: word.to_string(),
            letters,
            index: 0,
        })
    }

    pub fn word(&self) -> &str {
        &self.word
    }
}

impl ExercisePlan for WordDrill {
    fn current(&self) -> Option<Letter> {
        self.letters.get(self.index).copied()
    }

    fn advance(&mut self) -> Option<Letter> {
        self.index += 1;
        self.current()
    }

    fn progress(&self) -> (usize, usize) {
        (self.index.min(self.letters.len()), self.letters.len())
    }
}

// ==============================================================================
// Content Source Boundary
// ==============================================================================

/// Opaque backend boundary for fetching practice content. The core only
/// needs a label to query with; request shape and transport live outside.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn next_word(&self) -> GestureResult<String>;

    async fn hint_for(&self, letter: Letter) -> GestureResult<Option<String>>;
}

// ==============================================================================
// Exercise Session
// ==============================================================================

/// Outcome of handling one confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAdvance {
    /// Move on to the next expected letter.
    Next(Letter),
    /// The plan is exhausted; the session is complete.
    Completed { score: u32 },
    /// The session was not in a detecting state; nothing happened.
    Ignored,
}

/// Summary handed to the external session-submission endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub score: u32,
    pub items_completed: usize,
    pub items_total: usize,
    pub duration_ms: i64,
}

pub struct ExerciseSession {
    id: String,
    state: GameState,
    score: u32,
    points_per_letter: u32,
    plan: Box<dyn ExercisePlan>,
    started_at_ms: i64,
    completed_at_ms: Option<i64>,
}

impl ExerciseSession {
    pub fn new(plan: Box<dyn ExercisePlan>, points_per_letter: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: GameState::Idle,
            score: 0,
            points_per_letter,
            plan,
            started_at_ms: chrono::Utc::now().timestamp_millis(),
            completed_at_ms: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn progress(&self) -> (usize, usize) {
        self.plan.progress()
    }

    /// Start detecting; returns the first expected letter.
    pub fn begin(&mut self) -> Option<Letter> {
        self.state = GameState::Detecting;
        self.plan.current()
    }

    /// The currently expected letter, or `None` while the session is locked.
    pub fn expected(&self) -> Option<Letter> {
        if self.state == GameState::Detecting {
            self.plan.current()
        } else {
            None
        }
    }

    /// Whether the confirmation state machine should be paused: detections
    /// are ignored outside the detecting state.
    pub fn is_locked(&self) -> bool {
        self.state != GameState::Detecting
    }

    /// Handle a confirmed gesture: award points and advance the plan.
    /// Confirmations arriving while the session is locked are ignored.
    pub fn on_confirmed(&mut self) -> SessionAdvance {
        if self.state != GameState::Detecting {
            return SessionAdvance::Ignored;
        }

        self.score += self.points_per_letter;

        match self.plan.advance() {
            Some(next) => {
                self.state = GameState::Transitioning;
                SessionAdvance::Next(next)
            }
            None => {
                self.state = GameState::Completed;
                self.completed_at_ms = Some(chrono::Utc::now().timestamp_millis());
                SessionAdvance::Completed { score: self.score }
            }
        }
    }

    /// Return to detecting after the transition window (next hint fetched,
    /// animation finished).
    pub fn resume(&mut self) {
        if self.state == GameState::Transitioning {
            self.state = GameState::Detecting;
        }
    }

    /// Swap in the next word from the content source, e.g. after completing
    /// one word in an open-ended word practice run.
    pub async fn load_next_word(&mut self, source: &dyn ContentSource) -> GestureResult<Letter> {
        self.state = GameState::Transitioning;

        let word = source.next_word().await?;
        let drill = WordDrill::new(&word)?;
        let first = drill.current().ok_or_else(|| {
            GestureError::ContentUnavailable(format!("empty word '{}' from content source", word))
        })?;

        self.plan = Box::new(drill);
        self.state = GameState::Detecting;
        Ok(first)
    }

    pub fn summary(&self) -> SessionSummary {
        let (items_completed, items_total) = self.plan.progress();
        let end = self
            .completed_at_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        SessionSummary {
            id: self.id.clone(),
            score: self.score,
            items_completed,
            items_total,
            duration_ms: end - self.started_at_ms,
        }
    }
}
