//! Session-local mastery rules for weak-question review.
//!
//! A weak question is *cleared* once the user has shown they know it: one
//! correct answer in single mode, or [`STREAK_TO_CLEAR`] consecutive correct
//! answers in streak mode. Nothing here is persisted; a tracker lives for one
//! review session.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// Consecutive correct answers needed to clear a question in streak mode.
pub const STREAK_TO_CLEAR: u32 = 3;

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// Rule used to decide when a weak question is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClearMode {
    /// A single correct answer clears the question.
    #[default]
    Single,
    /// [`STREAK_TO_CLEAR`] consecutive correct answers clear the question.
    Streak,
}

impl ClearMode {
    #[must_use]
    pub fn from_streak_enabled(enabled: bool) -> Self {
        if enabled { Self::Streak } else { Self::Single }
    }

    #[must_use]
    pub fn is_streak(self) -> bool {
        matches!(self, ClearMode::Streak)
    }

    /// Correct answers in a row required under this mode.
    #[must_use]
    pub fn required_streak(self) -> u32 {
        match self {
            ClearMode::Single => 1,
            ClearMode::Streak => STREAK_TO_CLEAR,
        }
    }
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// What a single answer did to a question's mastery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasteryOutcome {
    /// This answer cleared the question.
    Cleared,
    /// Correct, but the streak is still short of the threshold.
    Progress { streak: u32, needed: u32 },
    /// Wrong answer; the question's streak is back to zero.
    Missed,
    /// The question was cleared earlier in the session; nothing changed.
    AlreadyCleared,
}

impl MasteryOutcome {
    #[must_use]
    pub fn cleared(self) -> bool {
        matches!(self, MasteryOutcome::Cleared)
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Streak counters and cleared set for one review session.
#[derive(Debug, Clone, Default)]
pub struct MasteryTracker {
    mode: ClearMode,
    streaks: HashMap<QuestionId, u32>,
    cleared: HashSet<QuestionId>,
}

impl MasteryTracker {
    #[must_use]
    pub fn new(mode: ClearMode) -> Self {
        Self {
            mode,
            streaks: HashMap::new(),
            cleared: HashSet::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ClearMode {
        self.mode
    }

    /// Switch clearing rule.
    ///
    /// All streak counters restart from zero. Already cleared questions stay
    /// cleared.
    pub fn set_mode(&mut self, mode: ClearMode) {
        self.mode = mode;
        self.streaks.clear();
    }

    /// Forget everything, as if a new session started.
    pub fn reset(&mut self) {
        self.streaks.clear();
        self.cleared.clear();
    }

    /// Current consecutive-correct count for `id` (0 when unknown or cleared).
    #[must_use]
    pub fn streak(&self, id: &QuestionId) -> u32 {
        self.streaks.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn streaks(&self) -> &HashMap<QuestionId, u32> {
        &self.streaks
    }

    #[must_use]
    pub fn is_cleared(&self, id: &QuestionId) -> bool {
        self.cleared.contains(id)
    }

    #[must_use]
    pub fn cleared(&self) -> &HashSet<QuestionId> {
        &self.cleared
    }

    #[must_use]
    pub fn cleared_count(&self) -> usize {
        self.cleared.len()
    }

    /// Apply one answer event for `id`.
    pub fn record(&mut self, id: &QuestionId, correct: bool) -> MasteryOutcome {
        if self.cleared.contains(id) {
            return MasteryOutcome::AlreadyCleared;
        }

        if !correct {
            self.streaks.insert(id.clone(), 0);
            return MasteryOutcome::Missed;
        }

        let needed = self.mode.required_streak();
        let streak = self.streak(id) + 1;
        if streak >= needed {
            self.streaks.remove(id);
            self.cleared.insert(id.clone());
            MasteryOutcome::Cleared
        } else {
            self.streaks.insert(id.clone(), streak);
            MasteryOutcome::Progress { streak, needed }
        }
    }
}

//
// ─── PURE EVALUATION ───────────────────────────────────────────────────────────
//

/// Result of replaying a sequence of answer events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteryReport {
    pub streaks: HashMap<QuestionId, u32>,
    pub cleared_in_order: Vec<QuestionId>,
}

/// Replay `(question, correct)` events under `mode` from an empty session.
///
/// ```
/// # use exam_core::mastery::{evaluate, ClearMode};
/// # use exam_core::model::QuestionId;
/// let q = QuestionId::new("T1A01").unwrap();
/// let report = evaluate(ClearMode::Streak, [(&q, true), (&q, true), (&q, true)]);
/// assert_eq!(report.cleared_in_order, vec![q]);
/// ```
pub fn evaluate<'a>(
    mode: ClearMode,
    events: impl IntoIterator<Item = (&'a QuestionId, bool)>,
) -> MasteryReport {
    let mut tracker = MasteryTracker::new(mode);
    let mut cleared_in_order = Vec::new();
    for (id, correct) in events {
        if tracker.record(id, correct).cleared() {
            cleared_in_order.push(id.clone());
        }
    }
    MasteryReport {
        streaks: tracker.streaks,
        cleared_in_order,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
