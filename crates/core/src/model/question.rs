use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("option {0} cannot be empty")]
    EmptyOption(AnswerLetter),

    #[error("invalid answer letter: {0:?}")]
    InvalidLetter(String),

    #[error("unknown test type: {0:?}")]
    UnknownTestType(String),
}

//
// ─── ANSWER LETTER ─────────────────────────────────────────────────────────────
//

/// One of the four answer choices of a pool question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Position of the option within a question (0..=3).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
            AnswerLetter::D => 3,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            AnswerLetter::A => 'A',
            AnswerLetter::B => 'B',
            AnswerLetter::C => 'C',
            AnswerLetter::D => 'D',
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for AnswerLetter {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(QuestionError::InvalidLetter(s.to_owned())),
        }
    }
}

//
// ─── TEST TYPE ─────────────────────────────────────────────────────────────────
//

/// License class whose question pool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    #[default]
    Technician,
    General,
    Extra,
}

impl TestType {
    pub const ALL: [TestType; 3] = [Self::Technician, Self::General, Self::Extra];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestType::Technician => "technician",
            TestType::General => "general",
            TestType::Extra => "extra",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technician" => Ok(Self::Technician),
            "general" => Ok(Self::General),
            "extra" => Ok(Self::Extra),
            _ => Err(QuestionError::UnknownTestType(s.to_owned())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice pool question.
///
/// Owned by the catalog; the study flows only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    display_label: String,
    prompt: String,
    options: [String; 4],
    correct: AnswerLetter,
    subelement: String,
    group: String,
}

impl Question {
    /// Build a question, rejecting blank prompt or option text.
    ///
    /// An empty `display_label` falls back to the id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` or `QuestionError::EmptyOption`.
    pub fn new(
        id: QuestionId,
        display_label: impl Into<String>,
        prompt: impl Into<String>,
        options: [String; 4],
        correct: AnswerLetter,
        subelement: impl Into<String>,
        group: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        for letter in AnswerLetter::ALL {
            if options[letter.index()].trim().is_empty() {
                return Err(QuestionError::EmptyOption(letter));
            }
        }

        let mut display_label = display_label.into();
        if display_label.trim().is_empty() {
            display_label = id.to_string();
        }

        Ok(Self {
            id,
            display_label,
            prompt,
            options,
            correct,
            subelement: subelement.into(),
            group: group.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String; 4] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, letter: AnswerLetter) -> &str {
        &self.options[letter.index()]
    }

    #[must_use]
    pub fn correct(&self) -> AnswerLetter {
        self.correct
    }

    #[must_use]
    pub fn is_correct(&self, selected: AnswerLetter) -> bool {
        self.correct == selected
    }

    #[must_use]
    pub fn subelement(&self) -> &str {
        &self.subelement
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
