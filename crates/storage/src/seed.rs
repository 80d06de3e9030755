//! Sample question pools for local development and demos.

use exam_core::model::{AnswerLetter, Question, QuestionId, TestType};

use crate::repository::{Storage, StorageError};

type SampleRow = (
    &'static str,
    &'static str,
    [&'static str; 4],
    AnswerLetter,
);

const TECHNICIAN: &[SampleRow] = &[
    (
        "T1A01",
        "Which of the following is part of the basis and purpose of the Amateur Radio Service?",
        [
            "Providing personal radio communications for as many citizens as possible",
            "Providing communications for international non-profit organizations",
            "Advancing skills in the technical and communication phases of the radio art",
            "All of these choices are correct",
        ],
        AnswerLetter::C,
    ),
    (
        "T1A02",
        "Which agency regulates and enforces the rules for the Amateur Radio Service in the United States?",
        [
            "FEMA",
            "Homeland Security",
            "The FCC",
            "All of these choices are correct",
        ],
        AnswerLetter::C,
    ),
    (
        "T1B01",
        "Which of the following frequency ranges are available for phone operation by Technician licensees?",
        [
            "28.050 MHz to 28.080 MHz",
            "28.100 MHz to 28.300 MHz",
            "28.300 MHz to 28.500 MHz",
            "28.500 MHz to 28.600 MHz",
        ],
        AnswerLetter::C,
    ),
    (
        "T5A01",
        "Electrical current is measured in which of the following units?",
        ["Volts", "Watts", "Ohms", "Amperes"],
        AnswerLetter::D,
    ),
    (
        "T5A02",
        "Electrical power is measured in which of the following units?",
        ["Volts", "Watts", "Watt-hours", "Amperes"],
        AnswerLetter::B,
    ),
    (
        "T5A03",
        "What is the name for the flow of electrons in an electric circuit?",
        ["Voltage", "Resistance", "Capacitance", "Current"],
        AnswerLetter::D,
    ),
    (
        "T5D01",
        "What formula is used to calculate current in a circuit?",
        [
            "I = E x R",
            "I = E / R",
            "I = E + R",
            "I = E - R",
        ],
        AnswerLetter::B,
    ),
    (
        "T9A01",
        "What is a beam antenna?",
        [
            "An antenna built from aluminum I-beams",
            "An omnidirectional antenna invented by Clarence Beam",
            "An antenna that concentrates signals in one direction",
            "An antenna that reverses the phase of received signals",
        ],
        AnswerLetter::C,
    ),
];

const GENERAL: &[SampleRow] = &[
    (
        "G5B01",
        "What dB change represents a factor of two increase or decrease in power?",
        [
            "Approximately 2 dB",
            "Approximately 3 dB",
            "Approximately 6 dB",
            "Approximately 9 dB",
        ],
        AnswerLetter::B,
    ),
    (
        "G5B02",
        "How does the total current relate to the individual currents in a circuit of parallel resistors?",
        [
            "It equals the average of the branch currents",
            "It decreases as more parallel branches are added to the circuit",
            "It equals the sum of the currents through each branch",
            "It is the sum of the reciprocal of each individual voltage drop",
        ],
        AnswerLetter::C,
    ),
    (
        "G9A01",
        "Which of the following factors determine the characteristic impedance of a parallel conductor feed line?",
        [
            "The distance between the centers of the conductors and the radius of the conductors",
            "The distance between the centers of the conductors and the length of the line",
            "The radius of the conductors and the frequency of the signal",
            "The frequency of the signal and the length of the line",
        ],
        AnswerLetter::A,
    ),
];

const EXTRA: &[SampleRow] = &[
    (
        "E5A01",
        "What can cause the voltage across reactances in a series RLC circuit to be higher than the voltage applied to the entire circuit?",
        ["Resonance", "Capacitance", "Conductance", "Resistance"],
        AnswerLetter::A,
    ),
    (
        "E5A02",
        "What is resonance in an LC or RLC circuit?",
        [
            "The highest frequency that will pass current",
            "The lowest frequency that will pass current",
            "The frequency at which the capacitive reactance equals the inductive reactance",
            "The frequency at which the reactive impedance equals the resistive impedance",
        ],
        AnswerLetter::C,
    ),
];

/// Built-in sample questions for one license class.
///
/// # Errors
///
/// Returns `exam_core::Error` if a sample row fails validation.
pub fn sample_questions(test_type: TestType) -> Result<Vec<Question>, exam_core::Error> {
    let rows = match test_type {
        TestType::Technician => TECHNICIAN,
        TestType::General => GENERAL,
        TestType::Extra => EXTRA,
    };

    let mut out = Vec::with_capacity(rows.len());
    for &(id, prompt, options, correct) in rows {
        let question = Question::new(
            QuestionId::new(id)?,
            id,
            prompt,
            options.map(str::to_owned),
            correct,
            &id[..2],
            &id[..3],
        )?;
        out.push(question);
    }
    Ok(out)
}

/// Errors emitted while seeding sample questions.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Sample(#[from] exam_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Upsert the sample pool for each of `test_types`. Returns how many
/// questions were written per class.
///
/// # Errors
///
/// Returns `SeedError` if a sample is invalid or a write fails.
pub async fn seed_samples(
    storage: &Storage,
    test_types: &[TestType],
) -> Result<Vec<(TestType, usize)>, SeedError> {
    let mut written = Vec::with_capacity(test_types.len());
    for &test_type in test_types {
        let questions = sample_questions(test_type)?;
        for question in &questions {
            storage.questions.upsert_question(test_type, question).await?;
        }
        written.push((test_type, questions.len()));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pool_has_valid_samples() {
        for test_type in TestType::ALL {
            let questions = sample_questions(test_type).unwrap();
            assert!(!questions.is_empty());
            let prefix = match test_type {
                TestType::Technician => 'T',
                TestType::General => 'G',
                TestType::Extra => 'E',
            };
            assert!(questions.iter().all(|q| q.id().as_str().starts_with(prefix)));
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let storage = Storage::in_memory();
        seed_samples(&storage, &[TestType::General]).await.unwrap();
        let counts = seed_samples(&storage, &[TestType::General]).await.unwrap();

        let stored = storage
            .questions
            .questions_for_test_type(TestType::General)
            .await
            .unwrap();
        assert_eq!(counts, vec![(TestType::General, stored.len())]);
    }
}
