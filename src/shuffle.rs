//! Answer ordering.
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::error::{Result, TriviaError};
use crate::questions::DISTRACTORS;

/// Returns the answers in uniformly random order and the index of `correct`.
///
/// Distractors are deduplicated against `correct` and each other first; fewer
/// than four distinct values is an error.
pub fn shuffle_answers<R: Rng + ?Sized>(
    correct: &str,
    distractors: &[String],
    rng: &mut R,
) -> Result<(Vec<String>, usize)> {
    let mut seen = HashSet::new();
    seen.insert(correct);

    let mut options = vec![correct.to_string()];
    for d in distractors {
        if options.len() > DISTRACTORS {
            break;
        }
        if seen.insert(d.as_str()) {
            options.push(d.clone());
        }
    }

    if options.len() < DISTRACTORS + 1 {
        return Err(TriviaError::InsufficientData(format!(
            "only {} distinct answers for '{correct}'",
            options.len()
        )));
    }

    options.shuffle(rng);
    let correct_index = options
        .iter()
        .position(|o| o == correct)
        .ok_or_else(|| {
            TriviaError::InsufficientData(format!("lost '{correct}' while shuffling"))
        })?;

    Ok((options, correct_index))
}
