//! Contest archive records and the serialized question record.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, TriviaError};

/// One country's participation in a given year's contest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub country: String,
    pub country_code: String,
    pub artist: String,
    pub song: String,
    /// Final rank, 1 = winner
    pub placement: u32,
    pub score: f64,
    #[serde(default)]
    pub media_url: String,
}

/// A single year's contest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestRecord {
    pub year: i32,
    pub host_country: String,
    pub host_city: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl ContestRecord {
    pub fn winner(&self) -> Option<&Entry> {
        self.entries.iter().find(|e| e.placement == 1)
    }
}

/// An entry together with the contest it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInContest {
    pub year: i32,
    pub host_country: String,
    pub host_city: String,
    pub entry: Entry,
}

/// Checks the integrity rules the question strategies rely on.
///
/// Years must be unique across the corpus. Within each contest placements are
/// at least 1, unique, and exactly one entry has placement 1.
pub fn validate_corpus(contests: &[ContestRecord]) -> Result<()> {
    let mut years = HashSet::new();
    for contest in contests {
        if !years.insert(contest.year) {
            return Err(TriviaError::InvalidData(format!(
                "year {} appears more than once",
                contest.year
            )));
        }

        let mut placements = HashSet::new();
        for entry in &contest.entries {
            if entry.placement < 1 {
                return Err(TriviaError::InvalidData(format!(
                    "{} in {} has placement 0",
                    entry.country, contest.year
                )));
            }
            if !placements.insert(entry.placement) {
                return Err(TriviaError::InvalidData(format!(
                    "placement {} repeated in {}",
                    entry.placement, contest.year
                )));
            }
        }

        if !contest.entries.is_empty() && !placements.contains(&1) {
            return Err(TriviaError::InvalidData(format!(
                "contest {} has no winner",
                contest.year
            )));
        }
    }
    Ok(())
}

/// Parses a JSON array of contests and validates it.
pub fn parse_corpus(json: &str) -> Result<Vec<ContestRecord>> {
    let contests: Vec<ContestRecord> = serde_json::from_str(json)?;
    validate_corpus(&contests)?;
    Ok(contests)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "pregunta")]
    Text,
    #[serde(rename = "video")]
    Video,
}

/// A finished question, ready to hand to the presentation layer.
///
/// Serializes to the flat mapping the quiz front end consumes:
/// `pregunta`, `respuestas`, `correcta`, `puntuacion`, `tipo`, and for videos
/// `url` and `url_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    #[serde(rename = "pregunta")]
    pub question_text: String,
    #[serde(skip)]
    pub correct_answer: String,
    #[serde(rename = "respuestas")]
    pub answer_options: Vec<String>,
    #[serde(rename = "correcta")]
    pub correct_index: usize,
    #[serde(rename = "puntuacion")]
    pub score_weight: u32,
    #[serde(rename = "tipo")]
    pub kind: RecordKind,
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(rename = "url_id", skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
}
