//! Contest trivia question kinds, the question registry, and the text-only
//! question strategies.
//!
//! Each strategy draws its parameters (country, entry, year, year range) from
//! the filtered archive, resolves the correct answer and collects a pool of
//! distractor candidates. [`Draft::assemble`] turns that pool into exactly
//! three distinct wrong answers or reports that the archive cannot support
//! the question.
use rand::seq::{IteratorRandom, SliceRandom};
use rand::RngCore;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::error::{Result, TriviaError};
use crate::filter::FilterContext;
use crate::model::RecordKind;
use crate::store::{ContestStore, EntryField};
use crate::videos;

/// Number of wrong answers shown alongside the correct one
pub const DISTRACTORS: usize = 3;

/// Types of trivia questions available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    FirstParticipationYear,
    SongToCountry,
    BestPlacementOfYear,
    BestAverageInRange,
    CountryOfPerformance,
    SongTitle,
    PerformerName,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::FirstParticipationYear,
        StrategyKind::SongToCountry,
        StrategyKind::BestPlacementOfYear,
        StrategyKind::BestAverageInRange,
        StrategyKind::CountryOfPerformance,
        StrategyKind::SongTitle,
        StrategyKind::PerformerName,
    ];

    pub fn record_kind(self) -> RecordKind {
        match self {
            StrategyKind::CountryOfPerformance
            | StrategyKind::SongTitle
            | StrategyKind::PerformerName => RecordKind::Video,
            _ => RecordKind::Text,
        }
    }

    pub fn score_weight(self) -> u32 {
        match self {
            StrategyKind::FirstParticipationYear => 2,
            StrategyKind::SongToCountry => 1,
            StrategyKind::BestPlacementOfYear => 3,
            StrategyKind::BestAverageInRange => 4,
            StrategyKind::CountryOfPerformance => 3,
            StrategyKind::SongTitle => 2,
            StrategyKind::PerformerName => 4,
        }
    }
}

/// Metadata for a question type including description and kind
#[derive(Debug, Clone, Copy)]
pub struct StrategyMeta {
    pub description: &'static str,
    pub kind: StrategyKind,
}

/// Builds registry mapping question codes to their metadata
pub fn build_registry() -> BTreeMap<String, StrategyMeta> {
    let mut m = BTreeMap::new();

    fn add(
        m: &mut BTreeMap<String, StrategyMeta>,
        code: &str,
        desc: &'static str,
        kind: StrategyKind,
    ) {
        m.insert(
            code.to_string(),
            StrategyMeta {
                description: desc,
                kind,
            },
        );
    }

    // --- text ---
    add(
        &mut m,
        "first_year",
        "Year a country took part for the first time",
        StrategyKind::FirstParticipationYear,
    );
    add(
        &mut m,
        "song_country",
        "Country that performed a given song",
        StrategyKind::SongToCountry,
    );
    add(
        &mut m,
        "best_placement",
        "Song / country that won a given year",
        StrategyKind::BestPlacementOfYear,
    );
    add(
        &mut m,
        "best_average",
        "Country with the best average score over a year range",
        StrategyKind::BestAverageInRange,
    );

    // --- video ---
    add(
        &mut m,
        "video_country",
        "Country represented by the performance in a video",
        StrategyKind::CountryOfPerformance,
    );
    add(
        &mut m,
        "video_song",
        "Title of the song in a video",
        StrategyKind::SongTitle,
    );
    add(
        &mut m,
        "video_artist",
        "Performer of the song in a video",
        StrategyKind::PerformerName,
    );

    m
}

/// Case-insensitive registry lookup by code
pub fn parse_code<'a>(
    input: &str,
    registry: &'a BTreeMap<String, StrategyMeta>,
) -> Option<(&'a String, &'a StrategyMeta)> {
    let wanted = input.trim().to_ascii_lowercase();
    registry.iter().find(|(k, _)| k.to_ascii_lowercase() == wanted)
}

/// Video reference carried by media questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub url: String,
    pub id: String,
}

/// A resolved question before its answers are shuffled
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub kind: StrategyKind,
    pub question_text: String,
    pub correct_answer: String,
    /// Exactly [`DISTRACTORS`] values, pairwise distinct, none equal to the answer
    pub distractors: Vec<String>,
    pub score_weight: u32,
    pub media: Option<Media>,
}

impl Draft {
    /// Takes the first three usable candidates, in pool order.
    ///
    /// Duplicates and copies of the correct answer are dropped. Fails with
    /// `InsufficientData` when fewer than three remain.
    pub fn assemble(
        kind: StrategyKind,
        question_text: String,
        correct_answer: String,
        candidates: Vec<String>,
    ) -> Result<Draft> {
        let mut seen = HashSet::new();
        seen.insert(correct_answer.clone());

        let distractors: Vec<String> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .take(DISTRACTORS)
            .collect();

        if distractors.len() < DISTRACTORS {
            return Err(TriviaError::InsufficientData(format!(
                "{kind:?}: only {} distinct wrong answers for '{correct_answer}'",
                distractors.len()
            )));
        }

        Ok(Draft {
            kind,
            question_text,
            correct_answer,
            distractors,
            score_weight: kind.score_weight(),
            media: None,
        })
    }

    pub fn with_media(mut self, url: &str) -> Self {
        self.media = Some(Media {
            url: url.to_string(),
            id: videos::media_id(url),
        });
        self
    }
}

/// Resolves one question of `kind` against the filtered archive.
pub fn draw(
    kind: StrategyKind,
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    debug!(?kind, %filter, "drawing question");
    match kind {
        StrategyKind::FirstParticipationYear => first_participation_year(filter, store, rng),
        StrategyKind::SongToCountry => song_to_country(filter, store, rng),
        StrategyKind::BestPlacementOfYear => best_placement_of_year(filter, store, rng),
        StrategyKind::BestAverageInRange => best_average_in_range(filter, store, rng),
        StrategyKind::CountryOfPerformance => videos::country_of_performance(filter, store, rng),
        StrategyKind::SongTitle => videos::song_title(filter, store, rng),
        StrategyKind::PerformerName => videos::performer_name(filter, store, rng),
    }
}

pub(crate) fn first<T>(values: Vec<T>, what: &str) -> Result<T> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| TriviaError::EmptyResult(what.to_string()))
}

/// "In which year did X take part for the first time?"
///
/// The answer comes from the whole archive even when the filter excludes the
/// debut year; wrong years come from every year the contest was held.
fn first_participation_year(
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    let country = first(store.sample_countries(1, filter, rng)?, "country in scope")?;
    let year = store.earliest_year_for(&country)?;

    let mut pool: Vec<String> = store
        .years(&FilterContext::unrestricted())?
        .into_iter()
        .filter(|y| *y != year)
        .map(|y| y.to_string())
        .collect();
    pool.shuffle(rng);

    Draft::assemble(
        StrategyKind::FirstParticipationYear,
        format!("In which year did {country} take part for the first time?"),
        year.to_string(),
        pool,
    )
}

/// "Which country performed the song 'S'?"
fn song_to_country(
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    let pick = first(store.sample_entries(1, filter, rng)?, "entry in scope")?;
    let country = pick.entry.country;
    let pool = store.group_and_sample(EntryField::Country, &country, None, DISTRACTORS, rng)?;

    Draft::assemble(
        StrategyKind::SongToCountry,
        format!(
            "Which country performed the song '{}' in {}?",
            pick.entry.song, pick.year
        ),
        country,
        pool,
    )
}

fn song_and_country(song: &str, country: &str) -> String {
    format!("{song} / {country}")
}

/// "Which song / country finished best in YYYY?"
fn best_placement_of_year(
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    let year = first(store.sample_years(1, filter, rng)?, "year in scope")?;
    let winner = store.winner_of(year)?;
    let contest = store.contest(year)?;

    let mut pool: Vec<String> = contest
        .entries
        .iter()
        .filter(|e| e.placement != 1)
        .map(|e| song_and_country(&e.song, &e.country))
        .collect();
    pool.shuffle(rng);

    Draft::assemble(
        StrategyKind::BestPlacementOfYear,
        format!("Which song / country finished best in {year}?"),
        song_and_country(&winner.song, &winner.country),
        pool,
    )
}

/// "Which country had the best average score between A and B?"
///
/// A tie for first place has no single correct answer and is reported as
/// insufficient data.
fn best_average_in_range(
    filter: &FilterContext,
    store: &dyn ContestStore,
    rng: &mut dyn RngCore,
) -> Result<Draft> {
    let start = first(store.sample_years(1, filter, rng)?, "start year in scope")?;
    let end = store
        .years(filter)?
        .into_iter()
        .filter(|y| *y >= start)
        .choose(rng)
        .unwrap_or(start);

    let ranked = store.average_score_by_country(start, end)?;
    if ranked.len() < DISTRACTORS + 1 {
        return Err(TriviaError::InsufficientData(format!(
            "only {} countries competed between {start} and {end}",
            ranked.len()
        )));
    }
    if ranked[0].1 == ranked[1].1 {
        return Err(TriviaError::InsufficientData(format!(
            "{} and {} share the best average between {start} and {end}",
            ranked[0].0, ranked[1].0
        )));
    }

    let question_text = if start == end {
        format!("Which country had the best average score in {start}?")
    } else {
        format!("Which country had the best average score between {start} and {end}?")
    };
    let mut names = ranked.into_iter().map(|(country, _)| country);
    let correct = names.next().unwrap_or_default();

    Draft::assemble(
        StrategyKind::BestAverageInRange,
        question_text,
        correct,
        names.take(DISTRACTORS).collect(),
    )
}
