//! Batch generation: picks question kinds, retries the ones the archive
//! cannot support, and shuffles answers into finished records.
use rand::seq::IteratorRandom;
use rand::RngCore;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::{Result, TriviaError};
use crate::filter::FilterContext;
use crate::model::QuestionRecord;
use crate::questions::{build_registry, draw, Draft, StrategyKind, StrategyMeta};
use crate::shuffle::shuffle_answers;
use crate::store::ContestStore;

/// Attempts per question before the batch is abandoned
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// How question kinds are picked for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// Every pick is uniform over the whole registry
    #[default]
    WithReplacement,
    /// A kind is used at most once per batch
    WithoutReplacement,
}

pub struct QuizGenerator<'a> {
    store: &'a dyn ContestStore,
    registry: BTreeMap<String, StrategyMeta>,
    max_attempts: usize,
    mode: DrawMode,
}

impl<'a> QuizGenerator<'a> {
    pub fn new(store: &'a dyn ContestStore) -> Self {
        QuizGenerator {
            store,
            registry: build_registry(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            mode: DrawMode::default(),
        }
    }

    pub fn with_registry(mut self, registry: BTreeMap<String, StrategyMeta>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn registry(&self) -> &BTreeMap<String, StrategyMeta> {
        &self.registry
    }

    /// Generates `n` questions, or fails without returning a partial batch.
    pub fn generate(
        &self,
        n: usize,
        filter: &FilterContext,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<QuestionRecord>> {
        let mut used: Vec<StrategyKind> = Vec::new();
        let mut records = Vec::with_capacity(n);

        for position in 0..n {
            let record = self.generate_one(filter, &mut used, rng).map_err(|e| {
                warn!(position, error = %e, "question batch failed");
                e
            })?;
            records.push(record);
        }

        info!(count = records.len(), %filter, "generated question batch");
        Ok(records)
    }

    /// Generates a single question of a fixed kind, without retries.
    pub fn generate_kind(
        &self,
        kind: StrategyKind,
        filter: &FilterContext,
        rng: &mut dyn RngCore,
    ) -> Result<QuestionRecord> {
        let draft = draw(kind, filter, self.store, rng)?;
        to_record(draft, rng)
    }

    fn generate_one(
        &self,
        filter: &FilterContext,
        used: &mut Vec<StrategyKind>,
        rng: &mut dyn RngCore,
    ) -> Result<QuestionRecord> {
        let mut tried: Vec<StrategyKind> = Vec::new();
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let kind = match self.pick_kind(used, &tried, rng) {
                Some(kind) => kind,
                None => break,
            };

            match draw(kind, filter, self.store, rng).and_then(|draft| to_record(draft, rng)) {
                Ok(record) => {
                    if self.mode == DrawMode::WithoutReplacement {
                        used.push(kind);
                    }
                    return Ok(record);
                }
                Err(e) if e.is_recoverable() => {
                    debug!(attempt, ?kind, error = %e, "retrying with another question kind");
                    tried.push(kind);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(TriviaError::InsufficientData(match last_error {
            Some(e) => format!("no question after {} attempts ({e})", tried.len()),
            None => "no question kinds left to draw".to_string(),
        }))
    }

    /// Uniform pick among kinds not yet tried for this question (and, without
    /// replacement, not yet used in the batch).
    fn pick_kind(
        &self,
        used: &[StrategyKind],
        tried: &[StrategyKind],
        rng: &mut dyn RngCore,
    ) -> Option<StrategyKind> {
        self.registry
            .values()
            .map(|meta| meta.kind)
            .filter(|kind| !tried.contains(kind))
            .filter(|kind| self.mode == DrawMode::WithReplacement || !used.contains(kind))
            .choose(rng)
    }
}

fn to_record(draft: Draft, rng: &mut dyn RngCore) -> Result<QuestionRecord> {
    let (answer_options, correct_index) =
        shuffle_answers(&draft.correct_answer, &draft.distractors, rng)?;
    let (media_url, media_id) = match draft.media {
        Some(media) => (Some(media.url), Some(media.id)),
        None => (None, None),
    };

    Ok(QuestionRecord {
        question_text: draft.question_text,
        correct_answer: draft.correct_answer,
        answer_options,
        correct_index,
        score_weight: draft.score_weight,
        kind: draft.kind.record_kind(),
        media_url,
        media_id,
    })
}
